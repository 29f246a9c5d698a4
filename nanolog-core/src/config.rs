use std::sync::LazyLock;

use derive_from_env::FromEnv;

/// Library-wide defaults read from `NANOLOG_*` environment variables.
#[derive(FromEnv)]
#[from_env(prefix = "NANOLOG")]
#[allow(non_snake_case)]
pub struct NanologConfig {
    /// Color level labels when the active sink is standard output.
    #[from_env(default = "false")]
    pub COLOR: bool,
    /// Capture a backtrace beneath every error logged with a trace.
    #[from_env(default = "true")]
    pub BACKTRACE: bool,
}

impl Default for NanologConfig {
    fn default() -> Self {
        Self {
            COLOR: false,
            BACKTRACE: true,
        }
    }
}

pub static NANOLOG_CONFIG: LazyLock<NanologConfig> =
    LazyLock::new(|| NanologConfig::from_env().unwrap_or_default());
