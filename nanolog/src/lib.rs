//! # nanolog
//! Nimble thread-safe logger writing leveled lines to a single file.
//!
//! Lines look like `Sun 2026/Oct/18 14:03:27:041 [INF] message`. Every write
//! happens under one lock, so concurrent threads never interleave partial lines.
//! When the log file cannot be created, logging goes to standard output instead.
//!
//! ## Usage
//! ```toml
//! // Cargo.toml
//! ...
//! [dependencies]
//! nanolog = "0.1.0"
//! ```
//!
//! ```rust
//! let path = std::env::temp_dir().join("nanolog_doc_usage");
//! let path = nanolog::init(&path).expect("Unable to create log file");
//! nanolog::info("Hello, world!");
//! nanolog::debug("not written, the default level is INFORMATION");
//! nanolog::set_active_level(nanolog::Level::Debug);
//! nanolog::debug("written now");
//! nanolog::close();
//! let content = std::fs::read_to_string(path).unwrap();
//! assert!(content.ends_with("[DBG] written now\n"));
//! ```
//!
//! ## Multi-threaded logging
//! ```rust
//! use nanolog::logger_config;
//!
//! let path = std::env::temp_dir().join("nanolog_doc_threads.log");
//! logger_config()
//!     .with_level(nanolog::Level::Warning)
//!     .init_global(&path)
//!     .expect("Unable to create log file");
//!
//! let handles: Vec<_> = (0..5).map(|i| {
//!     std::thread::spawn(move || {
//!         nanolog::warn(format!("Hello, world from thread {i}!"));
//!         log::warn!("log macros land in the same file");
//!     })
//! }).collect();
//! for h in handles { h.join().unwrap(); }
//! nanolog::close();
//! let content = std::fs::read_to_string(path).unwrap();
//! assert_eq!(content.lines().count(), 11);
//! ```
//!
//! ## Owned loggers
//! The process-wide logger is a [`Logger`] like any other; build your own to
//! pass around explicitly.
//!
//! ```rust
//! let logger = nanolog::logger_config().build();
//! logger.raw("written verbatim to standard output");
//! ```

mod logger;
mod stderr;

pub use logger::{Logger, SinkInfo};
pub use nanolog_core::{Level, ParseLevelError, SinkKind, time};

use nanolog_core::NANOLOG_CONFIG;
use std::{
    error::Error,
    fmt::Display,
    path::{Path, PathBuf},
    sync::LazyLock,
};

/// Process-wide logger, on standard output until [`init`] is called.
static LOGGER: LazyLock<Logger> = LazyLock::new(Logger::new);

/// Builder for configuring a logger.
pub struct ConfigBuilder {
    level: Level,
    color: bool,
    backtrace: bool,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            level: Level::Information,
            color: NANOLOG_CONFIG.COLOR,
            backtrace: NANOLOG_CONFIG.BACKTRACE,
        }
    }
}

impl ConfigBuilder {
    /// Sets the level restored by every `init`.
    pub fn with_level(self, level: Level) -> Self {
        Self { level, ..self }
    }
    /// Color labels while logging to standard output.
    pub fn with_color(self, yes: bool) -> Self {
        Self { color: yes, ..self }
    }
    /// Dynamically set the backtrace flag.
    pub fn with_backtrace(self, yes: bool) -> Self {
        Self {
            backtrace: yes,
            ..self
        }
    }
    /// Only write the source chain beneath logged errors
    pub fn no_backtrace(self) -> Self {
        self.with_backtrace(false)
    }
    /// Builds a standalone logger writing to standard output until initialized.
    pub fn build(self) -> Logger {
        Logger::with_settings(self.level, self.color, self.backtrace)
    }
    /// Configures the process-wide logger, routes the `log` macros to it and
    /// opens the log file. See [`Logger::init`].
    pub fn init_global<P: AsRef<Path>>(self, path: P) -> Result<PathBuf, std::io::Error> {
        LOGGER.configure(self.level, self.color, self.backtrace);
        // a second call finds the facade already pointing at LOGGER
        let _ = install_log_facade();
        LOGGER.init(path)
    }
}

/// Returns a default ConfigBuilder for configuring the logger.
pub fn logger_config() -> ConfigBuilder {
    ConfigBuilder::default()
}

/// The process-wide logger.
pub fn global() -> &'static Logger {
    &LOGGER
}

/// Routes records of the `log` crate macros to the process-wide logger.
pub fn install_log_facade() -> Result<(), ::log::SetLoggerError> {
    ::log::set_logger(global())?;
    ::log::set_max_level(::log::LevelFilter::Trace);
    Ok(())
}

/// Opens the process-wide log file. See [`Logger::init`].
pub fn init<P: AsRef<Path>>(path: P) -> Result<PathBuf, std::io::Error> {
    LOGGER.init(path)
}

/// Sends standard error to a `.err` file. See [`Logger::redirect_standard_error`].
pub fn redirect_standard_error<P: AsRef<Path>>(path: P) -> Result<PathBuf, std::io::Error> {
    LOGGER.redirect_standard_error(path)
}

/// Filters every later call on the process-wide logger.
pub fn set_active_level(level: Level) {
    LOGGER.set_active_level(level);
}

pub fn active_level() -> Level {
    LOGGER.active_level()
}

pub fn date() -> String {
    LOGGER.date()
}

pub fn raw<M: Display>(message: M) {
    LOGGER.raw(message);
}

pub fn log<M: Display>(level: Level, message: M) {
    LOGGER.log(level, message);
}

/// See [`Logger::log_with_trace`].
pub fn log_with_trace<E: Error + ?Sized>(level: Level, error: &E) {
    LOGGER.log_with_trace(level, error);
}

pub fn debug<M: Display>(message: M) {
    LOGGER.debug(message);
}

pub fn info<M: Display>(message: M) {
    LOGGER.info(message);
}

pub fn warn<M: Display>(message: M) {
    LOGGER.warn(message);
}

pub fn error<M: Display>(message: M) {
    LOGGER.error(message);
}

pub fn warn_with_trace<E: Error + ?Sized>(error: &E) {
    LOGGER.warn_with_trace(error);
}

pub fn error_with_trace<E: Error + ?Sized>(error: &E) {
    LOGGER.error_with_trace(error);
}

/// Closes the process-wide sink. See [`Logger::close`].
pub fn close() {
    LOGGER.close();
}
