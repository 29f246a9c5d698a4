use std::{
    ffi::OsString,
    fs::{self, File},
    io::ErrorKind,
    path::{Path, PathBuf},
};

use chrono::{
    DateTime, Local,
    format::{Item, StrftimeItems},
};
use colored::Colorize;

use crate::level::Level;

/// Suffix appended to log file paths lacking it.
pub const LOG_EXTENSION: &str = "log";
/// Suffix appended to standard-error file paths lacking it.
pub const ERR_EXTENSION: &str = "err";

/// Date formatter used for line prefixes and banners, e.g. `Sun 2026/Oct/18 14:03:27:041`.
///
/// The pattern is parsed once when the formatter is built and reused for every line.
#[derive(Debug, Clone)]
pub struct DateFormat {
    items: Vec<Item<'static>>,
}

impl DateFormat {
    pub const PATTERN: &'static str = "%a %Y/%b/%d %H:%M:%S:%3f";

    pub fn new() -> Self {
        Self {
            items: StrftimeItems::new(Self::PATTERN).collect(),
        }
    }

    pub fn format(&self, at: &DateTime<Local>) -> String {
        at.format_with_items(self.items.iter()).to_string()
    }

    pub fn now(&self) -> String {
        self.format(&Local::now())
    }
}

impl Default for DateFormat {
    fn default() -> Self {
        Self::new()
    }
}

/// Current wall-clock time as `HH:MM:SS:mmm`.
pub fn time() -> String {
    Local::now().format("%H:%M:%S:%3f").to_string()
}

/// Builds a log line: `<date> [<label>] <message>`, or the bare message for [`Level::Raw`].
pub fn format_line(date: &str, level: Level, message: &str, colorize: bool) -> String {
    let Some(label) = level.label() else {
        return message.to_owned();
    };
    if !colorize {
        return format!("{date} [{label}] {message}");
    }
    let label = match level {
        Level::Error => label.red(),
        Level::Warning => label.yellow(),
        Level::Information => label.green(),
        _ => label.blue(),
    };
    format!("{date} [{label}] {message}")
}

/// Appends `.<extension>` to `path` unless it already ends with it (ignoring case).
pub fn normalize_path<P: AsRef<Path>>(path: P, extension: &str) -> PathBuf {
    let path = path.as_ref();
    let suffix = format!(".{extension}");
    if path
        .to_string_lossy()
        .to_lowercase()
        .ends_with(&suffix.to_lowercase())
    {
        return path.to_path_buf();
    }
    let mut normalized = OsString::from(path.as_os_str());
    normalized.push(&suffix);
    PathBuf::from(normalized)
}

/// Creates a new empty file at `path`, deleting whatever file was there before.
pub fn create_fresh_file<P: AsRef<Path>>(path: P) -> Result<File, std::io::Error> {
    let path = path.as_ref();
    let open = || File::options().write(true).create_new(true).open(path);
    match open() {
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            fs::remove_file(path)?;
            open()
        }
        other => other,
    }
}
