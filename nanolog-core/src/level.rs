use std::{fmt, str::FromStr};

/// Log levels, ordered by priority.
///
/// A lower order means a higher priority: a message is written only when its
/// level's order is less than or equal to the order of the active level.
/// [`Level::Raw`] always passes the filter and is written without any prefix.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Level {
    Raw = 0,
    Error = 1,
    Warning = 2,
    #[default]
    Information = 3,
    Debug = 4,
}

impl Level {
    pub const ALL: [Level; 5] = [
        Level::Raw,
        Level::Error,
        Level::Warning,
        Level::Information,
        Level::Debug,
    ];

    pub fn order(self) -> u8 {
        self as u8
    }

    pub fn from_order(order: u8) -> Option<Self> {
        Self::ALL.get(order as usize).copied()
    }

    /// Short tag written between brackets, `None` for [`Level::Raw`].
    pub fn label(self) -> Option<&'static str> {
        match self {
            Level::Raw => None,
            Level::Error => Some("ERR"),
            Level::Warning => Some("WRN"),
            Level::Information => Some("INF"),
            Level::Debug => Some("DBG"),
        }
    }

    /// Whether a message at this level passes a filter set to `active`.
    pub fn passes(self, active: Level) -> bool {
        self <= active
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Level::Raw => "RAW",
            Level::Error => "ERROR",
            Level::Warning => "WARNING",
            Level::Information => "INFORMATION",
            Level::Debug => "DEBUG",
        };
        f.pad(name)
    }
}

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Level::Error,
            log::Level::Warn => Level::Warning,
            log::Level::Info => Level::Information,
            log::Level::Debug | log::Level::Trace => Level::Debug,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLevelError(String);

impl fmt::Display for ParseLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown log level: {:?}", self.0)
    }
}

impl std::error::Error for ParseLevelError {}

impl FromStr for Level {
    type Err = ParseLevelError;

    /// Accepts the full name, the label or the numeric order, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(order) = trimmed.parse::<u8>() {
            return Level::from_order(order).ok_or_else(|| ParseLevelError(s.into()));
        }
        match trimmed.to_ascii_uppercase().as_str() {
            "RAW" => Ok(Level::Raw),
            "ERROR" | "ERR" => Ok(Level::Error),
            "WARNING" | "WARN" | "WRN" => Ok(Level::Warning),
            "INFORMATION" | "INFO" | "INF" => Ok(Level::Information),
            "DEBUG" | "DBG" => Ok(Level::Debug),
            _ => Err(ParseLevelError(s.into())),
        }
    }
}
