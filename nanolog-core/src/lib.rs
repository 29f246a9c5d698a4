//! # nanolog-core
//! Core utilities for nanolog - levels, sinks and line formatting.

mod config;
mod level;
mod log_writer;
mod utils;

pub use config::NANOLOG_CONFIG;
pub use level::{Level, ParseLevelError};
pub use log_writer::{LogFile, LogStdout, LogWriter, Sink, SinkKind};
pub use utils::{
    DateFormat, ERR_EXTENSION, LOG_EXTENSION, create_fresh_file, format_line, normalize_path,
    time,
};
