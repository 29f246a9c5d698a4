use std::{
    fs::File,
    io::{LineWriter, Write},
    path::{Path, PathBuf},
};

use crate::utils::create_fresh_file;

/// Destination of formatted log lines.
///
/// Every call writes whole lines and leaves nothing buffered once it returns.
pub trait LogWriter {
    fn regular(&mut self, line: &str) -> Result<(), std::io::Error>;
    fn flush(&mut self) -> Result<(), std::io::Error>;
}

/// A log file, recreated empty on open and flushed after every line.
#[derive(Debug)]
pub struct LogFile {
    path: PathBuf,
    file: LineWriter<File>,
}

impl LogFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, std::io::Error> {
        let file = create_fresh_file(&path)?;
        Ok(Self {
            path: path.as_ref().to_path_buf(),
            file: LineWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogWriter for LogFile {
    fn regular(&mut self, line: &str) -> Result<(), std::io::Error> {
        writeln!(self.file, "{line}")?;
        self.file.flush()
    }

    fn flush(&mut self) -> Result<(), std::io::Error> {
        self.file.flush()
    }
}

/// Standard output, the fail-safe sink.
#[derive(Default, Debug)]
pub struct LogStdout;

impl LogWriter for LogStdout {
    fn regular(&mut self, line: &str) -> Result<(), std::io::Error> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{line}")?;
        stdout.flush()
    }

    fn flush(&mut self) -> Result<(), std::io::Error> {
        std::io::stdout().flush()
    }
}

/// The single output of a logger.
#[derive(Debug)]
pub enum Sink {
    Stdout(LogStdout),
    File(LogFile),
    /// Left behind by `close`; writes are discarded.
    Closed,
}

impl Default for Sink {
    fn default() -> Self {
        Sink::Stdout(LogStdout)
    }
}

/// Which kind of destination a [`Sink`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    Stdout,
    File,
    Closed,
}

impl Sink {
    pub fn kind(&self) -> SinkKind {
        match self {
            Sink::Stdout(_) => SinkKind::Stdout,
            Sink::File(_) => SinkKind::File,
            Sink::Closed => SinkKind::Closed,
        }
    }

    pub fn is_stdout(&self) -> bool {
        matches!(self, Sink::Stdout(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Sink::Closed)
    }

    /// Path of the log file, `None` for standard output or a closed sink.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Sink::File(f) => Some(f.path()),
            Sink::Stdout(_) | Sink::Closed => None,
        }
    }
}

impl LogWriter for Sink {
    fn regular(&mut self, line: &str) -> Result<(), std::io::Error> {
        match self {
            Sink::Stdout(w) => w.regular(line),
            Sink::File(w) => w.regular(line),
            Sink::Closed => Ok(()),
        }
    }

    fn flush(&mut self) -> Result<(), std::io::Error> {
        match self {
            Sink::Stdout(w) => w.flush(),
            Sink::File(w) => w.flush(),
            Sink::Closed => Ok(()),
        }
    }
}
