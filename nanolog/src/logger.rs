use std::{
    backtrace::Backtrace,
    error::Error,
    fmt::Display,
    io::Write,
    path::{Path, PathBuf},
    sync::{
        Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, AtomicU8, Ordering},
    },
};

use log::Log;
use nanolog_core::{
    DateFormat, ERR_EXTENSION, LOG_EXTENSION, Level, LogFile, LogWriter, Sink, SinkKind,
    create_fresh_file, format_line, normalize_path,
};

use crate::{ConfigBuilder, stderr};

/// A logger owning one sink and the lock serializing every write to it.
///
/// Starts on standard output until [`Logger::init`] opens a log file.
/// The active level and the settings are plain atomics read without the lock.
#[derive(Debug)]
pub struct Logger {
    active_level: AtomicU8,
    default_level: AtomicU8,
    color: AtomicBool,
    backtrace: AtomicBool,
    date_format: DateFormat,
    sink: Mutex<Sink>,
}

/// Snapshot of the active sink, taken under a short lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkInfo {
    kind: SinkKind,
    path: Option<PathBuf>,
}

impl SinkInfo {
    fn of(sink: &Sink) -> Self {
        Self {
            kind: sink.kind(),
            path: sink.path().map(Path::to_path_buf),
        }
    }

    pub fn kind(&self) -> SinkKind {
        self.kind
    }

    /// Path of the log file, `None` for standard output or a closed sink.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_stdout(&self) -> bool {
        self.kind == SinkKind::Stdout
    }

    pub fn is_closed(&self) -> bool {
        self.kind == SinkKind::Closed
    }
}

impl Default for Logger {
    fn default() -> Self {
        ConfigBuilder::default().build()
    }
}

impl Logger {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_settings(level: Level, color: bool, backtrace: bool) -> Self {
        Self {
            active_level: AtomicU8::new(level.order()),
            default_level: AtomicU8::new(level.order()),
            color: AtomicBool::new(color),
            backtrace: AtomicBool::new(backtrace),
            date_format: DateFormat::new(),
            sink: Mutex::new(Sink::default()),
        }
    }

    pub(crate) fn configure(&self, level: Level, color: bool, backtrace: bool) {
        self.default_level.store(level.order(), Ordering::Relaxed);
        self.active_level.store(level.order(), Ordering::Relaxed);
        self.color.store(color, Ordering::Relaxed);
        self.backtrace.store(backtrace, Ordering::Relaxed);
    }

    fn lock_sink(&self) -> MutexGuard<'_, Sink> {
        self.sink.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Opens `path` (with a `.log` suffix appended when missing) as the sink.
    ///
    /// Standard output is installed first and the active level is reset to the
    /// configured default. An existing file is deleted and recreated. The
    /// creation banner is written to whichever sink ends up active, so on
    /// failure it lands on standard output and logging keeps working there.
    pub fn init<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf, std::io::Error> {
        let path = normalize_path(path, LOG_EXTENSION);
        let mut sink = self.lock_sink();
        *sink = Sink::default();
        self.set_active_level(self.default_level());
        let result = LogFile::new(&path).map(|file| {
            *sink = Sink::File(file);
            path
        });
        let banner = format!("======= LOG CREATED on {} =======", self.date());
        sink.regular(&banner).ok();
        result
    }

    /// Sends the process's standard error to `path` (with a `.err` suffix appended
    /// when missing), truncating the file. Independent of the log sink.
    pub fn redirect_standard_error<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<PathBuf, std::io::Error> {
        let path = normalize_path(path, ERR_EXTENSION);
        let file = create_fresh_file(&path)?;
        stderr::redirect(&file)?;
        writeln!(
            std::io::stderr(),
            "======= ERROR FILE CREATED on {} =======",
            self.date()
        )?;
        Ok(path)
    }

    /// Affects only the calls made afterwards.
    pub fn set_active_level(&self, level: Level) {
        self.active_level.store(level.order(), Ordering::Relaxed);
    }

    pub fn active_level(&self) -> Level {
        Level::from_order(self.active_level.load(Ordering::Relaxed)).unwrap_or_default()
    }

    fn default_level(&self) -> Level {
        Level::from_order(self.default_level.load(Ordering::Relaxed)).unwrap_or_default()
    }

    pub fn enabled(&self, level: Level) -> bool {
        level.passes(self.active_level())
    }

    pub fn date(&self) -> String {
        self.date_format.now()
    }

    fn format(&self, sink: &Sink, level: Level, message: &str) -> String {
        let date = if level == Level::Raw {
            String::new()
        } else {
            self.date()
        };
        let colorize = self.color.load(Ordering::Relaxed) && sink.is_stdout();
        format_line(&date, level, message, colorize)
    }

    /// Writes `message` verbatim, without date or label.
    pub fn raw<M: Display>(&self, message: M) {
        self.log(Level::Raw, message);
    }

    /// Writes `<date> [<label>] <message>` if `level` passes the active level.
    pub fn log<M: Display>(&self, level: Level, message: M) {
        if !self.enabled(level) {
            return;
        }
        let message = message.to_string();
        let mut sink = self.lock_sink();
        let line = self.format(&sink, level, &message);
        sink.regular(&line).ok();
    }

    /// Writes the error as a log line followed by its source chain and a
    /// backtrace, all in one critical section.
    pub fn log_with_trace<E: Error + ?Sized>(&self, level: Level, error: &E) {
        if !self.enabled(level) {
            return;
        }
        let message = error.to_string();
        let mut causes = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }
        let backtrace = self
            .backtrace
            .load(Ordering::Relaxed)
            .then(Backtrace::force_capture);

        let mut sink = self.lock_sink();
        let mut block = self.format(&sink, level, &message);
        for cause in causes {
            block.push_str("\nCaused by: ");
            block.push_str(&cause);
        }
        if let Some(backtrace) = backtrace {
            for line in backtrace.to_string().lines() {
                block.push_str("\n\t");
                block.push_str(line.trim_start());
            }
        }
        sink.regular(&block).ok();
    }

    pub fn debug<M: Display>(&self, message: M) {
        self.log(Level::Debug, message);
    }

    pub fn info<M: Display>(&self, message: M) {
        self.log(Level::Information, message);
    }

    pub fn warn<M: Display>(&self, message: M) {
        self.log(Level::Warning, message);
    }

    pub fn error<M: Display>(&self, message: M) {
        self.log(Level::Error, message);
    }

    pub fn warn_with_trace<E: Error + ?Sized>(&self, error: &E) {
        self.log_with_trace(Level::Warning, error);
    }

    pub fn error_with_trace<E: Error + ?Sized>(&self, error: &E) {
        self.log_with_trace(Level::Error, error);
    }

    /// Describes the active sink without keeping it locked.
    pub fn sink(&self) -> SinkInfo {
        SinkInfo::of(&self.lock_sink())
    }

    pub fn flush(&self) -> Result<(), std::io::Error> {
        self.lock_sink().flush()
    }

    /// Flushes and closes the sink. Later log calls are discarded.
    pub fn close(&self) {
        let mut sink = self.lock_sink();
        sink.flush().ok();
        *sink = Sink::Closed;
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        Logger::enabled(self, metadata.level().into())
    }

    fn log(&self, record: &log::Record) {
        Logger::log(self, record.level().into(), record.args());
    }

    fn flush(&self) {
        Logger::flush(self).ok();
    }
}

#[cfg(test)]
mod tests {
    use std::fmt;

    use regex::Regex;

    use super::*;

    fn line_regex() -> Regex {
        Regex::new(
            r"^[A-Z][a-z]{2} \d{4}/[A-Z][a-z]{2}/\d{2} \d{2}:\d{2}:\d{2}:\d{3} \[(ERR|WRN|INF|DBG)\] ",
        )
        .unwrap()
    }

    fn read_lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(String::from)
            .collect()
    }

    #[derive(Debug)]
    struct Disconnected {
        source: std::io::Error,
    }

    impl fmt::Display for Disconnected {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "peer disconnected")
        }
    }

    impl Error for Disconnected {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.source)
        }
    }

    fn disconnected() -> Disconnected {
        Disconnected {
            source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "broken pipe"),
        }
    }

    #[test]
    fn test_init_writes_banner() {
        let dir = tempfile::tempdir().unwrap();
        let logger = Logger::new();
        let path = logger.init(dir.path().join("app")).unwrap();
        assert_eq!(path, dir.path().join("app.log"));
        assert_eq!(logger.sink().path(), Some(path.as_path()));
        let lines = read_lines(&path);
        assert_eq!(lines.len(), 1);
        let banner = Regex::new(r"^======= LOG CREATED on .+ =======$").unwrap();
        assert!(banner.is_match(&lines[0]));
    }

    #[test]
    fn test_level_filtering() {
        let dir = tempfile::tempdir().unwrap();
        let logger = Logger::new();
        let path = logger.init(dir.path().join("filter")).unwrap();
        for active in Level::ALL {
            logger.set_active_level(active);
            for level in Level::ALL {
                logger.log(level, format!("active={active} level={level}"));
            }
        }
        let content = std::fs::read_to_string(&path).unwrap();
        for active in Level::ALL {
            for level in Level::ALL {
                let message = format!("active={active} level={level}");
                assert_eq!(
                    content.contains(&message),
                    level.order() <= active.order(),
                    "{message}"
                );
            }
        }
    }

    #[test]
    fn test_default_level_is_information() {
        let dir = tempfile::tempdir().unwrap();
        let logger = Logger::new();
        let path = logger.init(dir.path().join("default")).unwrap();
        assert_eq!(logger.active_level(), Level::Information);
        logger.debug("hidden");
        logger.info("shown");
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("hidden"));
        assert!(content.contains("[INF] shown"));
    }

    #[test]
    fn test_set_active_level_is_not_retroactive() {
        let dir = tempfile::tempdir().unwrap();
        let logger = Logger::new();
        let path = logger.init(dir.path().join("switch")).unwrap();
        logger.set_active_level(Level::Debug);
        logger.debug("first");
        logger.set_active_level(Level::Error);
        logger.debug("second");
        logger.warn("third");
        logger.error("fourth");
        let lines = read_lines(&path);
        assert_eq!(lines.len(), 3);
        assert!(lines[1].ends_with("[DBG] first"));
        assert!(lines[2].ends_with("[ERR] fourth"));
    }

    #[test]
    fn test_failed_init_falls_back_to_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let logger = Logger::new();
        let err = logger
            .init(dir.path().join("missing").join("app"))
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
        assert!(logger.sink().is_stdout());
        logger.info("still logging to stdout");
        logger.flush().unwrap();
    }

    #[test]
    fn test_sink_info_does_not_hold_the_lock() {
        let dir = tempfile::tempdir().unwrap();
        let logger = std::sync::Arc::new(Logger::new());
        let path = logger.init(dir.path().join("sink_info")).unwrap();
        let (sender, receiver) = std::sync::mpsc::channel();
        let worker = {
            let logger = logger.clone();
            std::thread::spawn(move || {
                let sink = logger.sink();
                logger.info("while holding the sink info");
                Logger::flush(&logger).unwrap();
                sender.send(sink).unwrap();
            })
        };
        let sink = receiver
            .recv_timeout(std::time::Duration::from_secs(5))
            .expect("logging blocked while the sink info was held");
        worker.join().unwrap();
        assert_eq!(sink.kind(), SinkKind::File);
        assert_eq!(sink.path(), Some(path.as_path()));
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.ends_with("[INF] while holding the sink info\n"));
    }

    #[test]
    fn test_failed_init_releases_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let logger = Logger::new();
        let path = logger.init(dir.path().join("first")).unwrap();
        assert!(logger.init(dir.path().join("missing").join("app")).is_err());
        logger.info("after failure");
        assert!(logger.sink().is_stdout());
        assert!(!std::fs::read_to_string(&path).unwrap().contains("after failure"));
    }

    #[test]
    fn test_path_normalization() {
        let dir = tempfile::tempdir().unwrap();
        let logger = Logger::new();
        let a = logger.init(dir.path().join("foo")).unwrap();
        let b = logger.init(dir.path().join("foo.log")).unwrap();
        assert_eq!(a, b);
        let c = logger.init(dir.path().join("FOO.LOG")).unwrap();
        assert_eq!(c, dir.path().join("FOO.LOG"));
        assert!(!dir.path().join("FOO.LOG.log").exists());
    }

    #[test]
    fn test_init_truncates_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let logger = Logger::new();
        let path = logger.init(dir.path().join("rerun")).unwrap();
        logger.info("from the first run");
        logger.close();
        logger.init(&path).unwrap();
        logger.info("from the second run");
        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("======= LOG CREATED on "));
        assert!(lines[1].ends_with("[INF] from the second run"));
    }

    #[test]
    fn test_raw_lines_are_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let logger = Logger::new();
        let path = logger.init(dir.path().join("raw")).unwrap();
        logger.set_active_level(Level::Raw);
        logger.raw("exactly this");
        logger.log(Level::Raw, 42);
        logger.error("filtered out");
        let lines = read_lines(&path);
        assert_eq!(&lines[1..], ["exactly this", "42"]);
    }

    #[test]
    fn test_line_format() {
        let dir = tempfile::tempdir().unwrap();
        let logger = Logger::new();
        let path = logger.init(dir.path().join("format")).unwrap();
        logger.set_active_level(Level::Debug);
        logger.debug("d");
        logger.info("i");
        logger.warn("w");
        logger.error("e");
        logger.log(Level::Information, std::net::Ipv4Addr::LOCALHOST);
        let lines = read_lines(&path);
        let re = line_regex();
        let labels: Vec<&str> = lines[1..]
            .iter()
            .map(|line| {
                assert!(re.is_match(line), "{line}");
                re.captures(line).unwrap().get(1).unwrap().as_str()
            })
            .collect();
        assert_eq!(labels, ["DBG", "INF", "WRN", "ERR", "INF"]);
        assert!(lines[5].ends_with("[INF] 127.0.0.1"));
    }

    #[test]
    fn test_concurrent_lines_are_whole() {
        const THREADS: usize = 8;
        const MESSAGES: usize = 250;
        let dir = tempfile::tempdir().unwrap();
        let logger = Logger::new();
        let path = logger.init(dir.path().join("concurrent")).unwrap();
        std::thread::scope(|s| {
            for t in 0..THREADS {
                let logger = &logger;
                s.spawn(move || {
                    for m in 0..MESSAGES {
                        logger.warn(format!("thread {t} message {m} end"));
                    }
                });
            }
        });
        let lines = read_lines(&path);
        assert_eq!(lines.len(), 1 + THREADS * MESSAGES);
        let re = Regex::new(
            r"^[A-Z][a-z]{2} \d{4}/[A-Z][a-z]{2}/\d{2} \d{2}:\d{2}:\d{2}:\d{3} \[WRN\] thread \d+ message \d+ end$",
        )
        .unwrap();
        for line in &lines[1..] {
            assert!(re.is_match(line), "torn line: {line}");
        }
    }

    #[test]
    fn test_trace_follows_its_message() {
        let dir = tempfile::tempdir().unwrap();
        let logger = Logger::new();
        let path = logger.init(dir.path().join("trace")).unwrap();
        logger.error_with_trace(&disconnected());
        let lines = read_lines(&path);
        assert!(lines.len() >= 3);
        assert!(lines[1].ends_with("[ERR] peer disconnected"));
        assert_eq!(lines[2], "Caused by: broken pipe");
        assert!(lines[3..].iter().all(|l| l.starts_with('\t')));
    }

    #[test]
    fn test_trace_without_backtrace() {
        let dir = tempfile::tempdir().unwrap();
        let logger = ConfigBuilder::default().no_backtrace().build();
        let path = logger.init(dir.path().join("no_backtrace")).unwrap();
        logger.warn_with_trace(&disconnected());
        logger.set_active_level(Level::Error);
        logger.warn_with_trace(&disconnected());
        let lines = read_lines(&path);
        assert_eq!(lines.len(), 3);
        assert!(lines[1].ends_with("[WRN] peer disconnected"));
        assert_eq!(lines[2], "Caused by: broken pipe");
    }

    #[test]
    fn test_concurrent_traces_are_not_interleaved() {
        const THREADS: usize = 4;
        const MESSAGES: usize = 20;
        let dir = tempfile::tempdir().unwrap();
        let logger = Logger::new();
        let path = logger.init(dir.path().join("concurrent_trace")).unwrap();
        std::thread::scope(|s| {
            for t in 0..THREADS {
                let logger = &logger;
                s.spawn(move || {
                    for m in 0..MESSAGES {
                        if t % 2 == 0 {
                            logger.error_with_trace(&disconnected());
                        } else {
                            logger.info(format!("plain {t} {m}"));
                        }
                    }
                });
            }
        });
        let lines = read_lines(&path);
        let mut last_message = lines[0].as_str();
        let mut headers = 0;
        let mut causes = 0;
        for line in &lines[1..] {
            if line.starts_with('\t') || line.starts_with("Caused by: ") {
                assert!(
                    last_message.ends_with("[ERR] peer disconnected"),
                    "trace line after {last_message:?}"
                );
                causes += usize::from(line.starts_with("Caused by: "));
            } else {
                headers += usize::from(line.ends_with("[ERR] peer disconnected"));
                last_message = line.as_str();
            }
        }
        assert_eq!(headers, THREADS / 2 * MESSAGES);
        assert_eq!(causes, headers);
    }

    #[test]
    fn test_close_discards_later_lines() {
        let dir = tempfile::tempdir().unwrap();
        let logger = Logger::new();
        let path = logger.init(dir.path().join("closed")).unwrap();
        logger.info("before close");
        logger.close();
        assert!(logger.sink().is_closed());
        logger.info("after close");
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("before close"));
        assert!(!content.contains("after close"));
    }

    #[test]
    fn test_log_facade_records() {
        let dir = tempfile::tempdir().unwrap();
        let logger = Logger::new();
        let path = logger.init(dir.path().join("facade")).unwrap();
        let info = log::Metadata::builder().level(log::Level::Info).build();
        let trace = log::Metadata::builder().level(log::Level::Trace).build();
        assert!(Log::enabled(&logger, &info));
        assert!(!Log::enabled(&logger, &trace));
        Log::log(
            &logger,
            &log::Record::builder()
                .args(format_args!("via the facade {}", 7))
                .level(log::Level::Warn)
                .build(),
        );
        Log::flush(&logger);
        let lines = read_lines(&path);
        assert!(lines[1].ends_with("[WRN] via the facade 7"));
    }
}
