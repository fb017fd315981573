//! Log Sink
//!
//! Every `tracing` event is rendered as `<local timestamp> [<LEVEL>] <message>`,
//! printed to stdout and appended to `logs/app.log`. A second file,
//! `logs/stdout.log`, holds raw process output captured by whatever supervises
//! the process; it is only ever read here.
//!
//! Reads are always bounded: [`read_tail`] returns the last N lines of a file.

use std::collections::VecDeque;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{DateTime, Local};
use tracing::{Event, Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

pub const APP_LOG_FILE: &str = "app.log";
pub const STDOUT_LOG_FILE: &str = "stdout.log";

/// Lines returned by [`read_tail`] when the caller does not ask otherwise.
pub const DEFAULT_TAIL_LINES: usize = 200;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Locations of the two log files.
#[derive(Debug, Clone)]
pub struct LogPaths {
    pub app_log: PathBuf,
    pub stdout_log: PathBuf,
}

impl LogPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            app_log: dir.join(APP_LOG_FILE),
            stdout_log: dir.join(STDOUT_LOG_FILE),
        }
    }
}

/// Render one log line.
pub fn format_line(timestamp: DateTime<Local>, level: Level, message: &str) -> String {
    format!("{} [{level}] {message}", timestamp.format(TIMESTAMP_FORMAT))
}

/// `FormatEvent` producing the same shape as [`format_line`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut message = String::new();
        ctx.field_format()
            .format_fields(Writer::new(&mut message), event)?;
        writeln!(
            writer,
            "{}",
            format_line(Local::now(), *event.metadata().level(), &message)
        )
    }
}

fn build_filter(config: &LoggingConfig) -> EnvFilter {
    let directives = format!(
        "{level},hyper={fw},hyper_util={fw},axum={fw},tower_http={fw},rustls={fw}",
        level = config.level,
        fw = config.framework_level,
    );
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&directives))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber writing to stdout and `<log_dir>/app.log`.
///
/// If the log directory or file cannot be opened, logging continues on stdout
/// only. Calling this more than once keeps the first subscriber.
pub fn init(log_dir: &Path, config: &LoggingConfig) {
    let stdout_layer = tracing_subscriber::fmt::layer()
        .event_format(LineFormat)
        .with_ansi(false)
        .with_writer(io::stdout);

    let file_layer = match open_app_log(log_dir) {
        Ok(appender) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .event_format(LineFormat)
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
        }
        Err(e) => {
            eprintln!(
                "WARNING: cannot open {}: {e}",
                log_dir.join(APP_LOG_FILE).display()
            );
            None
        }
    };

    let _ = tracing_subscriber::registry()
        .with(build_filter(config))
        .with(stdout_layer)
        .with(file_layer)
        .try_init();
}

fn open_app_log(log_dir: &Path) -> Result<RollingFileAppender, Box<dyn std::error::Error>> {
    std::fs::create_dir_all(log_dir)?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(APP_LOG_FILE)
        .build(log_dir)?;
    Ok(appender)
}

/// Return up to the last `max_lines` lines of `path`, oldest first.
///
/// A missing or unreadable file yields no lines. Invalid UTF-8 is replaced
/// rather than rejected, and trailing whitespace is stripped from every line.
pub fn read_tail(path: &Path, max_lines: usize) -> Vec<String> {
    match try_read_tail(path, max_lines) {
        Ok(lines) => lines,
        Err(e) => {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::debug!(path = %path.display(), error = %e, "tail_read_failed");
            }
            Vec::new()
        }
    }
}

fn try_read_tail(path: &Path, max_lines: usize) -> io::Result<Vec<String>> {
    if max_lines == 0 {
        return Ok(Vec::new());
    }

    let mut reader = BufReader::new(File::open(path)?);
    let mut window: VecDeque<String> = VecDeque::with_capacity(max_lines.min(4096));
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        if window.len() == max_lines {
            window.pop_front();
        }
        window.push_back(String::from_utf8_lossy(&buf).trim_end().to_string());
    }

    Ok(window.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::TempDir;

    fn write_lines(path: &Path, count: usize) {
        let body: String = (1..=count).map(|i| format!("line {i}\n")).collect();
        fs::write(path, body).unwrap();
    }

    #[test]
    fn test_format_line() {
        let ts = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(
            format_line(ts, Level::WARN, "port busy"),
            "2024-03-09 07:05:01 [WARN] port busy"
        );
        assert_eq!(
            format_line(ts, Level::INFO, "ready"),
            "2024-03-09 07:05:01 [INFO] ready"
        );
    }

    #[test]
    fn test_read_tail_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(read_tail(&dir.path().join("nope.log"), 10).is_empty());
    }

    #[test]
    fn test_read_tail_short_file_returns_everything_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        write_lines(&path, 3);

        assert_eq!(read_tail(&path, 10), vec!["line 1", "line 2", "line 3"]);
    }

    #[test]
    fn test_read_tail_keeps_last_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        write_lines(&path, 500);

        let tail = read_tail(&path, 200);
        assert_eq!(tail.len(), 200);
        assert_eq!(tail.first().map(String::as_str), Some("line 301"));
        assert_eq!(tail.last().map(String::as_str), Some("line 500"));
    }

    #[test]
    fn test_read_tail_exact_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        write_lines(&path, 10);

        let tail = read_tail(&path, 10);
        assert_eq!(tail.len(), 10);
        assert_eq!(tail[0], "line 1");
    }

    #[test]
    fn test_read_tail_without_trailing_newline() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stdout.log");
        fs::write(&path, "first\r\nsecond   \nthird").unwrap();

        assert_eq!(read_tail(&path, 5), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_read_tail_invalid_utf8_is_replaced() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stdout.log");
        fs::write(&path, b"ok\nbad \xff byte\n").unwrap();

        let tail = read_tail(&path, 5);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[1], "bad \u{fffd} byte");
    }

    #[test]
    fn test_read_tail_zero_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        write_lines(&path, 3);
        assert!(read_tail(&path, 0).is_empty());
    }

    #[test]
    fn test_log_paths() {
        let paths = LogPaths::in_dir(Path::new("/srv/logs"));
        assert_eq!(paths.app_log, PathBuf::from("/srv/logs/app.log"));
        assert_eq!(paths.stdout_log, PathBuf::from("/srv/logs/stdout.log"));
    }
}
