use anyhow::{Context, Result};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_appender::rolling::{RollingFileAppender, Rotation};

/// Log file name inside `<data_dir>/logs`
pub const LOG_FILE: &str = "smartclip.log";

/// How long a notification stays in the status line
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(4);

/// User-facing notification shown in the status line
#[derive(Debug, Clone)]
pub struct Notification {
    pub level: Level,
    pub message: String,
    pub timestamp: Instant,
}

impl Notification {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Notification {
            level,
            message: message.into(),
            timestamp: Instant::now(),
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.timestamp) >= NOTIFICATION_TTL
    }
}

/// Writes every record to the rolling log file and forwards the serious ones
/// to the notification channel
struct SmartclipLogger {
    file_writer: Arc<Mutex<RollingFileAppender>>,
    notify_tx: Option<Arc<Mutex<Sender<Notification>>>>,
    file_level: LevelFilter,
    notify_level: LevelFilter,
}

impl Log for SmartclipLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.file_level || metadata.level() <= self.notify_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let message = format!("{}", record.args());
        let level = record.level();
        let timestamp = chrono::Local::now();

        if level <= self.file_level {
            if let Ok(mut writer) = self.file_writer.lock() {
                let _ = writeln!(
                    writer,
                    "{} [{}] {}: {}",
                    timestamp.format("%Y-%m-%d %H:%M:%S"),
                    level,
                    record.target(),
                    message
                );
            }
        }

        if level <= self.notify_level {
            if let Some(tx) = &self.notify_tx {
                if let Ok(tx) = tx.lock() {
                    let _ = tx.send(Notification::new(level, message));
                }
            }
        }
    }

    fn flush(&self) {
        if let Ok(mut writer) = self.file_writer.lock() {
            let _ = writer.flush();
        }
    }
}

/// Parse log level string to LevelFilter, falling back to info
pub fn parse_level(level_str: &str) -> LevelFilter {
    match level_str.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Install the global logger
///
/// Log lines go to `<log_dir>/smartclip.<date>.log`, rotated daily with the
/// last three files kept. Records at or above `notify_level` are also sent
/// to `notify_tx` for display.
pub fn init_logger(
    log_dir: &Path,
    notify_tx: Option<Sender<Notification>>,
    file_level: &str,
    notify_level: &str,
) -> Result<()> {
    fs::create_dir_all(log_dir).context("Failed to create log directory")?;

    let log_file = Path::new(LOG_FILE);
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(3)
        .filename_prefix(
            log_file
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("smartclip"),
        )
        .filename_suffix(
            log_file
                .extension()
                .and_then(|s| s.to_str())
                .unwrap_or("log"),
        )
        .build(log_dir)
        .context("Failed to create rotating file appender")?;

    let file_level = parse_level(file_level);
    let notify_level = parse_level(notify_level);

    let logger = SmartclipLogger {
        file_writer: Arc::new(Mutex::new(file_appender)),
        notify_tx: notify_tx.map(|tx| Arc::new(Mutex::new(tx))),
        file_level,
        notify_level,
    };

    let max_level = file_level.max(notify_level);
    log::set_boxed_logger(Box::new(logger)).context("Failed to set global logger")?;
    log::set_max_level(max_level);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("WARN"), LevelFilter::Warn);
        assert_eq!(parse_level("debug"), LevelFilter::Debug);
        assert_eq!(parse_level("off"), LevelFilter::Off);
        assert_eq!(parse_level("verbose"), LevelFilter::Info);
    }

    #[test]
    fn test_notification_expiry() {
        let n = Notification::new(Level::Warn, "disk full");
        assert!(!n.is_expired(n.timestamp));
        assert!(n.is_expired(n.timestamp + NOTIFICATION_TTL));
    }
}
