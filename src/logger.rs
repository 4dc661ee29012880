//! Console logger
//!
//! Minimal `log::Log` implementation: timestamp, colored level tag, target.
use colored::Colorize;
use log::{Level, LevelFilter, Metadata, Record};

struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let level = match record.level() {
            Level::Error => "ERROR".red().bold(),
            Level::Warn => "WARN ".yellow(),
            Level::Info => "INFO ".green(),
            Level::Debug => "DEBUG".cyan(),
            Level::Trace => "TRACE".dimmed(),
        };

        println!(
            "{} {} [{}] {}",
            chrono::Utc::now().format("%H:%M:%S%.3f"),
            level,
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {}
}

/// Install the console logger. Safe to call once at startup; later calls
/// are ignored (the `log` crate rejects a second logger).
pub fn init(level: LevelFilter) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

pub fn level_from_str(raw: &str) -> LevelFilter {
    match raw.to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}
