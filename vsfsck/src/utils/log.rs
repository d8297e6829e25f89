use colored::Colorize;
use log::{Level, LevelFilter, Log, Metadata, Record};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Quiet,
    Normal,
    Verbose,
}

impl LogLevel {
    /// Reads a `RUST_LOG`-style level name. Unset or unknown means `Normal`.
    pub fn from_env(value: Option<&str>) -> (Self, LevelFilter) {
        let filter = value
            .and_then(|v| v.trim().parse::<LevelFilter>().ok())
            .unwrap_or(LevelFilter::Warn);
        let level = match filter {
            LevelFilter::Off | LevelFilter::Error => LogLevel::Quiet,
            LevelFilter::Warn | LevelFilter::Info => LogLevel::Normal,
            LevelFilter::Debug | LevelFilter::Trace => LogLevel::Verbose,
        };
        (level, filter)
    }
}

/// Prints `log` records to stderr with the `[vsfsck]` prefix.
struct CliLogger;

static LOGGER: CliLogger = CliLogger;

impl Log for CliLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let tag = match record.level() {
            Level::Error => "error".red().bold(),
            Level::Warn => "warn".yellow().bold(),
            Level::Info => "info".normal(),
            Level::Debug => "debug".dimmed(),
            Level::Trace => "trace".dimmed(),
        };
        eprintln!("[vsfsck] {tag}: {}", record.args());
    }

    fn flush(&self) {}
}

/// Installs the logger with the level named by `RUST_LOG`.
pub fn init_logger(env: Option<&str>) -> LogLevel {
    let (level, filter) = LogLevel::from_env(env);
    // Already installed when called twice in one process; keep the first one
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(filter);
    level
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_to_level() {
        assert_eq!(LogLevel::from_env(None), (LogLevel::Normal, LevelFilter::Warn));
        assert_eq!(LogLevel::from_env(Some("bogus")).0, LogLevel::Normal);
        assert_eq!(LogLevel::from_env(Some("off")).0, LogLevel::Quiet);
        assert_eq!(LogLevel::from_env(Some("debug")).0, LogLevel::Verbose);
        assert_eq!(
            LogLevel::from_env(Some("TRACE")),
            (LogLevel::Verbose, LevelFilter::Trace)
        );
    }
}
