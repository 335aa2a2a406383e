///! Logging setup
///!
///! Console output goes to stderr so command output on stdout stays parseable.
///! A JSON file layer is added when a log directory is configured.

use std::io;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_PATH_ENV: &str = "PLANTD_LOG_PATH";

/// Log rotation policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogRotation {
    Hourly,
    Daily,
    Never,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: Option<PathBuf>,
    pub rotation: LogRotation,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            directory: None,
            rotation: LogRotation::Daily,
        }
    }
}

impl LoggingConfig {
    /// `--log-level` wins over the default; `PLANTD_LOG_PATH` over the configured directory
    pub fn resolve(level: Option<&str>, configured_dir: Option<PathBuf>) -> Self {
        let directory = std::env::var_os(LOG_PATH_ENV)
            .map(PathBuf::from)
            .or(configured_dir);
        Self {
            level: level.unwrap_or("warn").to_string(),
            directory,
            ..Default::default()
        }
    }

    /// `RUST_LOG` overrides the configured level
    pub fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level))
    }

    /// Installs the global subscriber. Keep the guard alive until exit so file logs are flushed.
    pub fn init(&self) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error + Send + Sync>> {
        let console_layer = fmt::layer()
            .with_target(false)
            .with_ansi(true)
            .with_writer(io::stderr);

        let Some(ref directory) = self.directory else {
            tracing_subscriber::registry()
                .with(self.filter())
                .with(console_layer)
                .try_init()?;
            return Ok(None);
        };

        let file_appender = match self.rotation {
            LogRotation::Hourly => rolling::hourly(directory, "plantd.log"),
            LogRotation::Daily => rolling::daily(directory, "plantd.log"),
            LogRotation::Never => rolling::never(directory, "plantd.log"),
        };
        let (writer, guard) = non_blocking(file_appender);
        let file_layer = fmt::layer()
            .with_target(true)
            .with_ansi(false)
            .json()
            .with_writer(writer);

        tracing_subscriber::registry()
            .with(self.filter())
            .with(console_layer)
            .with(file_layer)
            .try_init()?;

        tracing::debug!(directory = %directory.display(), "file logging enabled");
        Ok(Some(guard))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_level_is_used() {
        let config = LoggingConfig::resolve(Some("debug"), None);
        assert_eq!(config.level, "debug");
        assert_eq!(config.rotation, LogRotation::Daily);
        assert_eq!(LoggingConfig::resolve(None, None).level, "warn");
    }
}
