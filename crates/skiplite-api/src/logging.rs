//! Logging configuration for SkipLite
//!
//! The library only emits `tracing` events. Applications that want them on
//! stdout or in a rolling file can install a subscriber through [`LogConfig`].
//! `RUST_LOG` takes precedence over the configured level.

use skiplite_core::{Error, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// File name used when a log path has none
const DEFAULT_LOG_FILE: &str = "skiplite.log";

/// Log output destination
#[derive(Debug, Clone)]
pub enum LogOutput {
    /// Output to stdout
    Stdout,
    /// Output to a daily rolling file
    File(PathBuf),
    /// Output to both stdout and file
    Both(PathBuf),
}

/// Log format style
#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    /// Multi-line human-readable format
    Pretty,
    /// Compact single-line format
    Compact,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level filter
    pub level: String,
    /// Output destination
    pub output: LogOutput,
    /// Format style
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            output: LogOutput::Stdout,
            format: LogFormat::Compact,
        }
    }
}

impl LogConfig {
    /// Info level on stdout
    pub fn info() -> Self {
        Self::default()
    }

    /// Debug level, which includes every insert and delete
    pub fn debug() -> Self {
        Self::default().with_level("debug")
    }

    /// Trace level, which also shows which tier answered each read
    pub fn trace() -> Self {
        Self::default().with_level("trace")
    }

    /// Write to a rolling file instead of stdout
    pub fn with_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output = LogOutput::File(path.into());
        self
    }

    /// Write to stdout and a rolling file
    pub fn with_both<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output = LogOutput::Both(path.into());
        self
    }

    /// Set log format
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set log level filter
    pub fn with_level<S: Into<String>>(mut self, level: S) -> Self {
        self.level = level.into();
        self
    }

    fn filter(&self) -> Result<EnvFilter> {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .map_err(|e| Error::InvalidConfig(format!("log level '{}': {}", self.level, e)))
    }

    /// Installs the global subscriber.
    ///
    /// The returned guard flushes the file writer when dropped, so keep it
    /// alive for as long as the application logs. Fails if the level does not
    /// parse or a global subscriber is already installed.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use skiplite::logging::LogConfig;
    ///
    /// let _guard = LogConfig::debug().with_file("logs/skiplite.log").init()?;
    /// # Ok::<(), skiplite::Error>(())
    /// ```
    pub fn init(self) -> Result<Option<WorkerGuard>> {
        let env_filter = self.filter()?;
        let registry = tracing_subscriber::registry().with(env_filter);

        let installed = match self.output {
            LogOutput::Stdout => match self.format {
                LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
                LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
            },
            LogOutput::File(path) => {
                let (writer, guard) = file_writer(&path);
                let result = match self.format {
                    LogFormat::Pretty => registry
                        .with(fmt::layer().with_writer(writer).with_ansi(false).pretty())
                        .try_init(),
                    LogFormat::Compact => registry
                        .with(fmt::layer().with_writer(writer).with_ansi(false).compact())
                        .try_init(),
                };
                return result
                    .map(|_| Some(guard))
                    .map_err(|e| Error::InvalidOperation(e.to_string()));
            }
            LogOutput::Both(path) => {
                let (writer, guard) = file_writer(&path);
                let result = registry
                    .with(fmt::layer().compact())
                    .with(fmt::layer().with_writer(writer).with_ansi(false).compact())
                    .try_init();
                return result
                    .map(|_| Some(guard))
                    .map_err(|e| Error::InvalidOperation(e.to_string()));
            }
        };
        installed
            .map(|_| None)
            .map_err(|e| Error::InvalidOperation(e.to_string()))
    }
}

fn file_writer(path: &Path) -> (NonBlocking, WorkerGuard) {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(DEFAULT_LOG_FILE);
    tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_defaults() {
        let config = LogConfig::default();
        assert_eq!(config.level, "info");
        assert!(matches!(config.output, LogOutput::Stdout));
    }

    #[test]
    fn test_log_config_builders() {
        let config = LogConfig::debug()
            .with_file("/tmp/skiplite.log")
            .with_format(LogFormat::Pretty);
        assert_eq!(config.level, "debug");
        assert!(matches!(config.output, LogOutput::File(_)));
        assert!(matches!(config.format, LogFormat::Pretty));

        let both = LogConfig::trace().with_both("skiplite.log");
        assert_eq!(both.level, "trace");
        assert!(matches!(both.output, LogOutput::Both(_)));
    }

    #[test]
    fn test_bad_level_is_invalid_config() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let result = LogConfig::default().with_level("skiplite=verbose").init();
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }
}
