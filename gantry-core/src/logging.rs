//! Logging setup for the Gantry pipeline
//!
//! Structured logging on top of `tracing`, defaulting to JSON output on
//! STDOUT. The dispatcher and the built-in stages emit `debug!`/`trace!`
//! events through the macros re-exported here.
//!
//! # Examples
//!
//! ```no_run
//! use gantry_core::logging::*;
//!
//! #[tokio::main]
//! async fn main() {
//!     // Initialize with default JSON logging to STDOUT
//!     let _guard = LogConfig::default().init();
//!
//!     info!("Pipeline configured");
//! }
//! ```

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

// Re-export tracing for stage implementations
pub use tracing::{debug, error, info, trace, warn};

/// Log level for filtering messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Convert to string for EnvFilter
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Output format for log events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Structured JSON, one event per line
    Json,
    /// Human-readable multi-line output
    Pretty,
    /// Single-line condensed output
    Compact,
}

/// Where log events are written
#[derive(Debug, Clone)]
pub enum LogOutput {
    Stdout,
    Stderr,
    /// Daily-rotated file under `directory` with the given `prefix`
    RollingFile {
        directory: String,
        prefix: String,
    },
}

/// Logging configuration builder.
#[derive(Debug, Clone)]
pub struct LogConfig {
    level: LogLevel,
    format: LogFormat,
    output: LogOutput,
    with_targets: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Json,
            output: LogOutput::Stdout,
            with_targets: true,
        }
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    pub fn with_targets(mut self, enabled: bool) -> Self {
        self.with_targets = enabled;
        self
    }

    /// Install the global subscriber.
    ///
    /// The returned guard must be held for the lifetime of the program;
    /// dropping it stops the non-blocking writer. `RUST_LOG` overrides the
    /// configured level.
    pub fn init(self) -> WorkerGuard {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level.as_str()));

        let (writer, guard) = match &self.output {
            LogOutput::Stdout => tracing_appender::non_blocking(std::io::stdout()),
            LogOutput::Stderr => tracing_appender::non_blocking(std::io::stderr()),
            LogOutput::RollingFile { directory, prefix } => {
                tracing_appender::non_blocking(tracing_appender::rolling::daily(
                    directory, prefix,
                ))
            }
        };

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_target(self.with_targets);

        // A second init keeps the already-installed subscriber
        let _ = match self.format {
            LogFormat::Json => builder.json().try_init(),
            LogFormat::Pretty => builder.pretty().try_init(),
            LogFormat::Compact => builder.compact().try_init(),
        };

        guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_names() {
        assert_eq!(LogLevel::Trace.as_str(), "trace");
        assert_eq!(LogLevel::Error.as_str(), "error");
    }

    #[test]
    fn test_config_builder() {
        let config = LogConfig::new()
            .level(LogLevel::Debug)
            .format(LogFormat::Compact)
            .with_targets(false);

        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.format, LogFormat::Compact);
        assert!(!config.with_targets);
    }

    #[test]
    fn test_init_is_idempotent() {
        let _first = LogConfig::new().format(LogFormat::Compact).init();
        // The second install is a no-op rather than a panic
        let _second = LogConfig::new().init();
    }
}
