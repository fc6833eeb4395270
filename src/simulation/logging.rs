//! Logging and tracing setup
//!
//! Console output goes to stderr so that reports printed on stdout stay clean. File
//! output, when enabled, is JSON and rolls over daily.

use std::io;
use tracing::{debug, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

/// Error returned when the subscriber cannot be installed
pub type LoggingError = Box<dyn std::error::Error + Send + Sync>;

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Maximum level for this crate's events
    pub level: Level,
    /// JSON console output instead of the pretty format
    pub json_format: bool,
    /// Whether to also log to a daily rolling file
    pub log_to_file: bool,
    /// Log file directory (defaults to `logs`)
    pub log_directory: Option<String>,
    /// Log file name prefix
    pub log_file_prefix: String,
    /// Emit span open/close events
    pub enable_span_events: bool,
    /// ANSI colors on the console
    pub enable_ansi: bool,
    /// Explicit filter directive, overriding `RUST_LOG` and `level`
    pub env_filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            json_format: false,
            log_to_file: false,
            log_directory: None,
            log_file_prefix: "storefront-datagen".to_string(),
            enable_span_events: false,
            enable_ansi: true,
            env_filter: None,
        }
    }
}

impl LoggingConfig {
    /// Create the default configuration (WARN level, pretty console output)
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration matching the `--verbose` / `--debug` command line flags
    pub fn from_flags(verbose: bool, debug: bool) -> Self {
        match (verbose, debug) {
            (_, true) => Self::new().with_level(Level::DEBUG).with_span_events(),
            (true, false) => Self::new().with_level(Level::INFO),
            (false, false) => Self::new(),
        }
    }

    /// Set the log level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Enable JSON formatting
    pub fn with_json_format(mut self) -> Self {
        self.json_format = true;
        self
    }

    /// Enable file logging
    pub fn with_file_logging(mut self, directory: impl Into<String>) -> Self {
        self.log_to_file = true;
        self.log_directory = Some(directory.into());
        self
    }

    /// Set log file prefix
    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.log_file_prefix = prefix.into();
        self
    }

    /// Enable span events
    pub fn with_span_events(mut self) -> Self {
        self.enable_span_events = true;
        self
    }

    /// Disable ANSI colors
    pub fn without_ansi(mut self) -> Self {
        self.enable_ansi = false;
        self
    }

    /// Set custom environment filter
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Build the filter: explicit directive, then `RUST_LOG`, then the crate at `level`
    pub fn build_filter(&self) -> Result<EnvFilter, LoggingError> {
        if let Some(filter) = &self.env_filter {
            return Ok(EnvFilter::try_new(filter)?);
        }
        Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME").replace('-', "_"), self.level))
        }))
    }

    fn span_events(&self) -> FmtSpan {
        if self.enable_span_events {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }

    /// Install the global tracing subscriber
    pub fn init(self) -> Result<(), LoggingError> {
        let registry = Registry::default().with(self.build_filter()?);

        let file_layer = if self.log_to_file {
            let log_dir = self.log_directory.as_deref().unwrap_or("logs");
            let (writer, guard) = non_blocking(rolling::daily(log_dir, &self.log_file_prefix));
            // The writer flushes on drop of its guard, which must live as long as the process.
            std::mem::forget(guard);
            Some(fmt::layer().json().with_writer(writer).with_span_events(self.span_events()))
        } else {
            None
        };

        if self.json_format {
            let console = fmt::layer()
                .json()
                .with_writer(io::stderr)
                .with_span_events(self.span_events());
            registry.with(file_layer).with(console).try_init()?;
        } else {
            let console = fmt::layer()
                .pretty()
                .with_writer(io::stderr)
                .with_ansi(self.enable_ansi)
                .with_span_events(self.span_events());
            registry.with(file_layer).with(console).try_init()?;
        }

        debug!("Logging initialized at {}", self.level);
        Ok(())
    }

    /// Initialize logging for tests (WARN, no colors); repeated calls are harmless
    pub fn init_test() {
        let _ = Self::new().without_ansi().init();
    }
}
