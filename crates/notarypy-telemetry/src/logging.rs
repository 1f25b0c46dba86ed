//! Logging configuration and subscriber setup.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::error::{TelemetryError, TelemetryResult};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Log format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable multi-line format.
    Pretty,
    /// Compact single-line format (default).
    #[default]
    Compact,
    /// JSON lines, for log shippers on hosted platforms.
    Json,
    /// Full single-line format with all fields.
    Full,
}

/// Log output target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    /// Log to stdout.
    Stdout,
    /// Log to stderr.
    #[default]
    Stderr,
    /// Log to daily-rotated files in a directory.
    File(PathBuf),
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level filter (e.g. "info", "debug").
    #[serde(default = "default_level")]
    pub level: String,
    /// Log format.
    #[serde(default)]
    pub format: LogFormat,
    /// Log target.
    #[serde(default)]
    pub target: LogTarget,
    /// File name prefix when logging to files.
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
    /// Whether to include timestamps.
    #[serde(default = "default_true")]
    pub timestamps: bool,
    /// Whether to include file/line info.
    #[serde(default)]
    pub file_info: bool,
    /// Whether to use ANSI colors. Ignored for JSON and file output.
    #[serde(default = "default_true")]
    pub ansi: bool,
    /// Directive overrides (e.g. `notarypy_core=debug`).
    #[serde(default)]
    pub directives: Vec<String>,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_file_prefix() -> String {
    "notarypy".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            target: LogTarget::default(),
            file_prefix: default_file_prefix(),
            timestamps: true,
            file_info: false,
            ansi: true,
            directives: Vec::new(),
        }
    }
}

impl LogConfig {
    /// Create a new log config with the specified level.
    #[must_use]
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            ..Default::default()
        }
    }

    /// Set the log format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the log target.
    #[must_use]
    pub fn with_target(mut self, target: LogTarget) -> Self {
        self.target = target;
        self
    }

    /// Add a directive override.
    #[must_use]
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// Disable timestamps.
    #[must_use]
    pub fn without_timestamps(mut self) -> Self {
        self.timestamps = false;
        self
    }

    /// Enable file/line info.
    #[must_use]
    pub fn with_file_info(mut self) -> Self {
        self.file_info = true;
        self
    }

    /// Disable ANSI colors.
    #[must_use]
    pub fn without_ansi(mut self) -> Self {
        self.ansi = false;
        self
    }

    /// Build the env filter from config.
    fn build_filter(&self) -> TelemetryResult<EnvFilter> {
        let mut filter = EnvFilter::try_new(&self.level)
            .map_err(|e| TelemetryError::ConfigError(e.to_string()))?;

        for directive in &self.directives {
            filter = filter.add_directive(directive.parse().map_err(
                |e: tracing_subscriber::filter::ParseError| {
                    TelemetryError::ConfigError(e.to_string())
                },
            )?);
        }

        Ok(filter)
    }

    fn use_ansi(&self) -> bool {
        self.ansi && self.format != LogFormat::Json && !matches!(self.target, LogTarget::File(_))
    }

    fn build_writer(&self) -> TelemetryResult<BoxMakeWriter> {
        Ok(match &self.target {
            LogTarget::Stdout => BoxMakeWriter::new(std::io::stdout),
            LogTarget::Stderr => BoxMakeWriter::new(std::io::stderr),
            LogTarget::File(dir) => {
                std::fs::create_dir_all(dir).map_err(|e| {
                    TelemetryError::ConfigError(format!("failed to create log directory: {e}"))
                })?;
                BoxMakeWriter::new(RollingFileAppender::new(
                    Rotation::DAILY,
                    dir,
                    &self.file_prefix,
                ))
            },
        })
    }

    fn build_layer(&self) -> TelemetryResult<BoxedLayer> {
        let layer = fmt::layer()
            .with_writer(self.build_writer()?)
            .with_ansi(self.use_ansi())
            .with_file(self.file_info)
            .with_line_number(self.file_info);

        Ok(match (self.format, self.timestamps) {
            (LogFormat::Json, true) => layer.json().boxed(),
            (LogFormat::Json, false) => layer.json().without_time().boxed(),
            (LogFormat::Pretty, true) => layer.pretty().boxed(),
            (LogFormat::Pretty, false) => layer.pretty().without_time().boxed(),
            (LogFormat::Compact, true) => layer.compact().boxed(),
            (LogFormat::Compact, false) => layer.compact().without_time().boxed(),
            (LogFormat::Full, true) => layer.boxed(),
            (LogFormat::Full, false) => layer.without_time().boxed(),
        })
    }
}

/// Set up logging with the given configuration.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or a global subscriber
/// is already installed.
pub fn setup_logging(config: &LogConfig) -> TelemetryResult<()> {
    let filter = config.build_filter()?;
    let layer = config.build_layer()?;

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
        .map_err(|e| TelemetryError::InitError(e.to_string()))
}
