//! Tracing subscriber setup
//!
//! The library itself only emits `tracing` events. These helpers install a
//! subscriber for applications and tests that do not bring their own.
//!
//! ## Example
//!
//! ```rust,ignore
//! use siumai_object::telemetry::{init_subscriber, OutputFormat, SubscriberConfig};
//!
//! let config = SubscriberConfig::builder()
//!     .log_level(tracing::Level::DEBUG)
//!     .output_format(OutputFormat::Json)
//!     .build();
//! let _guard = init_subscriber(config)?;
//! ```

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::error::LlmError;

/// Output format for tracing logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// One JSON document per event
    Json,
    /// JSON with event fields flattened into the top level
    JsonCompact,
}

/// Configuration for the tracing subscriber
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    pub log_level: tracing::Level,
    pub output_format: OutputFormat,
    /// Write to stdout.
    pub enable_console: bool,
    /// Also write to this file.
    pub log_file: Option<PathBuf>,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            log_level: tracing::Level::INFO,
            output_format: OutputFormat::Text,
            enable_console: true,
            log_file: None,
        }
    }
}

impl SubscriberConfig {
    pub fn builder() -> SubscriberConfigBuilder {
        SubscriberConfigBuilder::default()
    }

    /// Debug level, text output.
    pub fn debug() -> Self {
        Self {
            log_level: tracing::Level::DEBUG,
            ..Self::default()
        }
    }
}

/// Builder for [`SubscriberConfig`]
#[derive(Debug, Default)]
pub struct SubscriberConfigBuilder {
    log_level: Option<tracing::Level>,
    output_format: Option<OutputFormat>,
    enable_console: Option<bool>,
    log_file: Option<PathBuf>,
}

impl SubscriberConfigBuilder {
    pub fn log_level(mut self, level: tracing::Level) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Set the log level from `trace`, `debug`, `info`, `warn` or `error`.
    pub fn log_level_str(mut self, level: &str) -> Result<Self, LlmError> {
        let level = match level.to_lowercase().as_str() {
            "trace" => tracing::Level::TRACE,
            "debug" => tracing::Level::DEBUG,
            "info" => tracing::Level::INFO,
            "warn" => tracing::Level::WARN,
            "error" => tracing::Level::ERROR,
            _ => {
                return Err(LlmError::InvalidParameter(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    level
                )));
            }
        };
        self.log_level = Some(level);
        Ok(self)
    }

    /// Set the output format from `text`, `json` or `json-compact`.
    pub fn output_format_str(self, format: &str) -> Result<Self, LlmError> {
        let output_format = match format.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "json-compact" => OutputFormat::JsonCompact,
            "text" => OutputFormat::Text,
            _ => {
                return Err(LlmError::InvalidParameter(format!(
                    "Invalid log format: {}. Valid options: text, json, json-compact",
                    format
                )));
            }
        };
        Ok(self.output_format(output_format))
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn enable_console(mut self, enable: bool) -> Self {
        self.enable_console = Some(enable);
        self
    }

    pub fn log_file(mut self, path: PathBuf) -> Self {
        self.log_file = Some(path);
        self
    }

    pub fn build(self) -> SubscriberConfig {
        SubscriberConfig {
            log_level: self.log_level.unwrap_or(tracing::Level::INFO),
            output_format: self.output_format.unwrap_or_default(),
            enable_console: self.enable_console.unwrap_or(true),
            log_file: self.log_file,
        }
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn fmt_layer<W>(format: OutputFormat, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_ansi(ansi);
    match format {
        OutputFormat::Json => layer
            .json()
            .with_thread_ids(true)
            .with_thread_names(true)
            .boxed(),
        OutputFormat::JsonCompact => layer.json().flatten_event(true).boxed(),
        OutputFormat::Text => layer.boxed(),
    }
}

fn file_writer(
    path: &Path,
) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard), LlmError> {
    let file_name = path.file_name().ok_or_else(|| {
        LlmError::InvalidParameter(format!("log file path has no file name: {}", path.display()))
    })?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let appender = tracing_appender::rolling::never(dir, file_name);
    Ok(tracing_appender::non_blocking(appender))
}

/// Install a global subscriber.
///
/// Returns the file writer's guard when `log_file` is set; keep it alive for
/// as long as events should be flushed to the file. Calling this when a
/// global subscriber already exists is not an error.
pub fn init_subscriber(config: SubscriberConfig) -> Result<Option<WorkerGuard>, LlmError> {
    let level = config.log_level.to_string().to_lowercase();
    let filter = EnvFilter::new(format!("siumai_object={level}"));

    let mut layers: Vec<BoxedLayer> = Vec::new();
    if config.enable_console {
        layers.push(fmt_layer(config.output_format, std::io::stdout, true));
    }

    let guard = match &config.log_file {
        Some(path) => {
            let (writer, guard) = file_writer(path)?;
            layers.push(fmt_layer(config.output_format, writer, false));
            Some(guard)
        }
        None => None,
    };

    match tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
    {
        Ok(()) => Ok(guard),
        // Another subscriber (an application's or a test harness's) is already installed.
        Err(e) if e.to_string().contains("already") => Ok(guard),
        Err(e) => Err(LlmError::InternalError(format!(
            "Failed to initialize tracing: {}",
            e
        ))),
    }
}

/// Info level, text output to stdout.
pub fn init_default() -> Result<Option<WorkerGuard>, LlmError> {
    init_subscriber(SubscriberConfig::default())
}

/// Debug level, text output to stdout.
pub fn init_debug() -> Result<Option<WorkerGuard>, LlmError> {
    init_subscriber(SubscriberConfig::debug())
}

/// Configure from `SIUMAI_LOG_LEVEL`, `SIUMAI_LOG_FORMAT` and `SIUMAI_LOG_FILE`.
pub fn init_from_env() -> Result<Option<WorkerGuard>, LlmError> {
    init_subscriber(config_from_lookup(|key| std::env::var(key).ok())?)
}

fn config_from_lookup<F>(lookup: F) -> Result<SubscriberConfig, LlmError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = SubscriberConfig::builder();
    if let Some(level) = lookup("SIUMAI_LOG_LEVEL") {
        builder = builder.log_level_str(&level)?;
    }
    if let Some(format) = lookup("SIUMAI_LOG_FORMAT") {
        builder = builder.output_format_str(&format)?;
    }
    if let Some(file) = lookup("SIUMAI_LOG_FILE") {
        builder = builder.log_file(PathBuf::from(file));
    }
    Ok(builder.build())
}
