//! Console and JSONL file logging for Vigil
//!
//! # Features
//!
//! - **Console**: pretty, compact, or JSON rendering on stderr
//! - **JSONL files**: structured lines for deployed controllers
//! - **File Rotation**: daily/hourly rotation with retention via tracing-appender
//!
//! # Quick Start
//!
//! ```ignore
//! use vigil_logging::{LogConfig, VigilSubscriberBuilder};
//!
//! // Compact console output at info
//! let _guard = VigilSubscriberBuilder::new().try_init()?;
//!
//! // Deployed controller: console plus JSONL files
//! let _guard = VigilSubscriberBuilder::new()
//!     .with_config(LogConfig::default().with_file_dir("/var/log/vigil"))
//!     .try_init()?;
//! ```
//!
//! Keep the returned guard alive for as long as logging should reach files.

pub mod config;

pub use config::{ConsoleFormat, FileConfig, LogConfig, RotationStrategy, DEFAULT_FILE_PREFIX};

use std::path::PathBuf;

use thiserror::Error;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{
    layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Errors setting up logging
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to create log file appender: {0}")]
    Appender(String),
    #[error("Failed to install global subscriber: {0}")]
    Install(String),
}

/// Builder for configuring and installing the global subscriber
#[derive(Debug, Default)]
pub struct VigilSubscriberBuilder {
    config: LogConfig,
}

impl VigilSubscriberBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific configuration
    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the filter directive
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.config.level = level.into();
        self
    }

    /// Choose the console rendering
    pub fn with_console(mut self, format: ConsoleFormat) -> Self {
        self.config.console = format;
        self
    }

    /// Also write JSONL files into `directory`
    pub fn with_log_dir(mut self, directory: impl Into<PathBuf>) -> Self {
        self.config = self.config.with_file_dir(directory);
        self
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Install the subscriber globally.
    ///
    /// Returns the file writer's guard when file output is configured; drop it
    /// only at exit so buffered lines are written.
    pub fn try_init(self) -> Result<Option<WorkerGuard>, LoggingError> {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.config.level));

        let mut layers: Vec<BoxedLayer> = Vec::new();
        let mut guard = None;

        if let Some(layer) = console_layer(self.config.console, self.config.ansi, std::io::stderr) {
            layers.push(layer);
        }

        if let Some(file_config) = &self.config.file {
            let (writer, file_guard) = create_file_writer(file_config)?;
            guard = Some(file_guard);
            layers.push(file_layer(file_config, writer));
        }

        Registry::default()
            .with(layers)
            .with(env_filter)
            .try_init()
            .map_err(|e| LoggingError::Install(e.to_string()))?;

        Ok(guard)
    }
}

/// Console layer writing to `writer`, or none when the console is off
fn console_layer<W>(format: ConsoleFormat, ansi: bool, writer: W) -> Option<BoxedLayer>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer().with_writer(writer);
    let boxed = match format {
        ConsoleFormat::Off => return None,
        ConsoleFormat::Pretty => layer.pretty().with_ansi(ansi).boxed(),
        ConsoleFormat::Compact => layer.compact().with_ansi(ansi).with_target(false).boxed(),
        ConsoleFormat::Json => layer
            .json()
            .with_current_span(true)
            .flatten_event(true)
            .boxed(),
    };
    Some(boxed)
}

fn file_layer(config: &FileConfig, writer: NonBlocking) -> BoxedLayer {
    tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .flatten_event(true)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_ansi(false)
        .with_writer(writer)
        .boxed()
}

/// Create a non-blocking writer for `<directory>/<prefix>[.<date>].log`
fn create_file_writer(config: &FileConfig) -> Result<(NonBlocking, WorkerGuard), LoggingError> {
    let rotation = match config.rotation {
        RotationStrategy::Daily => Rotation::DAILY,
        RotationStrategy::Hourly => Rotation::HOURLY,
        RotationStrategy::Never => Rotation::NEVER,
    };

    let mut builder = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(config.prefix.as_str())
        .filename_suffix("log");
    if let Some(max_files) = config.max_files {
        builder = builder.max_log_files(max_files);
    }

    let appender = builder
        .build(&config.directory)
        .map_err(|e| LoggingError::Appender(e.to_string()))?;

    Ok(tracing_appender::non_blocking(appender))
}
