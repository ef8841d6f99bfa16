//! Logging settings, read as the `[logging]` table of the controller config
//!
//! ```toml
//! [logging]
//! level = "vigil_eventlog=debug,info"
//! console = "compact"
//!
//! [logging.file]
//! directory = "/var/log/vigil"
//! rotation = "daily"
//! ```
//!
//! Console output goes to stderr so it never mixes with command output on
//! stdout. File output is always JSON lines.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default file name prefix for rolling log files
pub const DEFAULT_FILE_PREFIX: &str = "vigil-controller";

/// Main logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence when set
    pub level: String,
    /// How events are rendered on stderr
    pub console: ConsoleFormat,
    /// Colour the console output
    pub ansi: bool,
    /// JSONL file output, off when unset
    pub file: Option<FileConfig>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console: ConsoleFormat::Compact,
            ansi: false,
            file: None,
        }
    }
}

impl LogConfig {
    /// Override the filter directive
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Write JSONL files into `directory`, keeping any other file settings
    pub fn with_file_dir(mut self, directory: impl Into<PathBuf>) -> Self {
        let file = self.file.take().unwrap_or_default();
        self.file = Some(FileConfig {
            directory: directory.into(),
            ..file
        });
        self
    }
}

/// Console rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleFormat {
    /// Multi-line output with source locations, for bench debugging
    Pretty,
    /// One line per event
    #[default]
    Compact,
    /// One JSON object per event
    Json,
    /// No console output
    Off,
}

/// Rolling JSONL file output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub directory: PathBuf,
    /// File name prefix; files are `<prefix>.<date>.log`
    pub prefix: String,
    pub rotation: RotationStrategy,
    /// Oldest files beyond this count are deleted on rotation
    pub max_files: Option<usize>,
    /// Record source file and line on every event
    pub include_location: bool,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./logs"),
            prefix: DEFAULT_FILE_PREFIX.to_string(),
            rotation: RotationStrategy::Daily,
            max_files: Some(14),
            include_location: false,
        }
    }
}

/// File rotation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RotationStrategy {
    #[default]
    Daily,
    Hourly,
    /// Single file, never rotated
    Never,
}
