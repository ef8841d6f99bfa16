//! Configuration for the controller

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use vigil_eventlog::DEFAULT_LOG_CAPACITY;
use vigil_logging::LogConfig;

use crate::error::{ControllerError, ControllerResult};

/// Default polling period of the monitor
const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Configuration for a controller instance, usually read from a TOML file
///
/// ```toml
/// storage_root = "/mnt/sd"
/// log_capacity = 20
/// poll_interval_ms = 100
/// flush_interval_secs = 600
///
/// [logging]
/// level = "debug"
/// console = "pretty"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Directory holding persisted event files
    pub storage_root: PathBuf,
    /// Slots in the in-memory event log
    pub log_capacity: usize,
    /// Milliseconds between signal polls
    pub poll_interval_ms: u64,
    /// Seconds between automatic flushes; flush only on request when unset
    pub flush_interval_secs: Option<u64>,
    /// Scan storage for earlier flushes at startup
    pub recover_on_start: bool,
    /// Empty the in-memory log after a flush that wrote every record
    pub clear_after_flush: bool,
    /// Logging setup
    pub logging: LogConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("./sd"),
            log_capacity: DEFAULT_LOG_CAPACITY,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            flush_interval_secs: None,
            recover_on_start: true,
            clear_after_flush: false,
            logging: LogConfig::default(),
        }
    }
}

impl ControllerConfig {
    /// Load and validate a TOML configuration file
    pub fn load(path: impl AsRef<Path>) -> ControllerResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ControllerError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> ControllerResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the controller cannot run with
    pub fn validate(&self) -> ControllerResult<()> {
        if self.log_capacity == 0 {
            return Err(ControllerError::Config("log_capacity must be positive".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(ControllerError::Config("poll_interval_ms must be positive".into()));
        }
        if self.flush_interval_secs == Some(0) {
            return Err(ControllerError::Config(
                "flush_interval_secs must be positive when set".into(),
            ));
        }
        Ok(())
    }

    /// Set the storage root
    pub fn with_storage_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.storage_root = root.into();
        self
    }

    /// Set the event log capacity
    pub fn with_log_capacity(mut self, capacity: usize) -> Self {
        self.log_capacity = capacity;
        self
    }

    /// Set the polling period
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set the automatic flush period
    pub fn with_flush_interval(mut self, interval: Option<Duration>) -> Self {
        self.flush_interval_secs = interval.map(|d| d.as_secs());
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn flush_interval(&self) -> Option<Duration> {
        self.flush_interval_secs.map(Duration::from_secs)
    }
}
