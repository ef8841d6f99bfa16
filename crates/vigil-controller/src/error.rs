//! Error types for the controller

use thiserror::Error;
use vigil_eventlog::StorageError;

/// Errors that can occur in the controller
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// IO error
    #[error("IO error: {0}")]
    Io(String),

    /// The monitor task is no longer running
    #[error("Monitor task stopped")]
    TaskStopped,
}

impl From<std::io::Error> for ControllerError {
    fn from(e: std::io::Error) -> Self {
        ControllerError::Io(e.to_string())
    }
}

impl From<toml::de::Error> for ControllerError {
    fn from(e: toml::de::Error) -> Self {
        ControllerError::Config(e.to_string())
    }
}

/// Result type alias for controller operations
pub type ControllerResult<T> = Result<T, ControllerError>;
