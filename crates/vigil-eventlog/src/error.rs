//! Error types for vigil-eventlog
//!
//! Expected conditions (empty log, missing storage, malformed files) never
//! surface through these types as failures of a whole operation: flush and
//! recovery fold them into their reports. These enums describe *why* a single
//! write, read, or block went wrong.

use thiserror::Error;

/// Errors reported by an [`EventStorage`](crate::storage::EventStorage) backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The storage root could not be mounted or listed
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// The named file does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// I/O error while reading or writing a file
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(err.to_string()),
            _ => StorageError::Io(err.to_string()),
        }
    }
}

impl StorageError {
    /// Create a new Unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Create a new NotFound error
    pub fn not_found(item: impl Into<String>) -> Self {
        Self::NotFound(item.into())
    }

    /// Create a new I/O error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io(message.into())
    }
}

/// Errors constructing an [`EventRecord`](crate::record::EventRecord)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("Event name is empty")]
    EmptyName,
    #[error("Event name too long: {name:?} is {len} bytes, limit is {max}")]
    NameTooLong { name: String, len: usize, max: usize },
    #[error("Event name contains whitespace or control characters: {0:?}")]
    InvalidName(String),
}

/// Reason a text block was skipped during parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("Missing event line")]
    MissingEventLine,
    #[error("Missing date and time line")]
    MissingTimestampLine,
    #[error("Unexpected line: {0:?}")]
    UnexpectedLine(String),
    #[error("Invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: String },
    #[error("Invalid event name: {0}")]
    InvalidName(#[from] RecordError),
}
