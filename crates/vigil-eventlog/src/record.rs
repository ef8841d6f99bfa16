//! # Event Records
//!
//! A record is the smallest unit of the log: which signal changed, to which
//! state, and when. Names follow `<SIGNAL>_ON` / `<SIGNAL>_OFF` and are bounded
//! so every record fits the fixed-size slots of the controller's log.

use std::fmt;

use chrono::{DateTime, Timelike, Utc};
use serde::Serialize;

use crate::error::RecordError;

/// Maximum length of an event name in bytes.
///
/// `OVER_TEMP_OFF`, the longest built-in name, fits exactly.
pub const MAX_EVENT_NAME_LEN: usize = 13;

/// Suffix appended to a signal name when it turns on
pub const ON_SUFFIX: &str = "_ON";

/// Suffix appended to a signal name when it turns off
pub const OFF_SUFFIX: &str = "_OFF";

/// An immutable, timestamped event
///
/// Timestamps carry whole seconds only; sub-second precision is dropped at
/// construction so a record survives a text round trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EventRecord {
    name: String,
    timestamp: DateTime<Utc>,
}

impl EventRecord {
    /// Create a record from an already formed event name
    pub fn new(name: impl Into<String>, timestamp: DateTime<Utc>) -> Result<Self, RecordError> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            name,
            timestamp: truncate_to_second(timestamp),
        })
    }

    /// Create the record for a signal entering `state`
    pub fn for_transition(
        signal: &str,
        state: bool,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, RecordError> {
        Self::new(event_name(signal, state), timestamp)
    }

    /// The event name, e.g. `GAS_DET_ON`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// When the transition was recorded
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Split the name back into signal and state, if it follows the
    /// `<SIGNAL>_ON|_OFF` convention
    pub fn signal_state(&self) -> Option<(&str, bool)> {
        if let Some(signal) = self.name.strip_suffix(OFF_SUFFIX) {
            Some((signal, false))
        } else {
            self.name.strip_suffix(ON_SUFFIX).map(|signal| (signal, true))
        }
    }
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.name, self.timestamp.format("%Y-%m-%d %H:%M:%S"))
    }
}

/// Build the event name for a signal state, e.g. `("ALARM", true)` -> `ALARM_ON`
pub fn event_name(signal: &str, state: bool) -> String {
    let suffix = if state { ON_SUFFIX } else { OFF_SUFFIX };
    let mut name = String::with_capacity(signal.len() + suffix.len());
    name.push_str(signal);
    name.push_str(suffix);
    name
}

fn validate_name(name: &str) -> Result<(), RecordError> {
    if name.is_empty() {
        return Err(RecordError::EmptyName);
    }
    if name.len() > MAX_EVENT_NAME_LEN {
        return Err(RecordError::NameTooLong {
            name: name.to_string(),
            len: name.len(),
            max: MAX_EVENT_NAME_LEN,
        });
    }
    if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(RecordError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn truncate_to_second(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    // with_nanosecond(0) is always in range
    timestamp.with_nanosecond(0).unwrap_or(timestamp)
}
