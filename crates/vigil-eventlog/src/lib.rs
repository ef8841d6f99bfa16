//! # Vigil Event Log
//!
//! Event logging core for the Vigil home-security controller.
//!
//! Monitored signals (siren, gas, over-temperature, keypad indicators, motion)
//! are polled on a fixed tick. Every change of state becomes a timestamped
//! [`EventRecord`] in a bounded [`CircularEventLog`], which is flushed to
//! storage as plain text and can be scanned back for auditing.
//!
//! ## Modules
//!
//! - [`record`]: immutable `<SIGNAL>_ON|_OFF` records with second resolution
//! - [`ring`]: fixed-capacity ring with overwrite-when-full semantics
//! - [`detector`]: edge-triggered change detection per signal
//! - [`format`]: text block serialization and tolerant parsing
//! - [`persistence`]: flush to `YYYY_MM_DD_HH_MM_SS.txt` and recovery scans
//! - [`storage`]: the storage interface with filesystem and in-memory backends
//! - [`monitor`]: the polling tick tying the pieces together
//!
//! ## Example
//!
//! ```
//! use vigil_eventlog::{
//!     CircularEventLog, EventRecord, InMemoryStorage, PersistenceCoordinator,
//! };
//! use chrono::Utc;
//!
//! let mut log = CircularEventLog::new(20);
//! log.append(EventRecord::for_transition("ALARM", true, Utc::now()).unwrap());
//!
//! let storage = InMemoryStorage::new();
//! let coordinator = PersistenceCoordinator::new();
//! assert_eq!(coordinator.flush(&log, Utc::now(), &storage).written(), 1);
//!
//! let report = coordinator.recover_all(&storage);
//! assert_eq!(report.total_records(), 1);
//! ```

pub mod clock;
pub mod detector;
pub mod error;
pub mod format;
pub mod monitor;
pub mod persistence;
pub mod record;
pub mod ring;
pub mod storage;

// Re-exports
pub use clock::{Clock, ManualClock, SystemClock};
pub use detector::{ChangeDetector, Transition};
pub use error::{BlockError, RecordError, StorageError};
pub use format::{parse_all, serialize, ParseOutcome};
pub use monitor::{EventMonitor, MonitoredSignal, SignalReader, UnknownSignal};
pub use persistence::{
    FlushResult, PersistenceCoordinator, RecoveredFile, RecoveryFailure, RecoveryReport,
    RecoveryStatus,
};
pub use record::{EventRecord, MAX_EVENT_NAME_LEN};
pub use ring::{CircularEventLog, DEFAULT_LOG_CAPACITY};
pub use storage::{EventStorage, FsStorage, InMemoryStorage};
