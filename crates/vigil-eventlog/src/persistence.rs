//! # Persistence
//!
//! Moves events between the in-memory log and storage.
//!
//! ## Flush
//!
//! Every record in the log is written, oldest first, to a file named after the
//! flush time (`YYYY_MM_DD_HH_MM_SS.txt`). Each record is a separate append, so
//! a flush is best-effort: a failed write is counted and the remaining records
//! are still attempted.
//!
//! ## Recovery
//!
//! ```text
//! Start -> ListDirectory -> no entries -> Done (Empty)
//!                        -> entries    -> for each *.txt: Open -> Read -> Parse -> Accumulate
//!                                      -> Done (Complete)
//!       -> listing fails              -> Done (Unavailable)
//! ```
//!
//! Files that cannot be read are reported and excluded; the scan always runs to
//! the end. Recovered records are for inspection only and are never fed back
//! into a live [`CircularEventLog`].

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::error::StorageError;
use crate::format::{parse_all, serialize};
use crate::record::EventRecord;
use crate::ring::CircularEventLog;
use crate::storage::EventStorage;

/// Extension of persisted log files
pub const LOG_FILE_SUFFIX: &str = ".txt";

/// `strftime` layout of the file stem
pub const FILE_STEM_FORMAT: &str = "%Y_%m_%d_%H_%M_%S";

/// Outcome of a flush
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushResult {
    /// The log was empty; no file was touched
    NothingToStore,
    /// At least one write was attempted
    Flushed {
        file_name: String,
        written: usize,
        failed: usize,
    },
}

impl FlushResult {
    /// Records successfully written
    pub fn written(&self) -> usize {
        match self {
            Self::NothingToStore => 0,
            Self::Flushed { written, .. } => *written,
        }
    }

    /// Records whose write failed
    pub fn failed(&self) -> usize {
        match self {
            Self::NothingToStore => 0,
            Self::Flushed { failed, .. } => *failed,
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        match self {
            Self::NothingToStore => None,
            Self::Flushed { file_name, .. } => Some(file_name),
        }
    }

    /// True when nothing needed storing or every write succeeded
    pub fn is_complete(&self) -> bool {
        self.failed() == 0
    }
}

/// Records recovered from one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveredFile {
    pub file_name: String,
    /// Flush time encoded in the file name, when it follows the convention
    pub flushed_at: Option<DateTime<Utc>>,
    pub records: Vec<EventRecord>,
    /// Blocks that could not be parsed
    pub skipped: usize,
}

/// A file that matched but could not be read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryFailure {
    pub file_name: String,
    pub error: StorageError,
}

/// Terminal state of a recovery scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStatus {
    /// The storage root could not be listed
    Unavailable,
    /// No log files were found
    Empty,
    /// Every log file was visited
    Complete,
}

/// Aggregate result of [`PersistenceCoordinator::recover_all`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Readable files, sorted by name
    pub files: Vec<RecoveredFile>,
    /// Files that could not be read
    pub failures: Vec<RecoveryFailure>,
    /// Set when listing the storage root failed
    pub unavailable: Option<StorageError>,
}

impl RecoveryReport {
    pub fn status(&self) -> RecoveryStatus {
        if self.unavailable.is_some() {
            RecoveryStatus::Unavailable
        } else if self.files.is_empty() && self.failures.is_empty() {
            RecoveryStatus::Empty
        } else {
            RecoveryStatus::Complete
        }
    }

    /// All recovered records, file by file
    pub fn records(&self) -> impl Iterator<Item = &EventRecord> + '_ {
        self.files.iter().flat_map(|file| file.records.iter())
    }

    pub fn total_records(&self) -> usize {
        self.files.iter().map(|file| file.records.len()).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.files.iter().map(|file| file.skipped).sum()
    }
}

/// Writes the log to storage and scans storage for earlier flushes
#[derive(Debug, Clone)]
pub struct PersistenceCoordinator {
    suffix: String,
}

impl Default for PersistenceCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl PersistenceCoordinator {
    pub fn new() -> Self {
        Self {
            suffix: LOG_FILE_SUFFIX.to_string(),
        }
    }

    /// Match and write files with a different suffix
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// File name for a flush at `now`, e.g. `2024_03_09_14_05_07.txt`
    pub fn file_name_for(&self, now: DateTime<Utc>) -> String {
        format!("{}{}", now.format(FILE_STEM_FORMAT), self.suffix)
    }

    /// Flush time encoded in `file_name`, if it follows the naming convention
    pub fn parse_file_name(&self, file_name: &str) -> Option<DateTime<Utc>> {
        let stem = file_name.strip_suffix(self.suffix.as_str())?;
        NaiveDateTime::parse_from_str(stem, FILE_STEM_FORMAT)
            .ok()
            .map(|naive| naive.and_utc())
    }

    /// Write every record in `log`, oldest first, one append per record
    #[instrument(skip_all, fields(events = log.size()))]
    pub fn flush<S: EventStorage + ?Sized>(
        &self,
        log: &CircularEventLog,
        now: DateTime<Utc>,
        storage: &S,
    ) -> FlushResult {
        if log.is_empty() {
            info!("No events to store");
            return FlushResult::NothingToStore;
        }

        let file_name = self.file_name_for(now);
        let mut written = 0;
        let mut failed = 0;

        for (i, record) in log.iter().enumerate() {
            let block = serialize(record);
            match storage.append(&file_name, block.as_bytes()) {
                Ok(()) => {
                    written += 1;
                    debug!(event = i + 1, file = %file_name, "Stored event");
                }
                Err(e) => {
                    failed += 1;
                    warn!(event = i + 1, file = %file_name, error = %e, "Failed to store event");
                }
            }
        }

        if written > 0 {
            info!(file = %file_name, written, failed, "Event log written");
        } else {
            warn!(file = %file_name, failed, "No events stored, storage may be unavailable");
        }

        FlushResult::Flushed {
            file_name,
            written,
            failed,
        }
    }

    /// Check that storage is mounted, logging the outcome
    pub fn probe<S: EventStorage + ?Sized>(&self, storage: &S) -> bool {
        match storage.probe() {
            Ok(()) => {
                info!("Storage found");
                true
            }
            Err(e) => {
                warn!(error = %e, "Storage not available");
                false
            }
        }
    }

    /// Scan storage for log files and parse each one
    #[instrument(skip_all)]
    pub fn recover_all<S: EventStorage + ?Sized>(&self, storage: &S) -> RecoveryReport {
        let mut report = RecoveryReport::default();

        let mut names = match storage.list_files() {
            Ok(names) => names,
            Err(e) => {
                warn!(error = %e, "Failed to list storage");
                report.unavailable = Some(e);
                return report;
            }
        };
        names.retain(|name| name.ends_with(self.suffix.as_str()));
        names.sort();

        for file_name in names {
            let bytes = match storage.read_all(&file_name) {
                Ok(bytes) => bytes,
                Err(error) => {
                    warn!(file = %file_name, error = %error, "Failed to open file");
                    report.failures.push(RecoveryFailure { file_name, error });
                    continue;
                }
            };

            let outcome = parse_all(&String::from_utf8_lossy(&bytes));
            if outcome.skipped > 0 {
                warn!(file = %file_name, skipped = outcome.skipped, "Skipped malformed events");
            }
            info!(file = %file_name, events = outcome.records.len(), "Read events from file");

            report.files.push(RecoveredFile {
                flushed_at: self.parse_file_name(&file_name),
                file_name,
                records: outcome.records,
                skipped: outcome.skipped,
            });
        }

        info!(
            files = report.files.len(),
            failures = report.failures.len(),
            events = report.total_records(),
            "Recovery scan complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStorage;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, h, m, s).unwrap()
    }

    fn log_of(names: &[&str]) -> CircularEventLog {
        let mut log = CircularEventLog::new(8);
        for (i, name) in names.iter().enumerate() {
            log.append(EventRecord::new(*name, at(10, 0, i as u32)).unwrap());
        }
        log
    }

    #[test]
    fn test_file_name_round_trip() {
        let coordinator = PersistenceCoordinator::new();
        let name = coordinator.file_name_for(at(14, 5, 7));
        assert_eq!(name, "2024_03_09_14_05_07.txt");
        assert_eq!(coordinator.parse_file_name(&name), Some(at(14, 5, 7)));
        assert_eq!(coordinator.parse_file_name("notes.txt"), None);
        assert_eq!(coordinator.parse_file_name("2024_03_09_14_05_07.log"), None);
    }

    #[test]
    fn test_flush_empty_log() {
        let storage = InMemoryStorage::new();
        let result = PersistenceCoordinator::new().flush(&CircularEventLog::new(4), at(1, 0, 0), &storage);

        assert_eq!(result, FlushResult::NothingToStore);
        assert_eq!(result.written(), 0);
        assert_eq!(storage.file_count(), 0);
        assert_eq!(storage.append_count(), 0);
    }

    #[test]
    fn test_flush_writes_one_append_per_record() {
        let storage = InMemoryStorage::new();
        let log = log_of(&["ALARM_ON", "GAS_DET_ON", "ALARM_OFF"]);

        let result = PersistenceCoordinator::new().flush(&log, at(12, 0, 0), &storage);

        assert_eq!(result.written(), 3);
        assert!(result.is_complete());
        assert_eq!(storage.append_count(), 3);

        let expected: String = log.iter().map(serialize).collect();
        let contents = storage.contents("2024_03_09_12_00_00.txt").unwrap();
        assert_eq!(String::from_utf8(contents).unwrap(), expected);
    }

    #[test]
    fn test_flush_continues_after_failure() {
        let storage = InMemoryStorage::new();
        storage.fail_append(0);
        let log = log_of(&["ALARM_ON", "ALARM_OFF"]);

        let result = PersistenceCoordinator::new().flush(&log, at(12, 0, 0), &storage);

        assert_eq!(result.written(), 1);
        assert_eq!(result.failed(), 1);
        assert!(!result.is_complete());
        let contents = storage.contents(result.file_name().unwrap()).unwrap();
        assert_eq!(contents, serialize(log.get(1)).into_bytes());
    }

    #[test]
    fn test_flush_to_unavailable_storage() {
        let storage = InMemoryStorage::new();
        storage.set_unavailable(true);
        let log = log_of(&["MOTION_ON"]);

        let result = PersistenceCoordinator::new().flush(&log, at(12, 0, 0), &storage);
        assert_eq!(result.written(), 0);
        assert_eq!(result.failed(), 1);
        // The in-memory log is untouched
        assert_eq!(log.size(), 1);
    }

    #[test]
    fn test_recover_filters_by_suffix_and_sorts() {
        let storage = InMemoryStorage::new();
        let coordinator = PersistenceCoordinator::new();
        coordinator.flush(&log_of(&["LED_IC_ON"]), at(9, 0, 0), &storage);
        coordinator.flush(&log_of(&["LED_SB_ON", "LED_SB_OFF"]), at(8, 0, 0), &storage);
        storage.insert_file("config.ini", "Event = NOPE_ON\n");

        let report = coordinator.recover_all(&storage);

        assert_eq!(report.status(), RecoveryStatus::Complete);
        let names: Vec<_> = report.files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["2024_03_09_08_00_00.txt", "2024_03_09_09_00_00.txt"]);
        assert_eq!(report.files[0].flushed_at, Some(at(8, 0, 0)));
        assert_eq!(report.total_records(), 3);
        assert_eq!(report.total_skipped(), 0);
    }

    #[test]
    fn test_recover_empty_storage() {
        let report = PersistenceCoordinator::new().recover_all(&InMemoryStorage::new());
        assert_eq!(report.status(), RecoveryStatus::Empty);
        assert_eq!(report.total_records(), 0);
    }

    #[test]
    fn test_recover_unavailable_storage() {
        let storage = InMemoryStorage::new();
        storage.insert_file("a.txt", "");
        storage.set_unavailable(true);

        let report = PersistenceCoordinator::new().recover_all(&storage);
        assert_eq!(report.status(), RecoveryStatus::Unavailable);
        assert!(report.files.is_empty());
    }

    #[test]
    fn test_recover_reports_unreadable_files() {
        let storage = InMemoryStorage::new();
        let coordinator = PersistenceCoordinator::new();
        coordinator.flush(&log_of(&["ALARM_ON"]), at(1, 0, 0), &storage);
        storage.insert_file("broken.txt", "whatever");
        storage.make_unreadable("broken.txt");

        let report = coordinator.recover_all(&storage);

        assert_eq!(report.files.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].file_name, "broken.txt");
        assert_eq!(report.total_records(), 1);
    }

    #[test]
    fn test_custom_suffix() {
        let storage = InMemoryStorage::new();
        let coordinator = PersistenceCoordinator::new().with_suffix(".log");
        let result = coordinator.flush(&log_of(&["ALARM_ON"]), at(1, 2, 3), &storage);

        assert_eq!(result.file_name(), Some("2024_03_09_01_02_03.log"));
        assert_eq!(coordinator.recover_all(&storage).total_records(), 1);
        assert_eq!(PersistenceCoordinator::new().recover_all(&storage).total_records(), 0);
    }

    #[test]
    fn test_probe() {
        let storage = InMemoryStorage::new();
        let coordinator = PersistenceCoordinator::new();
        assert!(coordinator.probe(&storage));
        storage.set_unavailable(true);
        assert!(!coordinator.probe(&storage));
    }
}
