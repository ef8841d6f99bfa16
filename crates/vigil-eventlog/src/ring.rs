//! # Circular Event Log
//!
//! Fixed-capacity, in-memory event store for memory-constrained controllers.
//!
//! ## Overflow Policy
//!
//! The log is a ring, not a growing buffer. Once it holds `capacity` records,
//! every append overwrites the **oldest** surviving record and the size stays
//! at `capacity`. Nothing reports the loss: bounded memory is traded for
//! history, and callers that need every event must flush before the ring
//! wraps.
//!
//! ## Thread Safety
//!
//! [`CircularEventLog`] is **not thread-safe**. All mutation goes through
//! `&mut self`; keep it confined to the polling context, and never append
//! while a flush is reading it.
//!
//! ## Example
//!
//! ```
//! use chrono::Utc;
//! use vigil_eventlog::{CircularEventLog, EventRecord};
//!
//! let mut log = CircularEventLog::new(2);
//! for name in ["A", "B", "C"] {
//!     log.append(EventRecord::new(name, Utc::now()).unwrap());
//! }
//!
//! assert_eq!(log.size(), 2);
//! assert_eq!(log.get(0).name(), "B");
//! assert_eq!(log.get(1).name(), "C");
//! ```

use chrono::{DateTime, Utc};

use crate::error::RecordError;
use crate::record::EventRecord;

/// Default number of slots, matching the controller's event storage
pub const DEFAULT_LOG_CAPACITY: usize = 20;

/// Bounded ring of [`EventRecord`]s with overwrite-when-full semantics
#[derive(Debug, Clone)]
pub struct CircularEventLog {
    slots: Vec<Option<EventRecord>>,
    write_index: usize,
    count: usize,
}

impl Default for CircularEventLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

impl CircularEventLog {
    /// Create a log with `capacity` slots, allocated up front.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be positive");
        Self {
            slots: vec![None; capacity],
            write_index: 0,
            count: 0,
        }
    }

    /// Create a log, returning `None` for a zero capacity
    pub fn try_new(capacity: usize) -> Option<Self> {
        (capacity > 0).then(|| Self::new(capacity))
    }

    /// Append a record, overwriting the oldest one when full
    pub fn append(&mut self, record: EventRecord) {
        let capacity = self.capacity();
        self.slots[self.write_index] = Some(record);
        self.write_index = (self.write_index + 1) % capacity;
        if self.count < capacity {
            self.count += 1;
        }
    }

    /// Build a record from `name` and `timestamp` and append it
    ///
    /// Fails only when the name is not a valid event name; the log itself
    /// always accepts the record.
    pub fn push(&mut self, name: &str, timestamp: DateTime<Utc>) -> Result<(), RecordError> {
        self.append(EventRecord::new(name, timestamp)?);
        Ok(())
    }

    /// Number of surviving records
    pub fn size(&self) -> usize {
        self.count
    }

    /// Alias for [`size`](Self::size)
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Whether the next append will overwrite a record
    pub fn is_full(&self) -> bool {
        self.count == self.capacity()
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// The `index`-th surviving record, oldest first.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.size()`. Callers must bound their reads by
    /// [`size`](Self::size); use [`try_get`](Self::try_get) otherwise.
    pub fn get(&self, index: usize) -> &EventRecord {
        match self.try_get(index) {
            Some(record) => record,
            None => panic!(
                "event index out of range: index {} but size is {}",
                index, self.count
            ),
        }
    }

    /// The `index`-th surviving record, or `None` when out of range
    pub fn try_get(&self, index: usize) -> Option<&EventRecord> {
        if index >= self.count {
            return None;
        }
        let slot = (self.oldest_index() + index) % self.capacity();
        self.slots[slot].as_ref()
    }

    /// Iterate surviving records, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &EventRecord> + '_ {
        (0..self.count).filter_map(move |i| self.try_get(i))
    }

    /// Drop every record, keeping the allocation
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.write_index = 0;
        self.count = 0;
    }

    fn oldest_index(&self) -> usize {
        if self.count < self.capacity() {
            0
        } else {
            self.write_index
        }
    }
}
