//! # Signal Monitor
//!
//! The polling side of the event log. Once per tick the monitor reads every
//! monitored signal, feeds the readings to a [`ChangeDetector`], and appends a
//! timestamped record to its [`CircularEventLog`] for each transition.
//!
//! ## Thread Safety
//!
//! [`EventMonitor`] is **not thread-safe** and uses `&mut self` for ticks and
//! flushes. Run both from the same task so a flush never overlaps an append.
//!
//! ## Example
//!
//! ```
//! use vigil_eventlog::{EventMonitor, InMemoryStorage, PersistenceCoordinator, SystemClock};
//!
//! let mut monitor = EventMonitor::new(20, SystemClock);
//! let recorded = monitor.tick(&|signal: &str| signal == "GAS_DET");
//! assert_eq!(recorded.len(), 1);
//! assert_eq!(recorded[0].name(), "GAS_DET_ON");
//!
//! let storage = InMemoryStorage::new();
//! let result = monitor.flush(&PersistenceCoordinator::new(), &storage);
//! assert_eq!(result.written(), 1);
//! ```

use std::fmt;
use std::str::FromStr;

use tracing::{info, warn};

use crate::clock::Clock;
use crate::detector::ChangeDetector;
use crate::persistence::{FlushResult, PersistenceCoordinator};
use crate::record::EventRecord;
use crate::ring::CircularEventLog;
use crate::storage::EventStorage;

/// The signals watched by the security controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonitoredSignal {
    /// Siren / alarm output
    Alarm,
    /// Gas detector
    GasDetector,
    /// Over-temperature detector
    OverTemperature,
    /// Incorrect-code indicator LED
    IncorrectCode,
    /// System-blocked indicator LED
    SystemBlocked,
    /// Motion sensor
    Motion,
}

impl MonitoredSignal {
    /// Every monitored signal, in polling order
    pub const ALL: [MonitoredSignal; 6] = [
        Self::Alarm,
        Self::GasDetector,
        Self::OverTemperature,
        Self::IncorrectCode,
        Self::SystemBlocked,
        Self::Motion,
    ];

    /// Name used in event records
    pub fn name(self) -> &'static str {
        match self {
            Self::Alarm => "ALARM",
            Self::GasDetector => "GAS_DET",
            Self::OverTemperature => "OVER_TEMP",
            Self::IncorrectCode => "LED_IC",
            Self::SystemBlocked => "LED_SB",
            Self::Motion => "MOTION",
        }
    }
}

impl fmt::Display for MonitoredSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error parsing a [`MonitoredSignal`] name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown signal: {0}")]
pub struct UnknownSignal(pub String);

impl FromStr for MonitoredSignal {
    type Err = UnknownSignal;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|signal| signal.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownSignal(s.to_string()))
    }
}

/// Source of current signal values
pub trait SignalReader {
    /// Current state of `signal`
    fn read_signal(&self, signal: &str) -> bool;
}

impl<F> SignalReader for F
where
    F: Fn(&str) -> bool,
{
    fn read_signal(&self, signal: &str) -> bool {
        self(signal)
    }
}

/// Detector, log, and clock wired into a polling loop body
#[derive(Debug)]
pub struct EventMonitor<C: Clock> {
    detector: ChangeDetector,
    log: CircularEventLog,
    clock: C,
    signals: Vec<String>,
}

impl<C: Clock> EventMonitor<C> {
    /// Monitor every [`MonitoredSignal`] with a log of `capacity` slots
    pub fn new(capacity: usize, clock: C) -> Self {
        Self::with_signals(capacity, clock, MonitoredSignal::ALL.iter().map(|s| s.name()))
    }

    /// Monitor an explicit set of signal names, polled in the given order
    pub fn with_signals<I, S>(capacity: usize, clock: C, signals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            detector: ChangeDetector::new(),
            log: CircularEventLog::new(capacity),
            clock,
            signals: signals.into_iter().map(Into::into).collect(),
        }
    }

    /// Poll every signal once, returning the records appended this tick
    pub fn tick<R: SignalReader + ?Sized>(&mut self, reader: &R) -> Vec<EventRecord> {
        let mut recorded = Vec::new();

        for signal in &self.signals {
            let current = reader.read_signal(signal);
            let Some(transition) = self.detector.observe(signal, current) else {
                continue;
            };

            match EventRecord::for_transition(&transition.signal, transition.state, self.clock.now()) {
                Ok(record) => {
                    info!(event = record.name(), "Event recorded");
                    self.log.append(record.clone());
                    recorded.push(record);
                }
                Err(e) => {
                    warn!(signal = %signal, error = %e, "Cannot record event");
                }
            }
        }

        recorded
    }

    /// Flush the log to `storage`, stamped with the current time
    pub fn flush<S: EventStorage + ?Sized>(
        &self,
        coordinator: &PersistenceCoordinator,
        storage: &S,
    ) -> FlushResult {
        coordinator.flush(&self.log, self.clock.now(), storage)
    }

    pub fn log(&self) -> &CircularEventLog {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut CircularEventLog {
        &mut self.log
    }

    pub fn detector(&self) -> &ChangeDetector {
        &self.detector
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Signal names polled on each tick
    pub fn signals(&self) -> &[String] {
        &self.signals
    }
}
