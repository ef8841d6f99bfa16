//! # Change Detection
//!
//! Edge-triggered tracking of boolean signals. Each signal remembers the last
//! value it was observed with; an observation that differs from it is a
//! [`Transition`]. Signals never observed before start from OFF, so a signal
//! that is already ON on its first poll is reported.
//!
//! Observations for one signal must arrive in wall-clock order from a single
//! caller. Different signals are independent of each other.

use std::collections::HashMap;

use crate::record::event_name;

/// A change of a signal to a new state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Signal name, e.g. `GAS_DET`
    pub signal: String,
    /// The state the signal changed to
    pub state: bool,
}

impl Transition {
    /// The event name for this transition, e.g. `GAS_DET_ON`
    pub fn event_name(&self) -> String {
        event_name(&self.signal, self.state)
    }
}

/// Tracks the last observed state of every signal
#[derive(Debug, Default, Clone)]
pub struct ChangeDetector {
    last_states: HashMap<String, bool>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest polled value of `signal`.
    ///
    /// Returns a transition iff `current` differs from the previously observed
    /// value (OFF for unseen signals). The stored value is updated either way.
    pub fn observe(&mut self, signal: &str, current: bool) -> Option<Transition> {
        let last = match self.last_states.get_mut(signal) {
            Some(last) => std::mem::replace(last, current),
            None => {
                self.last_states.insert(signal.to_string(), current);
                false
            }
        };

        (last != current).then(|| Transition {
            signal: signal.to_string(),
            state: current,
        })
    }

    /// Last observed value of `signal`, OFF if never observed
    pub fn last_state(&self, signal: &str) -> bool {
        self.last_states.get(signal).copied().unwrap_or(false)
    }

    /// Names of every signal observed so far, sorted
    pub fn tracked_signals(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.last_states.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Forget all signals, returning every baseline to OFF
    pub fn reset(&mut self) {
        self.last_states.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gas_sequence() {
        let mut detector = ChangeDetector::new();
        let results: Vec<_> = [false, false, true, true, false]
            .into_iter()
            .map(|state| detector.observe("GAS", state))
            .collect();

        assert_eq!(results[0], None);
        assert_eq!(results[1], None);
        assert_eq!(
            results[2],
            Some(Transition {
                signal: "GAS".into(),
                state: true
            })
        );
        assert_eq!(results[3], None);
        assert_eq!(
            results[4],
            Some(Transition {
                signal: "GAS".into(),
                state: false
            })
        );
    }

    #[test]
    fn test_initial_on_is_reported() {
        let mut detector = ChangeDetector::new();
        let transition = detector.observe("MOTION", true).unwrap();
        assert_eq!(transition.event_name(), "MOTION_ON");
        assert!(detector.last_state("MOTION"));
    }

    #[test]
    fn test_initial_off_is_silent() {
        let mut detector = ChangeDetector::new();
        assert!(detector.observe("ALARM", false).is_none());
        assert_eq!(detector.tracked_signals(), vec!["ALARM"]);
    }

    #[test]
    fn test_signals_are_independent() {
        let mut detector = ChangeDetector::new();
        assert!(detector.observe("ALARM", true).is_some());
        assert!(detector.observe("GAS_DET", true).is_some());
        assert!(detector.observe("ALARM", true).is_none());
        assert!(detector.observe("GAS_DET", false).is_some());
        assert!(detector.last_state("ALARM"));
        assert!(!detector.last_state("GAS_DET"));
    }

    #[test]
    fn test_transitions_match_value_changes() {
        // Every boolean sequence up to length 8
        for len in 0..=8u32 {
            for bits in 0..(1u32 << len) {
                let sequence: Vec<bool> = (0..len).map(|i| bits & (1 << i) != 0).collect();
                let mut detector = ChangeDetector::new();
                let mut previous = false;

                for &value in &sequence {
                    let fired = detector.observe("SIG", value);
                    assert_eq!(fired.is_some(), value != previous);
                    if let Some(t) = fired {
                        assert_eq!(t.state, value);
                    }
                    previous = value;
                }
            }
        }
    }

    #[test]
    fn test_reset_restores_baseline() {
        let mut detector = ChangeDetector::new();
        detector.observe("LED_SB", true);
        detector.reset();
        assert!(detector.tracked_signals().is_empty());
        assert!(detector.observe("LED_SB", true).is_some());
    }
}
