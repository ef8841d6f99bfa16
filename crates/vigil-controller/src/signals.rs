//! Shared signal levels and the console command language that drives them
//!
//! On the bench there are no GPIO lines, so the operator sets signal levels
//! by typing commands. The monitor task reads the same [`SignalBoard`] on
//! every poll.
//!
//! ```text
//! GAS_DET on      raise a signal
//! alarm off       lower a signal (names are case-insensitive)
//! flush           write the in-memory log to storage
//! status          show log occupancy and signal levels
//! quit            flush and exit
//! ```

use std::str::FromStr;

use dashmap::DashMap;
use thiserror::Error;
use vigil_eventlog::{MonitoredSignal, SignalReader, UnknownSignal};

/// Current level of every signal, shared between the console and the monitor
///
/// Signals never set read as low.
#[derive(Debug, Default)]
pub struct SignalBoard {
    levels: DashMap<String, bool>,
}

impl SignalBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drive `signal` to `state`
    pub fn set(&self, signal: impl Into<String>, state: bool) {
        self.levels.insert(signal.into(), state);
    }

    /// Current level of `signal`
    pub fn get(&self, signal: &str) -> bool {
        self.levels.get(signal).map(|level| *level).unwrap_or(false)
    }

    /// Every signal that has been set, sorted by name
    pub fn snapshot(&self) -> Vec<(String, bool)> {
        let mut levels: Vec<_> = self
            .levels
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        levels.sort();
        levels
    }
}

impl SignalReader for SignalBoard {
    fn read_signal(&self, signal: &str) -> bool {
        self.get(signal)
    }
}

/// A parsed console line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Set { signal: MonitoredSignal, state: bool },
    Flush,
    Status,
    Quit,
}

/// Errors parsing a console line
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error(transparent)]
    UnknownSignal(#[from] UnknownSignal),

    #[error("expected on or off, got {0:?}")]
    InvalidLevel(String),

    #[error("usage: <SIGNAL> on|off | flush | status | quit")]
    Usage,
}

impl FromStr for ConsoleCommand {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            [] => Err(CommandError::Empty),
            [word] => match word.to_ascii_lowercase().as_str() {
                "flush" => Ok(Self::Flush),
                "status" => Ok(Self::Status),
                "quit" | "exit" => Ok(Self::Quit),
                _ => Err(CommandError::Usage),
            },
            [signal, level] => Ok(Self::Set {
                signal: signal.parse()?,
                state: parse_level(level)?,
            }),
            _ => Err(CommandError::Usage),
        }
    }
}

fn parse_level(level: &str) -> Result<bool, CommandError> {
    match level.to_ascii_lowercase().as_str() {
        "on" | "1" | "high" => Ok(true),
        "off" | "0" | "low" => Ok(false),
        _ => Err(CommandError::InvalidLevel(level.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_defaults_low() {
        let board = SignalBoard::new();
        assert!(!board.get("ALARM"));
        assert!(!board.read_signal("MOTION"));
        assert!(board.snapshot().is_empty());
    }

    #[test]
    fn test_board_set_and_snapshot() {
        let board = SignalBoard::new();
        board.set("MOTION", true);
        board.set("ALARM", true);
        board.set("ALARM", false);

        assert!(board.read_signal("MOTION"));
        assert_eq!(
            board.snapshot(),
            vec![("ALARM".to_string(), false), ("MOTION".to_string(), true)]
        );
    }

    #[test]
    fn test_parse_set_commands() {
        assert_eq!(
            "GAS_DET on".parse(),
            Ok(ConsoleCommand::Set {
                signal: MonitoredSignal::GasDetector,
                state: true
            })
        );
        assert_eq!(
            "  alarm   OFF ".parse(),
            Ok(ConsoleCommand::Set {
                signal: MonitoredSignal::Alarm,
                state: false
            })
        );
    }

    #[test]
    fn test_parse_control_commands() {
        assert_eq!("flush".parse(), Ok(ConsoleCommand::Flush));
        assert_eq!("STATUS".parse(), Ok(ConsoleCommand::Status));
        assert_eq!("exit".parse(), Ok(ConsoleCommand::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<ConsoleCommand>(), Err(CommandError::Empty));
        assert_eq!("reboot".parse::<ConsoleCommand>(), Err(CommandError::Usage));
        assert_eq!(
            "ALARM maybe".parse::<ConsoleCommand>(),
            Err(CommandError::InvalidLevel("maybe".into()))
        );
        assert!(matches!(
            "DOORBELL on".parse::<ConsoleCommand>(),
            Err(CommandError::UnknownSignal(_))
        ));
        assert_eq!("ALARM on now".parse::<ConsoleCommand>(), Err(CommandError::Usage));
    }
}
