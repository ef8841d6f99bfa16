//! # Text Record Format
//!
//! Human-readable serialization of [`EventRecord`]s, one block per record:
//!
//! ```text
//! Event = GAS_DET_ON
//! Date and Time = Sat Mar  9 14:05:07 2024
//!
//! ```
//!
//! - Line 1: `Event = ` followed by the event name
//! - Line 2: `Date and Time = ` followed by a ctime-style calendar string (UTC)
//! - Line 3: empty, separating blocks
//!
//! Parsing groups non-empty lines into blocks at blank lines. A block that does
//! not hold exactly these two lines, or whose name or timestamp is invalid, is
//! skipped and counted rather than failing the parse. Carriage returns are
//! ignored, so logs written with `\r\n` line endings read back the same.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::debug;

use crate::error::BlockError;
use crate::record::EventRecord;

/// Prefix of the event name line
pub const EVENT_PREFIX: &str = "Event = ";

/// Prefix of the timestamp line
pub const TIMESTAMP_PREFIX: &str = "Date and Time = ";

/// Calendar layout of the timestamp line, e.g. `Wed Jun 30 21:49:08 1993`
pub const CALENDAR_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// Records recovered from a text body, plus the number of blocks skipped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    pub records: Vec<EventRecord>,
    pub skipped: usize,
}

/// Serialize one record as a text block, trailing blank line included
pub fn serialize(record: &EventRecord) -> String {
    format!(
        "{EVENT_PREFIX}{}\n{TIMESTAMP_PREFIX}{}\n\n",
        record.name(),
        format_calendar(record.timestamp())
    )
}

/// Parse every block in `text`, skipping the malformed ones
pub fn parse_all(text: &str) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();
    let mut block: Vec<&str> = Vec::with_capacity(2);

    let lines = text.split('\n').map(|line| line.trim_end_matches('\r'));
    for line in lines.chain(std::iter::once("")) {
        if !line.trim().is_empty() {
            block.push(line);
            continue;
        }
        if block.is_empty() {
            continue;
        }

        match parse_block(&block) {
            Ok(record) => outcome.records.push(record),
            Err(e) => {
                debug!(error = %e, lines = block.len(), "Skipping malformed event block");
                outcome.skipped += 1;
            }
        }
        block.clear();
    }

    outcome
}

/// Parse a single block of non-empty lines
pub fn parse_block(lines: &[&str]) -> Result<EventRecord, BlockError> {
    let mut lines = lines.iter();

    let name = lines
        .next()
        .and_then(|line| line.strip_prefix(EVENT_PREFIX))
        .ok_or(BlockError::MissingEventLine)?;

    let calendar = lines
        .next()
        .and_then(|line| line.strip_prefix(TIMESTAMP_PREFIX))
        .ok_or(BlockError::MissingTimestampLine)?;

    if let Some(extra) = lines.next() {
        return Err(BlockError::UnexpectedLine(extra.to_string()));
    }

    let timestamp = parse_calendar(calendar)?;
    Ok(EventRecord::new(name.trim(), timestamp)?)
}

/// Render a timestamp in ctime layout
pub fn format_calendar(timestamp: DateTime<Utc>) -> String {
    timestamp.format(CALENDAR_FORMAT).to_string()
}

/// Parse a ctime-layout calendar string as UTC.
///
/// Runs of whitespace are collapsed first so the space-padded day parses the
/// same as a zero-padded one. A weekday that disagrees with the date is
/// rejected.
pub fn parse_calendar(value: &str) -> Result<DateTime<Utc>, BlockError> {
    let normalized = value.split_whitespace().collect::<Vec<_>>().join(" ");
    NaiveDateTime::parse_from_str(&normalized, "%a %b %d %H:%M:%S %Y")
        .map(|naive| naive.and_utc())
        .map_err(|e| BlockError::InvalidTimestamp {
            value: value.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(name: &str, y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> EventRecord {
        EventRecord::new(name, Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()).unwrap()
    }

    #[test]
    fn test_serialize_exact_text() {
        let r = record("GAS_DET_ON", 2024, 3, 9, 14, 5, 7);
        assert_eq!(
            serialize(&r),
            "Event = GAS_DET_ON\nDate and Time = Sat Mar  9 14:05:07 2024\n\n"
        );
    }

    #[test]
    fn test_serialize_two_digit_day() {
        let r = record("ALARM_OFF", 1993, 6, 30, 21, 49, 8);
        assert_eq!(
            serialize(&r),
            "Event = ALARM_OFF\nDate and Time = Wed Jun 30 21:49:08 1993\n\n"
        );
    }

    #[test]
    fn test_round_trip() {
        let records = [
            record("ALARM_ON", 2024, 1, 1, 0, 0, 0),
            record("OVER_TEMP_OFF", 2023, 12, 31, 23, 59, 59),
            record("MOTION_ON", 2024, 2, 29, 12, 30, 1),
            record("LED_IC_ON", 1999, 7, 4, 6, 7, 8),
        ];
        for r in records {
            let outcome = parse_all(&serialize(&r));
            assert_eq!(outcome.records, vec![r]);
            assert_eq!(outcome.skipped, 0);
        }
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse_all(""), ParseOutcome::default());
        assert_eq!(parse_all("\n\n\r\n"), ParseOutcome::default());
    }

    #[test]
    fn test_concatenated_blocks_keep_order() {
        let a = record("ALARM_ON", 2024, 5, 1, 8, 0, 0);
        let b = record("ALARM_OFF", 2024, 5, 1, 8, 0, 9);
        let text = format!("{}{}", serialize(&a), serialize(&b));

        let outcome = parse_all(&text);
        assert_eq!(outcome.records, vec![a, b]);
    }

    #[test]
    fn test_crlf_layout() {
        // ctime newline followed by CRLF, as older controllers wrote it
        let text = "Event = GAS_DET_ON\r\nDate and Time = Sat Mar  9 14:05:07 2024\n\r\n";
        let outcome = parse_all(text);
        assert_eq!(outcome.records, vec![record("GAS_DET_ON", 2024, 3, 9, 14, 5, 7)]);
        assert_eq!(outcome.skipped, 0);
    }

    #[test]
    fn test_missing_trailing_separator() {
        let text = "Event = LED_SB_ON\nDate and Time = Sat Mar  9 14:05:07 2024";
        let outcome = parse_all(text);
        assert_eq!(outcome.records.len(), 1);
    }

    #[test]
    fn test_malformed_blocks_are_skipped() {
        let good = record("MOTION_OFF", 2024, 3, 9, 14, 5, 7);
        let text = format!(
            "Event = TRUNCATED_ON\n\n\
             Date and Time = Sat Mar  9 14:05:07 2024\n\n\
             Event = GAS_ON\nDate and Time = not a date\n\n\
             Event = GAS_ON\nDate and Time = Sat Mar  9 14:05:07 2024\nextra\n\n\
             Event = THIS_NAME_IS_TOO_LONG\nDate and Time = Sat Mar  9 14:05:07 2024\n\n\
             {}",
            serialize(&good)
        );

        let outcome = parse_all(&text);
        assert_eq!(outcome.records, vec![good]);
        assert_eq!(outcome.skipped, 5);
    }

    #[test]
    fn test_parse_block_reasons() {
        assert_eq!(parse_block(&["garbage"]), Err(BlockError::MissingEventLine));
        assert_eq!(
            parse_block(&["Event = A_ON"]),
            Err(BlockError::MissingTimestampLine)
        );
        assert!(matches!(
            parse_block(&["Event = A_ON", "Date and Time = yesterday"]),
            Err(BlockError::InvalidTimestamp { .. })
        ));
    }
}
