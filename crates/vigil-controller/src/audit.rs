//! Rendering of recovery reports for the `recover` command
//!
//! Text output is for people at the console; JSON lines (one event per line,
//! tagged with the file it came from) are for feeding other tools.

use std::fmt::Write;

use serde::Serialize;
use vigil_eventlog::{EventRecord, RecoveryReport};

/// One recovered event with the file it was read from
#[derive(Debug, Serialize)]
pub struct AuditEntry<'a> {
    pub file: &'a str,
    #[serde(flatten)]
    pub record: &'a EventRecord,
}

/// Every recovered event, in file order then block order
pub fn entries(report: &RecoveryReport) -> impl Iterator<Item = AuditEntry<'_>> + '_ {
    report.files.iter().flat_map(|file| {
        file.records.iter().map(move |record| AuditEntry {
            file: &file.file_name,
            record,
        })
    })
}

/// One JSON object per recovered event, newline terminated
pub fn to_json_lines(report: &RecoveryReport) -> serde_json::Result<String> {
    let mut out = String::new();
    for entry in entries(report) {
        out.push_str(&serde_json::to_string(&entry)?);
        out.push('\n');
    }
    Ok(out)
}

/// Human-readable listing grouped by file, with unreadable files and totals
pub fn to_text(report: &RecoveryReport) -> String {
    let mut out = String::new();

    for file in &report.files {
        let _ = writeln!(
            out,
            "{} ({} events, {} skipped)",
            file.file_name,
            file.records.len(),
            file.skipped
        );
        for record in &file.records {
            let _ = writeln!(
                out,
                "  {:<13}  {}",
                record.name(),
                record.timestamp().format("%Y-%m-%d %H:%M:%S")
            );
        }
    }
    for failure in &report.failures {
        let _ = writeln!(out, "{}: {}", failure.file_name, failure.error);
    }
    let _ = writeln!(
        out,
        "{} events in {} files, {} blocks skipped",
        report.total_records(),
        report.files.len(),
        report.total_skipped()
    );

    out
}
