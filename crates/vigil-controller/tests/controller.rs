//! # Controller integration tests
//!
//! Runs the monitor task against a real storage directory, configured the
//! way the binary configures it.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use vigil_controller::{
    ConsoleCommand, ControllerConfig, MonitorHandle, MonitorSettings, MonitorTask, SignalBoard,
};
use vigil_eventlog::{
    EventMonitor, EventRecord, FsStorage, ManualClock, PersistenceCoordinator, RecoveryStatus,
};

fn write_config(dir: &TempDir, storage_root: &std::path::Path) -> std::path::PathBuf {
    let path = dir.path().join("vigil.toml");
    std::fs::write(
        &path,
        format!(
            "storage_root = {:?}\nlog_capacity = 4\npoll_interval_ms = 5\nclear_after_flush = true\n",
            storage_root.display().to_string()
        ),
    )
    .unwrap();
    path
}

async fn wait_for_events(handle: &MonitorHandle, count: usize) {
    for _ in 0..400 {
        if handle.status().await.unwrap().events >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("monitor never recorded {} events", count);
}

/// Test 1: console commands drive signals, flushes land on disk and recover
#[tokio::test]
async fn test_console_session_round_trip() {
    let temp = TempDir::new().unwrap();
    let config = ControllerConfig::load(write_config(&temp, &temp.path().join("sd"))).unwrap();
    assert_eq!(config.log_capacity, 4);

    let storage = Arc::new(FsStorage::create(&config.storage_root).unwrap());
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap(),
    ));
    let board = Arc::new(SignalBoard::new());
    let handle = MonitorTask::spawn(
        EventMonitor::new(config.log_capacity, clock.clone()),
        board.clone(),
        storage.clone(),
        PersistenceCoordinator::new(),
        MonitorSettings::from_config(&config).unwrap(),
    )
    .unwrap();

    for line in ["GAS_DET on", "led_ic ON"] {
        match line.parse::<ConsoleCommand>().unwrap() {
            ConsoleCommand::Set { signal, state } => board.set(signal.name(), state),
            other => panic!("unexpected command {:?}", other),
        }
    }
    wait_for_events(&handle, 2).await;

    let result = handle.flush().await.unwrap();
    assert_eq!(result.written(), 2);
    assert_eq!(result.file_name(), Some("2024_03_09_14_05_07.txt"));
    assert_eq!(handle.status().await.unwrap().events, 0);

    clock.advance(chrono::Duration::seconds(30));
    board.set("GAS_DET", false);
    wait_for_events(&handle, 1).await;
    handle.shutdown().await.unwrap();

    let text = std::fs::read_to_string(config.storage_root.join("2024_03_09_14_05_07.txt")).unwrap();
    assert!(text.starts_with("Event = "));
    assert!(text.contains("Date and Time = Sat Mar  9 14:05:07 2024\n\n"));

    let report = PersistenceCoordinator::new().recover_all(storage.as_ref());
    assert_eq!(report.status(), RecoveryStatus::Complete);
    assert_eq!(report.files.len(), 2);

    let mut names: Vec<_> = report.records().map(EventRecord::name).collect();
    names[..2].sort();
    assert_eq!(names, vec!["GAS_DET_ON", "LED_IC_ON", "GAS_DET_OFF"]);
}

/// Test 2: an unusable storage root is reported as unavailable
#[test]
fn test_recover_missing_root() {
    let temp = TempDir::new().unwrap();
    let storage = FsStorage::new(temp.path().join("absent"));

    let report = PersistenceCoordinator::new().recover_all(&storage);

    assert_eq!(report.status(), RecoveryStatus::Unavailable);
    assert_eq!(report.total_records(), 0);
}
