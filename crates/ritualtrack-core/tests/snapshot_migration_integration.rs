//! Integration tests for loading older snapshot blobs through the store.

use std::fs;
use std::sync::Arc;

use chrono::NaiveDate;
use ritualtrack_core::progress::ProgressStore;
use ritualtrack_core::storage::SnapshotBackend;
use ritualtrack_core::{FixedClock, OwnerId, Protocol, StaticIdentity};
use serde_json::{json, Value};

const OWNER: &str = "ritualtrack-legacy";

fn setup(blob: Value, today: NaiveDate) -> (tempfile::TempDir, ProgressStore<SnapshotBackend>) {
    let dir = tempfile::tempdir().unwrap();
    let backend = SnapshotBackend::new(dir.path(), Protocol::standard().catalog).unwrap();
    fs::write(backend.path_for(&OwnerId::new(OWNER)), blob.to_string()).unwrap();

    let store = ProgressStore::open(
        backend,
        &StaticIdentity::signed_in(OWNER),
        Arc::new(FixedClock::at_date(today)),
        Protocol::standard(),
    )
    .unwrap();
    (dir, store)
}

#[test]
fn test_legacy_toggle_map_becomes_full_checklist() {
    let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
    let blob = json!({
        "name": "Bia",
        "startDate": "2024-06-01",
        "initialWeight": 70.0,
        "currentWeight": 68.5,
        "streak": 4,
        "lastCheckIn": "2024-06-09",
        "weightHistory": [
            { "date": "2024-06-01", "weight": 70.0 },
            { "date": "2024-06-09", "weight": 68.5 }
        ],
        "routineChecks": { "water": true, "sleep": false }
    });
    let (dir, store) = setup(blob, today);

    let record = store.record().unwrap();
    assert_eq!(record.name, "Bia");
    assert_eq!(record.streak, 4);
    assert_eq!(record.weight_history.len(), 2);
    assert_eq!(record.daily_tasks.len(), 5);
    for task in &record.daily_tasks {
        assert_eq!(task.completed, task.task_id == "water", "task {}", task.task_id);
    }

    let stored: Value = serde_json::from_str(
        &fs::read_to_string(dir.path().join(format!("{OWNER}.json"))).unwrap(),
    )
    .unwrap();
    assert!(stored.get("routineChecks").is_none());
    assert_eq!(stored["protocolChecks"].as_array().unwrap().len(), 5);
}

#[test]
fn test_blob_from_previous_day_starts_fresh_checklist() {
    let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
    let blob = json!({
        "startDate": "2024-06-01",
        "protocolChecks": [
            { "id": "water", "label": "Water", "pillar": "Hydration",
              "description": "", "guidance": "", "completed": true },
            { "id": "method", "label": "Method", "pillar": "Method",
              "description": "", "guidance": "", "completed": true },
            { "id": "walk", "label": "Walk", "pillar": "Movement",
              "description": "", "guidance": "", "completed": true },
            { "id": "sleep", "label": "Sleep", "pillar": "Rest",
              "description": "", "guidance": "", "completed": true },
            { "id": "avoid", "label": "Avoid", "pillar": "Nutrition",
              "description": "", "guidance": "", "completed": true }
        ],
        "checksDate": "2024-06-09"
    });
    let (_dir, mut store) = setup(blob, today);
    assert_eq!(store.record().unwrap().completed_tasks(), 0);

    store.toggle_task("avoid").unwrap();
    store.reload().unwrap();
    assert_eq!(store.record().unwrap().completed_tasks(), 1);
}
