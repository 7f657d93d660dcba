//! Local JSON snapshot record store.
//!
//! One blob per owner under `<dir>/<owner>.json`, holding the whole record:
//!
//! ```json
//! {
//!   "name": "Ana",
//!   "startDate": "2024-03-01",
//!   "initialWeight": 82.0,
//!   "currentWeight": 80.5,
//!   "streak": 3,
//!   "lastCheckIn": "2024-03-03",
//!   "ritualCompletedOn": "2024-03-03",
//!   "weightHistory": [{ "date": "2024-03-01", "weight": 80.5 }],
//!   "protocolChecks": [{ "id": "water", "label": "...", "pillar": "...",
//!                        "description": "...", "guidance": "...", "completed": true }],
//!   "checksDate": "2024-03-04"
//! }
//! ```
//!
//! Older blobs are upgraded on read by [`migrate_snapshot`].

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::identity::OwnerId;
use crate::progress::{Profile, ProfileField, RecordBackend, TaskState, WeightEntry};
use crate::protocol::{Catalog, TaskDefinition};

/// Directory name for snapshot blobs inside the data directory.
pub const SNAPSHOT_DIR: &str = "snapshots";

const LEGACY_CHECKS_KEY: &str = "routineChecks";
const CHECKS_KEY: &str = "protocolChecks";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProtocolCheck {
    id: String,
    #[serde(default)]
    label: String,
    #[serde(default)]
    pillar: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    guidance: String,
    #[serde(default)]
    completed: bool,
}

impl ProtocolCheck {
    fn from_definition(def: &TaskDefinition, completed: bool) -> Self {
        Self {
            id: def.id.clone(),
            label: def.label.clone(),
            pillar: def.pillar.clone(),
            description: def.description.clone(),
            guidance: def.guidance.clone(),
            completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snapshot {
    #[serde(default)]
    name: String,
    start_date: NaiveDate,
    #[serde(default)]
    initial_weight: Option<f64>,
    #[serde(default)]
    current_weight: Option<f64>,
    #[serde(default)]
    streak: u32,
    #[serde(default)]
    last_check_in: Option<NaiveDate>,
    #[serde(default, alias = "ritualCompletedDate")]
    ritual_completed_on: Option<NaiveDate>,
    #[serde(default)]
    weight_history: Vec<WeightEntry>,
    #[serde(default)]
    protocol_checks: Vec<ProtocolCheck>,
    #[serde(default)]
    checks_date: Option<NaiveDate>,
}

impl Snapshot {
    fn profile(&self) -> Profile {
        Profile {
            name: self.name.clone(),
            start_date: self.start_date,
            initial_weight: self.initial_weight,
            current_weight: self.current_weight,
            streak: self.streak,
            last_check_in: self.last_check_in,
            ritual_completed_on: self.ritual_completed_on,
        }
    }

    fn apply(&mut self, field: &ProfileField) {
        let mut profile = self.profile();
        profile.apply(field);
        self.name = profile.name;
        self.start_date = profile.start_date;
        self.initial_weight = profile.initial_weight;
        self.current_weight = profile.current_weight;
        self.streak = profile.streak;
        self.last_check_in = profile.last_check_in;
        self.ritual_completed_on = profile.ritual_completed_on;
    }

    /// Checklist rows if they belong to `date`. Blobs without a date are
    /// taken to be current.
    fn checks_for(&self, date: NaiveDate) -> Option<&[ProtocolCheck]> {
        match self.checks_date {
            Some(d) if d != date => None,
            _ => Some(&self.protocol_checks),
        }
    }

    fn reseed_checks(&mut self, catalog: &Catalog, date: NaiveDate) {
        self.protocol_checks = seed_checks(catalog, |_| false);
        self.checks_date = Some(date);
    }
}

fn seed_checks<F>(catalog: &Catalog, mut completed: F) -> Vec<ProtocolCheck>
where
    F: FnMut(&str) -> bool,
{
    catalog
        .items()
        .iter()
        .map(|def| ProtocolCheck::from_definition(def, completed(&def.id)))
        .collect()
}

fn seed_checks_value(catalog: &Catalog, flags: &HashMap<String, bool>) -> Value {
    let checks = seed_checks(catalog, |id| flags.get(id).copied().unwrap_or(false));
    serde_json::to_value(checks).unwrap_or(Value::Array(Vec::new()))
}

/// Completed flags from a legacy toggle list (`[{"id", "completed"}]` or
/// `["id"]`) or map (`{"id": true}`).
fn legacy_flags(legacy: &Value) -> HashMap<String, bool> {
    match legacy {
        Value::Object(map) => map
            .iter()
            .map(|(id, v)| (id.clone(), v.as_bool().unwrap_or(false)))
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(id) => Some((id.clone(), true)),
                Value::Object(obj) => {
                    let id = obj.get("id")?.as_str()?.to_string();
                    let done = obj
                        .get("completed")
                        .or_else(|| obj.get("checked"))
                        .and_then(Value::as_bool)
                        .unwrap_or(false);
                    Some((id, done))
                }
                _ => None,
            })
            .collect(),
        _ => HashMap::new(),
    }
}

/// Rich checks need re-seeding when any row lacks its descriptive metadata
/// or the ids no longer match the catalog.
fn checks_need_reseed(checks: &[Value], catalog: &Catalog) -> bool {
    let has_metadata = |c: &Value| {
        c.get("pillar")
            .and_then(Value::as_str)
            .is_some_and(|p| !p.is_empty())
    };
    let ids: Vec<&str> = checks
        .iter()
        .filter_map(|c| c.get("id").and_then(Value::as_str))
        .collect();
    let catalog_ids: Vec<&str> = catalog.items().iter().map(|d| d.id.as_str()).collect();
    !checks.iter().all(has_metadata) || ids != catalog_ids
}

/// Upgrade an older blob in place. Returns true if anything changed.
///
/// - a legacy `routineChecks` field without `protocolChecks` seeds the full
///   checklist from the catalog, carrying completed flags over by id; the
///   legacy field is dropped either way;
/// - a missing `protocolChecks` is seeded uncompleted;
/// - rich checks lacking metadata are re-seeded, keeping completed flags.
pub fn migrate_snapshot(blob: &mut Value, catalog: &Catalog) -> bool {
    let Some(obj) = blob.as_object_mut() else {
        return false;
    };
    let mut changed = false;

    if let Some(legacy) = obj.remove(LEGACY_CHECKS_KEY) {
        changed = true;
        if !obj.contains_key(CHECKS_KEY) {
            let flags = legacy_flags(&legacy);
            obj.insert(CHECKS_KEY.into(), seed_checks_value(catalog, &flags));
        }
    }

    let reseed = match obj.get(CHECKS_KEY) {
        Some(current @ Value::Array(checks)) => {
            checks_need_reseed(checks, catalog).then(|| legacy_flags(current))
        }
        _ => Some(HashMap::new()),
    };
    if let Some(flags) = reseed {
        obj.insert(CHECKS_KEY.into(), seed_checks_value(catalog, &flags));
        changed = true;
    }

    changed
}

/// Record store keeping one JSON blob per owner on disk.
pub struct SnapshotBackend {
    dir: PathBuf,
    catalog: Catalog,
}

impl SnapshotBackend {
    /// Store blobs under `dir`, creating it if needed.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>, catalog: Catalog) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| io_error(&dir, &e))?;
        Ok(Self { dir, catalog })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, owner: &OwnerId) -> PathBuf {
        self.dir.join(format!("{}.json", owner.as_str()))
    }

    fn read(&self, owner: &OwnerId) -> Result<Option<Snapshot>, StoreError> {
        let path = self.path_for(owner);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(&path, &e)),
        };
        let corrupt = |e: serde_json::Error| StoreError::CorruptSnapshot {
            path: path.clone(),
            message: e.to_string(),
        };

        let mut blob: Value = serde_json::from_str(&content).map_err(corrupt)?;
        let migrated = migrate_snapshot(&mut blob, &self.catalog);
        let snapshot: Snapshot = serde_json::from_value(blob).map_err(corrupt)?;
        if migrated {
            info!(owner = %owner, path = %path.display(), "migrated snapshot to current format");
            self.write(owner, &snapshot)?;
        }
        Ok(Some(snapshot))
    }

    fn read_existing(&self, owner: &OwnerId) -> Result<Snapshot, StoreError> {
        self.read(owner)?
            .ok_or_else(|| StoreError::QueryFailed(format!("no snapshot for owner {owner}")))
    }

    fn write(&self, owner: &OwnerId, snapshot: &Snapshot) -> Result<(), StoreError> {
        let path = self.path_for(owner);
        let content = serde_json::to_string_pretty(snapshot)
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content).map_err(|e| io_error(&tmp, &e))?;
        fs::rename(&tmp, &path).map_err(|e| io_error(&path, &e))?;
        debug!(owner = %owner, path = %path.display(), "snapshot written");
        Ok(())
    }

    fn modify<F>(&self, owner: &OwnerId, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Snapshot, &Catalog),
    {
        let mut snapshot = self.read_existing(owner)?;
        f(&mut snapshot, &self.catalog);
        self.write(owner, &snapshot)
    }
}

fn io_error(path: &Path, e: &std::io::Error) -> StoreError {
    StoreError::Unavailable(format!("{}: {e}", path.display()))
}

impl RecordBackend for SnapshotBackend {
    fn name(&self) -> &str {
        "snapshot"
    }

    fn fetch_profile(&self, owner: &OwnerId) -> Result<Option<Profile>, StoreError> {
        Ok(self.read(owner)?.map(|s| s.profile()))
    }

    fn insert_profile(&self, owner: &OwnerId, profile: &Profile) -> Result<(), StoreError> {
        let snapshot = Snapshot {
            name: profile.name.clone(),
            start_date: profile.start_date,
            initial_weight: profile.initial_weight,
            current_weight: profile.current_weight,
            streak: profile.streak,
            last_check_in: profile.last_check_in,
            ritual_completed_on: profile.ritual_completed_on,
            weight_history: Vec::new(),
            protocol_checks: seed_checks(&self.catalog, |_| false),
            checks_date: Some(profile.start_date),
        };
        self.write(owner, &snapshot)
    }

    fn update_profile(&self, owner: &OwnerId, fields: &[ProfileField]) -> Result<(), StoreError> {
        self.modify(owner, |s, _| fields.iter().for_each(|f| s.apply(f)))
    }

    fn weight_history(&self, owner: &OwnerId) -> Result<Vec<WeightEntry>, StoreError> {
        Ok(self.read(owner)?.map(|s| s.weight_history).unwrap_or_default())
    }

    fn upsert_weight(&self, owner: &OwnerId, entry: &WeightEntry) -> Result<(), StoreError> {
        self.modify(owner, |s, _| {
            crate::progress::record::upsert_weight_entry(&mut s.weight_history, *entry);
        })
    }

    fn task_states(&self, owner: &OwnerId, date: NaiveDate) -> Result<Vec<TaskState>, StoreError> {
        let Some(snapshot) = self.read(owner)? else {
            return Ok(Vec::new());
        };
        Ok(snapshot
            .checks_for(date)
            .unwrap_or_default()
            .iter()
            .map(|c| TaskState {
                task_id: c.id.clone(),
                completed: c.completed,
            })
            .collect())
    }

    fn upsert_task_state(
        &self,
        owner: &OwnerId,
        date: NaiveDate,
        state: &TaskState,
    ) -> Result<(), StoreError> {
        self.modify(owner, |s, catalog| {
            if s.checks_for(date).is_none() {
                s.reseed_checks(catalog, date);
            }
            s.checks_date = Some(date);
            match s.protocol_checks.iter_mut().find(|c| c.id == state.task_id) {
                Some(check) => check.completed = state.completed,
                None => debug!(task_id = %state.task_id, "task not in snapshot checklist"),
            }
        })
    }

    fn delete_task_states(&self, owner: &OwnerId, date: NaiveDate) -> Result<(), StoreError> {
        self.modify(owner, |s, catalog| s.reseed_checks(catalog, date))
    }

    fn clear_history(&self, owner: &OwnerId) -> Result<(), StoreError> {
        self.modify(owner, |s, catalog| {
            s.weight_history.clear();
            let date = s.checks_date.unwrap_or(s.start_date);
            s.reseed_checks(catalog, date);
        })
    }

    fn check_in(
        &self,
        owner: &OwnerId,
        date: NaiveDate,
        fields: &[ProfileField],
    ) -> Result<(), StoreError> {
        self.modify(owner, |s, catalog| {
            fields.iter().for_each(|f| s.apply(f));
            s.reseed_checks(catalog, date);
        })
    }

    fn reset(&self, owner: &OwnerId, fields: &[ProfileField]) -> Result<(), StoreError> {
        self.modify(owner, |s, catalog| {
            fields.iter().for_each(|f| s.apply(f));
            s.weight_history.clear();
            s.reseed_checks(catalog, s.start_date);
        })
    }

    fn record_weight(
        &self,
        owner: &OwnerId,
        field: &ProfileField,
        entry: Option<&WeightEntry>,
    ) -> Result<(), StoreError> {
        self.modify(owner, |s, _| {
            s.apply(field);
            if let Some(entry) = entry {
                crate::progress::record::upsert_weight_entry(&mut s.weight_history, *entry);
            }
        })
    }
}
