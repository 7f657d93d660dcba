//! In-process record backend for tests and ephemeral sessions.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::NaiveDate;

use super::backend::{Profile, ProfileField, RecordBackend};
use super::record::{TaskState, WeightEntry};
use crate::error::StoreError;
use crate::identity::OwnerId;

#[derive(Debug, Default)]
struct Tables {
    profiles: HashMap<OwnerId, Profile>,
    weights: HashMap<OwnerId, BTreeMap<NaiveDate, f64>>,
    checks: HashMap<(OwnerId, NaiveDate), BTreeMap<String, bool>>,
}

/// Keeps every table in memory. Can be switched offline to simulate an
/// unreachable store.
#[derive(Debug)]
pub struct MemoryBackend {
    tables: Mutex<Tables>,
    available: AtomicBool,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            available: AtomicBool::new(true),
        }
    }
}

impl MemoryBackend {
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn tables(&self) -> Result<std::sync::MutexGuard<'_, Tables>, StoreError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory backend is offline".into()));
        }
        Ok(self.tables.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

impl RecordBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    fn fetch_profile(&self, owner: &OwnerId) -> Result<Option<Profile>, StoreError> {
        Ok(self.tables()?.profiles.get(owner).cloned())
    }

    fn insert_profile(&self, owner: &OwnerId, profile: &Profile) -> Result<(), StoreError> {
        self.tables()?
            .profiles
            .insert(owner.clone(), profile.clone());
        Ok(())
    }

    fn update_profile(&self, owner: &OwnerId, fields: &[ProfileField]) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        let profile = tables
            .profiles
            .get_mut(owner)
            .ok_or_else(|| StoreError::QueryFailed(format!("no profile for owner {owner}")))?;
        for field in fields {
            profile.apply(field);
        }
        Ok(())
    }

    fn weight_history(&self, owner: &OwnerId) -> Result<Vec<WeightEntry>, StoreError> {
        Ok(self
            .tables()?
            .weights
            .get(owner)
            .map(|w| {
                w.iter()
                    .map(|(date, weight)| WeightEntry {
                        date: *date,
                        weight: *weight,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn upsert_weight(&self, owner: &OwnerId, entry: &WeightEntry) -> Result<(), StoreError> {
        self.tables()?
            .weights
            .entry(owner.clone())
            .or_default()
            .insert(entry.date, entry.weight);
        Ok(())
    }

    fn task_states(&self, owner: &OwnerId, date: NaiveDate) -> Result<Vec<TaskState>, StoreError> {
        Ok(self
            .tables()?
            .checks
            .get(&(owner.clone(), date))
            .map(|rows| {
                rows.iter()
                    .map(|(task_id, completed)| TaskState {
                        task_id: task_id.clone(),
                        completed: *completed,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn upsert_task_state(
        &self,
        owner: &OwnerId,
        date: NaiveDate,
        state: &TaskState,
    ) -> Result<(), StoreError> {
        self.tables()?
            .checks
            .entry((owner.clone(), date))
            .or_default()
            .insert(state.task_id.clone(), state.completed);
        Ok(())
    }

    fn delete_task_states(&self, owner: &OwnerId, date: NaiveDate) -> Result<(), StoreError> {
        self.tables()?.checks.remove(&(owner.clone(), date));
        Ok(())
    }

    fn clear_history(&self, owner: &OwnerId) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        tables.weights.remove(owner);
        tables.checks.retain(|(o, _), _| o != owner);
        Ok(())
    }

    fn record_weight(
        &self,
        owner: &OwnerId,
        field: &ProfileField,
        entry: Option<&WeightEntry>,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        let profile = tables
            .profiles
            .get_mut(owner)
            .ok_or_else(|| StoreError::QueryFailed(format!("no profile for owner {owner}")))?;
        profile.apply(field);
        if let Some(entry) = entry {
            tables
                .weights
                .entry(owner.clone())
                .or_default()
                .insert(entry.date, entry.weight);
        }
        Ok(())
    }
}
