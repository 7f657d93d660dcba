use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::record::{TaskState, WeightEntry};
use crate::error::StoreError;
use crate::identity::OwnerId;

/// The scalar part of a progress record, one row per owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub start_date: NaiveDate,
    pub initial_weight: Option<f64>,
    pub current_weight: Option<f64>,
    pub streak: u32,
    pub last_check_in: Option<NaiveDate>,
    pub ritual_completed_on: Option<NaiveDate>,
}

impl Profile {
    pub fn new(start_date: NaiveDate) -> Self {
        Self {
            name: String::new(),
            start_date,
            initial_weight: None,
            current_weight: None,
            streak: 0,
            last_check_in: None,
            ritual_completed_on: None,
        }
    }

    pub fn apply(&mut self, field: &ProfileField) {
        match field {
            ProfileField::Name(name) => self.name = name.clone(),
            ProfileField::StartDate(date) => self.start_date = *date,
            ProfileField::InitialWeight(w) => self.initial_weight = *w,
            ProfileField::CurrentWeight(w) => self.current_weight = *w,
            ProfileField::Streak(s) => self.streak = *s,
            ProfileField::LastCheckIn(d) => self.last_check_in = *d,
            ProfileField::RitualCompletedOn(d) => self.ritual_completed_on = *d,
        }
    }
}

/// A single-column profile update.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileField {
    Name(String),
    StartDate(NaiveDate),
    InitialWeight(Option<f64>),
    CurrentWeight(Option<f64>),
    Streak(u32),
    LastCheckIn(Option<NaiveDate>),
    RitualCompletedOn(Option<NaiveDate>),
}

/// External record store consumed by [`super::ProgressStore`].
///
/// Every call is a complete unit of work; the store re-reads after each
/// mutation instead of trusting its own copy.
pub trait RecordBackend: Send {
    /// Short identifier for logs ("sqlite", "snapshot").
    fn name(&self) -> &str;

    fn fetch_profile(&self, owner: &OwnerId) -> Result<Option<Profile>, StoreError>;

    fn insert_profile(&self, owner: &OwnerId, profile: &Profile) -> Result<(), StoreError>;

    fn update_profile(&self, owner: &OwnerId, fields: &[ProfileField]) -> Result<(), StoreError>;

    /// Weight history in ascending date order.
    fn weight_history(&self, owner: &OwnerId) -> Result<Vec<WeightEntry>, StoreError>;

    /// Insert or replace the entry for `(owner, entry.date)`.
    fn upsert_weight(&self, owner: &OwnerId, entry: &WeightEntry) -> Result<(), StoreError>;

    /// Task rows stored for `(owner, date)`. Missing tasks are uncompleted.
    fn task_states(&self, owner: &OwnerId, date: NaiveDate) -> Result<Vec<TaskState>, StoreError>;

    /// Insert or replace the row for `(owner, state.task_id, date)`.
    fn upsert_task_state(
        &self,
        owner: &OwnerId,
        date: NaiveDate,
        state: &TaskState,
    ) -> Result<(), StoreError>;

    fn delete_task_states(&self, owner: &OwnerId, date: NaiveDate) -> Result<(), StoreError>;

    /// Delete every weight and task row for `owner`.
    fn clear_history(&self, owner: &OwnerId) -> Result<(), StoreError>;

    /// Record a day confirmation and clear that day's checklist.
    fn check_in(
        &self,
        owner: &OwnerId,
        date: NaiveDate,
        fields: &[ProfileField],
    ) -> Result<(), StoreError> {
        self.update_profile(owner, fields)?;
        self.delete_task_states(owner, date)
    }

    /// Reset profile fields and drop all history for `owner`.
    fn reset(&self, owner: &OwnerId, fields: &[ProfileField]) -> Result<(), StoreError> {
        self.update_profile(owner, fields)?;
        self.clear_history(owner)
    }

    /// Set a weight field and, when given, upsert the matching history entry.
    /// Either both writes land or the profile weights are restored.
    fn record_weight(
        &self,
        owner: &OwnerId,
        field: &ProfileField,
        entry: Option<&WeightEntry>,
    ) -> Result<(), StoreError> {
        let Some(entry) = entry else {
            return self.update_profile(owner, std::slice::from_ref(field));
        };
        let previous = self.fetch_profile(owner)?;
        self.update_profile(owner, std::slice::from_ref(field))?;
        if let Err(e) = self.upsert_weight(owner, entry) {
            if let Some(previous) = previous {
                let restore = [
                    ProfileField::InitialWeight(previous.initial_weight),
                    ProfileField::CurrentWeight(previous.current_weight),
                ];
                if let Err(undo) = self.update_profile(owner, &restore) {
                    warn!(owner = %owner, error = %undo, "failed to restore weights");
                }
            }
            return Err(e);
        }
        Ok(())
    }
}

impl<B: RecordBackend + ?Sized> RecordBackend for Box<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch_profile(&self, owner: &OwnerId) -> Result<Option<Profile>, StoreError> {
        (**self).fetch_profile(owner)
    }

    fn insert_profile(&self, owner: &OwnerId, profile: &Profile) -> Result<(), StoreError> {
        (**self).insert_profile(owner, profile)
    }

    fn update_profile(&self, owner: &OwnerId, fields: &[ProfileField]) -> Result<(), StoreError> {
        (**self).update_profile(owner, fields)
    }

    fn weight_history(&self, owner: &OwnerId) -> Result<Vec<WeightEntry>, StoreError> {
        (**self).weight_history(owner)
    }

    fn upsert_weight(&self, owner: &OwnerId, entry: &WeightEntry) -> Result<(), StoreError> {
        (**self).upsert_weight(owner, entry)
    }

    fn task_states(&self, owner: &OwnerId, date: NaiveDate) -> Result<Vec<TaskState>, StoreError> {
        (**self).task_states(owner, date)
    }

    fn upsert_task_state(
        &self,
        owner: &OwnerId,
        date: NaiveDate,
        state: &TaskState,
    ) -> Result<(), StoreError> {
        (**self).upsert_task_state(owner, date, state)
    }

    fn delete_task_states(&self, owner: &OwnerId, date: NaiveDate) -> Result<(), StoreError> {
        (**self).delete_task_states(owner, date)
    }

    fn clear_history(&self, owner: &OwnerId) -> Result<(), StoreError> {
        (**self).clear_history(owner)
    }

    fn check_in(
        &self,
        owner: &OwnerId,
        date: NaiveDate,
        fields: &[ProfileField],
    ) -> Result<(), StoreError> {
        (**self).check_in(owner, date, fields)
    }

    fn reset(&self, owner: &OwnerId, fields: &[ProfileField]) -> Result<(), StoreError> {
        (**self).reset(owner, fields)
    }

    fn record_weight(
        &self,
        owner: &OwnerId,
        field: &ProfileField,
        entry: Option<&WeightEntry>,
    ) -> Result<(), StoreError> {
        (**self).record_weight(owner, field, entry)
    }
}
