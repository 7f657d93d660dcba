//! Progress state store.
//!
//! Owns the record for one owner and exposes the mutation operations. Each
//! mutation writes through the backend and then reloads the record, so the
//! in-memory copy only ever reflects state the backend confirmed. The one
//! exception is [`ProgressStore::toggle_task`], which flips the local copy
//! before the write is acknowledged; a failed write leaves that flip in place.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::backend::{Profile, ProfileField, RecordBackend};
use super::record::{parse_weight_input, ProgressRecord, WeightEntry, WeightKind};
use crate::dates::{self, Clock};
use crate::error::{Result, StoreError};
use crate::identity::{IdentityProvider, OwnerId};
use crate::protocol::Protocol;
use crate::views::ProgressView;

/// Result of a mutation that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Applied,
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No owner is signed in.
    NoIdentity,
    /// The day was already confirmed.
    AlreadyConfirmed,
    /// The task id is not part of today's checklist.
    UnknownTask,
}

pub struct ProgressStore<B: RecordBackend> {
    backend: B,
    owner: Option<OwnerId>,
    clock: Arc<dyn Clock>,
    protocol: Protocol,
    record: Option<ProgressRecord>,
    loaded_on: Option<NaiveDate>,
}

impl<B: RecordBackend> ProgressStore<B> {
    /// Build a store for the current session and load its record, creating
    /// an empty profile on first use. Without an owner the store holds no
    /// record and every mutation is skipped.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be read.
    pub fn open(
        backend: B,
        identity: &dyn IdentityProvider,
        clock: Arc<dyn Clock>,
        protocol: Protocol,
    ) -> Result<Self> {
        let mut store = Self {
            backend,
            owner: identity.current_owner(),
            clock,
            protocol,
            record: None,
            loaded_on: None,
        };
        match store.owner.clone() {
            Some(owner) => {
                store.reload()?;
                debug!(owner = %owner, backend = store.backend.name(), "progress store opened");
            }
            None => debug!(backend = store.backend.name(), "progress store opened without identity"),
        }
        Ok(store)
    }

    pub fn record(&self) -> Option<&ProgressRecord> {
        self.record.as_ref()
    }

    pub fn owner(&self) -> Option<&OwnerId> {
        self.owner.as_ref()
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn is_checked_in_today(&self) -> bool {
        let today = self.today();
        self.record
            .as_ref()
            .is_some_and(|r| r.is_checked_in_on(today))
    }

    /// Day of the journey, 1 when no record is loaded.
    pub fn days_elapsed(&self) -> u32 {
        self.record
            .as_ref()
            .map_or(1, |r| dates::days_elapsed(r.start_date, self.clock.now()))
    }

    pub fn weight_lost(&self) -> f64 {
        self.record.as_ref().map_or(0.0, ProgressRecord::weight_lost)
    }

    /// Every derived value for the loaded record.
    pub fn view(&self) -> Option<ProgressView> {
        self.record
            .as_ref()
            .map(|r| ProgressView::compute(r, &self.protocol, self.clock.now()))
    }

    /// Re-read the record from the backend. On failure the previously
    /// loaded record is kept.
    ///
    /// # Errors
    /// Returns an error if any backend read fails.
    pub fn reload(&mut self) -> Result<()> {
        let Some(owner) = self.owner.clone() else {
            return Ok(());
        };
        let today = self.today();
        match self.load_record(&owner, today) {
            Ok(record) => {
                self.record = Some(record);
                self.loaded_on = Some(today);
                Ok(())
            }
            Err(e) => {
                warn!(owner = %owner, error = %e, "failed to load progress record");
                Err(e.into())
            }
        }
    }

    fn load_record(&self, owner: &OwnerId, today: NaiveDate) -> Result<ProgressRecord, StoreError> {
        let profile = match self.backend.fetch_profile(owner)? {
            Some(profile) => profile,
            None => {
                let profile = Profile::new(today);
                self.backend.insert_profile(owner, &profile)?;
                info!(owner = %owner, start_date = %today, "created progress profile");
                profile
            }
        };

        let mut weight_history = self.backend.weight_history(owner)?;
        weight_history.sort_by_key(|e| e.date);
        weight_history.dedup_by_key(|e| e.date);

        let stored: HashMap<String, bool> = self
            .backend
            .task_states(owner, today)?
            .into_iter()
            .map(|t| (t.task_id, t.completed))
            .collect();
        let daily_tasks = self
            .protocol
            .catalog
            .seed_with(|id| stored.get(id).copied().unwrap_or(false));

        Ok(ProgressRecord {
            name: profile.name,
            start_date: profile.start_date,
            initial_weight: profile.initial_weight,
            current_weight: profile.current_weight,
            streak: profile.streak,
            last_check_in: profile.last_check_in,
            ritual_completed_on: profile.ritual_completed_on,
            weight_history,
            daily_tasks,
        })
    }

    /// Owner of the session, reloading first if the calendar day changed
    /// since the last load so the checklist belongs to today.
    fn session_owner(&mut self) -> Result<Option<OwnerId>> {
        let Some(owner) = self.owner.clone() else {
            debug!("mutation skipped: no identity");
            return Ok(None);
        };
        if self.record.is_none() || self.loaded_on != Some(self.today()) {
            self.reload()?;
        }
        Ok(Some(owner))
    }

    fn write<T>(&self, owner: &OwnerId, op: &str, result: Result<T, StoreError>) -> Result<T> {
        result.map_err(|e| {
            warn!(owner = %owner, op, error = %e, "record store write failed");
            e.into()
        })
    }

    /// Set the initial or current weight. Setting the current weight also
    /// upserts today's history entry.
    ///
    /// # Errors
    /// Returns an error if the backend write or the reload fails.
    pub fn update_weight(&mut self, kind: WeightKind, value: Option<f64>) -> Result<Outcome> {
        let Some(owner) = self.session_owner()? else {
            return Ok(Outcome::Skipped(SkipReason::NoIdentity));
        };
        let today = self.today();

        let field = match kind {
            WeightKind::Initial => ProfileField::InitialWeight(value),
            WeightKind::Current => ProfileField::CurrentWeight(value),
        };
        let entry = match (kind, value) {
            (WeightKind::Current, Some(weight)) => Some(WeightEntry { date: today, weight }),
            _ => None,
        };
        self.write(
            &owner,
            "update_weight",
            self.backend.record_weight(&owner, &field, entry.as_ref()),
        )?;

        info!(owner = %owner, ?kind, ?value, "weight updated");
        self.reload()?;
        Ok(Outcome::Applied)
    }

    /// [`Self::update_weight`] from user-entered text; unparseable text
    /// clears the field.
    ///
    /// # Errors
    /// Returns an error if the backend write or the reload fails.
    pub fn update_weight_text(&mut self, kind: WeightKind, text: &str) -> Result<Outcome> {
        let value = parse_weight_input(text);
        if value.is_none() && !text.trim().is_empty() {
            debug!(?kind, input = text, "unparseable weight input clears the field");
        }
        self.update_weight(kind, value)
    }

    /// Flip one task of today's checklist. Unknown ids are ignored.
    ///
    /// # Errors
    /// Returns an error if the backend write fails. The local flip is kept.
    pub fn toggle_task(&mut self, task_id: &str) -> Result<Outcome> {
        let Some(owner) = self.session_owner()? else {
            return Ok(Outcome::Skipped(SkipReason::NoIdentity));
        };
        let today = self.today();

        let Some(task) = self
            .record
            .as_mut()
            .and_then(|r| r.daily_tasks.iter_mut().find(|t| t.task_id == task_id))
        else {
            debug!(owner = %owner, task_id, "toggle skipped: unknown task");
            return Ok(Outcome::Skipped(SkipReason::UnknownTask));
        };
        task.completed = !task.completed;
        let state = task.clone();

        self.write(
            &owner,
            "toggle_task",
            self.backend.upsert_task_state(&owner, today, &state),
        )?;
        info!(owner = %owner, task_id, completed = state.completed, "task toggled");
        Ok(Outcome::Applied)
    }

    /// Confirm today's ritual. At most once per calendar day.
    ///
    /// Extends the streak when yesterday was confirmed, otherwise restarts
    /// it at 1, and clears today's checklist for a fresh start.
    ///
    /// # Errors
    /// Returns an error if the backend write or the reload fails.
    pub fn confirm_day(&mut self) -> Result<Outcome> {
        let Some(owner) = self.session_owner()? else {
            return Ok(Outcome::Skipped(SkipReason::NoIdentity));
        };
        let today = self.today();

        let Some(record) = self.record.as_ref() else {
            return Ok(Outcome::Skipped(SkipReason::NoIdentity));
        };
        if record.is_checked_in_on(today) {
            debug!(owner = %owner, %today, "confirm skipped: already confirmed");
            return Ok(Outcome::Skipped(SkipReason::AlreadyConfirmed));
        }

        let streak = record.next_streak(today);
        let fields = [
            ProfileField::Streak(streak),
            ProfileField::LastCheckIn(Some(today)),
            ProfileField::RitualCompletedOn(Some(today)),
        ];
        self.write(&owner, "confirm_day", self.backend.check_in(&owner, today, &fields))?;

        info!(owner = %owner, %today, streak, "day confirmed");
        self.reload()?;
        Ok(Outcome::Applied)
    }

    /// Clear all progress and restart the journey today. The name is kept.
    ///
    /// # Errors
    /// Returns an error if the backend write or the reload fails.
    pub fn reset_progress(&mut self) -> Result<Outcome> {
        let Some(owner) = self.session_owner()? else {
            return Ok(Outcome::Skipped(SkipReason::NoIdentity));
        };
        let today = self.today();

        let fields = [
            ProfileField::InitialWeight(None),
            ProfileField::CurrentWeight(None),
            ProfileField::Streak(0),
            ProfileField::LastCheckIn(None),
            ProfileField::RitualCompletedOn(None),
            ProfileField::StartDate(today),
        ];
        self.write(&owner, "reset_progress", self.backend.reset(&owner, &fields))?;

        info!(owner = %owner, start_date = %today, "progress reset");
        self.reload()?;
        Ok(Outcome::Applied)
    }

    /// Store the display name as given.
    ///
    /// # Errors
    /// Returns an error if the backend write or the reload fails.
    pub fn update_name(&mut self, name: &str) -> Result<Outcome> {
        let Some(owner) = self.session_owner()? else {
            return Ok(Outcome::Skipped(SkipReason::NoIdentity));
        };
        let field = ProfileField::Name(name.to_string());
        self.write(&owner, "update_name", self.backend.update_profile(&owner, &[field]))?;

        info!(owner = %owner, "name updated");
        self.reload()?;
        Ok(Outcome::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::FixedClock;
    use crate::identity::StaticIdentity;
    use crate::progress::memory::MemoryBackend;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn open_store(start: NaiveDate) -> (ProgressStore<MemoryBackend>, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::at_date(start));
        let store = ProgressStore::open(
            MemoryBackend::default(),
            &StaticIdentity::signed_in("owner-1"),
            clock.clone(),
            Protocol::standard(),
        )
        .unwrap();
        (store, clock)
    }

    /// Accepts everything except weight history writes.
    #[derive(Default)]
    struct RejectingHistory(MemoryBackend);

    impl RecordBackend for RejectingHistory {
        fn name(&self) -> &str {
            "rejecting-history"
        }

        fn fetch_profile(&self, owner: &OwnerId) -> Result<Option<Profile>, StoreError> {
            self.0.fetch_profile(owner)
        }

        fn insert_profile(&self, owner: &OwnerId, profile: &Profile) -> Result<(), StoreError> {
            self.0.insert_profile(owner, profile)
        }

        fn update_profile(&self, owner: &OwnerId, fields: &[ProfileField]) -> Result<(), StoreError> {
            self.0.update_profile(owner, fields)
        }

        fn weight_history(&self, owner: &OwnerId) -> Result<Vec<WeightEntry>, StoreError> {
            self.0.weight_history(owner)
        }

        fn upsert_weight(&self, _owner: &OwnerId, _entry: &WeightEntry) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("weight history rejected".into()))
        }

        fn task_states(
            &self,
            owner: &OwnerId,
            date: NaiveDate,
        ) -> Result<Vec<crate::progress::TaskState>, StoreError> {
            self.0.task_states(owner, date)
        }

        fn upsert_task_state(
            &self,
            owner: &OwnerId,
            date: NaiveDate,
            state: &crate::progress::TaskState,
        ) -> Result<(), StoreError> {
            self.0.upsert_task_state(owner, date, state)
        }

        fn delete_task_states(&self, owner: &OwnerId, date: NaiveDate) -> Result<(), StoreError> {
            self.0.delete_task_states(owner, date)
        }

        fn clear_history(&self, owner: &OwnerId) -> Result<(), StoreError> {
            self.0.clear_history(owner)
        }
    }

    #[test]
    fn failed_history_write_leaves_current_weight_untouched() {
        let mut store = ProgressStore::open(
            RejectingHistory::default(),
            &StaticIdentity::signed_in("owner-1"),
            Arc::new(FixedClock::at_date(date(3, 1))),
            Protocol::standard(),
        )
        .unwrap();
        store.update_weight(WeightKind::Initial, Some(82.0)).unwrap();

        assert!(store.update_weight(WeightKind::Current, Some(70.0)).is_err());
        store.reload().unwrap();
        let record = store.record().unwrap();
        assert_eq!(record.current_weight, None);
        assert_eq!(record.initial_weight, Some(82.0));
        assert!(record.weight_history.is_empty());
    }

    #[test]
    fn current_weight_lands_with_history_entry() {
        let (mut store, _clock) = open_store(date(3, 1));
        store.update_weight(WeightKind::Current, Some(79.5)).unwrap();
        let record = store.record().unwrap();
        assert_eq!(record.current_weight, Some(79.5));
        assert_eq!(record.weight_history, vec![WeightEntry { date: date(3, 1), weight: 79.5 }]);
    }

    #[test]
    fn first_open_creates_empty_record() {
        let (store, _clock) = open_store(date(3, 1));
        let record = store.record().unwrap();
        assert_eq!(record.start_date, date(3, 1));
        assert_eq!(record.streak, 0);
        assert_eq!(record.daily_tasks.len(), 5);
        assert!(record.daily_tasks.iter().all(|t| !t.completed));
        assert_eq!(store.days_elapsed(), 1);
    }

    #[test]
    fn consecutive_confirmations_grow_streak() {
        let (mut store, clock) = open_store(date(3, 1));
        for expected in 1..=5 {
            assert_eq!(store.confirm_day().unwrap(), Outcome::Applied);
            assert_eq!(store.record().unwrap().streak, expected);
            clock.advance_days(1);
        }
    }

    #[test]
    fn gap_restarts_streak_at_one() {
        let (mut store, clock) = open_store(date(3, 1));
        store.confirm_day().unwrap();
        clock.advance_days(1);
        store.confirm_day().unwrap();
        assert_eq!(store.record().unwrap().streak, 2);

        clock.advance_days(3);
        store.confirm_day().unwrap();
        assert_eq!(store.record().unwrap().streak, 1);
    }

    #[test]
    fn second_confirmation_same_day_is_noop() {
        let (mut store, _clock) = open_store(date(3, 1));
        store.confirm_day().unwrap();
        let before = store.record().unwrap().clone();

        assert_eq!(
            store.confirm_day().unwrap(),
            Outcome::Skipped(SkipReason::AlreadyConfirmed)
        );
        let after = store.record().unwrap();
        assert_eq!(after.streak, before.streak);
        assert_eq!(after.last_check_in, before.last_check_in);
        assert!(store.is_checked_in_today());
    }

    #[test]
    fn confirm_stamps_ritual_and_clears_checklist() {
        // Confirming deliberately wipes the checklist the user just filled in.
        let (mut store, _clock) = open_store(date(3, 1));
        store.toggle_task("water").unwrap();
        store.toggle_task("walk").unwrap();
        assert_eq!(store.record().unwrap().completed_tasks(), 2);

        store.confirm_day().unwrap();
        let record = store.record().unwrap();
        assert_eq!(record.ritual_completed_on, Some(date(3, 1)));
        assert_eq!(record.completed_tasks(), 0);
        assert_eq!(record.daily_tasks.len(), 5);
    }

    #[test]
    fn double_toggle_restores_value() {
        let (mut store, _clock) = open_store(date(3, 1));
        store.toggle_task("sleep").unwrap();
        assert!(store.record().unwrap().task("sleep").unwrap().completed);
        store.toggle_task("sleep").unwrap();
        assert!(!store.record().unwrap().task("sleep").unwrap().completed);
    }

    #[test]
    fn toggle_unknown_task_is_ignored() {
        let (mut store, _clock) = open_store(date(3, 1));
        let before = store.record().unwrap().clone();
        assert_eq!(
            store.toggle_task("meditate").unwrap(),
            Outcome::Skipped(SkipReason::UnknownTask)
        );
        assert_eq!(store.record().unwrap(), &before);
    }

    #[test]
    fn toggles_persist_across_reload() {
        let (mut store, _clock) = open_store(date(3, 1));
        store.toggle_task("method").unwrap();
        store.reload().unwrap();
        assert!(store.record().unwrap().task("method").unwrap().completed);
    }

    #[test]
    fn checklist_rolls_over_at_midnight() {
        let (mut store, clock) = open_store(date(3, 1));
        store.toggle_task("water").unwrap();
        clock.advance_days(1);
        store.toggle_task("walk").unwrap();

        let record = store.record().unwrap();
        assert!(!record.task("water").unwrap().completed);
        assert!(record.task("walk").unwrap().completed);
    }

    #[test]
    fn current_weight_upserts_history() {
        let (mut store, clock) = open_store(date(3, 1));
        store.update_weight(WeightKind::Initial, Some(82.0)).unwrap();
        store.update_weight(WeightKind::Current, Some(81.0)).unwrap();
        store.update_weight(WeightKind::Current, Some(80.5)).unwrap();
        clock.advance_days(1);
        store.update_weight(WeightKind::Current, Some(80.0)).unwrap();

        let record = store.record().unwrap();
        assert_eq!(record.initial_weight, Some(82.0));
        assert_eq!(record.current_weight, Some(80.0));
        assert_eq!(
            record.weight_history,
            vec![
                WeightEntry { date: date(3, 1), weight: 80.5 },
                WeightEntry { date: date(3, 2), weight: 80.0 },
            ]
        );
        assert_eq!(store.weight_lost(), 2.0);
    }

    #[test]
    fn initial_weight_does_not_touch_history() {
        let (mut store, _clock) = open_store(date(3, 1));
        store.update_weight(WeightKind::Initial, Some(90.0)).unwrap();
        store.update_weight(WeightKind::Current, None).unwrap();
        assert!(store.record().unwrap().weight_history.is_empty());
    }

    #[test]
    fn malformed_weight_text_clears_field() {
        let (mut store, _clock) = open_store(date(3, 1));
        store.update_weight(WeightKind::Initial, Some(90.0)).unwrap();
        store.update_weight_text(WeightKind::Initial, "ninety").unwrap();
        assert_eq!(store.record().unwrap().initial_weight, None);

        store.update_weight_text(WeightKind::Current, "88,4").unwrap();
        assert_eq!(store.record().unwrap().current_weight, Some(88.4));
    }

    #[test]
    fn reset_keeps_name_only() {
        let (mut store, clock) = open_store(date(3, 1));
        store.update_name("Ana").unwrap();
        store.update_weight(WeightKind::Initial, Some(80.0)).unwrap();
        for _ in 0..12 {
            store.update_weight(WeightKind::Current, Some(79.0)).unwrap();
            store.confirm_day().unwrap();
            clock.advance_days(1);
        }
        store.toggle_task("water").unwrap();
        assert_eq!(store.record().unwrap().streak, 12);

        store.reset_progress().unwrap();
        let record = store.record().unwrap();
        assert_eq!(record.name, "Ana");
        assert_eq!(record.streak, 0);
        assert!(record.weight_history.is_empty());
        assert_eq!(record.start_date, clock.today());
        assert_eq!(record.initial_weight, None);
        assert_eq!(record.current_weight, None);
        assert_eq!(record.last_check_in, None);
        assert_eq!(record.ritual_completed_on, None);
        assert_eq!(record.completed_tasks(), 0);
    }

    #[test]
    fn no_identity_blocks_mutation() {
        let clock = Arc::new(FixedClock::at_date(date(3, 1)));
        let mut store = ProgressStore::open(
            MemoryBackend::default(),
            &StaticIdentity::signed_out(),
            clock,
            Protocol::standard(),
        )
        .unwrap();

        let skipped = Outcome::Skipped(SkipReason::NoIdentity);
        assert_eq!(store.confirm_day().unwrap(), skipped);
        assert_eq!(store.toggle_task("water").unwrap(), skipped);
        assert_eq!(store.update_name("Ana").unwrap(), skipped);
        assert_eq!(store.reset_progress().unwrap(), skipped);
        assert_eq!(store.update_weight(WeightKind::Current, Some(70.0)).unwrap(), skipped);
        assert!(store.record().is_none());
        assert!(store.view().is_none());
        assert_eq!(store.days_elapsed(), 1);
    }

    #[test]
    fn failed_write_leaves_state_unchanged() {
        let (mut store, _clock) = open_store(date(3, 1));
        store.confirm_day().unwrap();
        let before = store.record().unwrap().clone();

        store.backend().set_available(false);
        assert!(store.update_name("Bea").is_err());
        assert!(store.update_weight(WeightKind::Current, Some(70.0)).is_err());
        assert!(store.reset_progress().is_err());
        assert_eq!(store.record().unwrap(), &before);

        store.backend().set_available(true);
        store.update_name("Bea").unwrap();
        assert_eq!(store.record().unwrap().name, "Bea");
    }

    #[test]
    fn failed_toggle_keeps_optimistic_flip() {
        let (mut store, _clock) = open_store(date(3, 1));
        store.backend().set_available(false);
        assert!(store.toggle_task("water").is_err());
        assert!(store.record().unwrap().task("water").unwrap().completed);

        store.backend().set_available(true);
        store.reload().unwrap();
        assert!(!store.record().unwrap().task("water").unwrap().completed);
    }

    #[test]
    fn view_reflects_record() {
        let (mut store, clock) = open_store(date(3, 1));
        clock.advance_days(7);
        let view = store.view().unwrap();
        assert_eq!(view.days_elapsed, 8);
        assert_eq!(view.phase.id, "acceleration");
        assert!(!view.checked_in_today);

        store.confirm_day().unwrap();
        assert!(store.view().unwrap().checked_in_today);
    }
}
