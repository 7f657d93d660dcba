//! The per-owner progress record and its value types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates;
use crate::protocol::Catalog;

/// One weight sample. History holds at most one per calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    pub date: NaiveDate,
    pub weight: f64,
}

/// Today's completion state for one catalog task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskState {
    pub task_id: String,
    pub completed: bool,
}

/// Which weight field an update targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightKind {
    Initial,
    Current,
}

/// Everything tracked for one owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub name: String,
    pub start_date: NaiveDate,
    pub initial_weight: Option<f64>,
    pub current_weight: Option<f64>,
    pub streak: u32,
    pub last_check_in: Option<NaiveDate>,
    /// Date of the most recent ritual confirmation.
    pub ritual_completed_on: Option<NaiveDate>,
    /// Ascending by date, unique dates.
    pub weight_history: Vec<WeightEntry>,
    /// One entry per catalog task, in catalog order.
    pub daily_tasks: Vec<TaskState>,
}

impl ProgressRecord {
    /// Empty record starting on `today`.
    pub fn new(today: NaiveDate, catalog: &Catalog) -> Self {
        Self {
            name: String::new(),
            start_date: today,
            initial_weight: None,
            current_weight: None,
            streak: 0,
            last_check_in: None,
            ritual_completed_on: None,
            weight_history: Vec::new(),
            daily_tasks: catalog.seed(),
        }
    }

    /// Insert or replace the entry for `entry.date`, keeping date order.
    pub fn upsert_weight(&mut self, entry: WeightEntry) {
        upsert_weight_entry(&mut self.weight_history, entry);
    }

    pub fn task(&self, task_id: &str) -> Option<&TaskState> {
        self.daily_tasks.iter().find(|t| t.task_id == task_id)
    }

    pub fn completed_tasks(&self) -> usize {
        self.daily_tasks.iter().filter(|t| t.completed).count()
    }

    pub fn is_checked_in_on(&self, date: NaiveDate) -> bool {
        self.last_check_in == Some(date)
    }

    /// Streak after confirming on `today`: extended only when the last
    /// check-in was the day before.
    pub fn next_streak(&self, today: NaiveDate) -> u32 {
        if dates::is_consecutive(self.last_check_in, today) {
            self.streak.saturating_add(1)
        } else {
            1
        }
    }

    pub fn weight_lost(&self) -> f64 {
        weight_lost(self.initial_weight, self.current_weight)
    }

    /// The last `n` history entries, oldest first.
    pub fn recent_weights(&self, n: usize) -> &[WeightEntry] {
        let start = self.weight_history.len().saturating_sub(n);
        &self.weight_history[start..]
    }
}

/// `max(0, initial - current)` when both are known, else 0.
pub fn weight_lost(initial: Option<f64>, current: Option<f64>) -> f64 {
    match (initial, current) {
        (Some(initial), Some(current)) => (initial - current).max(0.0),
        _ => 0.0,
    }
}

/// Upsert into a date-sorted history.
pub fn upsert_weight_entry(history: &mut Vec<WeightEntry>, entry: WeightEntry) {
    match history.binary_search_by_key(&entry.date, |e| e.date) {
        Ok(i) => history[i] = entry,
        Err(i) => history.insert(i, entry),
    }
}

/// Parse user-entered weight text permissively.
///
/// Accepts surrounding whitespace, a decimal comma and trailing units
/// ("72,5 kg"). Any leading finite number is kept as entered; text without
/// one is `None`, which callers treat as "clear the field".
pub fn parse_weight_input(text: &str) -> Option<f64> {
    let normalized = text.trim().replace(',', ".");
    let mut end = 0;
    let mut seen_dot = false;
    for (i, c) in normalized.char_indices() {
        match c {
            '0'..='9' => end = i + 1,
            '.' if !seen_dot => seen_dot = true,
            '+' | '-' if i == 0 => {}
            _ => break,
        }
    }
    let value: f64 = normalized[..end].parse().ok()?;
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::standard_catalog;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[test]
    fn weight_lost_is_never_negative() {
        assert_eq!(weight_lost(Some(70.0), Some(75.0)), 0.0);
        assert_eq!(weight_lost(Some(80.0), Some(75.0)), 5.0);
        assert_eq!(weight_lost(None, Some(75.0)), 0.0);
        assert_eq!(weight_lost(Some(80.0), None), 0.0);
    }

    #[test]
    fn upsert_replaces_same_date() {
        let mut record = ProgressRecord::new(date(1), &standard_catalog());
        record.upsert_weight(WeightEntry { date: date(2), weight: 80.0 });
        record.upsert_weight(WeightEntry { date: date(2), weight: 79.5 });
        assert_eq!(record.weight_history.len(), 1);
        assert_eq!(record.weight_history[0].weight, 79.5);
    }

    #[test]
    fn upsert_keeps_date_order() {
        let mut record = ProgressRecord::new(date(1), &standard_catalog());
        record.upsert_weight(WeightEntry { date: date(5), weight: 78.0 });
        record.upsert_weight(WeightEntry { date: date(2), weight: 80.0 });
        record.upsert_weight(WeightEntry { date: date(3), weight: 79.0 });
        let dates: Vec<_> = record.weight_history.iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![date(2), date(3), date(5)]);
    }

    #[test]
    fn next_streak_extends_or_restarts() {
        let mut record = ProgressRecord::new(date(1), &standard_catalog());
        assert_eq!(record.next_streak(date(1)), 1);

        record.streak = 4;
        record.last_check_in = Some(date(9));
        assert_eq!(record.next_streak(date(10)), 5);
        assert_eq!(record.next_streak(date(12)), 1);
    }

    #[test]
    fn recent_weights_tail() {
        let mut record = ProgressRecord::new(date(1), &standard_catalog());
        for d in 1..=5 {
            record.upsert_weight(WeightEntry { date: date(d), weight: 80.0 - d as f64 });
        }
        let recent = record.recent_weights(3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].date, date(3));
        assert_eq!(record.recent_weights(10).len(), 5);
    }

    #[test]
    fn parses_weight_text_permissively() {
        assert_eq!(parse_weight_input("72.5"), Some(72.5));
        assert_eq!(parse_weight_input(" 72,5 kg "), Some(72.5));
        assert_eq!(parse_weight_input("80kg"), Some(80.0));
        assert_eq!(parse_weight_input(""), None);
        assert_eq!(parse_weight_input("abc"), None);
        assert_eq!(parse_weight_input("-3"), Some(-3.0));
        assert_eq!(parse_weight_input("0"), Some(0.0));
        assert_eq!(parse_weight_input("."), None);
    }
}
