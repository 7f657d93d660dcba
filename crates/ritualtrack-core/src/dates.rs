//! Calendar-date arithmetic for streaks and journey length.
//!
//! All values are naive local dates: the device zone is the single reference
//! zone and no time-zone or DST normalisation is attempted.

use std::sync::Mutex;

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};

const SECONDS_PER_DAY: i64 = 86_400;

/// Source of "now" for everything that depends on the calendar.
pub trait Clock: Send + Sync {
    /// Current local date-time.
    fn now(&self) -> NaiveDateTime;

    /// Current local calendar date.
    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Wall clock in the device's local zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Settable clock for tests and replays.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Clock pinned to `date` at noon.
    pub fn at_date(date: NaiveDate) -> Self {
        Self::new(date.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN)))
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance_days(&self, days: i64) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += Duration::days(days);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Day number of the journey: `ceil(now - start)` in days, never below 1.
///
/// The start date counts from its midnight, so any time on the start date is
/// day 1 and every midnight passed after that adds a day.
pub fn days_elapsed(start_date: NaiveDate, now: NaiveDateTime) -> u32 {
    let seconds = (now - start_date.and_time(NaiveTime::MIN)).num_seconds();
    if seconds <= 0 {
        return 1;
    }
    let days = (seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY;
    u32::try_from(days).unwrap_or(u32::MAX).max(1)
}

/// True iff `last_check_in` is exactly the calendar day before `today`.
pub fn is_consecutive(last_check_in: Option<NaiveDate>, today: NaiveDate) -> bool {
    last_check_in
        .and_then(|last| last.succ_opt())
        .is_some_and(|next| next == today)
}

/// Calendar-date equality, ignoring time of day.
pub fn is_same_day<A: Datelike, B: Datelike>(a: &A, b: &B) -> bool {
    a.year() == b.year() && a.ordinal() == b.ordinal()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(d: NaiveDate, h: u32, min: u32) -> NaiveDateTime {
        d.and_hms_opt(h, min, 0).unwrap()
    }

    #[test]
    fn start_date_is_day_one() {
        let start = date(2024, 3, 1);
        assert_eq!(days_elapsed(start, at(start, 0, 0)), 1);
        assert_eq!(days_elapsed(start, at(start, 9, 30)), 1);
        assert_eq!(days_elapsed(start, at(start, 23, 59)), 1);
    }

    #[test]
    fn each_midnight_adds_a_day() {
        let start = date(2024, 3, 1);
        assert_eq!(days_elapsed(start, at(date(2024, 3, 2), 8, 0)), 2);
        assert_eq!(days_elapsed(start, at(date(2024, 3, 8), 8, 0)), 8);
    }

    #[test]
    fn future_start_is_floored_at_one() {
        let start = date(2024, 3, 10);
        assert_eq!(days_elapsed(start, at(date(2024, 3, 1), 12, 0)), 1);
    }

    #[test]
    fn consecutive_only_for_previous_day() {
        let today = date(2024, 3, 1);
        assert!(is_consecutive(Some(date(2024, 2, 29)), today));
        assert!(!is_consecutive(Some(date(2024, 2, 28)), today));
        assert!(!is_consecutive(Some(today), today));
        assert!(!is_consecutive(None, today));
    }

    #[test]
    fn consecutive_across_year_boundary() {
        assert!(is_consecutive(Some(date(2023, 12, 31)), date(2024, 1, 1)));
    }

    #[test]
    fn same_day_ignores_time() {
        let d = date(2024, 5, 5);
        assert!(is_same_day(&at(d, 0, 1), &at(d, 23, 59)));
        assert!(is_same_day(&d, &at(d, 12, 0)));
        assert!(!is_same_day(&d, &date(2025, 5, 5)));
    }

    #[test]
    fn fixed_clock_advances() {
        let clock = FixedClock::at_date(date(2024, 1, 31));
        clock.advance_days(1);
        assert_eq!(clock.today(), date(2024, 2, 1));
    }
}
