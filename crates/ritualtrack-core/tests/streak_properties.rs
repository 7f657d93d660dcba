//! Property tests for streak arithmetic and phase progress.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use ritualtrack_core::dates::days_elapsed;
use ritualtrack_core::progress::weight_lost;
use ritualtrack_core::{FixedClock, MemoryBackend, ProgressStore, Protocol, StaticIdentity};

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Replaying a confirmation schedule gives the length of the final run
    /// of consecutive days.
    #[test]
    fn streak_matches_final_run(gaps in prop::collection::vec(1i64..4, 1..30)) {
        let clock = Arc::new(FixedClock::at_date(start()));
        let mut store = ProgressStore::open(
            MemoryBackend::default(),
            &StaticIdentity::signed_in("prop-owner"),
            clock.clone(),
            Protocol::standard(),
        )
        .unwrap();

        let mut expected = 0u32;
        for (i, gap) in gaps.iter().enumerate() {
            if i > 0 {
                clock.advance_days(*gap);
            }
            store.confirm_day().unwrap();
            expected = if i > 0 && *gap == 1 { expected + 1 } else { 1 };
            prop_assert_eq!(store.record().unwrap().streak, expected);
        }
    }

    #[test]
    fn phase_progress_is_monotone_within_a_phase(day in 1u32..200) {
        let protocol = Protocol::standard();
        let here = protocol.phase_progress_percent(day);
        prop_assert!((0.0..=100.0).contains(&here));
        if protocol.phase_index(day) == protocol.phase_index(day + 1) {
            prop_assert!(protocol.phase_progress_percent(day + 1) >= here);
        }
    }

    #[test]
    fn days_elapsed_is_at_least_one(offset in -100i64..400) {
        let now = (start() + Duration::days(offset)).and_hms_opt(12, 0, 0).unwrap();
        let days = days_elapsed(start(), now);
        prop_assert!(days >= 1);
        if offset >= 0 {
            prop_assert_eq!(i64::from(days), offset + 1);
        }
    }

    #[test]
    fn weight_lost_is_never_negative(initial in 30.0f64..200.0, current in 30.0f64..200.0) {
        let lost = weight_lost(Some(initial), Some(current));
        prop_assert!(lost >= 0.0);
        if initial >= current {
            prop_assert!((lost - (initial - current)).abs() < 1e-9);
        }
    }
}

#[test]
fn weight_lost_reference_values() {
    assert_eq!(weight_lost(Some(70.0), Some(75.0)), 0.0);
    assert_eq!(weight_lost(Some(80.0), Some(75.0)), 5.0);
    assert_eq!(weight_lost(None, Some(75.0)), 0.0);
}

#[test]
fn bounded_phases_reach_full_progress() {
    let protocol = Protocol::standard();
    for phase in protocol.phases.phases() {
        let reference = protocol.rules.terminal_reference_days;
        let duration = phase.duration_days().unwrap_or(reference);
        let past_end = phase.start_day - 1 + duration + 5;
        assert_eq!(phase.progress_percent(past_end, reference), 100.0, "phase {}", phase.id);
    }
    assert_eq!(protocol.current_phase(1).id, "activation");
    assert_eq!(protocol.current_phase(8).id, "acceleration");
    assert_eq!(protocol.current_phase(500).id, "stabilization");
}
