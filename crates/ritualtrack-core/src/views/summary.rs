use chrono::NaiveDateTime;
use serde::Serialize;

use super::checklist::{completion_feedback, ChecklistFeedback};
use super::messages::{daily_reinforcement, ritual_message, status_message, Reinforcement};
use super::milestones::{milestones, Milestone};
use super::trend::{interpret_weight_trend_with, TrendInterpretation};
use crate::dates;
use crate::progress::ProgressRecord;
use crate::protocol::{timeline_stages, Phase, Protocol, StageStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry {
    pub period: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub status: StageStatus,
}

/// Everything the presentation layer shows, derived from one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressView {
    pub name: String,
    pub days_elapsed: u32,
    pub streak: u32,
    pub checked_in_today: bool,
    pub initial_weight: Option<f64>,
    pub current_weight: Option<f64>,
    pub weight_lost: f64,
    pub phase: Phase,
    pub phase_index: usize,
    pub phase_count: usize,
    pub phase_progress_percent: f64,
    pub status_message: String,
    pub ritual_message: &'static str,
    pub reinforcement: Reinforcement,
    pub completed_tasks: usize,
    pub total_tasks: usize,
    pub checklist_feedback: Option<ChecklistFeedback>,
    pub trend: TrendInterpretation,
    pub milestones: Vec<Milestone>,
    pub timeline: Vec<TimelineEntry>,
}

impl ProgressView {
    pub fn compute(record: &ProgressRecord, protocol: &Protocol, now: NaiveDateTime) -> Self {
        let today = now.date();
        let days = dates::days_elapsed(record.start_date, now);
        let weight_lost = record.weight_lost();
        let checked_in_today = record.is_checked_in_on(today);
        let rules = &protocol.rules;
        let completed_tasks = record.completed_tasks();
        let total_tasks = record.daily_tasks.len();

        Self {
            name: record.name.clone(),
            days_elapsed: days,
            streak: record.streak,
            checked_in_today,
            initial_weight: record.initial_weight,
            current_weight: record.current_weight,
            weight_lost,
            phase: protocol.current_phase(days).clone(),
            phase_index: protocol.phase_index(days),
            phase_count: protocol.phases.len(),
            phase_progress_percent: protocol.phase_progress_percent(days),
            status_message: status_message(record.streak, checked_in_today),
            ritual_message: ritual_message(record.streak),
            reinforcement: *daily_reinforcement(today),
            completed_tasks,
            total_tasks,
            checklist_feedback: completion_feedback(completed_tasks, total_tasks),
            trend: interpret_weight_trend_with(
                weight_lost,
                days,
                record.recent_weights(rules.trend_window),
                rules,
            ),
            milestones: milestones(record, days, weight_lost),
            timeline: timeline_stages(days)
                .into_iter()
                .map(|(stage, status)| TimelineEntry {
                    period: stage.period,
                    title: stage.title,
                    description: stage.description,
                    status,
                })
                .collect(),
        }
    }

    pub fn achieved_milestones(&self) -> impl Iterator<Item = &Milestone> {
        self.milestones.iter().filter(|m| m.achieved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::WeightEntry;
    use crate::views::TrendCategory;
    use chrono::{NaiveDate, NaiveTime};

    fn at(date: NaiveDate) -> NaiveDateTime {
        date.and_time(NaiveTime::from_hms_opt(9, 0, 0).unwrap())
    }

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    #[test]
    fn fresh_record() {
        let protocol = Protocol::standard();
        let record = ProgressRecord::new(date(5, 1), &protocol.catalog);
        let view = ProgressView::compute(&record, &protocol, at(date(5, 1)));

        assert_eq!(view.days_elapsed, 1);
        assert_eq!(view.phase.id, "activation");
        assert_eq!(view.phase_index, 0);
        assert_eq!(view.phase_count, 3);
        assert_eq!(view.status_message, "Protocol awaiting activation");
        assert_eq!(view.trend.category, TrendCategory::Neutral);
        assert_eq!(view.checklist_feedback, None);
        assert_eq!(view.total_tasks, 5);
        assert_eq!(view.achieved_milestones().count(), 1);
        assert_eq!(view.timeline[0].status, StageStatus::Active);
        assert_eq!(view.timeline[4].status, StageStatus::Upcoming);
    }

    #[test]
    fn late_journey() {
        let protocol = Protocol::standard();
        let mut record = ProgressRecord::new(date(1, 1), &protocol.catalog);
        record.streak = 15;
        record.last_check_in = Some(date(1, 30));
        record.initial_weight = Some(90.0);
        record.current_weight = Some(86.0);
        record.weight_history = vec![
            WeightEntry { date: date(1, 20), weight: 87.0 },
            WeightEntry { date: date(1, 25), weight: 86.5 },
            WeightEntry { date: date(1, 30), weight: 86.0 },
        ];
        record.daily_tasks[0].completed = true;
        record.daily_tasks[1].completed = true;
        record.daily_tasks[2].completed = true;

        let view = ProgressView::compute(&record, &protocol, at(date(1, 30)));
        assert_eq!(view.days_elapsed, 30);
        assert_eq!(view.phase.id, "stabilization");
        assert!(view.checked_in_today);
        assert_eq!(view.weight_lost, 4.0);
        assert_eq!(view.trend.title, "Acceleration confirmed");
        assert_eq!(
            view.checklist_feedback.clone().map(|f| f.message),
            Some("3 of 5 pillars executed".to_string())
        );
        assert!(view.timeline.iter().take(4).all(|e| e.status == StageStatus::Done));
        let achieved: Vec<_> = view.achieved_milestones().map(|m| m.id).collect();
        assert!(achieved.contains(&"two_weeks"));
        assert!(achieved.contains(&"three_kg"));
        assert!(!achieved.contains(&"five_kg"));
    }
}
