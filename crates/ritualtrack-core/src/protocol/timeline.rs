//! Five-stage narrative timeline shown alongside the phase table.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineStage {
    pub period: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub first_day: u32,
    pub last_day: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Done,
    Active,
    Upcoming,
}

pub const STAGES: [TimelineStage; 5] = [
    TimelineStage {
        period: "Days 1-3",
        title: "Internal adjustment",
        description: "Your body is getting ready for the new rhythm. Feeling different is normal.",
        first_day: 1,
        last_day: Some(3),
    },
    TimelineStage {
        period: "Days 4-7",
        title: "Initial de-bloating",
        description: "The protocol starts to act. Retention drops and you feel lighter.",
        first_day: 4,
        last_day: Some(7),
    },
    TimelineStage {
        period: "Week 2",
        title: "Metabolic acceleration",
        description: "Metabolism recognises the pattern. Results become more visible.",
        first_day: 8,
        last_day: Some(14),
    },
    TimelineStage {
        period: "Week 3",
        title: "Consolidated rhythm",
        description: "Your body works in your favour. Effort drops and results continue.",
        first_day: 15,
        last_day: Some(21),
    },
    TimelineStage {
        period: "Week 4+",
        title: "Stabilization",
        description: "The protocol becomes part of you. Keeping going is easier than starting.",
        first_day: 22,
        last_day: None,
    },
];

impl TimelineStage {
    pub fn status(&self, days_elapsed: u32) -> StageStatus {
        match self.last_day {
            Some(last) if days_elapsed > last => StageStatus::Done,
            _ if days_elapsed >= self.first_day => StageStatus::Active,
            _ => StageStatus::Upcoming,
        }
    }
}

/// Every stage paired with its status on `days_elapsed`.
pub fn timeline_stages(days_elapsed: u32) -> Vec<(&'static TimelineStage, StageStatus)> {
    STAGES
        .iter()
        .map(|stage| (stage, stage.status(days_elapsed)))
        .collect()
}
