//! Achievement flags derived from streak, journey day and weight lost.
//!
//! Milestones are never stored; they are recomputed from the record each
//! time. Rule order is the narrative order shown to the user.

use serde::Serialize;

use crate::progress::ProgressRecord;

/// Threshold a milestone is measured against, for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum Requirement {
    Streak(u32),
    Day(u32),
    Weight(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Milestone {
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub achieved: bool,
    pub requirement: Option<Requirement>,
}

#[derive(Debug, Clone, Copy)]
enum Rule {
    Always,
    FirstRitual,
    Streak(u32),
    DayWithStreak { day: u32, streak: u32 },
    Day(u32),
    WeightLost(f64),
}

struct MilestoneRule {
    id: &'static str,
    label: &'static str,
    description: &'static str,
    rule: Rule,
}

const RULES: [MilestoneRule; 10] = [
    MilestoneRule {
        id: "protocol_activated",
        label: "Protocol activated",
        description: "You started the protocol",
        rule: Rule::Always,
    },
    MilestoneRule {
        id: "first_ritual",
        label: "First ritual completed",
        description: "The first step is the most important one",
        rule: Rule::FirstRitual,
    },
    MilestoneRule {
        id: "three_day_streak",
        label: "3-day streak",
        description: "Your body started to recognise the pattern",
        rule: Rule::Streak(3),
    },
    MilestoneRule {
        id: "first_week",
        label: "First week consolidated",
        description: "The protocol is already part of your routine",
        rule: Rule::DayWithStreak { day: 7, streak: 5 },
    },
    MilestoneRule {
        id: "acceleration_phase",
        label: "Acceleration phase reached",
        description: "Your metabolism entered an accelerated rhythm",
        rule: Rule::Day(8),
    },
    MilestoneRule {
        id: "two_weeks",
        label: "Protocol consolidated (14 days)",
        description: "You have built a new pattern",
        rule: Rule::Streak(14),
    },
    MilestoneRule {
        id: "metabolism_stabilized",
        label: "Metabolism stabilized",
        description: "The protocol became part of who you are",
        rule: Rule::Day(22),
    },
    MilestoneRule {
        id: "first_kg",
        label: "First kg lost",
        description: "Results started to show",
        rule: Rule::WeightLost(1.0),
    },
    MilestoneRule {
        id: "three_kg",
        label: "3 kg lost",
        description: "Metabolic evolution under way",
        rule: Rule::WeightLost(3.0),
    },
    MilestoneRule {
        id: "five_kg",
        label: "5 kg lost",
        description: "Visible transformation",
        rule: Rule::WeightLost(5.0),
    },
];

impl Rule {
    fn achieved(self, record: &ProgressRecord, days_elapsed: u32, weight_lost: f64) -> bool {
        match self {
            Rule::Always => true,
            Rule::FirstRitual => record.streak >= 1 || record.last_check_in.is_some(),
            Rule::Streak(n) => record.streak >= n,
            Rule::DayWithStreak { day, streak } => days_elapsed >= day && record.streak >= streak,
            Rule::Day(day) => days_elapsed >= day,
            Rule::WeightLost(kg) => weight_lost >= kg,
        }
    }

    fn requirement(self) -> Option<Requirement> {
        match self {
            Rule::Always | Rule::FirstRitual => None,
            Rule::Streak(n) => Some(Requirement::Streak(n)),
            Rule::DayWithStreak { day, .. } | Rule::Day(day) => Some(Requirement::Day(day)),
            Rule::WeightLost(kg) => Some(Requirement::Weight(kg)),
        }
    }
}

/// Evaluate every milestone rule, in narrative order.
pub fn milestones(record: &ProgressRecord, days_elapsed: u32, weight_lost: f64) -> Vec<Milestone> {
    RULES
        .iter()
        .map(|r| Milestone {
            id: r.id,
            label: r.label,
            description: r.description,
            achieved: r.rule.achieved(record, days_elapsed, weight_lost),
            requirement: r.rule.requirement(),
        })
        .collect()
}
