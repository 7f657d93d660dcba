//! Motivational copy keyed by streak, plus rotating message pools.

use chrono::{Datelike, NaiveDate};
use rand::RngCore;
use serde::Serialize;

/// Streak ranges the copy is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakBucket {
    Inactive,
    FirstDay,
    Building,
    Accelerating,
    Consolidating,
    Stabilized,
}

impl StreakBucket {
    pub fn from_streak(streak: u32) -> Self {
        match streak {
            0 => Self::Inactive,
            1 => Self::FirstDay,
            2..=6 => Self::Building,
            7..=13 => Self::Accelerating,
            14..=20 => Self::Consolidating,
            _ => Self::Stabilized,
        }
    }
}

/// Headline for the current state of the day.
pub fn status_message(streak: u32, checked_in_today: bool) -> String {
    if checked_in_today {
        return "Protocol executed today. Your body keeps responding.".to_string();
    }
    let days = if streak == 1 { "day" } else { "days" };
    match StreakBucket::from_streak(streak) {
        StreakBucket::Inactive => "Protocol awaiting activation".to_string(),
        StreakBucket::FirstDay => "Protocol active, 1 day in a row. Confirm today to keep it going.".to_string(),
        StreakBucket::Building => format!("Protocol active, {streak} {days} in a row. The pattern is forming."),
        StreakBucket::Accelerating => format!("Protocol active, {streak} {days} in a row. Your rhythm is accelerating."),
        StreakBucket::Consolidating => format!("Protocol active, {streak} {days} in a row. The habit is consolidating."),
        StreakBucket::Stabilized => format!("Protocol active, {streak} {days} in a row. This is who you are now."),
    }
}

/// Short line describing what the streak means for the body.
pub fn ritual_message(streak: u32) -> &'static str {
    match StreakBucket::from_streak(streak) {
        StreakBucket::Inactive => "Start your protocol today",
        StreakBucket::FirstDay => "First step taken. Your body has noticed.",
        StreakBucket::Building => "Metabolism is starting to respond",
        StreakBucket::Accelerating => "Your body is recognising the new pattern",
        StreakBucket::Consolidating => "Metabolic acceleration is active",
        StreakBucket::Stabilized => "The protocol is part of your routine",
    }
}

pub const CONFIRMATION_MESSAGES: [&str; 5] = [
    "Protocol confirmed. Your body keeps working in your favour.",
    "Ritual done. One more day of consistency adds up.",
    "Confirmed. Each day reinforces the new pattern.",
    "Done for today. The results are built in silence.",
    "Ritual registered. Your metabolism thanks you.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reinforcement {
    pub title: &'static str,
    pub text: &'static str,
}

pub const REINFORCEMENTS: [Reinforcement; 3] = [
    Reinforcement {
        title: "Consistency beats intensity",
        text: "Small actions repeated every day change more than big efforts once in a while.",
    },
    Reinforcement {
        title: "Trust the process",
        text: "The scale is one signal among many. Sleep, energy and mood change first.",
    },
    Reinforcement {
        title: "Water is part of the protocol",
        text: "Hydration keeps the metabolism moving. Keep a bottle within reach.",
    },
];

/// How an item is chosen from a pool.
pub enum MessageSelector<'r> {
    /// Deterministic rotation; the index wraps around the pool.
    DayIndex(usize),
    Random(&'r mut dyn RngCore),
}

/// Pick one item from `pool`; `None` only when the pool is empty.
pub fn pick_message<'p, T>(pool: &'p [T], selector: MessageSelector<'_>) -> Option<&'p T> {
    if pool.is_empty() {
        return None;
    }
    let index = match selector {
        MessageSelector::DayIndex(n) => n % pool.len(),
        MessageSelector::Random(rng) => (rng.next_u64() % pool.len() as u64) as usize,
    };
    pool.get(index)
}

/// Reinforcement of the day, rotating by weekday (Sunday = 0).
pub fn daily_reinforcement(date: NaiveDate) -> &'static Reinforcement {
    let weekday = date.weekday().num_days_from_sunday() as usize;
    pick_message(&REINFORCEMENTS, MessageSelector::DayIndex(weekday)).unwrap_or(&REINFORCEMENTS[0])
}
