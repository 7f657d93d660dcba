//! Pure functions deriving display state from a progress record.

pub mod checklist;
pub mod messages;
pub mod milestones;
pub mod summary;
pub mod trend;

pub use checklist::{completion_feedback, ChecklistFeedback, FeedbackLevel};
pub use messages::{
    daily_reinforcement, pick_message, ritual_message, status_message, MessageSelector,
    Reinforcement, StreakBucket, CONFIRMATION_MESSAGES, REINFORCEMENTS,
};
pub use milestones::{milestones, Milestone, Requirement};
pub use summary::{ProgressView, TimelineEntry};
pub use trend::{
    interpret_weight_trend, interpret_weight_trend_with, recent_change, TrendCategory,
    TrendInterpretation,
};
