//! Feedback for a partially filled checklist.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackLevel {
    Partial,
    Majority,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecklistFeedback {
    pub level: FeedbackLevel,
    pub completed: usize,
    pub total: usize,
    pub message: String,
}

/// `None` until at least one task is done.
pub fn completion_feedback(completed: usize, total: usize) -> Option<ChecklistFeedback> {
    if completed == 0 || total == 0 {
        return None;
    }
    let completed = completed.min(total);
    let (level, message) = if completed == total {
        (
            FeedbackLevel::Complete,
            "Every pillar executed. Confirm the day to register it.".to_string(),
        )
    } else if completed >= total.div_ceil(2) {
        (
            FeedbackLevel::Majority,
            format!("{completed} of {total} pillars executed"),
        )
    } else {
        let noun = if completed == 1 { "pillar" } else { "pillars" };
        (FeedbackLevel::Partial, format!("{completed} {noun} active"))
    };
    Some(ChecklistFeedback {
        level,
        completed,
        total,
        message,
    })
}
