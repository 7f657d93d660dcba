//! Weight-trend interpretation.
//!
//! A decision tree, evaluated top to bottom:
//! 1. a rise over the recent window is framed as adaptation, whatever the
//!    total lost;
//! 2. no loss yet is neutral in the first three days, encouraging after;
//! 3. otherwise the magnitude of the loss picks the positive framing.

use serde::Serialize;

use crate::progress::WeightEntry;
use crate::protocol::ProtocolRules;

const SETTLING_IN_DAYS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendCategory {
    Positive,
    Neutral,
    Encouraging,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendInterpretation {
    pub category: TrendCategory,
    pub title: &'static str,
    pub message: String,
}

impl TrendInterpretation {
    fn new(category: TrendCategory, title: &'static str, message: impl Into<String>) -> Self {
        Self {
            category,
            title,
            message: message.into(),
        }
    }
}

/// Net change across the last `window` entries, if there are that many.
pub fn recent_change(entries: &[WeightEntry], window: usize) -> Option<f64> {
    if window < 2 || entries.len() < window {
        return None;
    }
    let tail = &entries[entries.len() - window..];
    Some(tail[window - 1].weight - tail[0].weight)
}

/// Interpret progress with the default rules.
pub fn interpret_weight_trend(
    weight_lost: f64,
    days_elapsed: u32,
    recent_entries: &[WeightEntry],
) -> TrendInterpretation {
    interpret_weight_trend_with(
        weight_lost,
        days_elapsed,
        recent_entries,
        &ProtocolRules::default(),
    )
}

pub fn interpret_weight_trend_with(
    weight_lost: f64,
    days_elapsed: u32,
    recent_entries: &[WeightEntry],
    rules: &ProtocolRules,
) -> TrendInterpretation {
    use TrendCategory::*;

    if recent_change(recent_entries, rules.trend_window)
        .is_some_and(|change| change > rules.trend_rise_threshold)
    {
        return TrendInterpretation::new(
            Encouraging,
            "Adaptation phase",
            "Your body is reorganising internally. Swings are normal and part of the \
             metabolic process. The protocol is still active.",
        );
    }

    if weight_lost <= 0.0 {
        if days_elapsed <= SETTLING_IN_DAYS {
            return TrendInterpretation::new(
                Neutral,
                "Internal adjustment under way",
                "In the first days the body recognises the new pattern. The numbers do not \
                 yet reflect what is happening inside.",
            );
        }
        return TrendInterpretation::new(
            Encouraging,
            "Internal process active",
            "Temporary retention or metabolic adaptation. Your body is working even when \
             the scale does not show it. Keep going.",
        );
    }

    if weight_lost < 2.0 {
        return TrendInterpretation::new(
            Positive,
            "Early evolution",
            format!(
                "Your protocol has already taken off {weight_lost:.1} kg. Metabolism is \
                 responding and each day consolidates the result."
            ),
        );
    }

    if weight_lost < 5.0 {
        return TrendInterpretation::new(
            Positive,
            "Acceleration confirmed",
            format!(
                "{weight_lost:.1} kg lost. Your body recognises the rhythm of the protocol \
                 and results are accumulating."
            ),
        );
    }

    TrendInterpretation::new(
        Positive,
        "Transformation in progress",
        format!(
            "{weight_lost:.1} kg lost. The protocol is delivering real results. You are \
             proving it is possible."
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn history(weights: &[f64]) -> Vec<WeightEntry> {
        weights
            .iter()
            .enumerate()
            .map(|(i, w)| WeightEntry {
                date: NaiveDate::from_ymd_opt(2024, 2, 1 + i as u32).unwrap(),
                weight: *w,
            })
            .collect()
    }

    #[test]
    fn rising_window_overrides_magnitude() {
        let entries = history(&[80.0, 76.0, 76.5, 77.0]);
        let result = interpret_weight_trend(4.0, 20, &entries);
        assert_eq!(result.category, TrendCategory::Encouraging);
        assert_eq!(result.title, "Adaptation phase");
    }

    #[test]
    fn rise_at_threshold_is_not_a_trend() {
        let entries = history(&[76.0, 76.2, 76.5]);
        let result = interpret_weight_trend(4.0, 20, &entries);
        assert_eq!(result.category, TrendCategory::Positive);
    }

    #[test]
    fn short_history_skips_trend_rule() {
        let entries = history(&[70.0, 75.0]);
        let result = interpret_weight_trend(1.0, 10, &entries);
        assert_eq!(result.category, TrendCategory::Positive);
        assert_eq!(result.title, "Early evolution");
    }

    #[test]
    fn no_loss_depends_on_day() {
        assert_eq!(interpret_weight_trend(0.0, 3, &[]).category, TrendCategory::Neutral);
        assert_eq!(
            interpret_weight_trend(0.0, 4, &[]).category,
            TrendCategory::Encouraging
        );
    }

    #[test]
    fn magnitude_buckets() {
        assert_eq!(interpret_weight_trend(1.9, 10, &[]).title, "Early evolution");
        assert_eq!(interpret_weight_trend(2.0, 10, &[]).title, "Acceleration confirmed");
        assert_eq!(interpret_weight_trend(4.99, 10, &[]).title, "Acceleration confirmed");
        assert_eq!(interpret_weight_trend(5.0, 10, &[]).title, "Transformation in progress");
    }

    #[test]
    fn message_formats_weight() {
        let result = interpret_weight_trend(2.345, 10, &[]);
        assert!(result.message.starts_with("2.3 kg lost"));
    }

    #[test]
    fn custom_window() {
        let rules = ProtocolRules {
            trend_window: 2,
            trend_rise_threshold: 0.2,
            ..Default::default()
        };
        let entries = history(&[80.0, 79.0, 79.3]);
        let result = interpret_weight_trend_with(1.0, 10, &entries, &rules);
        assert_eq!(result.category, TrendCategory::Encouraging);
    }
}
