//! Journey phases keyed by elapsed days.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A named stage of the journey.
///
/// `end_day` is `None` only for the terminal phase, which catches every day
/// after the bounded phases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub id: String,
    pub name: String,
    pub description: String,
    pub objective: String,
    pub start_day: u32,
    #[serde(default)]
    pub end_day: Option<u32>,
}

impl Phase {
    /// Length in days, `None` for the unbounded terminal phase.
    pub fn duration_days(&self) -> Option<u32> {
        self.end_day.map(|end| end - self.start_day + 1)
    }

    pub fn is_terminal(&self) -> bool {
        self.end_day.is_none()
    }

    pub fn contains(&self, day: u32) -> bool {
        day >= self.start_day && self.end_day.map_or(true, |end| day <= end)
    }

    /// Completion of this phase at `days_elapsed`, in `0.0..=100.0`.
    ///
    /// Bounded phases are measured against their own duration, the terminal
    /// phase against `terminal_reference_days`. Days before the phase starts
    /// give 0 and days past its end stay at 100.
    pub fn progress_percent(&self, days_elapsed: u32, terminal_reference_days: u32) -> f64 {
        if days_elapsed < self.start_day {
            return 0.0;
        }
        let days_in_phase = f64::from(days_elapsed - self.start_day + 1);
        let window = self
            .duration_days()
            .unwrap_or(terminal_reference_days)
            .max(1);
        (days_in_phase / f64::from(window) * 100.0).min(100.0)
    }
}

/// Ordered, validated phase table.
///
/// Phases tile the journey starting at day 1 with no gaps or overlaps and the
/// last phase is unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Phase>", into = "Vec<Phase>")]
pub struct PhaseTable {
    phases: Vec<Phase>,
}

impl PhaseTable {
    pub fn new(phases: Vec<Phase>) -> Result<Self, ValidationError> {
        let Some(last) = phases.last() else {
            return Err(ValidationError::EmptyCollection("phases".into()));
        };
        if !last.is_terminal() {
            return Err(ValidationError::BoundedTail(last.id.clone()));
        }

        let mut expected = 1;
        for (i, phase) in phases.iter().enumerate() {
            if phases[..i].iter().any(|p| p.id == phase.id) {
                return Err(ValidationError::DuplicateId {
                    collection: "phase".into(),
                    id: phase.id.clone(),
                });
            }
            if phase.start_day != expected {
                return Err(ValidationError::PhaseGap {
                    phase: phase.id.clone(),
                    start_day: phase.start_day,
                    expected,
                });
            }
            match phase.end_day {
                Some(end) if end < phase.start_day => {
                    return Err(ValidationError::InvertedPhase {
                        phase: phase.id.clone(),
                        start_day: phase.start_day,
                        end_day: end,
                    });
                }
                Some(end) => expected = end + 1,
                None if i + 1 != phases.len() => {
                    return Err(ValidationError::UnboundedNotLast(phase.id.clone()));
                }
                None => {}
            }
        }

        Ok(Self { phases })
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Phase> {
        self.phases.iter().find(|p| p.id == id)
    }

    /// First phase whose range contains `days_elapsed`, else the last phase.
    pub fn current_phase(&self, days_elapsed: u32) -> &Phase {
        let index = self.phase_index(days_elapsed);
        &self.phases[index]
    }

    /// Ordinal position of [`Self::current_phase`].
    pub fn phase_index(&self, days_elapsed: u32) -> usize {
        self.phases
            .iter()
            .position(|p| p.contains(days_elapsed))
            .unwrap_or(self.phases.len() - 1)
    }

    /// Completion of the current phase in `0.0..=100.0`.
    pub fn phase_progress_percent(&self, days_elapsed: u32, terminal_reference_days: u32) -> f64 {
        self.current_phase(days_elapsed)
            .progress_percent(days_elapsed, terminal_reference_days)
    }
}

impl TryFrom<Vec<Phase>> for PhaseTable {
    type Error = ValidationError;

    fn try_from(phases: Vec<Phase>) -> Result<Self, Self::Error> {
        Self::new(phases)
    }
}

impl From<PhaseTable> for Vec<Phase> {
    fn from(table: PhaseTable) -> Self {
        table.phases
    }
}

impl Default for PhaseTable {
    fn default() -> Self {
        standard_phases()
    }
}

fn phase(
    id: &str,
    name: &str,
    description: &str,
    objective: &str,
    start_day: u32,
    end_day: Option<u32>,
) -> Phase {
    Phase {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        objective: objective.to_string(),
        start_day,
        end_day,
    }
}

/// The built-in three-phase journey: activation (days 1-7), acceleration
/// (days 8-21) and an open-ended stabilization phase from day 22.
pub fn standard_phases() -> PhaseTable {
    PhaseTable {
        phases: vec![
            phase(
                "activation",
                "Activation",
                "Your body is recognising the new pattern. This is the internal adjustment \
                 period where metabolism starts to respond.",
                "Build the base of the protocol and establish the daily ritual",
                1,
                Some(7),
            ),
            phase(
                "acceleration",
                "Acceleration",
                "The protocol is in full swing. Your metabolism already recognises the rhythm \
                 and starts working in your favour.",
                "Intensify results through consolidated consistency",
                8,
                Some(21),
            ),
            phase(
                "stabilization",
                "Stabilization",
                "You reached the point of balance. The protocol is now part of who you are. \
                 Keeping going is easier than starting.",
                "Consolidate the new pattern as a permanent habit",
                22,
                None,
            ),
        ],
    }
}
