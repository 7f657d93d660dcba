//! Canonical daily task definitions.
//!
//! The catalog seeds and resets the daily checklist. Catalog order is the
//! display order and the order of every seeded checklist.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::progress::TaskState;

/// A single daily task of the protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub id: String,
    pub label: String,
    /// Name of the pillar the task belongs to (hydration, movement, ...).
    pub pillar: String,
    pub description: String,
    pub guidance: String,
}

/// Ordered, non-empty catalog with unique ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TaskDefinition>", into = "Vec<TaskDefinition>")]
pub struct Catalog {
    items: Vec<TaskDefinition>,
}

impl Catalog {
    pub fn new(items: Vec<TaskDefinition>) -> Result<Self, ValidationError> {
        if items.is_empty() {
            return Err(ValidationError::EmptyCollection("tasks".into()));
        }
        for (i, item) in items.iter().enumerate() {
            if item.id.trim().is_empty() {
                return Err(ValidationError::InvalidValue {
                    field: "tasks.id".into(),
                    message: format!("task at position {i} has an empty id"),
                });
            }
            if items[..i].iter().any(|other| other.id == item.id) {
                return Err(ValidationError::DuplicateId {
                    collection: "task".into(),
                    id: item.id.clone(),
                });
            }
        }
        Ok(Self { items })
    }

    pub fn items(&self) -> &[TaskDefinition] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&TaskDefinition> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Fresh checklist with every task uncompleted.
    pub fn seed(&self) -> Vec<TaskState> {
        self.seed_with(|_| false)
    }

    /// Checklist with one entry per definition, completion looked up by id.
    pub fn seed_with<F>(&self, mut completed: F) -> Vec<TaskState>
    where
        F: FnMut(&str) -> bool,
    {
        self.items
            .iter()
            .map(|item| TaskState {
                task_id: item.id.clone(),
                completed: completed(&item.id),
            })
            .collect()
    }
}

impl TryFrom<Vec<TaskDefinition>> for Catalog {
    type Error = ValidationError;

    fn try_from(items: Vec<TaskDefinition>) -> Result<Self, Self::Error> {
        Self::new(items)
    }
}

impl From<Catalog> for Vec<TaskDefinition> {
    fn from(catalog: Catalog) -> Self {
        catalog.items
    }
}

impl Default for Catalog {
    fn default() -> Self {
        standard_catalog()
    }
}

fn task(id: &str, label: &str, pillar: &str, description: &str, guidance: &str) -> TaskDefinition {
    TaskDefinition {
        id: id.to_string(),
        label: label.to_string(),
        pillar: pillar.to_string(),
        description: description.to_string(),
        guidance: guidance.to_string(),
    }
}

/// The five built-in pillars.
pub fn standard_catalog() -> Catalog {
    Catalog {
        items: vec![
            task(
                "water",
                "Metabolic activation hydration",
                "Hydration",
                "Water is the first signal the body receives to activate metabolism. \
                 Without hydration the process slows down.",
                "Drink at least 2 litres through the day. Start with a glass when you wake up, \
                 before any food.",
            ),
            task(
                "method",
                "Predictable eating",
                "Nutrition",
                "Your body responds to signals, not extreme effort. Predictable meals teach \
                 metabolism to run efficiently.",
                "Keep regular meal times. Avoid skipping or compensating. Consistency beats \
                 perfection.",
            ),
            task(
                "walk",
                "Light active movement",
                "Movement",
                "Light movement keeps metabolism active without stress. It is about sending \
                 signals, not burning calories.",
                "Walk for 20 minutes today. Around the block, to work, or any continuous \
                 movement counts.",
            ),
            task(
                "sleep",
                "Restorative rest",
                "Rest",
                "The body processes and consolidates results during sleep. Without rest the \
                 protocol loses strength.",
                "Sleep 7 to 8 hours. Avoid screens for 30 minutes before bed.",
            ),
            task(
                "avoid",
                "Daily confirmation ritual",
                "Ritual",
                "The daily confirmation closes the protocol cycle and turns intention into \
                 commitment.",
                "At the end of the day review your pillars and confirm the protocol.",
            ),
        ],
    }
}
