//! The active protocol: phase table, task catalog and tunable rules.
//!
//! Derived views and the progress store are parameterised by a [`Protocol`]
//! instead of reading process-wide tables, so an alternative journey can be
//! loaded from a TOML definition without touching the core logic.
//!
//! ```toml
//! [[phases]]
//! id = "start"
//! name = "Start"
//! description = "..."
//! objective = "..."
//! start_day = 1
//! end_day = 10
//!
//! [[phases]]
//! id = "keep"
//! name = "Keep"
//! description = "..."
//! objective = "..."
//! start_day = 11
//!
//! [[tasks]]
//! id = "water"
//! label = "Drink water"
//! pillar = "Hydration"
//! description = "..."
//! guidance = "..."
//! ```

pub mod catalog;
pub mod phase;
pub mod timeline;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, CoreError, ValidationError};

pub use catalog::{standard_catalog, Catalog, TaskDefinition};
pub use phase::{standard_phases, Phase, PhaseTable};
pub use timeline::{timeline_stages, StageStatus, TimelineStage};

/// Thresholds used by the derived views.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProtocolRules {
    /// Reference window for progress through the unbounded terminal phase.
    pub terminal_reference_days: u32,
    /// Number of most recent weight entries inspected for a rising trend.
    pub trend_window: usize,
    /// Net rise (kg) across the trend window that counts as a rising trend.
    pub trend_rise_threshold: f64,
}

impl Default for ProtocolRules {
    fn default() -> Self {
        Self {
            terminal_reference_days: 30,
            trend_window: 3,
            trend_rise_threshold: 0.5,
        }
    }
}

impl ProtocolRules {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.terminal_reference_days == 0 {
            return Err(ValidationError::InvalidValue {
                field: "terminal_reference_days".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.trend_window < 2 {
            return Err(ValidationError::InvalidValue {
                field: "trend_window".into(),
                message: "must cover at least 2 entries".into(),
            });
        }
        if !self.trend_rise_threshold.is_finite() || self.trend_rise_threshold < 0.0 {
            return Err(ValidationError::InvalidValue {
                field: "trend_rise_threshold".into(),
                message: "must be a non-negative number".into(),
            });
        }
        Ok(())
    }
}

/// Phase table, catalog and rules that together define a journey.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Protocol {
    pub phases: PhaseTable,
    pub catalog: Catalog,
    pub rules: ProtocolRules,
}

/// On-disk shape of a protocol definition file.
#[derive(Debug, Deserialize)]
struct ProtocolDefinition {
    phases: Vec<Phase>,
    tasks: Vec<TaskDefinition>,
}

impl Protocol {
    /// The built-in journey.
    pub fn standard() -> Self {
        Self::default()
    }

    pub fn with_rules(mut self, rules: ProtocolRules) -> Self {
        self.rules = rules;
        self
    }

    /// Parse and validate a TOML protocol definition. Rules are left at
    /// their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, CoreError> {
        let definition: ProtocolDefinition =
            toml::from_str(content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Ok(Self {
            phases: PhaseTable::new(definition.phases)?,
            catalog: Catalog::new(definition.tasks)?,
            rules: ProtocolRules::default(),
        })
    }

    /// Load a protocol definition file.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn current_phase(&self, days_elapsed: u32) -> &Phase {
        self.phases.current_phase(days_elapsed)
    }

    pub fn phase_index(&self, days_elapsed: u32) -> usize {
        self.phases.phase_index(days_elapsed)
    }

    pub fn phase_progress_percent(&self, days_elapsed: u32) -> f64 {
        self.phases
            .phase_progress_percent(days_elapsed, self.rules.terminal_reference_days)
    }
}
