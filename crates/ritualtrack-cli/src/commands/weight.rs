use clap::Subcommand;
use ritualtrack_core::progress::WeightKind;

use super::{format_weight, open_store, print_json, report, CmdResult};

#[derive(Subcommand)]
pub enum WeightAction {
    /// Set the starting weight. Empty or unreadable input clears it.
    Initial {
        /// Weight in kg ("82.4" and "82,4" both work)
        value: String,
    },
    /// Set today's weight and record it in the history.
    Current {
        /// Weight in kg ("82.4" and "82,4" both work)
        value: String,
    },
    /// Show the weight history
    History {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: WeightAction) -> CmdResult {
    let mut store = open_store()?;

    match action {
        WeightAction::Initial { value } => {
            let outcome = store.update_weight_text(WeightKind::Initial, &value)?;
            let weight = store.record().and_then(|r| r.initial_weight);
            report(outcome, &format!("initial weight: {}", format_weight(weight)));
        }
        WeightAction::Current { value } => {
            let outcome = store.update_weight_text(WeightKind::Current, &value)?;
            let weight = store.record().and_then(|r| r.current_weight);
            report(outcome, &format!("current weight: {}", format_weight(weight)));
        }
        WeightAction::History { json } => {
            let history = store
                .record()
                .map(|r| r.weight_history.clone())
                .unwrap_or_default();
            if json {
                return print_json(&history);
            }
            if history.is_empty() {
                println!("No weight entries yet.");
            }
            for entry in history {
                println!("{}  {:.1} kg", entry.date, entry.weight);
            }
        }
    }
    Ok(())
}
