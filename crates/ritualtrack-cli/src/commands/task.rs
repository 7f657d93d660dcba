use clap::Subcommand;
use serde::Serialize;

use super::{open_store, print_json, report, CmdResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// List today's checklist
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Flip one task of today's checklist
    Toggle {
        /// Task id (e.g. "water")
        id: String,
    },
}

#[derive(Serialize)]
struct TaskRow<'a> {
    id: &'a str,
    label: &'a str,
    pillar: &'a str,
    completed: bool,
}

pub fn run(action: TaskAction) -> CmdResult {
    let mut store = open_store()?;

    match action {
        TaskAction::List { json } => {
            let Some(record) = store.record() else {
                println!("No local identity; nothing to show.");
                return Ok(());
            };
            let catalog = &store.protocol().catalog;
            let rows: Vec<TaskRow> = record
                .daily_tasks
                .iter()
                .filter_map(|task| {
                    let def = catalog.get(&task.task_id)?;
                    Some(TaskRow {
                        id: &def.id,
                        label: &def.label,
                        pillar: &def.pillar,
                        completed: task.completed,
                    })
                })
                .collect();
            if json {
                return print_json(&rows);
            }
            for row in rows {
                let mark = if row.completed { "x" } else { " " };
                println!("[{mark}] {:<8} {} ({})", row.id, row.label, row.pillar);
            }
        }
        TaskAction::Toggle { id } => {
            let outcome = store.toggle_task(&id)?;
            let done = store
                .record()
                .and_then(|r| r.task(&id))
                .is_some_and(|t| t.completed);
            let state = if done { "done" } else { "not done" };
            report(outcome, &format!("{id}: {state}"));
        }
    }
    Ok(())
}
