use clap::Args;
use serde::Serialize;

use ritualtrack_core::protocol::{Phase, StageStatus};
use ritualtrack_core::views::TimelineEntry;

use super::{current_view, open_store, print_json, CmdResult};

#[derive(Args)]
pub struct PhaseArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct PhaseReport<'a> {
    days_elapsed: u32,
    current: &'a str,
    progress_percent: f64,
    phases: &'a [Phase],
    timeline: &'a [TimelineEntry],
}

fn status_mark(status: StageStatus) -> &'static str {
    match status {
        StageStatus::Done => "done",
        StageStatus::Active => "now",
        StageStatus::Upcoming => "",
    }
}

pub fn run(args: PhaseArgs) -> CmdResult {
    let store = open_store()?;
    let view = current_view(&store)?;
    let phases = store.protocol().phases.phases();

    if args.json {
        return print_json(&PhaseReport {
            days_elapsed: view.days_elapsed,
            current: &view.phase.id,
            progress_percent: view.phase_progress_percent,
            phases,
            timeline: &view.timeline,
        });
    }

    for phase in phases {
        let marker = if phase.id == view.phase.id { ">" } else { " " };
        let days = match phase.end_day {
            Some(end) => format!("days {}-{}", phase.start_day, end),
            None => format!("day {}+", phase.start_day),
        };
        println!("{marker} {:<14} {days:<11} {}", phase.name, phase.objective);
    }
    println!(
        "Day {}: {:.0}% through {}",
        view.days_elapsed, view.phase_progress_percent, view.phase.name
    );
    println!();
    for entry in &view.timeline {
        println!(
            "{:<5} {:<9} {}",
            status_mark(entry.status),
            entry.period,
            entry.title
        );
    }
    Ok(())
}
