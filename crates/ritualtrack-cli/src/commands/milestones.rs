use clap::Args;

use ritualtrack_core::views::Requirement;

use super::{current_view, open_store, print_json, CmdResult};

#[derive(Args)]
pub struct MilestonesArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

fn describe(requirement: Requirement) -> String {
    match requirement {
        Requirement::Streak(n) => format!("{n}-day streak"),
        Requirement::Day(n) => format!("day {n}"),
        Requirement::Weight(kg) => format!("{kg:.0} kg lost"),
    }
}

pub fn run(args: MilestonesArgs) -> CmdResult {
    let store = open_store()?;
    let view = current_view(&store)?;
    if args.json {
        return print_json(&view.milestones);
    }

    for milestone in &view.milestones {
        let mark = if milestone.achieved { "x" } else { " " };
        let requirement = milestone
            .requirement
            .map(|r| format!(" [{}]", describe(r)))
            .unwrap_or_default();
        println!("[{mark}] {}{requirement}", milestone.label);
    }
    let achieved = view.achieved_milestones().count();
    println!("{achieved} of {} achieved", view.milestones.len());
    Ok(())
}
