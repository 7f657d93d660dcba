use clap::Args;

use super::{current_view, format_weight, open_store, print_json, CmdResult};

#[derive(Args)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: StatusArgs) -> CmdResult {
    let store = open_store()?;
    let view = current_view(&store)?;
    if args.json {
        return print_json(&view);
    }

    let name = if view.name.is_empty() { "you" } else { view.name.as_str() };
    println!("Hello, {name}. Day {} of your journey.", view.days_elapsed);
    println!("{}", view.status_message);
    println!("{}", view.ritual_message);
    println!(
        "Phase {}/{}: {} ({:.0}%)",
        view.phase_index + 1,
        view.phase_count,
        view.phase.name,
        view.phase_progress_percent
    );
    println!(
        "Weight: {} -> {} (lost {:.1} kg)",
        format_weight(view.initial_weight),
        format_weight(view.current_weight),
        view.weight_lost
    );
    println!("Checklist: {}/{}", view.completed_tasks, view.total_tasks);
    if let Some(feedback) = &view.checklist_feedback {
        println!("  {}", feedback.message);
    }
    println!("{}: {}", view.reinforcement.title, view.reinforcement.text);
    Ok(())
}
