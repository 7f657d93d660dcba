use ritualtrack_core::progress::Outcome;
use ritualtrack_core::views::{pick_message, MessageSelector, CONFIRMATION_MESSAGES};

use super::{open_store, report, CmdResult};

pub fn run() -> CmdResult {
    let mut store = open_store()?;
    let outcome = store.confirm_day()?;
    if outcome != Outcome::Applied {
        report(outcome, "");
        return Ok(());
    }

    let mut rng = rand::thread_rng();
    if let Some(message) = pick_message(&CONFIRMATION_MESSAGES, MessageSelector::Random(&mut rng)) {
        println!("{message}");
    }
    let streak = store.record().map_or(0, |r| r.streak);
    let days = if streak == 1 { "day" } else { "days" };
    println!("Streak: {streak} {days}");
    Ok(())
}
