use clap::Args;

use super::{open_store, report, CmdResult};

#[derive(Args)]
pub struct ResetArgs {
    /// Confirm the reset; weights, history, streak and checklist are lost
    #[arg(long)]
    pub yes: bool,
}

pub fn run(args: ResetArgs) -> CmdResult {
    if !args.yes {
        return Err("refusing to reset without --yes".into());
    }
    let mut store = open_store()?;
    let outcome = store.reset_progress()?;
    report(outcome, "progress reset; the journey starts today");
    Ok(())
}
