use clap::Args;

use super::{open_store, report, CmdResult};

#[derive(Args)]
pub struct NameArgs {
    /// Display name, stored as given
    pub name: String,
}

pub fn run(args: NameArgs) -> CmdResult {
    let mut store = open_store()?;
    let outcome = store.update_name(&args.name)?;
    report(outcome, &format!("name: {}", args.name));
    Ok(())
}
