use clap::Args;

use super::{current_view, open_store, print_json, CmdResult};

#[derive(Args)]
pub struct TrendArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: TrendArgs) -> CmdResult {
    let store = open_store()?;
    let view = current_view(&store)?;
    if args.json {
        return print_json(&view.trend);
    }
    println!("{}", view.trend.title);
    println!("{}", view.trend.message);
    Ok(())
}
