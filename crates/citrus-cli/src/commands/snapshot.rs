//! Export snapshot command.

use super::common::ControlArgs;
use clap::Args;

#[derive(Args)]
pub struct SnapshotArgs {
    #[command(flatten)]
    controls: ControlArgs,

    /// Print on one line
    #[arg(long)]
    compact: bool,
}

pub fn run(args: SnapshotArgs) -> anyhow::Result<()> {
    let snapshot = args.controls.values().snapshot();
    let json = if args.compact {
        serde_json::to_string(&snapshot)?
    } else {
        serde_json::to_string_pretty(&snapshot)?
    };
    println!("{json}");
    Ok(())
}
