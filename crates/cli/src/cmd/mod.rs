pub(crate) mod history;
pub(crate) mod pin_args;
pub(crate) mod snapshot;

use anyhow::Result;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    #[command(subcommand, about = "Inspect aggregator snapshot files")]
    Snapshot(snapshot::SnapshotCmd),
    #[command(subcommand, about = "Read or purge long-term pin history")]
    History(history::HistoryCmd),
}

pub fn run(opts: crate::Opts) -> Result<()> {
    let mode = opts.output_mode();
    match opts.cmd {
        Commands::Snapshot(cmd) => snapshot::execute(cmd, mode),
        Commands::History(cmd) => history::execute(cmd, mode),
    }
}
