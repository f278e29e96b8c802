use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::PathBuf;

use beacon_common::Granularity;
use beacon_workers::reporting::{FileReportingStore, ReportingStore};

use super::pin_args::PinArgs;
use crate::output::{
    average_cell, build_table, numeric_cell, print_info, print_json, print_success, OutputMode,
};

#[derive(Subcommand)]
pub enum HistoryCmd {
    #[command(about = "Show flushed averages for one pin")]
    Show(ShowArgs),
    #[command(about = "Purge all history for one pin")]
    Delete(DeleteArgs),
}

#[derive(clap::Args)]
pub struct ShowArgs {
    #[arg(long, help = "Reporting storage directory")]
    dir: PathBuf,
    #[command(flatten)]
    pin: PinArgs,
    #[arg(long, default_value = "hourly", help = "hourly or daily")]
    granularity: Granularity,
    #[arg(long, default_value = "48", help = "Show only the most recent N points")]
    limit: usize,
}

#[derive(clap::Args)]
pub struct DeleteArgs {
    #[arg(long, help = "Reporting storage directory")]
    dir: PathBuf,
    #[command(flatten)]
    pin: PinArgs,
}

impl ShowArgs {
    pub(crate) fn granularity(&self) -> Granularity {
        self.granularity
    }
}

impl DeleteArgs {
    pub(crate) fn pin(&self) -> &PinArgs {
        &self.pin
    }
}

pub fn execute(cmd: HistoryCmd, mode: OutputMode) -> Result<()> {
    match cmd {
        HistoryCmd::Show(args) => show(args, mode),
        HistoryCmd::Delete(args) => delete(args, mode),
    }
}

fn show(args: ShowArgs, mode: OutputMode) -> Result<()> {
    let store = FileReportingStore::new(&args.dir);
    let granularity = args.granularity();
    let identity = args.pin.identity();
    let points = store
        .read(&identity, granularity)
        .with_context(|| format!("reading history for {identity}"))?;
    let skip = points.len().saturating_sub(args.limit);
    let recent = &points[skip..];

    match mode {
        OutputMode::Json => print_json(&serde_json::json!({
            "pin": identity,
            "granularity": granularity,
            "total": points.len(),
            "points": recent,
        }))?,
        OutputMode::Human => {
            if recent.is_empty() {
                print_success(&format!("No {} history for {identity}", granularity));
                return Ok(());
            }
            let mut table = build_table(&["Bucket start (ms)", "Average"]);
            for p in recent {
                table.add_row(vec![numeric_cell(p.timestamp_ms), average_cell(Some(p.average))]);
            }
            println!("{table}");
            print_info("Points", &format!("{} of {}", recent.len(), points.len()));
        }
    }
    Ok(())
}

fn delete(args: DeleteArgs, mode: OutputMode) -> Result<()> {
    let store = FileReportingStore::new(&args.dir);
    let identity = args.pin().identity();
    let removed = store
        .delete(&identity)
        .with_context(|| format!("deleting history for {identity}"))?;

    match mode {
        OutputMode::Json => print_json(&serde_json::json!({
            "pin": identity,
            "removed_series": removed,
        }))?,
        OutputMode::Human => print_success(&format!("Removed {removed} series for {identity}")),
    }
    Ok(())
}
