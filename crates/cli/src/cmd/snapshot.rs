use anyhow::{Context, Result};
use clap::Subcommand;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use beacon_aggregate::snapshot::{read_file, snapshot_path};
use beacon_aggregate::{Accumulator, AggregationKey};
use beacon_common::Granularity;

use crate::output::{
    average_cell, build_table, format_bytes, numeric_cell, print_info, print_json, print_success,
    print_warning, text_cell, OutputMode,
};

#[derive(Subcommand)]
pub enum SnapshotCmd {
    #[command(about = "Decode one snapshot file without consuming it")]
    Inspect(InspectArgs),
    #[command(about = "Presence and size of both snapshot files in a directory")]
    Stats(StatsArgs),
}

#[derive(clap::Args)]
pub struct InspectArgs {
    file: PathBuf,
    #[arg(long, default_value = "20", help = "Max number of entries to show")]
    limit: usize,
}

#[derive(clap::Args)]
pub struct StatsArgs {
    #[arg(long, help = "Aggregator storage directory")]
    dir: PathBuf,
}

#[derive(Debug, Serialize, PartialEq)]
pub(crate) struct EntryView {
    pub owner: String,
    pub dashboard_id: i32,
    pub device_id: i32,
    pub pin_type: char,
    pub pin: i32,
    pub bucket: i64,
    pub sum: f64,
    pub count: u64,
    pub average: Option<f64>,
}

impl EntryView {
    fn new(key: &AggregationKey, acc: &Accumulator) -> Self {
        Self {
            owner: key.owner().to_string(),
            dashboard_id: key.dashboard_id(),
            device_id: key.device_id(),
            pin_type: key.pin_type().as_char(),
            pin: key.pin(),
            bucket: key.bucket(),
            sum: acc.sum(),
            count: acc.count(),
            average: acc.average(),
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub(crate) struct FileStats {
    pub granularity: Granularity,
    pub path: String,
    pub present: bool,
    pub size_bytes: u64,
    pub entries: Option<usize>,
    pub error: Option<String>,
}

pub fn execute(cmd: SnapshotCmd, mode: OutputMode) -> Result<()> {
    match cmd {
        SnapshotCmd::Inspect(args) => inspect(args, mode),
        SnapshotCmd::Stats(args) => stats(args, mode),
    }
}

pub(crate) fn load_entries(path: &Path) -> Result<Vec<EntryView>> {
    let entries = read_file(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?
        .with_context(|| format!("no snapshot at {}", path.display()))?;
    let mut views: Vec<EntryView> = entries.iter().map(|(k, a)| EntryView::new(k, a)).collect();
    views.sort_by(|a, b| {
        (&a.owner, a.dashboard_id, a.device_id, a.pin_type, a.pin, a.bucket)
            .cmp(&(&b.owner, b.dashboard_id, b.device_id, b.pin_type, b.pin, b.bucket))
    });
    Ok(views)
}

pub(crate) fn collect_stats(dir: &Path) -> Vec<FileStats> {
    Granularity::ALL
        .iter()
        .map(|&granularity| {
            let path = snapshot_path(dir, granularity);
            let size_bytes = fs::metadata(&path).map(|m| m.len()).ok();
            let (entries, error) = match read_file(&path) {
                Ok(Some(e)) => (Some(e.len()), None),
                Ok(None) => (None, None),
                Err(e) => (None, Some(e.to_string())),
            };
            FileStats {
                granularity,
                path: path.display().to_string(),
                present: size_bytes.is_some(),
                size_bytes: size_bytes.unwrap_or(0),
                entries,
                error,
            }
        })
        .collect()
}

fn inspect(args: InspectArgs, mode: OutputMode) -> Result<()> {
    let entries = load_entries(&args.file)?;
    let total = entries.len();
    let limited: Vec<_> = entries.into_iter().take(args.limit).collect();

    match mode {
        OutputMode::Json => print_json(&serde_json::json!({
            "total": total,
            "entries": limited,
        }))?,
        OutputMode::Human => {
            if limited.is_empty() {
                print_success("Snapshot is empty");
                return Ok(());
            }
            let mut table = build_table(&["Owner", "Dash", "Device", "Pin", "Bucket", "Count", "Average"]);
            for e in &limited {
                table.add_row(vec![
                    text_cell(&e.owner),
                    numeric_cell(e.dashboard_id),
                    numeric_cell(e.device_id),
                    text_cell(format!("{}{}", e.pin_type, e.pin)),
                    numeric_cell(e.bucket),
                    numeric_cell(e.count),
                    average_cell(e.average),
                ]);
            }
            println!("{table}");
            print_info("Entries", &format!("{} of {total}", limited.len()));
        }
    }
    Ok(())
}

fn stats(args: StatsArgs, mode: OutputMode) -> Result<()> {
    let stats = collect_stats(&args.dir);

    match mode {
        OutputMode::Json => print_json(&stats)?,
        OutputMode::Human => {
            print_success("Snapshot files:");
            for s in &stats {
                match (&s.error, s.entries) {
                    (Some(err), _) => print_warning(&format!("{}: corrupt ({err})", s.path)),
                    (None, Some(n)) => print_info(
                        s.granularity.label(),
                        &format!("{n} entries, {}", format_bytes(s.size_bytes)),
                    ),
                    (None, None) => print_info(s.granularity.label(), "absent"),
                }
            }
        }
    }
    Ok(())
}
