use beacon_common::{Granularity, PinIdentity, PinType};
use beacon_workers::reporting::{FileReportingStore, HistoryPoint, ReportingStore};
use clap::Parser;

use crate::Opts;

fn seed(dir: &std::path::Path) -> PinIdentity {
    let id = PinIdentity::new("test", 1, 0, PinType::Virtual, 3);
    let store = FileReportingStore::new(dir);
    for g in Granularity::ALL {
        store
            .append(&id, g, &[HistoryPoint { timestamp_ms: 0, average: 1.5 }])
            .unwrap();
    }
    id
}

fn run(args: &[&str]) -> anyhow::Result<()> {
    let mut full = vec!["beacon", "--json"];
    full.extend_from_slice(args);
    crate::cmd::run(Opts::parse_from(full))
}

#[test]
fn show_reads_existing_history() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    let root = dir.path().to_str().unwrap();
    run(&[
        "history", "show", "--dir", root, "--owner", "test", "--dashboard", "1", "--pin-type",
        "v", "--pin", "3",
    ])
    .unwrap();
}

#[test]
fn delete_purges_both_series() {
    let dir = tempfile::tempdir().unwrap();
    let id = seed(dir.path());
    let root = dir.path().to_str().unwrap();
    run(&[
        "history", "delete", "--dir", root, "--owner", "test", "--dashboard", "1", "--pin-type",
        "v", "--pin", "3",
    ])
    .unwrap();

    let store = FileReportingStore::new(dir.path());
    assert!(store.read(&id, Granularity::Hourly).unwrap().is_empty());
    assert!(store.read(&id, Granularity::Daily).unwrap().is_empty());
}

#[test]
fn invalid_owner_surfaces_as_error() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_str().unwrap();
    let err = run(&[
        "history", "delete", "--dir", root, "--owner", "../etc", "--dashboard", "1",
        "--pin-type", "v", "--pin", "3",
    ])
    .unwrap_err();
    assert!(format!("{err:#}").contains("deleting history"));
}
