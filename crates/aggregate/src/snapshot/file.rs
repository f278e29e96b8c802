use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use beacon_common::Granularity;

use super::codec::{read_snapshot, write_snapshot};
use super::error::SnapshotError;
use super::{DAILY_SNAPSHOT_FILE, HOURLY_SNAPSHOT_FILE};
use crate::accumulator::Accumulator;
use crate::key::AggregationKey;

pub fn snapshot_path(dir: &Path, granularity: Granularity) -> PathBuf {
    match granularity {
        Granularity::Hourly => dir.join(HOURLY_SNAPSHOT_FILE),
        Granularity::Daily => dir.join(DAILY_SNAPSHOT_FILE),
    }
}

/// Writes `entries` next to `path`, syncs, then renames over `path`, so a
/// reader never sees a half-written snapshot under the final name.
pub fn write_file(
    path: &Path,
    entries: &[(AggregationKey, Accumulator)],
) -> Result<(), SnapshotError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp = tmp_path(path);
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&tmp)?;
    let mut writer = BufWriter::new(file);
    let written = write_snapshot(&mut writer, entries).and_then(|_| {
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        Ok(())
    });
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }

    fs::rename(&tmp, path)?;
    Ok(())
}

/// `Ok(None)` when no snapshot exists at `path`.
pub fn read_file(path: &Path) -> Result<Option<Vec<(AggregationKey, Accumulator)>>, SnapshotError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut reader = BufReader::new(file);
    read_snapshot(&mut reader).map(Some)
}

pub fn remove_file(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_common::PinType;

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = snapshot_path(dir.path(), Granularity::Hourly);
        let entries = vec![(
            AggregationKey::new("test", 1, 0, PinType::Virtual, 1, 7),
            Accumulator::from_parts(99.0, 2),
        )];

        write_file(&path, &entries).unwrap();
        assert!(path.exists());
        assert!(!tmp_path(&path).exists());

        let read = read_file(&path).unwrap().unwrap();
        assert_eq!(read, entries);
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = snapshot_path(dir.path(), Granularity::Daily);
        assert!(read_file(&path).unwrap().is_none());
    }

    #[test]
    fn overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = snapshot_path(dir.path(), Granularity::Daily);
        fs::write(&path, b"stale garbage").unwrap();

        write_file(&path, &[]).unwrap();
        assert!(read_file(&path).unwrap().unwrap().is_empty());
    }

    #[test]
    fn creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = snapshot_path(&dir.path().join("nested/reporting"), Granularity::Hourly);
        write_file(&path, &[]).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn remove_missing_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        remove_file(&dir.path().join("absent.bin")).unwrap();
    }

    #[test]
    fn fixed_names_per_granularity() {
        let dir = Path::new("/var/lib/beacon");
        assert_eq!(
            snapshot_path(dir, Granularity::Hourly),
            dir.join("hourly_temp.bin")
        );
        assert_eq!(
            snapshot_path(dir, Granularity::Daily),
            dir.join("daily_temp.bin")
        );
    }
}
