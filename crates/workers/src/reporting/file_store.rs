use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use beacon_common::{Granularity, PinIdentity};

use super::error::ReportingError;
use super::point::{HistoryPoint, POINT_SIZE};
use super::store::ReportingStore;

/// History files under `<root>/<owner>/`, one per pin and granularity.
///
/// Only owner subdirectories are touched, so snapshot files kept directly
/// in `root` are never affected.
pub struct FileReportingStore {
    root: PathBuf,
    // serializes appends and deletes within this process
    lock: Mutex<()>,
}

pub fn history_file_name(identity: &PinIdentity, granularity: Granularity) -> String {
    format!(
        "history_{}_{}_{}{}_{}.bin",
        identity.dashboard_id,
        identity.device_id,
        identity.pin_type.as_char(),
        identity.pin,
        granularity.label()
    )
}

impl FileReportingStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn history_path(
        &self,
        identity: &PinIdentity,
        granularity: Granularity,
    ) -> Result<PathBuf, ReportingError> {
        Ok(self
            .owner_dir(&identity.owner)?
            .join(history_file_name(identity, granularity)))
    }

    fn owner_dir(&self, owner: &str) -> Result<PathBuf, ReportingError> {
        let mut components = Path::new(owner).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) if name == owner => Ok(self.root.join(name)),
            _ => Err(ReportingError::InvalidOwner(owner.to_string())),
        }
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl ReportingStore for FileReportingStore {
    fn append(
        &self,
        identity: &PinIdentity,
        granularity: Granularity,
        points: &[HistoryPoint],
    ) -> Result<(), ReportingError> {
        if points.is_empty() {
            return Ok(());
        }
        let path = self.history_path(identity, granularity)?;
        let _guard = self.guard();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut buf = Vec::with_capacity(points.len() * POINT_SIZE);
        for p in points {
            buf.extend_from_slice(&p.encode());
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.write_all(&buf)?;
        file.sync_data()?;

        tracing::debug!(pin = %identity, %granularity, points = points.len(), "history appended");
        Ok(())
    }

    fn read(
        &self,
        identity: &PinIdentity,
        granularity: Granularity,
    ) -> Result<Vec<HistoryPoint>, ReportingError> {
        let path = self.history_path(identity, granularity)?;
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if bytes.len() % POINT_SIZE != 0 {
            return Err(ReportingError::Corrupt {
                path,
                len: bytes.len() as u64,
            });
        }

        Ok(bytes
            .chunks_exact(POINT_SIZE)
            .map(|chunk| {
                let mut point = [0u8; POINT_SIZE];
                point.copy_from_slice(chunk);
                HistoryPoint::decode(&point)
            })
            .collect())
    }

    fn delete(&self, identity: &PinIdentity) -> Result<usize, ReportingError> {
        let _guard = self.guard();
        let mut removed = 0;
        for granularity in Granularity::ALL {
            let path = self.history_path(identity, granularity)?;
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        tracing::info!(pin = %identity, removed, "history deleted");
        Ok(removed)
    }
}
