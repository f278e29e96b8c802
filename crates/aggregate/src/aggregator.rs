use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use beacon_common::{Granularity, PinIdentity, PinType};

use super::error::AggregateError;
use super::key::AggregationKey;
use super::snapshot::{self, SnapshotError};
use super::stats::{IngestSnapshot, IngestStats};
use super::store::BucketStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Active,
    /// `close` failed to persist; only another `close` is accepted.
    CloseFailed,
    Closed,
}

/// Entries restored from snapshot files at `open`, per granularity.
/// `None` means no file was present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    pub hourly: Option<usize>,
    pub daily: Option<usize>,
}

impl RecoveryReport {
    pub fn recovered(&self) -> bool {
        self.hourly.is_some() || self.daily.is_some()
    }
}

/// Hourly and daily averages for every reporting pin.
///
/// Snapshot files are written by [`Aggregator::close`] and consumed by the
/// next [`Aggregator::open`] on the same directory. A process that exits
/// without `close` loses whatever was not flushed elsewhere.
pub struct Aggregator {
    hourly: BucketStore,
    daily: BucketStore,
    storage_dir: Option<PathBuf>,
    lifecycle: RwLock<Lifecycle>,
    recovery: RecoveryReport,
    stats: IngestStats,
}

impl Aggregator {
    /// Aggregator without persistence.
    pub fn in_memory() -> Self {
        Self::with_stores(
            BucketStore::new(Granularity::Hourly),
            BucketStore::new(Granularity::Daily),
            None,
            RecoveryReport::default(),
        )
    }

    /// Opens an aggregator persisting to `storage_dir`; an empty path
    /// disables persistence. Snapshot files left by a previous `close` are
    /// loaded and then deleted. A damaged snapshot fails the open and is
    /// left in place.
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, AggregateError> {
        let dir = storage_dir.as_ref();
        if dir.as_os_str().is_empty() {
            return Ok(Self::in_memory());
        }

        let hourly = BucketStore::new(Granularity::Hourly);
        let daily = BucketStore::new(Granularity::Daily);

        // Decode both before consuming either, so a damaged daily file does
        // not cost the hourly one.
        let hourly_path = snapshot::snapshot_path(dir, Granularity::Hourly);
        let daily_path = snapshot::snapshot_path(dir, Granularity::Daily);
        let hourly_loaded = load(&hourly, &hourly_path)?;
        let daily_loaded = load(&daily, &daily_path)?;

        let recovery = RecoveryReport {
            hourly: hourly_loaded,
            daily: daily_loaded,
        };
        let consumed: Vec<&Path> = [
            hourly_loaded.map(|_| hourly_path.as_path()),
            daily_loaded.map(|_| daily_path.as_path()),
        ]
        .into_iter()
        .flatten()
        .collect();
        consume(&consumed);

        if recovery.recovered() {
            tracing::info!(
                dir = %dir.display(),
                hourly = hourly.len(),
                daily = daily.len(),
                "restored aggregates from snapshot"
            );
        }

        Ok(Self::with_stores(
            hourly,
            daily,
            Some(dir.to_path_buf()),
            recovery,
        ))
    }

    fn with_stores(
        hourly: BucketStore,
        daily: BucketStore,
        storage_dir: Option<PathBuf>,
        recovery: RecoveryReport,
    ) -> Self {
        Self {
            hourly,
            daily,
            storage_dir,
            lifecycle: RwLock::new(Lifecycle::Active),
            recovery,
            stats: IngestStats::default(),
        }
    }

    /// Adds one raw sample to the hourly and daily bucket containing
    /// `timestamp_ms`. A value that does not parse as a finite number is
    /// rejected and leaves both stores untouched.
    #[allow(clippy::too_many_arguments)]
    pub fn collect(
        &self,
        owner: &str,
        dashboard_id: i32,
        device_id: i32,
        pin_type: PinType,
        pin: i32,
        timestamp_ms: i64,
        raw_value: &str,
    ) -> Result<(), AggregateError> {
        let identity = PinIdentity::new(owner, dashboard_id, device_id, pin_type, pin);
        self.collect_for(&identity, timestamp_ms, raw_value)
    }

    pub fn collect_for(
        &self,
        identity: &PinIdentity,
        timestamp_ms: i64,
        raw_value: &str,
    ) -> Result<(), AggregateError> {
        // Held for the whole merge so `close` cannot snapshot in between.
        let state = self.lifecycle.read().unwrap_or_else(PoisonError::into_inner);
        if *state != Lifecycle::Active {
            return Err(AggregateError::Closed);
        }

        let value = match parse_value(raw_value) {
            Some(v) => v,
            None => {
                self.stats.inc_rejected();
                tracing::debug!(pin = %identity, raw = raw_value, "dropping non-numeric sample");
                return Err(AggregateError::ValueParse {
                    raw: raw_value.to_string(),
                });
            }
        };

        self.hourly.merge(
            AggregationKey::for_sample(identity, Granularity::Hourly, timestamp_ms),
            value,
        );
        self.daily.merge(
            AggregationKey::for_sample(identity, Granularity::Daily, timestamp_ms),
            value,
        );
        self.stats.inc_collected();
        Ok(())
    }

    pub fn hourly(&self) -> Result<&BucketStore, AggregateError> {
        self.ensure_active()?;
        Ok(&self.hourly)
    }

    pub fn daily(&self) -> Result<&BucketStore, AggregateError> {
        self.ensure_active()?;
        Ok(&self.daily)
    }

    pub fn store(&self, granularity: Granularity) -> Result<&BucketStore, AggregateError> {
        match granularity {
            Granularity::Hourly => self.hourly(),
            Granularity::Daily => self.daily(),
        }
    }

    pub fn storage_dir(&self) -> Option<&Path> {
        self.storage_dir.as_deref()
    }

    pub fn recovery(&self) -> RecoveryReport {
        self.recovery
    }

    pub fn stats(&self) -> IngestSnapshot {
        self.stats.snapshot()
    }

    pub fn is_closed(&self) -> bool {
        *self.lifecycle.read().unwrap_or_else(PoisonError::into_inner) != Lifecycle::Active
    }

    /// Ends the aggregator's life. With persistence enabled both stores are
    /// written to their snapshot files, replacing older ones. Later calls to
    /// anything but `close` fail with [`AggregateError::Closed`]; `close`
    /// itself may be retried only after a persistence failure.
    pub fn close(&self) -> Result<(), AggregateError> {
        let mut state = self.lifecycle.write().unwrap_or_else(PoisonError::into_inner);
        if *state == Lifecycle::Closed {
            return Err(AggregateError::Closed);
        }
        *state = Lifecycle::CloseFailed;

        let Some(dir) = &self.storage_dir else {
            *state = Lifecycle::Closed;
            tracing::debug!("persistence disabled, nothing to snapshot");
            return Ok(());
        };

        for store in [&self.hourly, &self.daily] {
            let path = snapshot::snapshot_path(dir, store.granularity());
            let entries = store.entries();
            snapshot::write_file(&path, &entries).map_err(|source| {
                tracing::error!(path = %path.display(), error = %source, "snapshot write failed");
                AggregateError::Persistence {
                    path: path.clone(),
                    source,
                }
            })?;
            tracing::info!(
                granularity = %store.granularity(),
                entries = entries.len(),
                path = %path.display(),
                "snapshot written"
            );
        }

        *state = Lifecycle::Closed;
        Ok(())
    }

    fn ensure_active(&self) -> Result<(), AggregateError> {
        if self.is_closed() {
            return Err(AggregateError::Closed);
        }
        Ok(())
    }
}

impl Drop for Aggregator {
    fn drop(&mut self) {
        let state = *self.lifecycle.get_mut().unwrap_or_else(PoisonError::into_inner);
        if state != Lifecycle::Closed && self.storage_dir.is_some() {
            tracing::warn!(
                hourly = self.hourly.len(),
                daily = self.daily.len(),
                "aggregator dropped without a successful close; live aggregates are lost"
            );
        }
    }
}

fn parse_value(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn load(store: &BucketStore, path: &Path) -> Result<Option<usize>, AggregateError> {
    let recovery_error = |source| AggregateError::Recovery {
        path: path.to_path_buf(),
        source,
    };

    let Some(entries) = snapshot::read_file(path).map_err(recovery_error)? else {
        return Ok(None);
    };
    let count = entries.len();
    for (index, (key, acc)) in entries.into_iter().enumerate() {
        if !store.insert_recovered(key, acc) {
            return Err(recovery_error(SnapshotError::DuplicateKey {
                index: index as u64,
            }));
        }
    }
    tracing::debug!(path = %path.display(), entries = count, "snapshot decoded");
    Ok(Some(count))
}

/// Deletes restored snapshot files. Their contents already live in memory,
/// so a failed removal is logged and the remaining files are still removed;
/// the next `close` overwrites whatever is left behind.
fn consume(paths: &[&Path]) -> usize {
    let mut failed = 0;
    for path in paths {
        if let Err(e) = snapshot::remove_file(path) {
            tracing::error!(path = %path.display(), error = %e, "cannot remove restored snapshot");
            failed += 1;
        }
    }
    failed
}
