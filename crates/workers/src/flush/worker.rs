use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use beacon_aggregate::{Accumulator, AggregateError, AggregationKey, Aggregator};
use beacon_common::{clock, Granularity, PinIdentity};

use super::stats::FlushStats;
use crate::reporting::{HistoryPoint, ReportingStore};

#[derive(Debug, thiserror::Error)]
pub enum FlushError {
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub entries_flushed: usize,
    pub failed_series: usize,
}

/// Moves finished buckets from the aggregator into the reporting store.
///
/// A bucket is finished once `now` has moved past its window. Series the
/// store refuses are merged back into the live store and retried on the
/// next cycle. Stop the worker before closing the aggregator; a flush
/// racing the close can lose the entries it drained.
pub struct FlushWorker {
    aggregator: Arc<Aggregator>,
    reporting: Arc<dyn ReportingStore>,
    stats: Arc<FlushStats>,
}

impl FlushWorker {
    pub fn new(
        aggregator: Arc<Aggregator>,
        reporting: Arc<dyn ReportingStore>,
        stats: Arc<FlushStats>,
    ) -> Self {
        Self {
            aggregator,
            reporting,
            stats,
        }
    }

    pub fn flush_once(&self, now_ms: i64) -> Result<FlushReport, FlushError> {
        let mut report = FlushReport::default();
        for granularity in Granularity::ALL {
            let store = self.aggregator.store(granularity)?;
            let current = granularity.bucket(now_ms);
            let drained = store.drain_where(|k| k.bucket() < current);
            if drained.is_empty() {
                continue;
            }

            for (identity, mut entries) in group_by_identity(drained) {
                entries.sort_by_key(|(k, _)| k.bucket());
                let points: Vec<HistoryPoint> = entries
                    .iter()
                    .filter_map(|(k, acc)| {
                        acc.average().map(|average| HistoryPoint {
                            timestamp_ms: granularity.bucket_start_ms(k.bucket()),
                            average,
                        })
                    })
                    .collect();

                match self.reporting.append(&identity, granularity, &points) {
                    Ok(()) => report.entries_flushed += entries.len(),
                    Err(e) => {
                        tracing::warn!(
                            pin = %identity,
                            %granularity,
                            error = %e,
                            "history append failed, keeping buckets live"
                        );
                        for (key, acc) in entries {
                            store.restore(key, acc);
                        }
                        report.failed_series += 1;
                        self.stats.inc_append_failures();
                    }
                }
            }
        }

        self.stats.inc_cycles();
        self.stats.add_entries_flushed(report.entries_flushed as u64);
        if report.entries_flushed > 0 || report.failed_series > 0 {
            tracing::info!(
                flushed = report.entries_flushed,
                failed = report.failed_series,
                "flush cycle complete"
            );
        }
        Ok(report)
    }

    /// Runs `flush_once` every `interval` until `shutdown` flips to `true`
    /// or its sender goes away.
    pub fn spawn(self, interval: Duration, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // the first tick completes immediately
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = self.flush_once(clock::now_ms()) {
                            tracing::warn!(error = %e, "flush stopped");
                            break;
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("flush worker stopped");
        })
    }
}

fn group_by_identity(
    entries: Vec<(AggregationKey, Accumulator)>,
) -> BTreeMap<PinIdentity, Vec<(AggregationKey, Accumulator)>> {
    let mut groups: BTreeMap<PinIdentity, Vec<_>> = BTreeMap::new();
    for (key, acc) in entries {
        groups.entry(key.identity()).or_default().push((key, acc));
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporting::ReportingError;
    use beacon_common::{PinType, DAY, HOUR};
    use std::sync::Mutex;

    const DAY_START: i64 = 1_438_387_200_000;

    #[derive(Default)]
    struct RecordingStore {
        appended: Mutex<Vec<(PinIdentity, Granularity, Vec<HistoryPoint>)>>,
        fail: bool,
    }

    impl ReportingStore for RecordingStore {
        fn append(
            &self,
            identity: &PinIdentity,
            granularity: Granularity,
            points: &[HistoryPoint],
        ) -> Result<(), ReportingError> {
            if self.fail {
                return Err(ReportingError::Io(std::io::Error::other("disk full")));
            }
            self.appended
                .lock()
                .unwrap()
                .push((identity.clone(), granularity, points.to_vec()));
            Ok(())
        }

        fn read(&self, _: &PinIdentity, _: Granularity) -> Result<Vec<HistoryPoint>, ReportingError> {
            Ok(Vec::new())
        }

        fn delete(&self, _: &PinIdentity) -> Result<usize, ReportingError> {
            Ok(0)
        }
    }

    fn worker(agg: &Arc<Aggregator>, store: &Arc<RecordingStore>) -> FlushWorker {
        FlushWorker::new(agg.clone(), store.clone(), FlushStats::new())
    }

    #[test]
    fn flushes_only_finished_buckets() {
        let agg = Arc::new(Aggregator::in_memory());
        for hour in 0..3 {
            agg.collect("test", 1, 0, PinType::Virtual, 1, DAY_START + hour * HOUR, "10")
                .unwrap();
        }
        let store = Arc::new(RecordingStore::default());

        // now is inside hour 2 of the same day
        let report = worker(&agg, &store).flush_once(DAY_START + 2 * HOUR + 5).unwrap();
        assert_eq!(report.entries_flushed, 2);
        assert_eq!(agg.hourly().unwrap().len(), 1);
        assert_eq!(agg.daily().unwrap().len(), 1);

        let appended = store.appended.lock().unwrap();
        assert_eq!(appended.len(), 1);
        let (id, g, points) = &appended[0];
        assert_eq!(id, &PinIdentity::new("test", 1, 0, PinType::Virtual, 1));
        assert_eq!(*g, Granularity::Hourly);
        assert_eq!(
            points,
            &vec![
                HistoryPoint { timestamp_ms: DAY_START, average: 10.0 },
                HistoryPoint { timestamp_ms: DAY_START + HOUR, average: 10.0 },
            ]
        );
    }

    #[test]
    fn next_day_flushes_daily_bucket() {
        let agg = Arc::new(Aggregator::in_memory());
        agg.collect("test", 1, 0, PinType::Analog, 4, DAY_START, "2").unwrap();
        agg.collect("test", 1, 0, PinType::Analog, 4, DAY_START + HOUR, "4").unwrap();
        let store = Arc::new(RecordingStore::default());

        let report = worker(&agg, &store).flush_once(DAY_START + DAY).unwrap();
        assert_eq!(report.entries_flushed, 3);
        assert!(agg.hourly().unwrap().is_empty());
        assert!(agg.daily().unwrap().is_empty());

        let appended = store.appended.lock().unwrap();
        let daily: Vec<_> = appended
            .iter()
            .filter(|(_, g, _)| *g == Granularity::Daily)
            .collect();
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].2, vec![HistoryPoint { timestamp_ms: DAY_START, average: 3.0 }]);
    }

    #[test]
    fn failed_append_keeps_buckets_live() {
        let agg = Arc::new(Aggregator::in_memory());
        agg.collect("test", 1, 0, PinType::Virtual, 1, DAY_START, "6").unwrap();
        let store = Arc::new(RecordingStore {
            fail: true,
            ..Default::default()
        });
        let stats = FlushStats::new();
        let w = FlushWorker::new(agg.clone(), store, stats.clone());

        let report = w.flush_once(DAY_START + DAY).unwrap();
        assert_eq!(report.entries_flushed, 0);
        assert_eq!(report.failed_series, 2);
        assert_eq!(agg.hourly().unwrap().len(), 1);
        assert_eq!(agg.daily().unwrap().len(), 1);
        assert_eq!(stats.snapshot().append_failures, 2);
        assert_eq!(stats.snapshot().cycles, 1);
    }

    #[test]
    fn closed_aggregator_stops_flushing() {
        let agg = Arc::new(Aggregator::in_memory());
        agg.close().unwrap();
        let store = Arc::new(RecordingStore::default());
        assert!(matches!(
            worker(&agg, &store).flush_once(DAY_START),
            Err(FlushError::Aggregate(AggregateError::Closed))
        ));
    }

    #[tokio::test]
    async fn spawned_worker_stops_on_shutdown() {
        let agg = Arc::new(Aggregator::in_memory());
        let store = Arc::new(RecordingStore::default());
        let (tx, rx) = watch::channel(false);
        let handle = worker(&agg, &store).spawn(Duration::from_millis(10), rx);

        tokio::time::sleep(Duration::from_millis(30)).await;
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
