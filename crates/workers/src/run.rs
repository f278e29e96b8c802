use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncBufRead;
use tokio::sync::{mpsc, watch};

use beacon_aggregate::{AggregateError, Aggregator};

use crate::config::WorkerConfig;
use crate::flush::{FlushStats, FlushWorker};
use crate::ingest::{apply_samples, read_samples, IngestReport};
use crate::reporting::{FileReportingStore, ReportingStore};

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
    #[error("ingest task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Builds a runtime, drives [`run`] on it, and shuts the runtime down
/// giving leftover blocking tasks at most `grace` to finish. A blocking
/// stdin read cannot be cancelled, so waiting on it would keep the
/// process alive after the aggregator is closed.
pub fn run_blocking<R, S>(
    config: WorkerConfig,
    input: R,
    shutdown: S,
    grace: Duration,
) -> Result<IngestReport, RunError>
where
    R: AsyncBufRead + Unpin + Send + 'static,
    S: Future<Output = ()>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run(config, input, shutdown));
    runtime.shutdown_timeout(grace);
    result
}

/// Runs the worker until `shutdown` resolves or `input` ends, then closes
/// the aggregator so its state survives into the next run.
pub async fn run<R, S>(config: WorkerConfig, input: R, shutdown: S) -> Result<IngestReport, RunError>
where
    R: AsyncBufRead + Unpin + Send + 'static,
    S: Future<Output = ()>,
{
    let aggregator = Arc::new(Aggregator::open(Path::new(&config.storage_dir))?);
    let recovery = aggregator.recovery();
    tracing::info!(
        storage_dir = ?aggregator.storage_dir(),
        recovered_hourly = ?recovery.hourly,
        recovered_daily = ?recovery.daily,
        "aggregator open"
    );

    let (stop_tx, stop_rx) = watch::channel(false);
    let flush_stats = FlushStats::new();
    let flush_handle = if config.flush.enabled && config.persistence_enabled() {
        let reporting: Arc<dyn ReportingStore> =
            Arc::new(FileReportingStore::new(&config.storage_dir));
        let worker = FlushWorker::new(aggregator.clone(), reporting, flush_stats.clone());
        Some(worker.spawn(config.flush.interval(), stop_rx))
    } else {
        tracing::info!("history flushing disabled");
        None
    };

    let (tx, rx) = mpsc::channel(config.ingest.channel_capacity);
    let apply_handle = tokio::spawn(apply_samples(rx, aggregator.clone()));
    let mut read_handle = tokio::spawn(read_samples(input, tx));

    tokio::select! {
        _ = shutdown => tracing::info!("shutdown requested"),
        r = &mut read_handle => match r {
            Ok(Ok(sent)) => tracing::info!(sent, "input exhausted"),
            Ok(Err(e)) => tracing::error!(error = %e, "reading input failed"),
            Err(e) => tracing::error!(error = %e, "input task panicked"),
        },
    }
    // Dropping the sender lets the apply task drain what is queued and end.
    read_handle.abort();
    let report = apply_handle.await?;

    let _ = stop_tx.send(true);
    if let Some(handle) = flush_handle {
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "flush worker panicked");
        }
    }

    aggregator.close()?;

    let ingest = aggregator.stats();
    let flush = flush_stats.snapshot();
    tracing::info!(
        collected = ingest.collected,
        rejected = ingest.rejected,
        flush_cycles = flush.cycles,
        flushed = flush.entries_flushed,
        flush_failures = flush.append_failures,
        "worker stopped"
    );
    Ok(report)
}
