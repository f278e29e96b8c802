use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

use beacon_aggregate::{AggregateError, Aggregator};

use super::line::{parse_line, Sample};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub accepted: u64,
    pub rejected: u64,
}

/// Reads samples line by line and forwards them. Blank lines and lines
/// starting with `#` are ignored; malformed lines are logged and skipped.
/// Returns the number of samples sent once input ends or the receiver is
/// dropped.
pub async fn read_samples<R>(reader: R, tx: mpsc::Sender<Sample>) -> std::io::Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut sent = 0u64;
    let mut line_no = 0u64;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match parse_line(trimmed) {
            Ok(sample) => {
                if tx.send(sample).await.is_err() {
                    break;
                }
                sent += 1;
            }
            Err(e) => tracing::warn!(line = line_no, error = %e, "skipping malformed sample line"),
        }
    }
    Ok(sent)
}

/// Feeds samples into the aggregator until the channel closes or the
/// aggregator is closed.
pub async fn apply_samples(
    mut rx: mpsc::Receiver<Sample>,
    aggregator: Arc<Aggregator>,
) -> IngestReport {
    let mut report = IngestReport::default();
    while let Some(sample) = rx.recv().await {
        match aggregator.collect_for(&sample.identity, sample.timestamp_ms, &sample.raw_value) {
            Ok(()) => report.accepted += 1,
            Err(AggregateError::Closed) => {
                tracing::debug!("aggregator closed, ingest stopping");
                break;
            }
            Err(e) => {
                report.rejected += 1;
                tracing::debug!(pin = %sample.identity, error = %e, "sample rejected");
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_aggregate::{AggregationKey, PinType, HOUR};

    #[tokio::test]
    async fn pipes_lines_into_aggregator() {
        let input = "\
# owner dash device type pin ts value
alice 1 0 v 3 1438387200000 10
alice 1 0 v 3 1438387200000 20

alice 1 0 v 3 1438387200000 off
broken line
";
        let agg = Arc::new(Aggregator::in_memory());
        let (tx, rx) = mpsc::channel(4);
        let apply = tokio::spawn(apply_samples(rx, agg.clone()));

        let sent = read_samples(input.as_bytes(), tx).await.unwrap();
        let report = apply.await.unwrap();

        assert_eq!(sent, 3);
        assert_eq!(report, IngestReport { accepted: 2, rejected: 1 });
        let key = AggregationKey::new("alice", 1, 0, PinType::Virtual, 3, 1_438_387_200_000 / HOUR);
        assert_eq!(agg.hourly().unwrap().average(&key), Some(15.0));
    }

    #[tokio::test]
    async fn stops_when_aggregator_closes() {
        let agg = Arc::new(Aggregator::in_memory());
        agg.close().unwrap();
        let (tx, rx) = mpsc::channel(4);
        tx.send(parse_line("a 1 0 v 1 0 1").unwrap()).await.unwrap();
        let report = apply_samples(rx, agg).await;
        assert_eq!(report, IngestReport::default());
    }
}
