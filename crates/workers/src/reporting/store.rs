use beacon_common::{Granularity, PinIdentity};

use super::error::ReportingError;
use super::point::HistoryPoint;

/// Long-term per-pin history fed by the flush worker.
///
/// Implementations keep their data apart from the aggregator's snapshot
/// files: no operation here may create, modify or remove them.
pub trait ReportingStore: Send + Sync {
    fn append(
        &self,
        identity: &PinIdentity,
        granularity: Granularity,
        points: &[HistoryPoint],
    ) -> Result<(), ReportingError>;

    fn read(
        &self,
        identity: &PinIdentity,
        granularity: Granularity,
    ) -> Result<Vec<HistoryPoint>, ReportingError>;

    /// Purges every granularity of history for `identity`. Returns how many
    /// series were removed.
    fn delete(&self, identity: &PinIdentity) -> Result<usize, ReportingError>;
}
