use std::path::PathBuf;

use crate::snapshot::SnapshotError;

#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    /// The raw sample was not a finite number. The sample is dropped.
    #[error("invalid sample value '{raw}'")]
    ValueParse { raw: String },
    /// A snapshot file exists but could not be restored.
    #[error("cannot recover snapshot {}: {source}", .path.display())]
    Recovery {
        path: PathBuf,
        #[source]
        source: SnapshotError,
    },
    /// Writing a snapshot at shutdown failed. Files on disk may be partial.
    #[error("cannot persist snapshot {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: SnapshotError,
    },
    #[error("aggregator is closed")]
    Closed,
}
