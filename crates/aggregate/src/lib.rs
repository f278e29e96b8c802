//! Hourly and daily rolling averages keyed by pin and time bucket, with
//! snapshot-on-close recovery.

mod accumulator;
mod aggregator;
mod error;
mod key;
pub mod snapshot;
mod stats;
mod store;

pub use accumulator::Accumulator;
pub use aggregator::{Aggregator, RecoveryReport};
pub use error::AggregateError;
pub use key::AggregationKey;
pub use snapshot::{SnapshotError, DAILY_SNAPSHOT_FILE, HOURLY_SNAPSHOT_FILE};
pub use stats::{IngestSnapshot, IngestStats};
pub use store::BucketStore;

pub use beacon_common::{Granularity, PinIdentity, PinType, DAY, HOUR};
