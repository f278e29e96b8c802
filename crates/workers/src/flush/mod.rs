mod stats;
mod worker;

pub use stats::{FlushStats, FlushStatsSnapshot};
pub use worker::{FlushError, FlushReport, FlushWorker};
