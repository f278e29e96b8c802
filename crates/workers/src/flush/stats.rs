use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct FlushStats {
    cycles: AtomicU64,
    entries_flushed: AtomicU64,
    append_failures: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlushStatsSnapshot {
    pub cycles: u64,
    pub entries_flushed: u64,
    pub append_failures: u64,
}

impl FlushStats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_cycles(&self) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_entries_flushed(&self, count: u64) {
        self.entries_flushed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn inc_append_failures(&self) {
        self.append_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> FlushStatsSnapshot {
        FlushStatsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            entries_flushed: self.entries_flushed.load(Ordering::Relaxed),
            append_failures: self.append_failures.load(Ordering::Relaxed),
        }
    }
}
