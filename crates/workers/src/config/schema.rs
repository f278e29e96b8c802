use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct WorkerConfig {
    /// Holds snapshot files and per-owner history. Empty disables both.
    #[serde(default)]
    pub storage_dir: String,
    #[serde(default)]
    pub flush: FlushConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FlushConfig {
    #[serde(default = "default_flush_interval")]
    pub interval_seconds: u64,
    #[serde(default = "yes")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct IngestConfig {
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl WorkerConfig {
    pub fn persistence_enabled(&self) -> bool {
        !self.storage_dir.is_empty()
    }
}

impl FlushConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

impl Default for FlushConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_flush_interval(),
            enabled: true,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_flush_interval() -> u64 {
    60
}

fn default_channel_capacity() -> usize {
    1024
}

fn yes() -> bool {
    true
}
