//! Binary snapshot of one bucket store.
//!
//! Layout: `BSNP` magic, version byte, little-endian `u64` entry count, then
//! one CRC-framed record per entry. The stream must end right after the last
//! record. Granularity is not stored; it follows from the file name.

mod codec;
mod error;
mod file;
mod frame;

pub use codec::{read_snapshot, write_snapshot, FORMAT_VERSION, MAGIC};
pub use error::SnapshotError;
pub use file::{read_file, remove_file, snapshot_path, write_file};

pub const HOURLY_SNAPSHOT_FILE: &str = "hourly_temp.bin";
pub const DAILY_SNAPSHOT_FILE: &str = "daily_temp.bin";
