use std::io;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("io: {0}")]
    Io(#[from] io::Error),
    #[error("not a snapshot file (bad magic)")]
    BadMagic,
    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u8),
    #[error("snapshot truncated at entry {index}")]
    Truncated { index: u64 },
    #[error("crc mismatch at entry {index}")]
    CrcMismatch { index: u64 },
    #[error("malformed entry {index}: {reason}")]
    Malformed { index: u64, reason: String },
    #[error("duplicate key at entry {index}")]
    DuplicateKey { index: u64 },
    #[error("unexpected data after entry {expected}")]
    TrailingData { expected: u64 },
}

impl SnapshotError {
    /// Whether the file itself is damaged, as opposed to an I/O failure
    /// while accessing it.
    pub fn is_corruption(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}
