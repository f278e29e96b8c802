use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ReportingError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("owner name '{0}' cannot be used as a directory")]
    InvalidOwner(String),
    #[error("history file {} has a partial trailing point ({len} bytes)", .path.display())]
    Corrupt { path: PathBuf, len: u64 },
}
