mod line;
mod pump;

pub use line::{parse_line, LineError, Sample};
pub use pump::{apply_samples, read_samples, IngestReport};
