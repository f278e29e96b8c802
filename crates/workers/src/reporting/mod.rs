mod error;
mod file_store;
mod point;
mod store;

pub use error::ReportingError;
pub use file_store::{history_file_name, FileReportingStore};
pub use point::{HistoryPoint, POINT_SIZE};
pub use store::ReportingStore;
