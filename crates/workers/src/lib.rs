pub mod config;
pub mod flush;
pub mod ingest;
pub mod reporting;
pub mod run;
pub mod shutdown;
