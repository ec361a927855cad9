pub mod error;
pub mod ingest;
pub mod merge;
pub mod report;
pub mod serve;
pub mod standardize;
