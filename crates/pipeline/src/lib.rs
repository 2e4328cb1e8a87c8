//! Lagpipe outer plumbing
//!
//! Everything around the transform core: chunked CSV ingestion with type
//! coercion and the schema-probe protocol, CSV persistence, mean/mode
//! imputation, keyed left joins, and the train/test split by calendar year.
//! The binary in `main.rs` wires these stages into the end-to-end run.

pub mod impute;
pub mod ingest;
pub mod join;
pub mod sink;
pub mod split;

pub use impute::{ImputePlan, ImputingSource};
pub use ingest::{coerce_cell, read_table, CsvReadConfig, CsvSource};
pub use join::{Joiner, JoiningSource};
pub use sink::CsvSink;
pub use split::split_by_year;
