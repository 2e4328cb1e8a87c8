//! Lagpipe data model
//!
//! Shared tabular types for the chunked pipeline:
//! - `value`: scalar cell values (numeric, categorical, date, missing)
//! - `chunk`: a bounded, ordered slice of the row stream
//! - `table`: a fully materialized column set for whole-table passes

pub mod chunk;
pub mod error;
pub mod table;
pub mod value;

pub use chunk::{Chunk, Column};
pub use error::FrameError;
pub use table::Table;
pub use value::Value;
