//! Lagpipe transform core
//!
//! Computes lag features ("value of column X exactly k rows earlier") over an
//! ordered stream of bounded chunks. The dataset never has to fit in memory:
//! each configured offset keeps a fixed-length carry-over buffer of the most
//! recent source values, so a lag can reach across chunk boundaries.
//!
//! Modules:
//! - `spec`: validated lag configuration (source column, offsets, naming)
//! - `state`: per-offset carry-over buffers and the run-scoped state store
//! - `engine`: the chunk-at-a-time transform with bootstrap and probe paths
//! - `driver`: sequential source → engine → sink execution with ordering
//!   and schema enforcement
//! - `io`: `ChunkSource`/`ChunkSink` traits plus in-memory implementations

pub mod driver;
pub mod engine;
pub mod error;
pub mod io;
pub mod spec;
pub mod state;

pub use driver::{PipelineDriver, RunSummary};
pub use engine::LagTransformEngine;
pub use error::EngineError;
pub use io::{ChunkSink, ChunkSource, MemorySink, MemorySource};
pub use spec::LagSpec;
pub use state::{LagBuffer, LagStateStore};
