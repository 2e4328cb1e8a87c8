//! Error taxonomy for the transform core
//!
//! Every variant is fatal for the run: the carry-over state reflects a
//! specific prefix of the stream and cannot be rewound, so no retries are
//! performed inside the core. Any retry policy belongs to the caller and must
//! restart from an empty state store.

use lagpipe_frame::FrameError;
use thiserror::Error;

/// Errors raised by the lag transform engine and pipeline driver
#[derive(Debug, Error)]
pub enum EngineError {
    /// Non-positive or duplicate offsets, or an empty configuration
    #[error("invalid lag spec: {0}")]
    InvalidLagSpec(String),

    /// A probe chunk's column set disagrees with a real chunk's, or the
    /// schema changed mid-stream
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A chunk arrived that does not follow the prior chunk in stream order
    #[error("out-of-order chunk: {0}")]
    OutOfOrderChunk(String),

    /// The upstream chunk source failed mid-stream; partial sink output is
    /// left in place and must be treated as invalid
    #[error("upstream source failure: {0}")]
    UpstreamSourceFailure(String),

    /// A real chunk was processed before the one-time bootstrap ran
    #[error("engine not bootstrapped before first real chunk")]
    NotBootstrapped,

    /// Bootstrap was invoked after the state store already existed
    #[error("bootstrap invoked twice for one run")]
    AlreadyBootstrapped,

    /// A probe chunk was passed where a real chunk is required
    #[error("probe chunk passed where a real chunk is required")]
    UnexpectedProbeChunk,

    /// Data model violation (ragged columns, missing column, ...)
    #[error("data model error: {0}")]
    Frame(#[from] FrameError),

    /// I/O error from a source or sink
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for transform core operations
pub type Result<T> = std::result::Result<T, EngineError>;
