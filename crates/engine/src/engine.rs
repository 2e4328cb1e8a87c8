//! The chunk-at-a-time lag transform
//!
//! For one offset `k` with carry-over buffer `B` (length `k`) and a chunk's
//! source values `V = [v1..vn]`, the combined stream `A = B ++ V` yields the
//! lag column: output row `i` (1-indexed) takes `A[i]`, and the new buffer is
//! the last `k` elements of `A`. The rule holds for chunks both shorter and
//! longer than the offset, so chunk boundaries never need special cases.
//!
//! Probe chunks bypass the state entirely and pass through unchanged; see
//! `process_chunk` for the schema-shape hazard that creates.

use crate::error::{EngineError, Result};
use crate::spec::LagSpec;
use crate::state::LagStateStore;
use lagpipe_frame::{Chunk, Column};
use tracing::{debug, warn};

/// Stateful engine transforming an ordered stream of chunks into
/// lag-augmented output chunks.
///
/// The engine exclusively owns its `LagStateStore` for the duration of one
/// strictly sequential run. Chunk `i+1` must never be processed before chunk
/// `i`'s state update has completed; the `start_row` check enforces this.
pub struct LagTransformEngine {
    spec: LagSpec,
    state: Option<LagStateStore>,
    rows_processed: usize,
    input_schema: Option<Vec<String>>,
    probe_warned: bool,
}

impl LagTransformEngine {
    /// Pure construction, no I/O. The spec is already validated; the state
    /// store stays absent until `bootstrap` runs.
    pub fn new(spec: LagSpec) -> Self {
        Self {
            spec,
            state: None,
            rows_processed: 0,
            input_schema: None,
            probe_warned: false,
        }
    }

    pub fn spec(&self) -> &LagSpec {
        &self.spec
    }

    /// True once the one-time bootstrap has created the state store
    pub fn is_bootstrapped(&self) -> bool {
        self.state.is_some()
    }

    /// Count of real rows processed so far
    pub fn rows_processed(&self) -> usize {
        self.rows_processed
    }

    /// One-time state initialization from the first real chunk: every buffer
    /// for offset `k` is filled with the first row's source value repeated
    /// `k` times. The driver invokes this exactly once, before the first real
    /// chunk is processed.
    ///
    /// An empty chunk has no first row; bootstrap is deferred and the call
    /// is a no-op so the driver can retry on the next real chunk.
    pub fn bootstrap(&mut self, chunk: &Chunk) -> Result<()> {
        if chunk.is_probe() {
            return Err(EngineError::UnexpectedProbeChunk);
        }
        if self.state.is_some() {
            return Err(EngineError::AlreadyBootstrapped);
        }
        if chunk.is_empty() {
            debug!("bootstrap deferred: first real chunk is empty");
            return Ok(());
        }
        let source = chunk.require_column(self.spec.source_column())?;
        let first_value = &source.values[0];
        self.state = Some(LagStateStore::bootstrap(&self.spec, first_value));
        debug!(
            source = self.spec.source_column(),
            offsets = ?self.spec.offsets(),
            "lag state bootstrapped"
        );
        Ok(())
    }

    /// Transform one chunk.
    ///
    /// Probe chunks pass through with their rows unchanged and without lag
    /// columns, and neither read nor mutate the state store. Downstream
    /// schema inference that expects probe output to match real output shape
    /// will therefore not see the lag columns; this is the compatibility
    /// behavior, flagged once per run at warn level.
    ///
    /// Real chunks gain one lag column per configured offset; the row count
    /// and row order of the input are preserved exactly. After the output is
    /// produced, every buffer absorbs the chunk's source values.
    pub fn process_chunk(&mut self, chunk: &Chunk) -> Result<Chunk> {
        if chunk.is_probe() {
            if !self.probe_warned {
                warn!(
                    "probe chunk passed through without lag columns; downstream \
                     schema inference will not observe the output shape of real chunks"
                );
                self.probe_warned = true;
            }
            return Ok(chunk.clone());
        }

        self.check_schema(chunk)?;

        if chunk.start_row() != self.rows_processed {
            return Err(EngineError::OutOfOrderChunk(format!(
                "expected global row {}, chunk starts at row {}",
                self.rows_processed,
                chunk.start_row()
            )));
        }

        // An empty real chunk before bootstrap still gets the lag columns so
        // the output schema is complete; there is no state to touch yet.
        if self.state.is_none() {
            if !chunk.is_empty() {
                return Err(EngineError::NotBootstrapped);
            }
            let mut output = chunk.clone();
            for &k in self.spec.offsets() {
                output.push_column(Column::new(self.spec.output_name(k), Vec::new()))?;
            }
            return Ok(output);
        }

        let source_values = chunk
            .require_column(self.spec.source_column())?
            .values
            .clone();
        let n = source_values.len();

        let mut output = chunk.clone();
        let spec = &self.spec;
        let state = self.state.as_mut().expect("state checked above");

        for &k in spec.offsets() {
            let buffer = state
                .buffer_mut(k)
                .expect("bootstrap created a buffer per offset");

            // First n values of A = buffer ++ V, i.e. each row's value from
            // k positions earlier in the global ordering.
            let lagged: Vec<_> = buffer
                .values()
                .chain(source_values.iter())
                .take(n)
                .cloned()
                .collect();
            output.push_column(Column::new(spec.output_name(k), lagged))?;

            // Commit the new tail before the next chunk may be processed.
            buffer.absorb(&source_values);
        }

        self.rows_processed += n;
        Ok(output)
    }

    /// Real chunks must all share the first real chunk's column set.
    fn check_schema(&mut self, chunk: &Chunk) -> Result<()> {
        let names: Vec<String> = chunk
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        match &self.input_schema {
            None => {
                if !names.iter().any(|n| n == self.spec.source_column()) {
                    return Err(EngineError::SchemaMismatch(format!(
                        "source column '{}' not present in input columns {:?}",
                        self.spec.source_column(),
                        names
                    )));
                }
                self.input_schema = Some(names);
                Ok(())
            }
            Some(expected) if *expected == names => Ok(()),
            Some(expected) => Err(EngineError::SchemaMismatch(format!(
                "input columns changed mid-stream: expected {expected:?}, got {names:?}"
            ))),
        }
    }
}
