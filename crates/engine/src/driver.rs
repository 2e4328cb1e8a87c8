//! Sequential pipeline driver
//!
//! Wires source → engine → sink and enforces the stream protocol the engine's
//! state model depends on: probes strictly before the first real chunk, no
//! reordering, no replays, bootstrap exactly once. A mid-stream source
//! failure is fatal; whatever the sink already persisted is left in place and
//! must be treated as invalid by the caller.

use crate::engine::LagTransformEngine;
use crate::error::{EngineError, Result};
use crate::io::{ChunkSink, ChunkSource};
use tracing::{debug, info};

/// Counters reported after a completed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub probe_chunks: usize,
    pub real_chunks: usize,
    pub rows_written: usize,
}

/// Drives one strictly sequential transform run
pub struct PipelineDriver<S, K> {
    engine: LagTransformEngine,
    source: S,
    sink: K,
}

impl<S: ChunkSource, K: ChunkSink> PipelineDriver<S, K> {
    pub fn new(engine: LagTransformEngine, source: S, sink: K) -> Self {
        Self {
            engine,
            source,
            sink,
        }
    }

    /// Consume the source to exhaustion. Probe outputs are used only for
    /// schema observation and are not forwarded to the sink.
    pub fn run(&mut self) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        let mut probe_schema: Option<Vec<String>> = None;

        loop {
            let chunk = match self.source.next_chunk() {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(err @ EngineError::UpstreamSourceFailure(_)) => return Err(err),
                Err(err) => {
                    return Err(EngineError::UpstreamSourceFailure(err.to_string()));
                }
            };

            if chunk.is_probe() {
                if summary.real_chunks > 0 {
                    return Err(EngineError::OutOfOrderChunk(
                        "probe chunk arrived after a real chunk".to_string(),
                    ));
                }
                if probe_schema.is_none() {
                    probe_schema =
                        Some(chunk.column_names().iter().map(|s| s.to_string()).collect());
                }
                // Schema observation only; the output never reaches the sink.
                self.engine.process_chunk(&chunk)?;
                summary.probe_chunks += 1;
                debug!(rows = chunk.row_count(), "probe chunk observed");
                continue;
            }

            if summary.real_chunks == 0 {
                if let Some(expected) = &probe_schema {
                    let actual: Vec<String> =
                        chunk.column_names().iter().map(|s| s.to_string()).collect();
                    if *expected != actual {
                        return Err(EngineError::SchemaMismatch(format!(
                            "probe columns {expected:?} disagree with real columns {actual:?}"
                        )));
                    }
                }
            }

            if !self.engine.is_bootstrapped() {
                self.engine.bootstrap(&chunk)?;
            }

            let output = self.engine.process_chunk(&chunk)?;
            summary.real_chunks += 1;
            summary.rows_written += output.row_count();
            self.sink.write_chunk(output)?;
        }

        info!(
            probes = summary.probe_chunks,
            chunks = summary.real_chunks,
            rows = summary.rows_written,
            "transform run complete"
        );
        Ok(summary)
    }

    pub fn into_sink(self) -> K {
        self.sink
    }
}
