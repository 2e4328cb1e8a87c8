//! Carry-over state for one transform run
//!
//! Each configured offset `k` owns a `LagBuffer` holding exactly the `k` most
//! recent source values, oldest first. The store does not exist until the
//! one-time bootstrap runs, is mutated after every real chunk, and dies with
//! the run. It is exclusively owned by one engine instance; nothing else may
//! touch it, in particular not the probe-chunk path.

use crate::spec::LagSpec;
use lagpipe_frame::Value;
use std::collections::{BTreeMap, VecDeque};

/// Fixed-length tail of recent source values for one offset
#[derive(Debug, Clone, PartialEq)]
pub struct LagBuffer {
    offset: usize,
    values: VecDeque<Value>,
}

impl LagBuffer {
    /// Bootstrap buffer: the first observed value repeated `offset` times.
    /// This manufactures synthetic lag values for the stream prefix instead
    /// of leaving the first `offset` output rows undefined.
    pub fn seeded(offset: usize, first_value: &Value) -> Self {
        debug_assert!(offset > 0);
        Self {
            offset,
            values: std::iter::repeat(first_value.clone()).take(offset).collect(),
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Buffer contents, oldest first. Length always equals the offset.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    /// Absorb one chunk's source values: append them all, then drop the
    /// oldest entries so exactly `offset` remain. Correct whether the chunk
    /// is shorter or longer than the offset.
    pub fn absorb(&mut self, chunk_values: &[Value]) {
        self.values.extend(chunk_values.iter().cloned());
        while self.values.len() > self.offset {
            self.values.pop_front();
        }
    }
}

/// Keyed storage of one `LagBuffer` per configured offset
#[derive(Debug, Clone)]
pub struct LagStateStore {
    buffers: BTreeMap<usize, LagBuffer>,
}

impl LagStateStore {
    /// Create the store with every buffer seeded from the first real
    /// observation. Runs exactly once per run.
    pub fn bootstrap(spec: &LagSpec, first_value: &Value) -> Self {
        let buffers = spec
            .offsets()
            .iter()
            .map(|&k| (k, LagBuffer::seeded(k, first_value)))
            .collect();
        Self { buffers }
    }

    pub fn buffer(&self, offset: usize) -> Option<&LagBuffer> {
        self.buffers.get(&offset)
    }

    pub fn buffer_mut(&mut self, offset: usize) -> Option<&mut LagBuffer> {
        self.buffers.get_mut(&offset)
    }
}
