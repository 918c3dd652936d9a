//! Sort-merge compaction for globally ascending streams.

use crate::array::{ChunkedI64Array, ElementStore};

use super::delta::DeltaRleStream;
use super::{SequenceStream, StreamError};

/// Values buffered between merges. Large enough that the quadratic-ish
/// cost of re-encoding the merged stream is paid rarely.
const BUFFER_CAPACITY: usize = 200_000;

/// A [`DeltaRleStream`] kept globally ascending by sort-merge
/// compaction.
///
/// Writes accumulate in a large buffer; when it fills (or at rewind),
/// the buffer is sorted and linearly merged with the already-encoded
/// content into a fresh encoded stream. Ascending content makes deltas
/// small and non-negative, so the encoded form is much denser than in
/// write order. The cost: the original ordering is lost — every read
/// pass observes the values ascending, duplicates preserved.
#[derive(Debug, Default)]
pub struct SortedStream {
    base: DeltaRleStream,
    buffer: ChunkedI64Array,
}

impl SortedStream {
    /// Creates an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sorts the pending buffer and merges it with the encoded content
    /// into a fresh encoded stream. No-op on an empty buffer.
    pub fn flush_buffer(&mut self) -> Result<(), StreamError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        tracing::debug!(
            buffered = self.buffer.len(),
            encoded = self.base.element_count(),
            "merging sorted buffer into encoded stream"
        );
        self.buffer.sort();
        self.base.rewind()?;

        let mut merged = DeltaRleStream::new();
        let mut pending = if self.base.has_more() {
            Some(self.base.read_long()?)
        } else {
            None
        };
        // Two-way merge: buffered values win only while strictly less
        // than the next encoded value.
        let mut next = 0;
        while next < self.buffer.len() {
            let value = self.buffer.get(next);
            match pending {
                Some(old) if old <= value => {
                    merged.write_long(old)?;
                    pending = if self.base.has_more() {
                        Some(self.base.read_long()?)
                    } else {
                        None
                    };
                }
                _ => {
                    merged.write_long(value)?;
                    next += 1;
                }
            }
        }
        if let Some(old) = pending {
            merged.write_long(old)?;
        }
        while self.base.has_more() {
            let old = self.base.read_long()?;
            merged.write_long(old)?;
        }

        merged.compact();
        self.base = merged;
        self.buffer.clear();
        Ok(())
    }
}

impl SequenceStream for SortedStream {
    fn write_long(&mut self, value: i64) -> Result<(), StreamError> {
        self.buffer.push(value);
        if self.buffer.len() == BUFFER_CAPACITY {
            self.flush_buffer()?;
        }
        Ok(())
    }

    fn read_long(&mut self) -> Result<i64, StreamError> {
        self.base.read_long()
    }

    fn has_more(&self) -> bool {
        self.base.has_more()
    }

    fn rewind(&mut self) -> Result<(), StreamError> {
        // Merge any pending tail first: a read pass must observe the
        // fully merged ascending content.
        self.flush_buffer()?;
        self.base.rewind()
    }

    fn clear(&mut self) {
        self.base.clear();
        self.buffer.clear();
    }

    fn element_count(&self) -> u64 {
        self.base.element_count() + self.buffer.len() as u64
    }

    fn memory_usage(&self) -> usize {
        self.base.memory_usage() + self.buffer.memory_usage()
    }
}
