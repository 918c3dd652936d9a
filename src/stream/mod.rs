//! Sequence stream codecs.
//!
//! A sequence stream accepts `i64` values one at a time, stores them
//! compactly, and replays them after a [`SequenceStream::rewind`]. Three
//! variants trade write cost against compression:
//!
//! * [`DeltaRleStream`] — the base codec: tagged delta tokens plus
//!   run-length compression of consecutive equal values, packed onto a
//!   [`crate::BitStore`].
//! * [`BufferedStream`] — a small write buffer in front of the base
//!   codec, avoiding per-item bit-stream overhead for short bursts while
//!   preserving write order.
//! * [`SortedStream`] — a large write buffer with sort-merge compaction
//!   on flush, keeping the encoded content globally ascending for much
//!   better delta compression at the cost of the original ordering.
//!
//! Streams are single-writer/multi-reader in time, not in parallel: all
//! writes must be issued before the first rewind/read, and a stream may
//! be rewound and replayed any number of times afterwards.

mod buffered;
mod delta;
mod sorted;


pub use buffered::BufferedStream;
pub use delta::DeltaRleStream;
pub use sorted::SortedStream;

/// Errors surfaced by sequence stream reads.
///
/// Contract violations (invalid bit widths, non-positive repeat counts)
/// are not represented here: they are caller bugs and panic instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// `read_long` was called with no elements remaining. Recoverable:
    /// check [`SequenceStream::has_more`] first.
    #[error("read past the end of the sequence")]
    ExhaustedSequence,
}

/// Common surface of the sequence codecs.
pub trait SequenceStream {
    /// Appends a value to the sequence.
    fn write_long(&mut self, value: i64) -> Result<(), StreamError>;

    /// Returns the next value of the current read pass.
    fn read_long(&mut self) -> Result<i64, StreamError>;

    /// True while the current read pass has elements remaining.
    fn has_more(&self) -> bool;

    /// Prepares a read pass over everything written so far.
    fn rewind(&mut self) -> Result<(), StreamError>;

    /// Discards all content and resets the stream for reuse.
    fn clear(&mut self);

    /// Total number of values written since creation or the last
    /// [`SequenceStream::clear`].
    fn element_count(&self) -> u64;

    /// Bytes occupied by the stream's backing storage.
    fn memory_usage(&self) -> usize;

    /// Rewinds and drains the whole sequence into a `Vec<i64>`.
    fn to_i64_vec(&mut self) -> Result<Vec<i64>, StreamError> {
        self.rewind()?;
        let mut values = Vec::with_capacity(self.element_count() as usize);
        while self.has_more() {
            values.push(self.read_long()?);
        }
        Ok(values)
    }

    /// Rewinds and drains the whole sequence into a `Vec<i32>`,
    /// truncating each value. Intended for sequences known to hold
    /// 32-bit data.
    fn to_i32_vec(&mut self) -> Result<Vec<i32>, StreamError> {
        self.rewind()?;
        let mut values = Vec::with_capacity(self.element_count() as usize);
        while self.has_more() {
            values.push(self.read_long()? as i32);
        }
        Ok(values)
    }
}
