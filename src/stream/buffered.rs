//! Write buffering in front of the base codec.

use crate::array::ChunkedI64Array;

use super::delta::DeltaRleStream;
use super::{SequenceStream, StreamError};

/// Values held back before being pushed through the bit-level encoder.
const BUFFER_CAPACITY: usize = 4096;

/// A [`DeltaRleStream`] behind a small write buffer.
///
/// Short sequences never touch the bit stream at all; longer ones are
/// drained through it a full buffer at a time. Write order is preserved:
/// the logical content is the compressed prefix followed by the
/// not-yet-flushed tail, and reads replay both in original order.
///
/// Rewinding deliberately does not flush a partially filled buffer, so
/// a stream can alternate between whole phases of writing and reading
/// without paying encoding costs for the tail.
#[derive(Debug, Default)]
pub struct BufferedStream {
    base: DeltaRleStream,
    buffer: ChunkedI64Array,
    /// Buffered values not yet served in the current read pass.
    read_buffer_count: usize,
}

impl BufferedStream {
    /// Creates an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains the buffer through the base encoder in write order.
    fn flush_buffer(&mut self) -> Result<(), StreamError> {
        tracing::trace!(buffered = self.buffer.len(), "draining write buffer");
        for i in 0..self.buffer.len() {
            self.base.write_long(self.buffer.get(i))?;
        }
        self.buffer.clear();
        self.read_buffer_count = 0;
        Ok(())
    }
}

impl SequenceStream for BufferedStream {
    fn write_long(&mut self, value: i64) -> Result<(), StreamError> {
        self.buffer.push(value);
        if self.buffer.len() == BUFFER_CAPACITY {
            self.flush_buffer()?;
        }
        Ok(())
    }

    fn read_long(&mut self) -> Result<i64, StreamError> {
        if self.base.has_more() {
            return self.base.read_long();
        }
        if self.read_buffer_count > 0 {
            let next = self.buffer.len() - self.read_buffer_count;
            self.read_buffer_count -= 1;
            return Ok(self.buffer.get(next));
        }
        Err(StreamError::ExhaustedSequence)
    }

    fn has_more(&self) -> bool {
        self.base.has_more() || self.read_buffer_count > 0
    }

    fn rewind(&mut self) -> Result<(), StreamError> {
        // The buffered tail stays raw; only the read cursors reset.
        self.base.rewind()?;
        self.read_buffer_count = self.buffer.len();
        Ok(())
    }

    fn clear(&mut self) {
        self.base.clear();
        self.buffer.clear();
        self.read_buffer_count = 0;
    }

    fn element_count(&self) -> u64 {
        self.base.element_count() + self.buffer.len() as u64
    }

    fn memory_usage(&self) -> usize {
        self.base.memory_usage() + self.buffer.memory_usage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use test_case::test_case;

    fn roundtrip(values: &[i64]) -> Vec<i64> {
        let mut stream = BufferedStream::new();
        for &value in values {
            stream.write_long(value).unwrap();
        }
        stream.to_i64_vec().unwrap()
    }

    #[test_case(&[]; "empty")]
    #[test_case(&[5, 5, 5, 5, 100, 100, -3]; "short burst stays buffered")]
    #[test_case(&[0, 0, 0]; "zeros")]
    #[test_case(&[i64::MAX, 1, -1]; "extremes")]
    fn test_roundtrip_within_buffer(values: &[i64]) {
        assert_eq!(roundtrip(values), values);
    }

    /// Sequences longer than the buffer cross the flush boundary and
    /// read back in original order: compressed prefix, then raw tail.
    #[test_case(BUFFER_CAPACITY - 1; "one short of a flush")]
    #[test_case(BUFFER_CAPACITY; "exactly one flush")]
    #[test_case(BUFFER_CAPACITY + 1; "flush plus tail")]
    #[test_case(3 * BUFFER_CAPACITY + 123; "several flushes")]
    fn test_roundtrip_across_flushes(count: usize) {
        let values: Vec<i64> = (0..count as i64).map(|i| i * 17 - 9_000).collect();
        assert_eq!(roundtrip(&values), values);
    }

    /// Short sequences never touch the bit-level encoder.
    #[test]
    fn test_short_sequences_stay_raw() {
        let mut stream = BufferedStream::new();
        for i in 0..100 {
            stream.write_long(i).unwrap();
        }
        assert_eq!(stream.base.element_count(), 0);
        assert_eq!(stream.element_count(), 100);

        // Rewinding does not push the tail into the encoder either.
        stream.rewind().unwrap();
        assert_eq!(stream.base.element_count(), 0);
        assert_eq!(stream.to_i64_vec().unwrap().len(), 100);
        assert_eq!(stream.base.element_count(), 0);
    }

    #[test]
    fn test_has_more_invariant() {
        let count = BUFFER_CAPACITY + 10;
        let mut stream = BufferedStream::new();
        for i in 0..count as i64 {
            stream.write_long(i).unwrap();
        }
        stream.rewind().unwrap();
        for _ in 0..count {
            assert!(stream.has_more());
            stream.read_long().unwrap();
        }
        assert!(!stream.has_more());
        assert_matches!(stream.read_long(), Err(StreamError::ExhaustedSequence));
    }

    /// Repeated rewinds replay the identical sequence.
    #[test]
    fn test_multiple_read_passes() {
        let values: Vec<i64> = (0..(BUFFER_CAPACITY as i64 + 7)).map(|i| i % 13).collect();
        let mut stream = BufferedStream::new();
        for &value in &values {
            stream.write_long(value).unwrap();
        }
        assert_eq!(stream.to_i64_vec().unwrap(), values);
        assert_eq!(stream.to_i64_vec().unwrap(), values);
    }

    #[test]
    fn test_clear_resets() {
        let mut stream = BufferedStream::new();
        for i in 0..(BUFFER_CAPACITY as i64 * 2) {
            stream.write_long(i).unwrap();
        }
        stream.clear();
        assert_eq!(stream.element_count(), 0);
        assert!(!stream.has_more());
        stream.write_long(77).unwrap();
        assert_eq!(stream.to_i64_vec().unwrap(), vec![77]);
    }
}
