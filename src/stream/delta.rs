//! Tagged delta/run-length codec over a bit store.
//!
//! Values are encoded as the signed difference from the previous value,
//! using the narrowest of three magnitude classes, and consecutive equal
//! values collapse into a single repeat token:
//!
//! ```text
//! token   := type:2 body
//! type 0  := count:32                  repeat the last value count times
//! type 1  := sign:1 magnitude:11       |delta| < 2^11
//! type 2  := sign:1 magnitude:31       |delta| < 2^31
//! type 3  := sign:1 magnitude:63       everything else
//! ```
//!
//! Decode tracks the running value starting at 0 and applies
//! `last ± magnitude` per delta token, or replays `last` for repeat
//! tokens. This grammar together with the MSB-first word packing of
//! [`BitStore`] is the interop contract for any persisted form of the
//! word array.

use crate::bitstore::BitStore;

use super::{SequenceStream, StreamError};

/// Repeat-run token.
const TYPE_REPEAT: u32 = 0;
/// Delta token with an 11-bit magnitude.
const TYPE_SMALL: u32 = 1;
/// Delta token with a 31-bit magnitude.
const TYPE_MEDIUM: u32 = 2;
/// Delta token with a 63-bit magnitude.
const TYPE_LARGE: u32 = 3;

/// Width of the token type tag.
const TYPE_BITS: u32 = 2;
/// Width of the repeat count field.
const COUNT_BITS: u32 = 32;
/// Magnitude widths per delta class.
const SMALL_BITS: u32 = 11;
const MEDIUM_BITS: u32 = 31;
const LARGE_BITS: u32 = 63;

/// Exclusive magnitude bound of the small class.
const SMALL_LIMIT: i64 = 1 << SMALL_BITS;
/// Exclusive magnitude bound of the medium class.
const MEDIUM_LIMIT: i64 = 1 << MEDIUM_BITS;

/// A pending run is flushed once its count reaches this, keeping the
/// 32-bit count field in range.
const MAX_RUN: i64 = i32::MAX as i64;

/// Encoder-side running context. Fresh (zeroed) at creation and after
/// `clear`; decode deliberately starts from the same zero state.
#[derive(Debug, Default, Clone, Copy)]
struct EncodeState {
    /// The last value encoded.
    last: i64,
    /// Count of a pending, not yet emitted run of `last`.
    repeat: i64,
}

/// Decoder-side running context, rebuilt zeroed at every rewind.
#[derive(Debug, Default, Clone, Copy)]
struct DecodeState {
    /// The last value produced.
    last: i64,
    /// Remaining repeats of `last` before the next token is read.
    repeat: i64,
}

/// The base sequence codec: delta encoding with run-length compression,
/// bit-packed onto a [`BitStore`].
///
/// Preserves write order exactly. Encoding a value whose delta from the
/// previous value is exactly `i64::MIN` is rejected with a panic, since
/// that magnitude cannot be represented in sign-magnitude form.
#[derive(Debug, Default)]
pub struct DeltaRleStream {
    store: BitStore,
    encode: EncodeState,
    decode: DecodeState,
    element_count: u64,
    read_element_count: u64,
}

impl DeltaRleStream {
    /// Creates an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `value` `count` times, collapsing the repetition into
    /// run tokens without per-value work.
    ///
    /// `count` must be positive; a non-positive count is a caller bug
    /// and panics.
    pub fn write_repeated(&mut self, value: i64, count: i64) -> Result<(), StreamError> {
        assert!(count > 0, "repeat count must be positive, got {count}");
        self.write_long(value)?;
        let mut remaining = count - 1;
        while remaining > 0 {
            if self.encode.repeat == MAX_RUN {
                self.flush_run();
            }
            let taken = remaining.min(MAX_RUN - self.encode.repeat);
            self.encode.repeat += taken;
            self.element_count += taken as u64;
            remaining -= taken;
        }
        Ok(())
    }

    /// Emits the pending repeat run, if any.
    fn flush_run(&mut self) {
        if self.encode.repeat > 0 {
            self.store.write_bits(TYPE_REPEAT, TYPE_BITS);
            self.store.write_bits(self.encode.repeat as u32, COUNT_BITS);
            self.encode.repeat = 0;
        }
    }

    /// Emits any pending run and trims the backing storage to the
    /// encoded content. Call with the write cursor at the end of the
    /// stream, before the first rewind.
    pub fn compact(&mut self) {
        self.flush_run();
        self.store.compact();
    }

    /// The backing bit store, exposed for persistence of the word array.
    pub fn bit_store(&self) -> &BitStore {
        &self.store
    }
}

impl SequenceStream for DeltaRleStream {
    fn write_long(&mut self, value: i64) -> Result<(), StreamError> {
        if value == self.encode.last {
            if self.encode.repeat == MAX_RUN {
                self.flush_run();
            }
            self.encode.repeat += 1;
        } else {
            self.flush_run();
            let delta = value.wrapping_sub(self.encode.last);
            assert!(
                delta != i64::MIN,
                "delta of -2^63 has no sign-magnitude representation"
            );
            let (token, magnitude_bits) = if delta.abs() < SMALL_LIMIT {
                (TYPE_SMALL, SMALL_BITS)
            } else if delta.abs() < MEDIUM_LIMIT {
                (TYPE_MEDIUM, MEDIUM_BITS)
            } else {
                (TYPE_LARGE, LARGE_BITS)
            };
            self.store.write_bits(token, TYPE_BITS);
            self.store.write_bits(u32::from(delta < 0), 1);
            self.store.write_bits64(delta.abs(), magnitude_bits);
            self.encode.last = value;
        }
        self.element_count += 1;
        Ok(())
    }

    fn read_long(&mut self) -> Result<i64, StreamError> {
        if !self.has_more() {
            return Err(StreamError::ExhaustedSequence);
        }
        self.read_element_count -= 1;

        if self.decode.repeat > 0 {
            self.decode.repeat -= 1;
            return Ok(self.decode.last);
        }

        let token = self.store.read_bits(TYPE_BITS);
        if token == TYPE_REPEAT {
            let count = i64::from(self.store.read_bits(COUNT_BITS));
            self.decode.repeat = count - 1;
            return Ok(self.decode.last);
        }

        let negative = self.store.read_bits(1) == 1;
        let magnitude_bits = match token {
            TYPE_SMALL => SMALL_BITS,
            TYPE_MEDIUM => MEDIUM_BITS,
            _ => LARGE_BITS,
        };
        let magnitude = self.store.read_bits64(magnitude_bits);
        let delta = if negative { -magnitude } else { magnitude };
        self.decode.last = self.decode.last.wrapping_add(delta);
        Ok(self.decode.last)
    }

    fn has_more(&self) -> bool {
        self.read_element_count != 0
    }

    fn rewind(&mut self) -> Result<(), StreamError> {
        self.flush_run();
        self.store.rewind();
        self.decode = DecodeState::default();
        self.read_element_count = self.element_count;
        Ok(())
    }

    fn clear(&mut self) {
        self.store.clear();
        self.encode = EncodeState::default();
        self.decode = DecodeState::default();
        self.element_count = 0;
        self.read_element_count = 0;
    }

    fn element_count(&self) -> u64 {
        self.element_count
    }

    fn memory_usage(&self) -> usize {
        self.store.memory_usage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use more_asserts::assert_le;
    use test_case::test_case;

    fn roundtrip(values: &[i64]) -> Vec<i64> {
        let mut stream = DeltaRleStream::new();
        for &value in values {
            stream.write_long(value).unwrap();
        }
        stream.to_i64_vec().unwrap()
    }

    #[test_case(&[5, 5, 5, 5, 100, 100, -3]; "runs and deltas")]
    #[test_case(&[0]; "single zero")]
    #[test_case(&[0, 0, 0, 0]; "leading zero run")]
    #[test_case(&[-1, -2, -3, -4]; "descending negatives")]
    #[test_case(&[2047, -2048, 2047]; "small class boundary")]
    #[test_case(&[2048, -2049]; "medium class entry")]
    #[test_case(&[i64::MAX, 0, i64::MAX]; "large deltas")]
    #[test_case(&[1, (1 << 31) - 1, 1 << 31, -(1 << 31)]; "medium class boundary")]
    #[test_case(&[7, 7, 8, 8, 8, 7, 7]; "alternating runs")]
    fn test_order_preserving_roundtrip(values: &[i64]) {
        assert_eq!(roundtrip(values), values);
    }

    /// The concrete scenario from the interop contract.
    #[test]
    fn test_concrete_scenario() {
        assert_eq!(
            roundtrip(&[5, 5, 5, 5, 100, 100, -3]),
            vec![5, 5, 5, 5, 100, 100, -3]
        );
    }

    /// First word of the encoding of a single small positive delta:
    /// type SMALL (01), sign 0, magnitude 5 over 11 bits, MSB-first.
    #[test]
    fn test_token_layout_small_delta() {
        let mut stream = DeltaRleStream::new();
        stream.write_long(5).unwrap();
        stream.rewind().unwrap();
        assert_eq!(stream.bit_store().words()[0], 0b01_0_00000000101 << 18);
    }

    /// A run of four equal values encodes as one delta token plus one
    /// repeat token carrying count 3.
    #[test]
    fn test_token_layout_run() {
        let mut stream = DeltaRleStream::new();
        for _ in 0..4 {
            stream.write_long(9).unwrap();
        }
        stream.rewind().unwrap();
        let store = stream.bit_store();
        // type:2 = SMALL, sign:1 = 0, magnitude:11 = 9.
        assert_eq!(store.words()[0] >> 18, 0b01_0_00000001001);
        // Following token: type:2 = REPEAT, count:32 = 3.
        let mut probe = store.clone();
        probe.rewind();
        probe.read_bits(14);
        assert_eq!(probe.read_bits(2), 0);
        assert_eq!(probe.read_bits(32), 3);
    }

    /// `has_more` is false exactly when all written elements were read.
    #[test]
    fn test_has_more_invariant() {
        let mut stream = DeltaRleStream::new();
        for i in 0..50 {
            stream.write_long(i % 5).unwrap();
        }
        stream.rewind().unwrap();
        for _ in 0..50 {
            assert!(stream.has_more());
            stream.read_long().unwrap();
        }
        assert!(!stream.has_more());
        assert_matches!(stream.read_long(), Err(StreamError::ExhaustedSequence));
    }

    /// Rewinding again replays the identical sequence.
    #[test]
    fn test_multiple_read_passes() {
        let values = [3, 3, 3, -9, 1 << 40, 1 << 40, 0];
        let mut stream = DeltaRleStream::new();
        for &value in &values {
            stream.write_long(value).unwrap();
        }
        let first = stream.to_i64_vec().unwrap();
        let second = stream.to_i64_vec().unwrap();
        assert_eq!(first, values);
        assert_eq!(second, values);
    }

    /// Runs longer than the 32-bit count field split into several repeat
    /// tokens.
    #[test]
    fn test_run_overflow_splits() {
        let total = i32::MAX as i64 + 5;
        let mut stream = DeltaRleStream::new();
        stream.write_repeated(42, total).unwrap();
        stream.write_long(41).unwrap();
        stream.rewind().unwrap();
        assert_eq!(stream.element_count(), total as u64 + 1);

        // Token sequence: delta 42, repeat i32::MAX, repeat 4, delta -1.
        let mut probe = stream.bit_store().clone();
        probe.rewind();
        assert_eq!(probe.read_bits(2), TYPE_SMALL);
        probe.read_bits(12); // sign + magnitude
        assert_eq!(probe.read_bits(2), TYPE_REPEAT);
        assert_eq!(probe.read_bits(32), i32::MAX as u32);
        assert_eq!(probe.read_bits(2), TYPE_REPEAT);
        assert_eq!(probe.read_bits(32), 4);
        assert_eq!(probe.read_bits(2), TYPE_SMALL);
        assert_eq!(probe.read_bits(1), 1); // negative delta back to 41

        // The head of the replay is the repeated value.
        for _ in 0..3 {
            assert_eq!(stream.read_long().unwrap(), 42);
        }
        assert!(stream.has_more());
    }

    #[test]
    fn test_write_repeated_matches_individual_writes() {
        let mut repeated = DeltaRleStream::new();
        repeated.write_long(10).unwrap();
        repeated.write_repeated(-4, 6).unwrap();
        repeated.write_long(100).unwrap();

        let mut individual = DeltaRleStream::new();
        individual.write_long(10).unwrap();
        for _ in 0..6 {
            individual.write_long(-4).unwrap();
        }
        individual.write_long(100).unwrap();

        assert_eq!(
            repeated.to_i64_vec().unwrap(),
            individual.to_i64_vec().unwrap()
        );
    }

    #[test]
    #[should_panic(expected = "repeat count must be positive")]
    fn test_non_positive_repeat_count_panics() {
        let mut stream = DeltaRleStream::new();
        let _ = stream.write_repeated(1, 0);
    }

    #[test]
    #[should_panic(expected = "sign-magnitude")]
    fn test_min_delta_rejected() {
        let mut stream = DeltaRleStream::new();
        stream.write_long(i64::MIN).unwrap();
    }

    /// `clear` resets the stream for reuse from the zero state.
    #[test]
    fn test_clear_resets() {
        let mut stream = DeltaRleStream::new();
        for i in 0..1000 {
            stream.write_long(i * i).unwrap();
        }
        stream.clear();
        assert_eq!(stream.element_count(), 0);
        assert!(!stream.has_more());

        stream.write_long(-5).unwrap();
        assert_eq!(stream.to_i64_vec().unwrap(), vec![-5]);
    }

    /// `compact` keeps the full content readable.
    #[test]
    fn test_compact_preserves_content() {
        let values: Vec<i64> = (0..500).map(|i| i * 31 - 7000).collect();
        let mut stream = DeltaRleStream::new();
        for &value in &values {
            stream.write_long(value).unwrap();
        }
        let before = stream.memory_usage();
        stream.compact();
        assert_le!(stream.memory_usage(), before);
        assert_eq!(stream.to_i64_vec().unwrap(), values);
    }
}
