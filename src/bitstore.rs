//! Bit-granular storage over a growable array of 32-bit words.
//!
//! `BitStore` is the backing primitive for the sequence codecs: a cursor
//! that can write and read fields of arbitrary width (1..=32 bits, or
//! 1..=63 via the 64-bit entry points) packed MSB-first into consecutive
//! 32-bit words. A field never straddles more than two words.
//!
//! ## Layout
//!
//! The word array is an ordered sequence of 32-bit units, index 0 first.
//! Within a word, bits are MSB-first: a write of `len` bits at bit offset
//! `b` ORs `value << (32 - b - len)` into the word. A field that does not
//! fit in the remaining bits of the current word is split, with the
//! high-order bits going to the current word and the remainder to the
//! next.
//!
//! ## Contract
//!
//! Passing a width outside the supported range is a caller bug and
//! panics; there is no recoverable error in this module. Reads are only
//! meaningful over bits previously written at the same relative
//! positions. Writes OR into the backing words and rely on unwritten
//! bits being zero, so content must be discarded with
//! [`BitStore::clear`] (not just a rewind) before a store is rewritten
//! from the origin.

/// Number of bits in a storage word.
const WORD_BITS: u32 = 32;

/// Number of words allocated by a fresh store. Kept small so that short
/// streams stay cheap; growth is geometric from here.
const INITIAL_WORDS: usize = 256;

/// Retention cap applied by [`BitStore::clear`]: a backing array larger
/// than this (1 MiB of words) is released rather than kept for reuse.
const MAX_RETAINED_WORDS: usize = 1 << 18; // 262144 words = 1 MiB

/// Mask covering the low `len` bits of a `u32`.
///
/// `len` must be in `1..=32`.
#[inline]
fn low_mask(len: u32) -> u32 {
    if len == WORD_BITS {
        u32::MAX
    } else {
        (1 << len) - 1
    }
}

/// A growable array of 32-bit words with bit-granular sequential and
/// positioned access.
///
/// The store maintains a single cursor (`word_offset`, `bit_offset`)
/// shared by writes and reads; [`BitStore::rewind`] moves it back to the
/// origin so that a fully written stream can be read back in order.
#[derive(Debug, Clone)]
pub struct BitStore {
    /// Backing words. Always fully initialized; unwritten bits are zero.
    words: Vec<u32>,
    /// Index of the word the cursor is positioned in.
    word_offset: usize,
    /// Bit position within the current word. Invariant: `bit_offset < 32`.
    bit_offset: u32,
}

impl Default for BitStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BitStore {
    /// Creates an empty store with the cursor at the origin.
    pub fn new() -> Self {
        Self {
            words: vec![0; INITIAL_WORDS],
            word_offset: 0,
            bit_offset: 0,
        }
    }

    /// Writes the low `len` bits of `value` at the cursor, MSB-first.
    ///
    /// `len` must be in `1..=32`; any other width is a caller bug and
    /// panics. Bits of `value` above `len` are ignored.
    pub fn write_bits(&mut self, value: u32, len: u32) {
        assert!(
            (1..=WORD_BITS).contains(&len),
            "bit width must be in 1..=32, got {len}"
        );
        let space = WORD_BITS - self.bit_offset;
        if len > space {
            // Split: high-order bits fill the current word, the rest
            // start the next one.
            let low_len = len - space;
            self.write_bits(value >> low_len, space);
            self.write_bits(value & low_mask(low_len), low_len);
            return;
        }
        self.words[self.word_offset] |= (value & low_mask(len)) << (space - len);
        self.bit_offset += len;
        if self.bit_offset == WORD_BITS {
            self.next_word(true);
        }
    }

    /// Reads `len` bits (1..=32) at the cursor, advancing past them.
    pub fn read_bits(&mut self, len: u32) -> u32 {
        assert!(
            (1..=WORD_BITS).contains(&len),
            "bit width must be in 1..=32, got {len}"
        );
        let space = WORD_BITS - self.bit_offset;
        if len > space {
            let low_len = len - space;
            let high = self.read_bits(space);
            let low = self.read_bits(low_len);
            return (high << low_len) | low;
        }
        let value = (self.words[self.word_offset] >> (space - len)) & low_mask(len);
        self.bit_offset += len;
        if self.bit_offset == WORD_BITS {
            self.next_word(false);
        }
        value
    }

    /// Writes the low `len` bits of `value` at the cursor, for widths up
    /// to 63 bits.
    ///
    /// Widths of 33 and above decompose into a high write of `len - 32`
    /// bits followed by a low write of exactly 32 bits.
    pub fn write_bits64(&mut self, value: i64, len: u32) {
        assert!(
            (1..=63).contains(&len),
            "bit width must be in 1..=63, got {len}"
        );
        if len <= WORD_BITS {
            self.write_bits(value as u32, len);
        } else {
            self.write_bits((value >> 32) as u32, len - WORD_BITS);
            self.write_bits(value as u32, WORD_BITS);
        }
    }

    /// Reads `len` bits (1..=63) at the cursor as a non-negative value.
    pub fn read_bits64(&mut self, len: u32) -> i64 {
        assert!(
            (1..=63).contains(&len),
            "bit width must be in 1..=63, got {len}"
        );
        if len <= WORD_BITS {
            i64::from(self.read_bits(len))
        } else {
            let high = i64::from(self.read_bits(len - WORD_BITS));
            let low = i64::from(self.read_bits(WORD_BITS));
            (high << 32) | low
        }
    }

    /// Writes `len` bits of `value` at an explicit position without
    /// disturbing the sequential cursor.
    ///
    /// Useful for patching a field reserved earlier (the bits being
    /// patched must still be zero, since writes OR into the word).
    pub fn write_bits_at(&mut self, value: u32, len: u32, word_offset: usize, bit_offset: u32) {
        let saved = (self.word_offset, self.bit_offset);
        self.word_offset = word_offset;
        self.bit_offset = bit_offset;
        self.write_bits(value, len);
        (self.word_offset, self.bit_offset) = saved;
    }

    /// Reads `len` bits at an explicit position without disturbing the
    /// sequential cursor.
    pub fn read_bits_at(&mut self, len: u32, word_offset: usize, bit_offset: u32) -> u32 {
        let saved = (self.word_offset, self.bit_offset);
        self.word_offset = word_offset;
        self.bit_offset = bit_offset;
        let value = self.read_bits(len);
        (self.word_offset, self.bit_offset) = saved;
        value
    }

    /// Advances the cursor to the start of the next word.
    ///
    /// In write mode the store grows geometrically on overflow; fresh
    /// words arrive zeroed from allocation, so writes can OR into them.
    /// In read mode the cursor only moves.
    fn next_word(&mut self, write: bool) {
        self.word_offset += 1;
        self.bit_offset = 0;
        if write && self.word_offset >= self.words.len() {
            let grown = (self.words.len() * 3 + 1) / 2;
            self.words.resize(grown, 0);
        }
    }

    /// Moves the cursor to the origin without erasing any content.
    pub fn rewind(&mut self) {
        self.word_offset = 0;
        self.bit_offset = 0;
    }

    /// Resets the cursor and zeroes the logical content.
    ///
    /// A backing array that grew past the retention cap is released and
    /// replaced with a fresh one at the initial capacity.
    pub fn clear(&mut self) {
        self.rewind();
        if self.words.len() > MAX_RETAINED_WORDS {
            tracing::debug!(words = self.words.len(), "releasing oversized backing array");
            self.words = vec![0; INITIAL_WORDS];
        } else {
            self.words.fill(0);
        }
    }

    /// Trims the backing array to the words actually covered by the
    /// cursor, releasing the excess capacity.
    ///
    /// Never discards bits at or before the current cursor position.
    pub fn compact(&mut self) {
        self.words.truncate(self.word_offset + 1);
        self.words.shrink_to_fit();
    }

    /// Returns the word index of the cursor.
    pub fn word_offset(&self) -> usize {
        self.word_offset
    }

    /// Moves the cursor to the start of the given word.
    pub fn set_word_offset(&mut self, word_offset: usize) {
        self.word_offset = word_offset;
        self.bit_offset = 0;
    }

    /// Bytes occupied by the backing word array.
    pub fn memory_usage(&self) -> usize {
        self.words.len() * 4
    }

    /// The backing words, index 0 first.
    ///
    /// This is the stable interop surface: any persisted form of the
    /// stream is this array, bit-for-bit.
    pub fn words(&self) -> &[u32] {
        &self.words
    }
}
