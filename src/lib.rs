#![deny(missing_docs)]

//! # seqpack
//!
//! Compact in-memory storage for large sequences of 64-bit integers,
//! built for heap-dump analysis where millions of object references and
//! sizes must be held at once. Consecutive values tend to be close
//! together, so sequences are stored as bit-packed delta tokens with
//! run-length compression instead of plain arrays.
//!
//! ## Usage Example
//!
//! ```
//! use seqpack::{DeltaRleStream, SequenceStream};
//!
//! let mut stream = DeltaRleStream::new();
//! for address in [0x1000i64, 0x1008, 0x1008, 0x1010] {
//!     stream.write_long(address)?;
//! }
//!
//! stream.rewind()?;
//! while stream.has_more() {
//!     println!("{:#x}", stream.read_long()?);
//! }
//! # Ok::<(), seqpack::StreamError>(())
//! ```
//!
//! ## Architecture
//!
//! * **BitStore**: growable word array with bit-granular access
//! * **Streams**: three codecs over it — [`DeltaRleStream`] (write
//!   order, delta + run-length), [`BufferedStream`] (small write buffer
//!   in front), [`SortedStream`] (sort-merge compaction, ascending)
//! * **Arrays**: paged scratch storage with shared search/sort over the
//!   [`ElementStore`] seam
//!
//! Everything is single-threaded and in-memory; the only recoverable
//! error is reading past the end of a sequence.

pub mod array;
pub mod bitstore;
pub mod stream;

pub use array::{ChunkedI32Array, ChunkedI64Array, ElementStore};
pub use bitstore::BitStore;
pub use stream::{BufferedStream, DeltaRleStream, SequenceStream, SortedStream, StreamError};
