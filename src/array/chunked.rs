//! Page-backed dynamic arrays.
//!
//! Elements live in fixed-size pages of 4096, so growth never copies
//! existing elements and a partially filled last page is the only
//! overallocation. Both widths implement [`ElementStore`], sharing the
//! search and sort logic; the `i32` variant widens on read and truncates
//! on write at the trait seam.

use super::ElementStore;

/// log2 of the page size.
const PAGE_SHIFT: usize = 12;

/// Elements per page.
const PAGE_SIZE: usize = 1 << PAGE_SHIFT;

/// Mask extracting the within-page index.
const PAGE_MASK: usize = PAGE_SIZE - 1;

/// Paged dynamic array of `i64` values.
#[derive(Debug, Default)]
pub struct ChunkedI64Array {
    pages: Vec<Box<[i64; PAGE_SIZE]>>,
    size: usize,
}

impl ChunkedI64Array {
    /// Creates an empty array. No pages are allocated until the first
    /// push.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value, allocating a fresh page when the last one is
    /// full.
    pub fn push(&mut self, value: i64) {
        if self.size >> PAGE_SHIFT == self.pages.len() {
            self.pages.push(Box::new([0; PAGE_SIZE]));
        }
        self.pages[self.size >> PAGE_SHIFT][self.size & PAGE_MASK] = value;
        self.size += 1;
    }

    /// Returns the element at `index`. Panics if out of bounds.
    pub fn get(&self, index: usize) -> i64 {
        assert!(index < self.size, "index {index} out of bounds ({})", self.size);
        self.pages[index >> PAGE_SHIFT][index & PAGE_MASK]
    }

    /// Replaces the element at `index`. Panics if out of bounds.
    pub fn set(&mut self, index: usize, value: i64) {
        assert!(index < self.size, "index {index} out of bounds ({})", self.size);
        self.pages[index >> PAGE_SHIFT][index & PAGE_MASK] = value;
    }

    /// Number of elements held.
    pub fn len(&self) -> usize {
        self.size
    }

    /// True when no elements are held.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Drops all elements and releases the pages.
    pub fn clear(&mut self) {
        self.pages.clear();
        self.size = 0;
    }

    /// Bytes occupied by the allocated pages.
    pub fn memory_usage(&self) -> usize {
        self.pages.len() * PAGE_SIZE * std::mem::size_of::<i64>()
    }
}

impl ElementStore for ChunkedI64Array {
    fn get(&self, index: usize) -> i64 {
        ChunkedI64Array::get(self, index)
    }

    fn set(&mut self, index: usize, value: i64) {
        ChunkedI64Array::set(self, index, value);
    }

    fn len(&self) -> usize {
        self.size
    }
}

/// Paged dynamic array of `i32` values.
///
/// Same shape as [`ChunkedI64Array`] at half the footprint. Through
/// [`ElementStore`] it widens on read and truncates on write, so the
/// shared search/sort logic applies unchanged; callers are responsible
/// for only storing values that fit.
#[derive(Debug, Default)]
pub struct ChunkedI32Array {
    pages: Vec<Box<[i32; PAGE_SIZE]>>,
    size: usize,
}

impl ChunkedI32Array {
    /// Creates an empty array.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value.
    pub fn push(&mut self, value: i32) {
        if self.size >> PAGE_SHIFT == self.pages.len() {
            self.pages.push(Box::new([0; PAGE_SIZE]));
        }
        self.pages[self.size >> PAGE_SHIFT][self.size & PAGE_MASK] = value;
        self.size += 1;
    }

    /// Returns the element at `index`. Panics if out of bounds.
    pub fn get(&self, index: usize) -> i32 {
        assert!(index < self.size, "index {index} out of bounds ({})", self.size);
        self.pages[index >> PAGE_SHIFT][index & PAGE_MASK]
    }

    /// Replaces the element at `index`. Panics if out of bounds.
    pub fn set(&mut self, index: usize, value: i32) {
        assert!(index < self.size, "index {index} out of bounds ({})", self.size);
        self.pages[index >> PAGE_SHIFT][index & PAGE_MASK] = value;
    }

    /// Number of elements held.
    pub fn len(&self) -> usize {
        self.size
    }

    /// True when no elements are held.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Drops all elements and releases the pages.
    pub fn clear(&mut self) {
        self.pages.clear();
        self.size = 0;
    }

    /// Bytes occupied by the allocated pages.
    pub fn memory_usage(&self) -> usize {
        self.pages.len() * PAGE_SIZE * std::mem::size_of::<i32>()
    }
}

impl ElementStore for ChunkedI32Array {
    fn get(&self, index: usize) -> i64 {
        i64::from(ChunkedI32Array::get(self, index))
    }

    fn set(&mut self, index: usize, value: i64) {
        ChunkedI32Array::set(self, index, value as i32);
    }

    fn len(&self) -> usize {
        self.size
    }
}
