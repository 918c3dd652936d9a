//! Paged dynamic arrays with search and sort over an abstract element
//! seam.
//!
//! The buffered stream variants need a large scratch array of `i64`
//! values that can be appended to, binary-searched, and sorted in place.
//! Storage is kept behind the [`ElementStore`] trait so that the search
//! and sort logic is shared between element widths: [`ChunkedI64Array`]
//! is the primary backing, [`ChunkedI32Array`] the narrow variant.
//!
//! Sorting is a randomized in-place quicksort with a fixed pivot seed,
//! so the exact sequence of element exchanges is reproducible for a
//! given input. Callers that maintain a second array in lockstep can
//! subscribe to every exchange through a swap listener.

mod chunked;

pub use chunked::{ChunkedI32Array, ChunkedI64Array};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Partitions smaller than this are finished with an insertion sort.
const INSERTION_SORT_THRESHOLD: usize = 8;

/// Default pivot seed. Pivot selection is a behavioral contract: for a
/// given input, the swap sequence (and therefore the ordering of equal
/// keys) is reproducible across runs.
const DEFAULT_PIVOT_SEED: u64 = 0x5EED_1234;

/// Abstract indexed storage of `i64` elements.
///
/// Search and sort are provided on top of `get`/`set`/`len`, so any
/// backing that can read and write elements by index inherits them.
/// Sortedness is a precondition of the search operations, not something
/// they enforce.
pub trait ElementStore {
    /// Returns the element at `index`.
    fn get(&self, index: usize) -> i64;

    /// Replaces the element at `index`.
    fn set(&mut self, index: usize, value: i64);

    /// Number of elements held.
    fn len(&self) -> usize;

    /// True when no elements are held.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Seed for pivot selection. Implementations may carry their own.
    fn pivot_seed(&self) -> u64 {
        DEFAULT_PIVOT_SEED
    }

    /// Exchanges the elements at `i` and `j`.
    fn swap(&mut self, i: usize, j: usize) {
        let a = self.get(i);
        let b = self.get(j);
        self.set(i, b);
        self.set(j, a);
    }

    /// Binary search for `value` in an ascending store.
    ///
    /// Returns an index holding `value`, or `None` if absent. Which
    /// index is returned among duplicates is unspecified.
    fn index_of(&self, value: i64) -> Option<usize> {
        let mut lo = 0;
        let mut hi = self.len();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            match self.get(mid).cmp(&value) {
                std::cmp::Ordering::Less => lo = mid + 1,
                std::cmp::Ordering::Greater => hi = mid,
                std::cmp::Ordering::Equal => return Some(mid),
            }
        }
        None
    }

    /// Index of the greatest element `<= value` in an ascending store,
    /// or `None` if every element is greater.
    fn nearest_index_of(&self, value: i64) -> Option<usize> {
        let mut lo = 0;
        let mut hi = self.len();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.get(mid) <= value {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo.checked_sub(1)
    }

    /// Sorts the store ascending.
    fn sort(&mut self)
    where
        Self: Sized,
    {
        self.sort_with(|_| {}, |_, _| {});
    }

    /// Sorts the store ascending, reporting progress and every element
    /// exchange.
    ///
    /// `progress` receives the cumulative number of elements known to be
    /// in their final position; `on_swap` receives the index pair of
    /// every exchange actually performed, in order. Replaying the swaps
    /// onto a copy of the original contents reproduces the sorted array
    /// exactly.
    fn sort_with<P, S>(&mut self, mut progress: P, mut on_swap: S)
    where
        Self: Sized,
        P: FnMut(usize),
        S: FnMut(usize, usize),
    {
        let len = self.len();
        if len < 2 {
            return;
        }
        let mut rng = StdRng::seed_from_u64(self.pivot_seed());
        let mut placed = 0;
        quicksort(
            self,
            0,
            len - 1,
            &mut rng,
            &mut on_swap,
            &mut progress,
            &mut placed,
        );
    }

    /// Sorts the store descending.
    fn reverse_sort(&mut self)
    where
        Self: Sized,
    {
        self.reverse_sort_with(|_| {}, |_, _| {});
    }

    /// Sorts the store descending, reporting progress and every element
    /// exchange performed in both the ascending phase and the in-place
    /// reversal.
    fn reverse_sort_with<P, S>(&mut self, progress: P, mut on_swap: S)
    where
        Self: Sized,
        P: FnMut(usize),
        S: FnMut(usize, usize),
    {
        self.sort_with(progress, &mut on_swap);
        let len = self.len();
        if len < 2 {
            return;
        }
        let mut i = 0;
        let mut j = len - 1;
        while i < j {
            self.swap(i, j);
            on_swap(i, j);
            i += 1;
            j -= 1;
        }
    }
}

/// Exchanges two elements and notifies the listener.
fn exchange<T, S>(store: &mut T, i: usize, j: usize, on_swap: &mut S)
where
    T: ElementStore,
    S: FnMut(usize, usize),
{
    store.swap(i, j);
    on_swap(i, j);
}

/// Insertion sort of the inclusive range `lo..=hi` by adjacent swaps,
/// notifying the listener for each exchange.
fn insertion_sort<T, S>(store: &mut T, lo: usize, hi: usize, on_swap: &mut S)
where
    T: ElementStore,
    S: FnMut(usize, usize),
{
    for i in (lo + 1)..=hi {
        let mut j = i;
        while j > lo && store.get(j - 1) > store.get(j) {
            exchange(store, j - 1, j, on_swap);
            j -= 1;
        }
    }
}

/// Randomized quicksort of the inclusive range `lo..=hi`.
///
/// A randomly chosen pivot is swapped to the front, the remainder is
/// partitioned Hoare-style, and the pivot is swapped into its final
/// slot. Small partitions fall back to insertion sort.
fn quicksort<T, P, S>(
    store: &mut T,
    lo: usize,
    hi: usize,
    rng: &mut StdRng,
    on_swap: &mut S,
    progress: &mut P,
    placed: &mut usize,
) where
    T: ElementStore,
    P: FnMut(usize),
    S: FnMut(usize, usize),
{
    if hi <= lo {
        // Single element: already in place.
        *placed += 1;
        progress(*placed);
        return;
    }
    if hi - lo + 1 < INSERTION_SORT_THRESHOLD {
        insertion_sort(store, lo, hi, on_swap);
        *placed += hi - lo + 1;
        progress(*placed);
        return;
    }

    let pivot_index = rng.gen_range(lo..=hi);
    if pivot_index != lo {
        exchange(store, lo, pivot_index, on_swap);
    }
    let pivot = store.get(lo);

    let mut i = lo + 1;
    let mut j = hi;
    loop {
        while i <= hi && store.get(i) < pivot {
            i += 1;
        }
        while j > lo && store.get(j) > pivot {
            j -= 1;
        }
        if i >= j {
            break;
        }
        exchange(store, i, j, on_swap);
        i += 1;
        j -= 1;
    }
    // `j` is the final slot for the pivot.
    if j != lo {
        exchange(store, lo, j, on_swap);
    }
    *placed += 1;
    progress(*placed);

    if j > lo {
        quicksort(store, lo, j - 1, rng, on_swap, progress, placed);
    }
    if j < hi {
        quicksort(store, j + 1, hi, rng, on_swap, progress, placed);
    }
}
