//! Buffer view shared by workers that write disjoint positions

use std::marker::PhantomData;
use std::ops::Range;

/// Raw view of a mutable buffer handed to every worker of a launch
///
/// The prefix sums of a pass send each element to a unique position, so
/// concurrent writes through the view never alias. Reads of a range are
/// only valid once the writes to it are ordered before the read by a
/// barrier.
#[derive(Debug)]
pub struct SharedSlice<'a, T> {
    ptr: *mut T,
    len: usize,
    _marker: PhantomData<&'a mut [T]>,
}

impl<T> Clone for SharedSlice<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SharedSlice<'_, T> {}

// SAFETY: workers only touch disjoint positions between barriers.
unsafe impl<T: Send> Send for SharedSlice<'_, T> {}
unsafe impl<T: Send> Sync for SharedSlice<'_, T> {}

impl<'a, T: Copy> SharedSlice<'a, T> {
    /// View over `slice` for the lifetime of the borrow
    pub fn new(slice: &'a mut [T]) -> Self {
        Self {
            ptr: slice.as_mut_ptr(),
            len: slice.len(),
            _marker: PhantomData,
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the view is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Write one element
    ///
    /// # Safety
    /// `index < len` and no other worker accesses `index` concurrently.
    #[inline(always)]
    pub unsafe fn write(&self, index: usize, value: T) {
        debug_assert!(index < self.len);
        unsafe { self.ptr.add(index).write(value) }
    }

    /// Borrow a range for reading
    ///
    /// # Safety
    /// `range` is in bounds and nobody writes it while the borrow lives.
    #[inline]
    pub unsafe fn slice(&self, range: Range<usize>) -> &'a [T] {
        debug_assert!(range.start <= range.end && range.end <= self.len);
        unsafe { std::slice::from_raw_parts(self.ptr.add(range.start), range.len()) }
    }

    /// Borrow a range for writing
    ///
    /// # Safety
    /// `range` is in bounds and owned by the caller while the borrow lives.
    #[allow(clippy::mut_from_ref)]
    #[inline]
    pub unsafe fn slice_mut(&self, range: Range<usize>) -> &'a mut [T] {
        debug_assert!(range.start <= range.end && range.end <= self.len);
        unsafe { std::slice::from_raw_parts_mut(self.ptr.add(range.start), range.len()) }
    }
}
