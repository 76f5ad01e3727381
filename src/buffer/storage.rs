//! Raw element storage - the only place that touches the allocator
//!
//! Every byte offset inside a buffer comes from [`RawStorage::span`].

use crate::error::{NativeError, Result};
use crate::kind::ElementKind;
use crate::logging::{log_allocation, log_deallocation};
use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::ops::Range;
use std::ptr::NonNull;

/// Exclusively owned, zero-initialized block of `capacity` elements
pub(crate) struct RawStorage {
    ptr: NonNull<u8>,
    capacity: usize,
    kind: ElementKind,
}

impl RawStorage {
    /// Allocate room for `capacity` elements (at least one)
    pub(crate) fn allocate(kind: ElementKind, capacity: usize) -> Result<Self> {
        let capacity = capacity.max(1);
        let layout = Self::layout_for(kind, capacity)?;

        // Zeroed so every byte of the block is initialized memory, even the
        // slots past the logical length.
        let raw = unsafe { alloc_zeroed(layout) };
        let ptr = NonNull::new(raw).ok_or_else(|| NativeError::allocation("typed buffer", layout.size()))?;

        log_allocation("typed buffer", layout.size(), ptr.as_ptr());
        Ok(Self { ptr, capacity, kind })
    }

    fn layout_for(kind: ElementKind, capacity: usize) -> Result<Layout> {
        let size = capacity
            .checked_mul(kind.width())
            .ok_or_else(|| NativeError::allocation("typed buffer", usize::MAX))?;
        Layout::from_size_align(size, kind.align()).map_err(|_| NativeError::allocation("typed buffer", size))
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub(crate) fn kind(&self) -> ElementKind {
        self.kind
    }

    #[inline]
    pub(crate) fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    /// Byte range occupied by elements `[start, end)`
    #[inline]
    pub(crate) fn span(&self, start: usize, end: usize) -> Range<usize> {
        debug_assert!(start <= end && end <= self.capacity);
        let width = self.kind.width();
        start * width..end * width
    }

    /// Whole block as bytes
    #[inline]
    pub(crate) fn bytes(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.capacity * self.kind.width()) }
    }

    #[inline]
    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.capacity * self.kind.width()) }
    }
}

impl Drop for RawStorage {
    fn drop(&mut self) {
        let size = self.capacity * self.kind.width();
        log_deallocation("typed buffer", size, self.ptr.as_ptr());
        unsafe {
            let layout = Layout::from_size_align_unchecked(size, self.kind.align());
            dealloc(self.ptr.as_ptr(), layout);
        }
    }
}

// The block is plain bytes with a single owner.
unsafe impl Send for RawStorage {}

/// Smallest power-of-two multiple of `current` strictly greater than `needed`
///
/// Keeps one spare slot past the logical length, matching the growth
/// trigger `needed >= capacity`.
pub(crate) fn grown_capacity(current: usize, needed: usize) -> usize {
    let mut capacity = current.max(1);
    while capacity <= needed {
        capacity *= 2;
    }
    capacity
}
