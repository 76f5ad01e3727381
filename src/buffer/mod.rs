//! Typed buffer - growable homogeneous sequence with amortized O(1) append
//!
//! Design: one contiguous block per buffer, elements stored by value at
//! `index * kind.width()`, geometric growth (factor of 2).
//! - The element kind is fixed at creation
//! - Capacity never shrinks; `clear` keeps the storage for reuse
//! - Growth replaces the storage by move, so the old block is released
//!   exactly once and can no longer be reached

mod storage;
mod view;


pub use view::BufferView;

use crate::error::{NativeError, Result};
use crate::kind::{Element, ElementKind};
use crate::logging::{log_buffer_growth, trace};
use std::fmt;
use storage::{grown_capacity, RawStorage};

pub struct TypedBuffer {
    len: usize,
    storage: RawStorage,
}

impl TypedBuffer {
    /// Create an empty buffer with the configured default capacity
    pub fn new(kind: ElementKind) -> Result<Self> {
        Self::with_capacity(kind, crate::config::current().buffer.default_capacity)
    }

    /// Create an empty buffer holding at least `capacity` elements
    pub fn with_capacity(kind: ElementKind, capacity: usize) -> Result<Self> {
        Ok(Self {
            len: 0,
            storage: RawStorage::allocate(kind, capacity)?,
        })
    }

    /// Create a buffer from `bytes`, which must hold a whole number of
    /// `kind` elements laid out back to back.
    pub fn create(kind: ElementKind, bytes: &[u8]) -> Result<Self> {
        if bytes.len() % kind.width() != 0 {
            return Err(NativeError::conversion(
                format!("whole {} elements", kind),
                format!("{} bytes", bytes.len()),
            ));
        }

        let count = bytes.len() / kind.width();
        let default = crate::config::current().buffer.default_capacity;
        let mut buffer = Self::with_capacity(kind, grown_capacity(default, count))?;

        let span = buffer.storage.span(0, count);
        buffer.storage.bytes_mut()[span].copy_from_slice(bytes);
        buffer.len = count;

        trace!(kind = kind.name(), len = count, capacity = buffer.capacity(), "buffer created");
        Ok(buffer)
    }

    pub fn from_slice<T: Element>(items: &[T]) -> Result<Self> {
        let kind = T::KIND;
        let default = crate::config::current().buffer.default_capacity;
        let mut buffer = Self::with_capacity(kind, grown_capacity(default, items.len()))?;
        for item in items {
            buffer.push(*item)?;
        }
        Ok(buffer)
    }

    #[inline]
    pub fn kind(&self) -> ElementKind {
        self.storage.kind()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    /// Raw pointer to the first element; valid until the next growth
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.storage.as_ptr()
    }

    /// Initialized elements as bytes
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        let span = self.storage.span(0, self.len);
        &self.storage.bytes()[span]
    }

    fn check_element(&self, element: &[u8]) -> Result<()> {
        if element.len() != self.kind().width() {
            return Err(NativeError::conversion(
                format!("one {} element ({} bytes)", self.kind(), self.kind().width()),
                format!("{} bytes", element.len()),
            ));
        }
        Ok(())
    }

    /// Make room for `needed` elements, reallocating if `needed` meets or
    /// exceeds the current capacity.
    fn reserve_for(&mut self, needed: usize) -> Result<()> {
        if needed < self.capacity() {
            return Ok(());
        }

        let new_capacity = grown_capacity(self.capacity(), needed);
        let mut fresh = RawStorage::allocate(self.kind(), new_capacity)?;
        let span = self.storage.span(0, self.len);
        fresh.bytes_mut()[span.clone()].copy_from_slice(&self.storage.bytes()[span]);

        log_buffer_growth(self.kind(), self.capacity(), new_capacity);
        // Old storage is dropped here, exactly once.
        self.storage = fresh;
        Ok(())
    }

    /// Concatenate `other` onto the end of this buffer
    pub fn append(&mut self, other: &TypedBuffer) -> Result<()> {
        if other.kind() != self.kind() {
            return Err(NativeError::kind_mismatch(self.kind(), other.kind()));
        }
        self.extend_from_bytes(other.as_bytes())
    }

    /// Append raw elements (a whole number of element widths)
    pub fn extend_from_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let width = self.kind().width();
        if bytes.len() % width != 0 {
            return Err(NativeError::conversion(
                format!("whole {} elements", self.kind()),
                format!("{} bytes", bytes.len()),
            ));
        }

        let added = bytes.len() / width;
        let total = self.len + added;
        self.reserve_for(total)?;

        let span = self.storage.span(self.len, total);
        self.storage.bytes_mut()[span].copy_from_slice(bytes);
        self.len = total;
        Ok(())
    }

    /// Append one typed element
    pub fn push<T: Element>(&mut self, value: T) -> Result<()> {
        if T::KIND != self.kind() {
            return Err(NativeError::kind_mismatch(self.kind(), T::KIND));
        }
        let mut raw = [0u8; 16];
        let raw = &mut raw[..T::KIND.width()];
        value.write_bytes(raw);
        self.extend_from_bytes(raw)
    }

    /// Insert `element` before position `index` (`index == len` appends)
    pub fn insert(&mut self, index: usize, element: &[u8]) -> Result<()> {
        self.check_element(element)?;
        if index > self.len {
            return Err(NativeError::index(index, self.len));
        }

        self.reserve_for(self.len + 1)?;

        let tail = self.storage.span(index, self.len);
        let dest = self.storage.span(index + 1, self.len + 1).start;
        let slot = self.storage.span(index, index + 1);
        let bytes = self.storage.bytes_mut();
        bytes.copy_within(tail, dest);
        bytes[slot].copy_from_slice(element);

        self.len += 1;
        Ok(())
    }

    /// Remove the element at `index`, shifting later elements left
    pub fn remove_at(&mut self, index: usize) -> Result<()> {
        if index >= self.len {
            return Err(NativeError::index(index, self.len));
        }

        let tail = self.storage.span(index + 1, self.len);
        let dest = self.storage.span(index, index).start;
        self.storage.bytes_mut().copy_within(tail, dest);

        // Keep the vacated slot zeroed like never-written capacity.
        let vacated = self.storage.span(self.len - 1, self.len);
        self.storage.bytes_mut()[vacated].fill(0);

        self.len -= 1;
        Ok(())
    }

    /// Position of the first element byte-equal to `value`
    pub fn find_first(&self, value: &[u8]) -> Result<Option<usize>> {
        self.check_element(value)?;
        Ok(self.elements().position(|element| element == value))
    }

    /// Number of elements byte-equal to `value`
    pub fn count_equal(&self, value: &[u8]) -> Result<usize> {
        self.check_element(value)?;
        Ok(self.elements().filter(|element| *element == value).count())
    }

    /// Remove the first element equal to `value`. Returns whether one was found.
    pub fn remove_value(&mut self, value: &[u8]) -> Result<bool> {
        match self.find_first(value)? {
            Some(index) => {
                self.remove_at(index)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Reverse element order in place
    pub fn reverse(&mut self) {
        let (mut lo, mut hi) = (0, self.len);
        while lo + 1 < hi {
            hi -= 1;
            let front = self.storage.span(lo, lo + 1);
            let back = self.storage.span(hi, hi + 1);
            let bytes = self.storage.bytes_mut();
            let (head, rest) = bytes.split_at_mut(back.start);
            head[front].swap_with_slice(&mut rest[..back.len()]);
            lo += 1;
        }
    }

    /// Drop all elements, keeping the storage
    pub fn clear(&mut self) {
        let span = self.storage.span(0, self.len);
        self.storage.bytes_mut()[span].fill(0);
        self.len = 0;
    }

    /// Deep copy with independent storage
    pub fn copy(&self) -> Result<Self> {
        let mut copy = Self::with_capacity(self.kind(), self.capacity())?;
        copy.extend_from_bytes(self.as_bytes())?;
        Ok(copy)
    }

    /// Borrow the bytes of the element at `index`
    pub fn element_at(&self, index: usize) -> Option<&[u8]> {
        if index >= self.len {
            return None;
        }
        let span = self.storage.span(index, index + 1);
        Some(&self.storage.bytes()[span])
    }

    /// Mutably borrow the bytes of the element at `index`
    pub fn element_at_mut(&mut self, index: usize) -> Option<&mut [u8]> {
        if index >= self.len {
            return None;
        }
        let span = self.storage.span(index, index + 1);
        Some(&mut self.storage.bytes_mut()[span])
    }

    /// Read the element at `index` as `T`
    pub fn get<T: Element>(&self, index: usize) -> Result<T> {
        if T::KIND != self.kind() {
            return Err(NativeError::kind_mismatch(self.kind(), T::KIND));
        }
        self.element_at(index)
            .map(T::read_bytes)
            .ok_or_else(|| NativeError::index(index, self.len))
    }

    /// Copy all elements out as `T`
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>> {
        if T::KIND != self.kind() {
            return Err(NativeError::kind_mismatch(self.kind(), T::KIND));
        }
        Ok(self.elements().map(T::read_bytes).collect())
    }

    /// Expose the elements as a rank-1 array view borrowing this buffer
    pub fn as_array_view(&self) -> BufferView<'_> {
        BufferView::new(self)
    }

    /// Release the storage. The buffer is consumed and cannot be used again.
    pub fn destroy(self) {
        trace!(kind = self.kind().name(), len = self.len, "buffer destroyed");
    }

    fn elements(&self) -> std::slice::ChunksExact<'_, u8> {
        self.as_bytes().chunks_exact(self.kind().width())
    }
}

impl PartialEq for TypedBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind() && self.as_bytes() == other.as_bytes()
    }
}

impl fmt::Debug for TypedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedBuffer")
            .field("kind", &self.kind())
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .finish()
    }
}
