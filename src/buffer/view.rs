//! Rank-1 array views over typed buffers

use super::TypedBuffer;
use crate::array::{ArrayDescriptor, MemoryOrder};
use std::marker::PhantomData;
use std::ops::Deref;

/// Read-only [`ArrayDescriptor`] over a buffer's elements.
///
/// Borrows the buffer, so the buffer cannot grow (and move its storage)
/// while the view exists.
pub struct BufferView<'a> {
    descriptor: ArrayDescriptor,
    _buffer: PhantomData<&'a TypedBuffer>,
}

impl<'a> BufferView<'a> {
    pub(super) fn new(buffer: &'a TypedBuffer) -> Self {
        // SAFETY: storage holds `len` initialized elements and is pinned by
        // the shared borrow for 'a.
        let descriptor = unsafe {
            ArrayDescriptor::from_view_unchecked(
                buffer.as_ptr() as *mut u8,
                &[buffer.len()],
                buffer.kind(),
                MemoryOrder::RowMajor,
            )
        };
        Self {
            descriptor,
            _buffer: PhantomData,
        }
    }
}

impl Deref for BufferView<'_> {
    type Target = ArrayDescriptor;

    fn deref(&self) -> &ArrayDescriptor {
        &self.descriptor
    }
}
