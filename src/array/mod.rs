//! Array descriptors - shape/stride metadata over native memory
//!
//! A descriptor either borrows memory owned by someone else (a host array,
//! a typed buffer) or owns a block it allocated itself. The distinction is
//! the [`ArrayData`] variant, so releasing memory is decided by the type of
//! the data field rather than by a flag every destruction path must check.
//!
//! Strides are stored in bytes, like the host reports them;
//! [`ArrayDescriptor::element_strides`] gives element units.

mod strides;

#[cfg(test)]
mod tests;

pub use strides::{contiguous_strides, element_count, is_contiguous, IndexIter, Shape, Strides};

use crate::error::{NativeError, Result};
use crate::kind::{Element, ElementKind};
use crate::logging::{log_allocation, log_deallocation, log_view_created, trace};
use serde::{Deserialize, Serialize};
use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::fmt;
use std::ptr::NonNull;

/// Element ordering of a dense array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MemoryOrder {
    /// Last index varies fastest (C order, the host default)
    #[default]
    RowMajor,
    /// First index varies fastest (Fortran order)
    ColumnMajor,
}

/// Native allocation owned by a descriptor
pub struct OwnedBlock {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl OwnedBlock {
    fn allocate_zeroed(size: usize, align: usize) -> Result<Self> {
        // Empty arrays still get a real (one element) block.
        let layout = Layout::from_size_align(size.max(align), align)
            .map_err(|_| NativeError::allocation("array descriptor", size))?;
        let raw = unsafe { alloc_zeroed(layout) };
        let ptr = NonNull::new(raw).ok_or_else(|| NativeError::allocation("array descriptor", layout.size()))?;
        log_allocation("array descriptor", layout.size(), ptr.as_ptr());
        Ok(Self { ptr, layout })
    }
}

impl Drop for OwnedBlock {
    fn drop(&mut self) {
        log_deallocation("array descriptor", self.layout.size(), self.ptr.as_ptr());
        unsafe { dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

/// Where a descriptor's elements live
pub enum ArrayData {
    /// Borrowed; never freed by the descriptor
    View(NonNull<u8>),
    /// Allocated by the runtime; freed when the descriptor is dropped
    Owned(OwnedBlock),
}

impl ArrayData {
    #[inline]
    fn ptr(&self) -> NonNull<u8> {
        match self {
            Self::View(ptr) => *ptr,
            Self::Owned(block) => block.ptr,
        }
    }
}

pub struct ArrayDescriptor {
    shape: Shape,
    strides: Strides,
    kind: ElementKind,
    data: ArrayData,
    len: usize,
    byte_len: usize,
}

impl ArrayDescriptor {
    /// Describe externally owned memory laid out densely in `order`.
    ///
    /// # Safety
    /// `data` must point to `product(shape)` initialized elements of `kind`
    /// laid out in `order`, and stay valid for the lifetime of the returned
    /// descriptor. The descriptor never frees it.
    pub unsafe fn from_view(
        data: *mut u8,
        shape: &[usize],
        kind: ElementKind,
        order: MemoryOrder,
    ) -> Result<Self> {
        let strides = contiguous_strides(shape, kind.width(), order);
        Self::from_strided_view(data, shape, &strides, kind)
    }

    /// Describe externally owned memory with explicit byte strides.
    ///
    /// # Safety
    /// Every byte addressed by `shape`/`strides` from `data` must be valid
    /// for the lifetime of the returned descriptor.
    pub unsafe fn from_strided_view(
        data: *mut u8,
        shape: &[usize],
        strides: &[isize],
        kind: ElementKind,
    ) -> Result<Self> {
        if shape.len() != strides.len() {
            return Err(NativeError::shape(
                format!("{} strides", shape.len()),
                format!("{} strides", strides.len()),
            ));
        }

        let len = element_count(shape).ok_or_else(|| NativeError::shape("addressable extents", format!("{:?}", shape)))?;
        let ptr = match NonNull::new(data) {
            Some(ptr) => ptr,
            None if len == 0 => NonNull::dangling(),
            None => return Err(NativeError::conversion("array data pointer", "null")),
        };

        log_view_created(kind, shape.len(), len);
        Ok(Self {
            shape: shape.iter().copied().collect(),
            strides: strides.iter().copied().collect(),
            kind,
            data: ArrayData::View(ptr),
            len,
            byte_len: len * kind.width(),
        })
    }

    /// Infallible dense view for callers that already hold a non-null
    /// pointer and a small shape.
    pub(crate) unsafe fn from_view_unchecked(
        data: *mut u8,
        shape: &[usize],
        kind: ElementKind,
        order: MemoryOrder,
    ) -> Self {
        let len = shape.iter().product::<usize>();
        Self {
            shape: shape.iter().copied().collect(),
            strides: contiguous_strides(shape, kind.width(), order),
            kind,
            data: ArrayData::View(NonNull::new_unchecked(data)),
            len,
            byte_len: len * kind.width(),
        }
    }

    /// Allocate a zero-filled array owned by the descriptor
    pub fn zeros(shape: &[usize], kind: ElementKind, order: MemoryOrder) -> Result<Self> {
        let len = element_count(shape)
            .ok_or_else(|| NativeError::allocation("array descriptor", usize::MAX))?;
        let byte_len = len
            .checked_mul(kind.width())
            .ok_or_else(|| NativeError::allocation("array descriptor", usize::MAX))?;
        let block = OwnedBlock::allocate_zeroed(byte_len, kind.align())?;

        Ok(Self {
            shape: shape.iter().copied().collect(),
            strides: contiguous_strides(shape, kind.width(), order),
            kind,
            data: ArrayData::Owned(block),
            len,
            byte_len,
        })
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Per-dimension strides in bytes
    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    /// Per-dimension strides in elements, `None` if some stride is not a
    /// whole number of elements
    pub fn element_strides(&self) -> Option<Strides> {
        let width = self.kind.width() as isize;
        self.strides
            .iter()
            .map(|&stride| (stride % width == 0).then_some(stride / width))
            .collect()
    }

    #[inline]
    pub fn element_kind(&self) -> ElementKind {
        self.kind
    }

    /// Total element count
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total size in bytes (`len() * width`)
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    #[inline]
    pub fn is_view(&self) -> bool {
        matches!(self.data, ArrayData::View(_))
    }

    #[inline]
    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.data.ptr().as_ptr()
    }

    pub fn is_c_contiguous(&self) -> bool {
        is_contiguous(&self.shape, &self.strides, self.kind.width(), MemoryOrder::RowMajor)
    }

    pub fn is_f_contiguous(&self) -> bool {
        is_contiguous(&self.shape, &self.strides, self.kind.width(), MemoryOrder::ColumnMajor)
    }

    /// Byte offset of the element at `index` from the data pointer
    pub fn byte_offset(&self, index: &[usize]) -> Result<isize> {
        if index.len() != self.rank() {
            return Err(NativeError::shape(
                format!("{} indices", self.rank()),
                format!("{} indices", index.len()),
            ));
        }

        let mut offset = 0isize;
        for ((&i, &extent), &stride) in index.iter().zip(&self.shape).zip(&self.strides) {
            if i >= extent {
                return Err(NativeError::index(i, extent));
            }
            offset += i as isize * stride;
        }
        Ok(offset)
    }

    /// Borrow the bytes of one element
    pub fn element_bytes(&self, index: &[usize]) -> Result<&[u8]> {
        let offset = self.byte_offset(index)?;
        // SAFETY: offset addresses an in-bounds element per the construction contract.
        unsafe {
            let ptr = self.as_ptr().offset(offset);
            Ok(std::slice::from_raw_parts(ptr, self.kind.width()))
        }
    }

    /// Mutably borrow the bytes of one element
    pub fn element_bytes_mut(&mut self, index: &[usize]) -> Result<&mut [u8]> {
        let offset = self.byte_offset(index)?;
        unsafe {
            let ptr = self.data.ptr().as_ptr().offset(offset);
            Ok(std::slice::from_raw_parts_mut(ptr, self.kind.width()))
        }
    }

    pub fn read<T: Element>(&self, index: &[usize]) -> Result<T> {
        if T::KIND != self.kind {
            return Err(NativeError::kind_mismatch(self.kind, T::KIND));
        }
        self.element_bytes(index).map(T::read_bytes)
    }

    pub fn write<T: Element>(&mut self, index: &[usize], value: T) -> Result<()> {
        if T::KIND != self.kind {
            return Err(NativeError::kind_mismatch(self.kind, T::KIND));
        }
        value.write_bytes(self.element_bytes_mut(index)?);
        Ok(())
    }

    /// Copy into a fresh, owned, row-major allocation
    pub fn to_owned(&self) -> Result<Self> {
        let mut copy = Self::zeros(&self.shape, self.kind, MemoryOrder::RowMajor)?;
        for index in IndexIter::new(&self.shape) {
            let src = self.element_bytes(&index)?;
            copy.element_bytes_mut(&index)?.copy_from_slice(src);
        }
        Ok(copy)
    }

    /// Release the descriptor. Owned memory is freed; viewed memory is not.
    pub fn destroy(self) {
        trace!(kind = self.kind.name(), view = self.is_view(), "array descriptor destroyed");
    }
}

impl fmt::Debug for ArrayDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayDescriptor")
            .field("kind", &self.kind)
            .field("shape", &self.shape.as_slice())
            .field("strides", &self.strides.as_slice())
            .field("view", &self.is_view())
            .finish()
    }
}
