//! Array descriptor lifecycle and metadata - C API
//!
//! Order arguments: 0 = row-major, 1 = column-major, anything else uses
//! the configured default order.

use super::error::{fail, invalid, succeed, PYRT_ERR_INVALID};
use super::raw_slice;
use crate::array::{ArrayDescriptor, MemoryOrder};
use crate::config;
use crate::error::Result;
use crate::kind::ElementKind;
use crate::logging::trace;
use std::ptr;

pub(crate) fn into_handle(result: Result<ArrayDescriptor>) -> *mut ArrayDescriptor {
    match result {
        Ok(array) => {
            succeed();
            Box::into_raw(Box::new(array))
        }
        Err(err) => {
            fail(&err);
            ptr::null_mut()
        }
    }
}

fn memory_order(order: i32) -> MemoryOrder {
    match order {
        0 => MemoryOrder::RowMajor,
        1 => MemoryOrder::ColumnMajor,
        _ => config::current().array.default_order,
    }
}

/// Non-owning descriptor over dense memory.
///
/// # Safety
/// `shape` must hold `rank` extents; `data` must hold `product(shape)`
/// elements of `kind` and outlive the descriptor.
#[no_mangle]
pub unsafe extern "C" fn pyrt_array_from_view(
    data: *mut u8,
    rank: usize,
    shape: *const usize,
    kind: u8,
    order: i32,
) -> *mut ArrayDescriptor {
    let Some(kind) = ElementKind::from_u8(kind) else {
        invalid("unknown element kind");
        return ptr::null_mut();
    };
    let Some(shape) = raw_slice(shape, rank) else {
        invalid("null shape");
        return ptr::null_mut();
    };
    into_handle(ArrayDescriptor::from_view(data, shape, kind, memory_order(order)))
}

/// Non-owning descriptor with explicit byte strides.
///
/// # Safety
/// `shape` and `strides` must hold `rank` entries each; every element they
/// address from `data` must stay valid for the descriptor's lifetime.
#[no_mangle]
pub unsafe extern "C" fn pyrt_array_from_strided_view(
    data: *mut u8,
    rank: usize,
    shape: *const usize,
    strides: *const isize,
    kind: u8,
) -> *mut ArrayDescriptor {
    let Some(kind) = ElementKind::from_u8(kind) else {
        invalid("unknown element kind");
        return ptr::null_mut();
    };
    let (Some(shape), Some(strides)) = (raw_slice(shape, rank), raw_slice(strides, rank)) else {
        invalid("null shape or strides");
        return ptr::null_mut();
    };
    into_handle(ArrayDescriptor::from_strided_view(data, shape, strides, kind))
}

/// Zero-filled descriptor that owns its memory
///
/// # Safety
/// `shape` must hold `rank` extents.
#[no_mangle]
pub unsafe extern "C" fn pyrt_array_zeros(rank: usize, shape: *const usize, kind: u8, order: i32) -> *mut ArrayDescriptor {
    let Some(kind) = ElementKind::from_u8(kind) else {
        invalid("unknown element kind");
        return ptr::null_mut();
    };
    let Some(shape) = raw_slice(shape, rank) else {
        invalid("null shape");
        return ptr::null_mut();
    };
    into_handle(ArrayDescriptor::zeros(shape, kind, memory_order(order)))
}

/// Destroy a descriptor (freeing memory only if it owns it) and null out
/// the caller's handle
///
/// # Safety
/// `handle` must be null or point to a live descriptor handle.
#[no_mangle]
pub unsafe extern "C" fn pyrt_array_destroy(handle: *mut *mut ArrayDescriptor) {
    if handle.is_null() || (*handle).is_null() {
        return;
    }
    let array = *Box::from_raw(*handle);
    *handle = ptr::null_mut();
    trace!(address = ?array.as_ptr(), "array handle destroyed");
    array.destroy();
}

/// # Safety
/// `array` must be null or a live descriptor handle.
#[no_mangle]
pub unsafe extern "C" fn pyrt_array_rank(array: *const ArrayDescriptor) -> usize {
    array.as_ref().map_or(0, ArrayDescriptor::rank)
}

/// Pointer to `rank` extents, owned by the descriptor
///
/// # Safety
/// `array` must be null or a live descriptor handle.
#[no_mangle]
pub unsafe extern "C" fn pyrt_array_shape(array: *const ArrayDescriptor) -> *const usize {
    array.as_ref().map_or(ptr::null(), |a| a.shape().as_ptr())
}

/// Pointer to `rank` byte strides, owned by the descriptor
///
/// # Safety
/// `array` must be null or a live descriptor handle.
#[no_mangle]
pub unsafe extern "C" fn pyrt_array_strides(array: *const ArrayDescriptor) -> *const isize {
    array.as_ref().map_or(ptr::null(), |a| a.strides().as_ptr())
}

/// Element-kind tag, or -1 for a null handle
///
/// # Safety
/// `array` must be null or a live descriptor handle.
#[no_mangle]
pub unsafe extern "C" fn pyrt_array_kind(array: *const ArrayDescriptor) -> i32 {
    array.as_ref().map_or(PYRT_ERR_INVALID, |a| a.element_kind() as i32)
}

/// # Safety
/// `array` must be null or a live descriptor handle.
#[no_mangle]
pub unsafe extern "C" fn pyrt_array_len(array: *const ArrayDescriptor) -> usize {
    array.as_ref().map_or(0, ArrayDescriptor::len)
}

/// # Safety
/// `array` must be null or a live descriptor handle.
#[no_mangle]
pub unsafe extern "C" fn pyrt_array_byte_len(array: *const ArrayDescriptor) -> usize {
    array.as_ref().map_or(0, ArrayDescriptor::byte_len)
}

/// # Safety
/// `array` must be null or a live descriptor handle.
#[no_mangle]
pub unsafe extern "C" fn pyrt_array_is_view(array: *const ArrayDescriptor) -> bool {
    array.as_ref().map_or(false, ArrayDescriptor::is_view)
}

/// Pointer to the element at `index` (`rank` entries); null on a bad index
///
/// # Safety
/// `array` must be null or a live descriptor handle; `index` must hold
/// `rank` entries.
#[no_mangle]
pub unsafe extern "C" fn pyrt_array_element(array: *mut ArrayDescriptor, index: *const usize) -> *mut u8 {
    let Some(array) = array.as_mut() else {
        invalid("null array handle");
        return ptr::null_mut();
    };
    let Some(index) = raw_slice(index, array.rank()) else {
        invalid("null index");
        return ptr::null_mut();
    };
    match array.element_bytes_mut(index) {
        Ok(bytes) => {
            succeed();
            bytes.as_mut_ptr()
        }
        Err(err) => {
            fail(&err);
            ptr::null_mut()
        }
    }
}
