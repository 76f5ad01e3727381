//! Typed buffer lifecycle and operations - C API
//!
//! Buffers cross the boundary as owning `*mut TypedBuffer` handles created
//! by `pyrt_buffer_create`/`pyrt_buffer_copy` and released exactly once by
//! `pyrt_buffer_destroy`. Element arguments point at one element's bytes.

use super::error::{fail, invalid, status, succeed, PYRT_ERR_INVALID};
use super::raw_slice;
use crate::array::{ArrayDescriptor, MemoryOrder};
use crate::buffer::TypedBuffer;
use crate::kind::ElementKind;
use crate::logging::trace;
use smallvec::SmallVec;
use std::ptr;

fn into_handle(result: crate::error::Result<TypedBuffer>) -> *mut TypedBuffer {
    match result {
        Ok(buffer) => {
            succeed();
            Box::into_raw(Box::new(buffer))
        }
        Err(err) => {
            fail(&err);
            ptr::null_mut()
        }
    }
}

/// Copy one element's bytes from a C pointer, which may point into the
/// buffer being mutated
unsafe fn element(buffer: &TypedBuffer, value: *const u8) -> Option<SmallVec<[u8; 16]>> {
    raw_slice(value, buffer.kind().width()).map(SmallVec::from_slice)
}

/// Create a buffer holding `count` elements copied from `data`.
///
/// Returns null on failure (see `pyrt_last_error`).
///
/// # Safety
/// `data` must be valid for `count` elements of `kind`; it may be null
/// when `count` is 0.
#[no_mangle]
pub unsafe extern "C" fn pyrt_buffer_create(kind: u8, data: *const u8, count: usize) -> *mut TypedBuffer {
    let Some(kind) = ElementKind::from_u8(kind) else {
        invalid("unknown element kind");
        return ptr::null_mut();
    };
    let Some(bytes) = count.checked_mul(kind.width()).and_then(|n| raw_slice(data, n)) else {
        invalid("null element data");
        return ptr::null_mut();
    };
    into_handle(TypedBuffer::create(kind, bytes))
}

/// Destroy a buffer and null out the caller's handle
///
/// # Safety
/// `handle` must be null or point to a handle returned by this API that
/// has not been destroyed.
#[no_mangle]
pub unsafe extern "C" fn pyrt_buffer_destroy(handle: *mut *mut TypedBuffer) {
    if handle.is_null() || (*handle).is_null() {
        return;
    }
    let buffer = *Box::from_raw(*handle);
    *handle = ptr::null_mut();
    trace!(address = ?buffer.as_ptr(), "buffer handle destroyed");
    buffer.destroy();
}

/// Append every element of `other` to `buffer`.
///
/// `buffer` and `other` may be the same handle.
///
/// # Safety
/// Both pointers must be null or live buffer handles.
#[no_mangle]
pub unsafe extern "C" fn pyrt_buffer_append(buffer: *mut TypedBuffer, other: *const TypedBuffer) -> i32 {
    if buffer.is_null() || other.is_null() {
        return invalid("null buffer handle");
    }
    if ptr::eq(buffer, other) {
        let result = (*buffer).copy().and_then(|copy| (*buffer).append(&copy));
        return status(result);
    }
    status((*buffer).append(&*other))
}

/// # Safety
/// `buffer` must be null or a live handle; `value` must point at one
/// element of the buffer's kind.
#[no_mangle]
pub unsafe extern "C" fn pyrt_buffer_insert(buffer: *mut TypedBuffer, index: usize, value: *const u8) -> i32 {
    let Some(buffer) = buffer.as_mut() else {
        return invalid("null buffer handle");
    };
    match element(buffer, value) {
        Some(bytes) => status(buffer.insert(index, &bytes)),
        None => invalid("null element"),
    }
}

/// # Safety
/// `buffer` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn pyrt_buffer_remove_at(buffer: *mut TypedBuffer, index: usize) -> i32 {
    match buffer.as_mut() {
        Some(buffer) => status(buffer.remove_at(index)),
        None => invalid("null buffer handle"),
    }
}

/// Index of the first element equal to `value`, or -1 when absent
/// (or on error, with `pyrt_last_error` set).
///
/// # Safety
/// `buffer` must be null or a live handle; `value` must point at one
/// element of the buffer's kind.
#[no_mangle]
pub unsafe extern "C" fn pyrt_buffer_find_first(buffer: *const TypedBuffer, value: *const u8) -> isize {
    let Some(buffer) = buffer.as_ref() else {
        invalid("null buffer handle");
        return -1;
    };
    let Some(value) = element(buffer, value) else {
        invalid("null element");
        return -1;
    };
    match buffer.find_first(&value) {
        Ok(found) => {
            succeed();
            found.map_or(-1, |index| index as isize)
        }
        Err(err) => {
            fail(&err);
            -1
        }
    }
}

/// Number of elements equal to `value`; -1 on error
///
/// # Safety
/// Same as [`pyrt_buffer_find_first`].
#[no_mangle]
pub unsafe extern "C" fn pyrt_buffer_count(buffer: *const TypedBuffer, value: *const u8) -> isize {
    let Some(buffer) = buffer.as_ref() else {
        invalid("null buffer handle");
        return -1;
    };
    let Some(value) = element(buffer, value) else {
        invalid("null element");
        return -1;
    };
    match buffer.count_equal(&value) {
        Ok(count) => {
            succeed();
            count as isize
        }
        Err(err) => {
            fail(&err);
            -1
        }
    }
}

/// Remove the first element equal to `value`. `removed` (nullable)
/// receives whether a match existed.
///
/// # Safety
/// Same as [`pyrt_buffer_find_first`]; `removed` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn pyrt_buffer_remove_value(
    buffer: *mut TypedBuffer,
    value: *const u8,
    removed: *mut bool,
) -> i32 {
    let Some(buffer) = buffer.as_mut() else {
        return invalid("null buffer handle");
    };
    let Some(value) = element(buffer, value) else {
        return invalid("null element");
    };
    match buffer.remove_value(&value) {
        Ok(found) => {
            if !removed.is_null() {
                *removed = found;
            }
            succeed()
        }
        Err(err) => fail(&err),
    }
}

/// # Safety
/// `buffer` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn pyrt_buffer_reverse(buffer: *mut TypedBuffer) -> i32 {
    match buffer.as_mut() {
        Some(buffer) => {
            buffer.reverse();
            succeed()
        }
        None => invalid("null buffer handle"),
    }
}

/// # Safety
/// `buffer` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn pyrt_buffer_clear(buffer: *mut TypedBuffer) -> i32 {
    match buffer.as_mut() {
        Some(buffer) => {
            buffer.clear();
            succeed()
        }
        None => invalid("null buffer handle"),
    }
}

/// Deep copy; null on failure
///
/// # Safety
/// `buffer` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn pyrt_buffer_copy(buffer: *const TypedBuffer) -> *mut TypedBuffer {
    match buffer.as_ref() {
        Some(buffer) => into_handle(buffer.copy()),
        None => {
            invalid("null buffer handle");
            ptr::null_mut()
        }
    }
}

/// Pointer to element `index`, valid until the buffer is next mutated.
/// Null when out of range.
///
/// # Safety
/// `buffer` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn pyrt_buffer_element_at(buffer: *mut TypedBuffer, index: usize) -> *mut u8 {
    let Some(buffer) = buffer.as_mut() else {
        invalid("null buffer handle");
        return ptr::null_mut();
    };
    let len = buffer.len();
    match buffer.element_at_mut(index) {
        Some(bytes) => {
            succeed();
            bytes.as_mut_ptr()
        }
        None => {
            fail(&crate::error::NativeError::index(index, len));
            ptr::null_mut()
        }
    }
}

/// # Safety
/// `buffer` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn pyrt_buffer_len(buffer: *const TypedBuffer) -> usize {
    buffer.as_ref().map_or(0, TypedBuffer::len)
}

/// # Safety
/// `buffer` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn pyrt_buffer_capacity(buffer: *const TypedBuffer) -> usize {
    buffer.as_ref().map_or(0, TypedBuffer::capacity)
}

/// Element-kind tag, or -1 for a null handle
///
/// # Safety
/// `buffer` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn pyrt_buffer_kind(buffer: *const TypedBuffer) -> i32 {
    buffer.as_ref().map_or(PYRT_ERR_INVALID, |b| b.kind() as i32)
}

/// Rank-1 view over the buffer's elements. The view must be destroyed
/// before the buffer is mutated or destroyed.
///
/// # Safety
/// `buffer` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn pyrt_buffer_as_array(buffer: *const TypedBuffer) -> *mut ArrayDescriptor {
    let Some(buffer) = buffer.as_ref() else {
        invalid("null buffer handle");
        return ptr::null_mut();
    };
    super::array::into_handle(ArrayDescriptor::from_view(
        buffer.as_ptr() as *mut u8,
        &[buffer.len()],
        buffer.kind(),
        MemoryOrder::RowMajor,
    ))
}
