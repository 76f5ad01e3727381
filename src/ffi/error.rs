//! Thread-local error status for C callers
//!
//! Every fallible entry point records its outcome here. Status codes are
//! `PYRT_OK` or an [`ErrorCategory`] value.

use crate::error::{ErrorCategory, NativeError};
use crate::logging::debug;
use std::cell::RefCell;
use std::os::raw::c_char;

pub const PYRT_OK: i32 = 0;
pub const PYRT_ERR_ALLOCATION: i32 = ErrorCategory::Allocation as i32;
pub const PYRT_ERR_CONVERSION: i32 = ErrorCategory::Conversion as i32;
pub const PYRT_ERR_INDEX: i32 = ErrorCategory::Index as i32;
pub const PYRT_ERR_SHAPE: i32 = ErrorCategory::Shape as i32;
/// Null handle or unknown element-kind tag
pub const PYRT_ERR_INVALID: i32 = -1;

struct LastError {
    code: i32,
    message: String,
}

thread_local! {
    static LAST_ERROR: RefCell<LastError> = RefCell::new(LastError {
        code: PYRT_OK,
        message: String::new(),
    });
}

fn store(code: i32, message: String) {
    LAST_ERROR.with(|last| {
        let mut last = last.borrow_mut();
        last.code = code;
        last.message = message;
    });
}

/// Record `err` as this thread's last error and return its status code
pub(crate) fn fail(err: &NativeError) -> i32 {
    let code = err.category() as i32;
    debug!(code, error = %err, "native call failed");
    store(code, err.to_string());
    code
}

/// Record a misuse of the C API (null handle, bad tag)
pub(crate) fn invalid(message: &str) -> i32 {
    debug!(message, "invalid native call");
    store(PYRT_ERR_INVALID, message.to_string());
    PYRT_ERR_INVALID
}

/// Record success
pub(crate) fn succeed() -> i32 {
    store(PYRT_OK, String::new());
    PYRT_OK
}

/// Status of a unit result
pub(crate) fn status(result: crate::error::Result<()>) -> i32 {
    match result {
        Ok(()) => succeed(),
        Err(err) => fail(&err),
    }
}

/// Status code of the last call made on this thread
#[no_mangle]
pub extern "C" fn pyrt_last_error() -> i32 {
    LAST_ERROR.with(|last| last.borrow().code)
}

/// Reset this thread's error status
#[no_mangle]
pub extern "C" fn pyrt_clear_error() {
    succeed();
}

/// Copy the last error message as a NUL-terminated string into `out`.
///
/// Returns the full message length (excluding the terminator); the copy
/// is truncated to `capacity - 1` bytes.
///
/// # Safety
/// `out` must be null or valid for `capacity` bytes of writes.
#[no_mangle]
pub unsafe extern "C" fn pyrt_last_error_message(out: *mut c_char, capacity: usize) -> usize {
    LAST_ERROR.with(|last| {
        let last = last.borrow();
        let bytes = last.message.as_bytes();
        if !out.is_null() && capacity > 0 {
            let n = bytes.len().min(capacity - 1);
            std::ptr::copy_nonoverlapping(bytes.as_ptr() as *const c_char, out, n);
            *out.add(n) = 0;
        }
        bytes.len()
    })
}
