//! C FFI - Stable ABI for generated code
//!
//! Design: handles are boxed Rust values passed as raw pointers.
//! 1. Buffer lifecycle and operations (`buffer.rs`)
//! 2. Array descriptor lifecycle and metadata (`array.rs`)
//! 3. Error propagation via status codes plus a thread-local last error
//!    (`error.rs`)
//!
//! Null handles are reported as `PYRT_ERR_INVALID`, never dereferenced.

mod array;
mod buffer;
mod error;

#[cfg(test)]
mod tests;

pub use array::{
    pyrt_array_byte_len, pyrt_array_destroy, pyrt_array_element, pyrt_array_from_strided_view,
    pyrt_array_from_view, pyrt_array_is_view, pyrt_array_kind, pyrt_array_len, pyrt_array_rank,
    pyrt_array_shape, pyrt_array_strides, pyrt_array_zeros,
};
pub use buffer::{
    pyrt_buffer_append, pyrt_buffer_as_array, pyrt_buffer_capacity, pyrt_buffer_clear,
    pyrt_buffer_copy, pyrt_buffer_count, pyrt_buffer_create, pyrt_buffer_destroy,
    pyrt_buffer_element_at, pyrt_buffer_find_first, pyrt_buffer_insert, pyrt_buffer_kind,
    pyrt_buffer_len, pyrt_buffer_remove_at, pyrt_buffer_remove_value, pyrt_buffer_reverse,
};
pub use error::{
    pyrt_clear_error, pyrt_last_error, pyrt_last_error_message, PYRT_ERR_ALLOCATION,
    PYRT_ERR_CONVERSION, PYRT_ERR_INDEX, PYRT_ERR_INVALID, PYRT_ERR_SHAPE, PYRT_OK,
};

use crate::config::{self, RuntimeConfig};
use crate::logging::{self, debug, info, warn};
use crate::marshal;

/// Initialize the runtime (called once at program start).
///
/// Loads configuration from the environment, starts logging and resets the
/// marshalling counters. Returns `PYRT_ERR_INVALID` if the environment
/// configuration is invalid; invalid settings fall back to their defaults
/// and the rest is installed.
#[no_mangle]
pub extern "C" fn pyrt_runtime_init() -> i32 {
    let config = RuntimeConfig::from_env();
    logging::init_with_config(&config.log);

    let code = match config.validate() {
        Ok(()) => PYRT_OK,
        Err(err) => {
            warn!(error = %err, "replacing invalid runtime settings with defaults");
            PYRT_ERR_INVALID
        }
    };
    if config::install(config.sanitized()).is_err() {
        debug!("runtime configuration already installed");
    }

    marshal::reset_stats();
    info!(
        default_capacity = config::current().buffer.default_capacity,
        "runtime initialized"
    );
    code
}

/// Cleanup the runtime (called at program exit)
#[no_mangle]
pub extern "C" fn pyrt_runtime_cleanup() {
    let stats = marshal::stats();
    info!(
        conversions = stats.conversions,
        conversion_errors = stats.conversion_errors,
        views_created = stats.views_created,
        objects_created = stats.objects_created,
        "runtime shutting down"
    );
    pyrt_clear_error();
}

/// View `len` items at `ptr`; a null pointer is accepted only for `len == 0`
#[inline]
pub(crate) unsafe fn raw_slice<'a, T>(ptr: *const T, len: usize) -> Option<&'a [T]> {
    if len == 0 {
        Some(std::slice::from_raw_parts(std::ptr::NonNull::<T>::dangling().as_ptr(), 0))
    } else if ptr.is_null() {
        None
    } else {
        Some(std::slice::from_raw_parts(ptr, len))
    }
}
