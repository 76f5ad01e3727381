//! Marshalling - host objects ↔ native values
//!
//! Design: generic over [`HostApi`], so the same conversions run against a
//! live interpreter or the in-process arena.
//!
//! Architecture:
//! - `scalar.rs` - integers, floats, booleans and complex numbers
//! - `array.rs` - array views, validated extraction and buffer copies
//!
//! Reference contract: every `to_*`/`check_*` function borrows its host
//! argument and leaves its reference count alone. Every `from_*` function
//! returns a new reference the caller must release.

mod array;
mod scalar;


pub use array::{
    buffer_to_host, check_element_kind, check_rank, extract_array, from_array_descriptor,
    to_array_descriptor, to_typed_buffer,
};
pub use scalar::{
    check_host_type, from_bool, from_complex128, from_complex64, from_float32, from_float64,
    from_int16, from_int32, from_int64, from_int8, to_bool, to_complex128, to_complex64,
    to_float32, to_float64, to_int16, to_int32, to_int64, to_int8,
};

use crate::error::{ErrorKind, NativeError};
use crate::host::{HostApi, HostErrorKind, HostType};
use crate::logging::log_conversion_error;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Forward `err` to the host as an exception.
///
/// A host error that is already pending wins: it carries the interpreter's
/// own message, which is more precise than anything rebuilt from `err`.
pub fn raise<H: HostApi>(host: &H, err: &NativeError) {
    if host.error_occurred() {
        return;
    }

    let kind = match err.kind {
        ErrorKind::Allocation { .. } => HostErrorKind::MemoryError,
        ErrorKind::Conversion { .. } | ErrorKind::KindMismatch { .. } | ErrorKind::HostError { .. } => {
            HostErrorKind::TypeError
        }
        ErrorKind::Index { .. } => HostErrorKind::IndexError,
        ErrorKind::Shape { .. } => HostErrorKind::ValueError,
    };
    host.set_error(kind, &err.to_string());
}

/// Host-level name of an object's type, for error messages
pub(crate) fn host_type_name(host_type: HostType) -> &'static str {
    match host_type {
        HostType::Int => "int",
        HostType::Float => "float",
        HostType::Complex => "complex",
        HostType::Bool => "bool",
        HostType::None => "NoneType",
        HostType::Array => "ndarray",
        HostType::Other => "object",
    }
}

static CONVERSIONS: AtomicUsize = AtomicUsize::new(0);
static CONVERSION_ERRORS: AtomicUsize = AtomicUsize::new(0);
static VIEWS_CREATED: AtomicUsize = AtomicUsize::new(0);
static OBJECTS_CREATED: AtomicUsize = AtomicUsize::new(0);

/// Marshalling statistics for monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarshalStats {
    /// Successful host → native conversions
    pub conversions: usize,
    pub conversion_errors: usize,
    /// Non-owning array views handed out
    pub views_created: usize,
    /// Host objects created by `from_*`
    pub objects_created: usize,
}

/// Get marshalling statistics
pub fn stats() -> MarshalStats {
    MarshalStats {
        conversions: CONVERSIONS.load(Ordering::Relaxed),
        conversion_errors: CONVERSION_ERRORS.load(Ordering::Relaxed),
        views_created: VIEWS_CREATED.load(Ordering::Relaxed),
        objects_created: OBJECTS_CREATED.load(Ordering::Relaxed),
    }
}

pub fn reset_stats() {
    CONVERSIONS.store(0, Ordering::Relaxed);
    CONVERSION_ERRORS.store(0, Ordering::Relaxed);
    VIEWS_CREATED.store(0, Ordering::Relaxed);
    OBJECTS_CREATED.store(0, Ordering::Relaxed);
}

#[inline]
fn record_conversion() {
    CONVERSIONS.fetch_add(1, Ordering::Relaxed);
}

#[inline]
fn record_view() {
    VIEWS_CREATED.fetch_add(1, Ordering::Relaxed);
}

#[inline]
fn record_object() {
    OBJECTS_CREATED.fetch_add(1, Ordering::Relaxed);
}

/// Count and log a failed conversion, handing the error back
fn conversion_failed(target: &str, err: NativeError) -> NativeError {
    CONVERSION_ERRORS.fetch_add(1, Ordering::Relaxed);
    log_conversion_error(target, &err);
    err
}
