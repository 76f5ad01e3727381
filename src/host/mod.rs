//! Host interpreter boundary
//!
//! The runtime never owns host objects. Everything it needs from the
//! interpreter goes through [`HostApi`], which mirrors the interpreter's C
//! API closely: unwrap primitives report failure through a pending-error
//! side channel instead of a return value, exactly like the interpreter does.
//!
//! Implementations:
//! - [`arena::ObjectArena`] - self-contained interpreter model
//! - `python::PyHost` - live interpreter through pyo3 (feature `python`)

pub mod arena;

#[cfg(feature = "python")]
pub mod python;

use std::fmt;

/// Coarse type of a host object, as the interpreter's type checks see it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostType {
    Int,
    Float,
    Complex,
    Bool,
    None,
    Array,
    Other,
}

/// Exception classes the runtime may raise in the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostErrorKind {
    TypeError,
    ValueError,
    OverflowError,
    IndexError,
    MemoryError,
}

impl fmt::Display for HostErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TypeError => "TypeError",
            Self::ValueError => "ValueError",
            Self::OverflowError => "OverflowError",
            Self::IndexError => "IndexError",
            Self::MemoryError => "MemoryError",
        };
        f.write_str(name)
    }
}

/// Everything the host reports about an n-dimensional array object
#[derive(Debug, Clone)]
pub struct HostArrayInfo {
    /// First element; owned by the host object
    pub data: *mut u8,
    pub shape: Vec<usize>,
    /// Byte strides, one per dimension
    pub strides: Vec<isize>,
    /// Host array-library type number
    pub type_code: i32,
    pub item_size: usize,
    /// Total element count
    pub len: usize,
    /// Total byte count
    pub byte_len: usize,
}

impl HostArrayInfo {
    #[inline]
    pub fn rank(&self) -> usize {
        self.shape.len()
    }
}

/// Narrow view of the host interpreter's object API.
///
/// Reference contract: methods taking an `Object` borrow it (no reference
/// count change) unless documented otherwise; constructors return a new
/// reference the caller must eventually [`decref`](HostApi::decref).
pub trait HostApi {
    /// Opaque object handle
    type Object: Copy + fmt::Debug;

    fn incref(&self, obj: Self::Object);
    fn decref(&self, obj: Self::Object);

    /// Identity comparison
    fn is_same(&self, a: Self::Object, b: Self::Object) -> bool;

    fn type_of(&self, obj: Self::Object) -> HostType;

    /// Integer value; on failure returns -1 and sets the pending error
    fn as_i64(&self, obj: Self::Object) -> i64;

    /// Float value; on failure returns -1.0 and sets the pending error
    fn as_f64(&self, obj: Self::Object) -> f64;

    /// Real part; on failure returns -1.0 and sets the pending error
    fn complex_real(&self, obj: Self::Object) -> f64;

    /// Imaginary part; on failure returns -1.0 and sets the pending error
    fn complex_imag(&self, obj: Self::Object) -> f64;

    fn error_occurred(&self) -> bool;
    fn set_error(&self, kind: HostErrorKind, message: &str);
    fn clear_error(&self);

    /// Canonical `True` singleton (borrowed)
    fn true_object(&self) -> Self::Object;

    /// Canonical `False` singleton (borrowed)
    fn false_object(&self) -> Self::Object;

    /// Array introspection; `None` if `obj` is not array-like
    fn array_info(&self, obj: Self::Object) -> Option<HostArrayInfo>;

    /// New reference to an integer; `None` with a pending error on failure
    fn new_int(&self, value: i64) -> Option<Self::Object>;

    /// New reference to a float; `None` with a pending error on failure
    fn new_float(&self, value: f64) -> Option<Self::Object>;

    /// New reference to a complex; `None` with a pending error on failure
    fn new_complex(&self, re: f64, im: f64) -> Option<Self::Object>;

    /// New reference to a dense row-major array holding a copy of `bytes`.
    /// Hosts without array construction return `None` with a pending error.
    fn new_array(&self, shape: &[usize], type_code: i32, bytes: &[u8]) -> Option<Self::Object>;
}
