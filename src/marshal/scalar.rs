//! Scalar conversions
//!
//! Unwrapping follows the interpreter's own protocol: the primitive returns
//! a sentinel (-1) and the error side channel says whether it was real.

use super::{conversion_failed, host_type_name, record_conversion, record_object};
use crate::error::{NativeError, Result};
use crate::host::{HostApi, HostErrorKind, HostType};
use crate::kind::{Complex128, Complex64, ElementKind};
use crate::logging::log_conversion;
use num_traits::FromPrimitive;

fn unwrap_i64<H: HostApi>(host: &H, obj: H::Object, target: &'static str) -> Result<i64> {
    let value = host.as_i64(obj);
    if value == -1 && host.error_occurred() {
        return Err(conversion_failed(target, NativeError::host_error(target)));
    }
    Ok(value)
}

fn unwrap_f64<H: HostApi>(host: &H, obj: H::Object, target: &'static str) -> Result<f64> {
    let value = host.as_f64(obj);
    if value == -1.0 && host.error_occurred() {
        return Err(conversion_failed(target, NativeError::host_error(target)));
    }
    Ok(value)
}

/// Unwrap an integer and range-check it into a narrower type.
///
/// Out-of-range values raise `OverflowError` in the host, mirroring the
/// interpreter's own argument parser, instead of truncating.
fn narrow_int<H: HostApi, T: FromPrimitive>(host: &H, obj: H::Object, target: &'static str) -> Result<T> {
    let wide = unwrap_i64(host, obj, target)?;
    match T::from_i64(wide) {
        Some(value) => {
            record_conversion();
            log_conversion("int", target);
            Ok(value)
        }
        None => {
            host.set_error(
                HostErrorKind::OverflowError,
                &format!("value {} out of range for {}", wide, target),
            );
            Err(conversion_failed(target, NativeError::conversion(target, format!("int {}", wide))))
        }
    }
}

pub fn to_int8<H: HostApi>(host: &H, obj: H::Object) -> Result<i8> {
    narrow_int(host, obj, "int8")
}

pub fn to_int16<H: HostApi>(host: &H, obj: H::Object) -> Result<i16> {
    narrow_int(host, obj, "int16")
}

pub fn to_int32<H: HostApi>(host: &H, obj: H::Object) -> Result<i32> {
    narrow_int(host, obj, "int32")
}

pub fn to_int64<H: HostApi>(host: &H, obj: H::Object) -> Result<i64> {
    let value = unwrap_i64(host, obj, "int64")?;
    record_conversion();
    log_conversion("int", "int64");
    Ok(value)
}

/// Unwrap a real number; values outside `f32` range become infinities
pub fn to_float32<H: HostApi>(host: &H, obj: H::Object) -> Result<f32> {
    let value = unwrap_f64(host, obj, "float32")?;
    record_conversion();
    log_conversion("float", "float32");
    Ok(value as f32)
}

pub fn to_float64<H: HostApi>(host: &H, obj: H::Object) -> Result<f64> {
    let value = unwrap_f64(host, obj, "float64")?;
    record_conversion();
    log_conversion("float", "float64");
    Ok(value)
}

/// Only the canonical `True`/`False` singletons convert. Truthiness of
/// other objects is not consulted, and the host error state is untouched.
pub fn to_bool<H: HostApi>(host: &H, obj: H::Object) -> Result<bool> {
    let value = if host.is_same(obj, host.true_object()) {
        true
    } else if host.is_same(obj, host.false_object()) {
        false
    } else {
        let found = host_type_name(host.type_of(obj));
        return Err(conversion_failed("bool", NativeError::conversion("bool", found)));
    };
    record_conversion();
    log_conversion("bool", "bool");
    Ok(value)
}

fn complex_parts<H: HostApi>(host: &H, obj: H::Object, target: &'static str) -> Result<(f64, f64)> {
    let re = host.complex_real(obj);
    if re == -1.0 && host.error_occurred() {
        return Err(conversion_failed(target, NativeError::host_error(target)));
    }
    let im = host.complex_imag(obj);
    if im == -1.0 && host.error_occurred() {
        return Err(conversion_failed(target, NativeError::host_error(target)));
    }
    record_conversion();
    log_conversion("complex", target);
    Ok((re, im))
}

pub fn to_complex64<H: HostApi>(host: &H, obj: H::Object) -> Result<Complex64> {
    let (re, im) = complex_parts(host, obj, "complex64")?;
    Ok(Complex64::new(re as f32, im as f32))
}

pub fn to_complex128<H: HostApi>(host: &H, obj: H::Object) -> Result<Complex128> {
    let (re, im) = complex_parts(host, obj, "complex128")?;
    Ok(Complex128::new(re, im))
}

/// A host constructor result; `None` means the host raised (out of memory)
fn created<O>(obj: Option<O>, entity: &'static str, bytes: usize) -> Result<O> {
    match obj {
        Some(obj) => {
            record_object();
            Ok(obj)
        }
        None => Err(conversion_failed(entity, NativeError::allocation(entity, bytes))),
    }
}

pub fn from_int64<H: HostApi>(host: &H, value: i64) -> Result<H::Object> {
    created(host.new_int(value), "host int", std::mem::size_of::<i64>())
}

pub fn from_int32<H: HostApi>(host: &H, value: i32) -> Result<H::Object> {
    from_int64(host, i64::from(value))
}

pub fn from_int16<H: HostApi>(host: &H, value: i16) -> Result<H::Object> {
    from_int64(host, i64::from(value))
}

pub fn from_int8<H: HostApi>(host: &H, value: i8) -> Result<H::Object> {
    from_int64(host, i64::from(value))
}

pub fn from_float64<H: HostApi>(host: &H, value: f64) -> Result<H::Object> {
    created(host.new_float(value), "host float", std::mem::size_of::<f64>())
}

pub fn from_float32<H: HostApi>(host: &H, value: f32) -> Result<H::Object> {
    from_float64(host, f64::from(value))
}

/// New reference to the `True` or `False` singleton. Cannot fail.
pub fn from_bool<H: HostApi>(host: &H, value: bool) -> H::Object {
    let obj = if value { host.true_object() } else { host.false_object() };
    host.incref(obj);
    obj
}

pub fn from_complex128<H: HostApi>(host: &H, value: Complex128) -> Result<H::Object> {
    created(
        host.new_complex(value.re, value.im),
        "host complex",
        std::mem::size_of::<Complex128>(),
    )
}

pub fn from_complex64<H: HostApi>(host: &H, value: Complex64) -> Result<H::Object> {
    from_complex128(host, Complex128::new(f64::from(value.re), f64::from(value.im)))
}

/// Whether `obj` is a host scalar of the family `kind` belongs to.
///
/// Booleans only match [`ElementKind::Bool`], even though the host treats
/// them as integers. Never raises.
pub fn check_host_type<H: HostApi>(host: &H, obj: H::Object, kind: ElementKind) -> bool {
    let host_type = host.type_of(obj);
    match kind {
        ElementKind::Bool => host_type == HostType::Bool,
        ElementKind::Int8 | ElementKind::Int16 | ElementKind::Int32 | ElementKind::Int64 => {
            host_type == HostType::Int
        }
        ElementKind::Float32 | ElementKind::Float64 => host_type == HostType::Float,
        ElementKind::Complex64 | ElementKind::Complex128 => host_type == HostType::Complex,
    }
}
