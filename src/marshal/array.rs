//! Array conversions
//!
//! Views alias host memory and copy nothing; the buffer conversions copy.

use super::{conversion_failed, host_type_name, record_conversion, record_object, record_view};
use crate::array::{ArrayDescriptor, IndexIter};
use crate::buffer::TypedBuffer;
use crate::error::{NativeError, Result};
use crate::host::{HostApi, HostArrayInfo};
use crate::kind::ElementKind;
use crate::logging::{log_conversion, perf};

fn array_info<H: HostApi>(host: &H, obj: H::Object) -> Result<HostArrayInfo> {
    host.array_info(obj).ok_or_else(|| {
        let found = host_type_name(host.type_of(obj));
        conversion_failed("array", NativeError::conversion("ndarray", found))
    })
}

fn info_kind(info: &HostArrayInfo) -> Result<ElementKind> {
    match ElementKind::from_type_code(info.type_code) {
        Some(kind) if kind.width() == info.item_size => Ok(kind),
        _ => Err(conversion_failed(
            "array",
            NativeError::conversion(
                "array of a supported element kind",
                format!("array type {} ({} byte items)", info.type_code, info.item_size),
            ),
        )),
    }
}

/// Non-owning descriptor over a host array's memory.
///
/// Shape and byte strides are taken verbatim from the host, so element
/// ordering and offsets (transposed, reversed, sliced) match exactly.
///
/// # Safety
/// The descriptor aliases memory owned by `obj`. It must not be used after
/// the caller's reference to `obj` is released.
pub unsafe fn to_array_descriptor<H: HostApi>(host: &H, obj: H::Object) -> Result<ArrayDescriptor> {
    let info = array_info(host, obj)?;
    view_from_info(&info)
}

unsafe fn view_from_info(info: &HostArrayInfo) -> Result<ArrayDescriptor> {
    let kind = info_kind(info)?;
    let view = ArrayDescriptor::from_strided_view(info.data, &info.shape, &info.strides, kind)
        .map_err(|err| conversion_failed("array", err))?;
    record_view();
    log_conversion("ndarray", kind.name());
    Ok(view)
}

/// Whether `obj` is an array of exactly `rank` dimensions. Never raises.
pub fn check_rank<H: HostApi>(host: &H, obj: H::Object, rank: usize) -> bool {
    host.array_info(obj).map_or(false, |info| info.rank() == rank)
}

/// Whether `obj` is an array holding `kind` elements. Never raises.
pub fn check_element_kind<H: HostApi>(host: &H, obj: H::Object, kind: ElementKind) -> bool {
    host.array_info(obj)
        .map_or(false, |info| ElementKind::from_type_code(info.type_code) == Some(kind))
}

/// Validate and view a generated-code array argument.
///
/// Failures name `argument`: a non-array or wrong element kind is a
/// conversion error, a wrong rank a shape error.
///
/// # Safety
/// Same contract as [`to_array_descriptor`].
pub unsafe fn extract_array<H: HostApi>(
    host: &H,
    obj: H::Object,
    argument: &str,
    rank: usize,
    kind: ElementKind,
) -> Result<ArrayDescriptor> {
    let info = array_info(host, obj).map_err(|err| err.with_argument(argument))?;

    if info.rank() != rank {
        let err = NativeError::shape(format!("rank {}", rank), format!("rank {}", info.rank()));
        return Err(conversion_failed("array", err.with_argument(argument)));
    }

    let found = ElementKind::from_type_code(info.type_code);
    if found != Some(kind) {
        let found = found.map_or_else(|| format!("array type {}", info.type_code), |k| format!("{} array", k));
        let err = NativeError::conversion(format!("{} array", kind), found);
        return Err(conversion_failed("array", err.with_argument(argument)));
    }

    view_from_info(&info).map_err(|err| err.with_argument(argument))
}

/// Copy a rank-1 host array into a new owning buffer
pub fn to_typed_buffer<H: HostApi>(host: &H, obj: H::Object) -> Result<TypedBuffer> {
    let info = array_info(host, obj)?;
    if info.rank() != 1 {
        let err = NativeError::shape("rank 1", format!("rank {}", info.rank()));
        return Err(conversion_failed("typed buffer", err));
    }

    let _guard = perf::track("to_typed_buffer");
    // SAFETY: the view is dropped before this function returns, while the
    // caller still holds `obj`.
    let view = unsafe { view_from_info(&info)? };
    let mut bytes = Vec::with_capacity(view.byte_len());
    for i in 0..view.len() {
        bytes.extend_from_slice(view.element_bytes(&[i])?);
    }

    let buffer = TypedBuffer::create(view.element_kind(), &bytes)?;
    record_conversion();
    Ok(buffer)
}

/// New host rank-1 array holding a copy of the buffer's elements
pub fn buffer_to_host<H: HostApi>(host: &H, buffer: &TypedBuffer) -> Result<H::Object> {
    let kind = buffer.kind();
    let obj = host
        .new_array(&[buffer.len()], kind.type_code(), buffer.as_bytes())
        .ok_or_else(|| conversion_failed("host array", NativeError::allocation("host array", buffer.as_bytes().len())))?;
    record_object();
    log_conversion(kind.name(), "ndarray");
    Ok(obj)
}

/// New dense row-major host array holding a copy of the descriptor's elements
pub fn from_array_descriptor<H: HostApi>(host: &H, array: &ArrayDescriptor) -> Result<H::Object> {
    let _guard = perf::track("from_array_descriptor");
    let kind = array.element_kind();
    let mut bytes = Vec::with_capacity(array.byte_len());
    for index in IndexIter::new(array.shape()) {
        bytes.extend_from_slice(array.element_bytes(&index)?);
    }

    let obj = host
        .new_array(array.shape(), kind.type_code(), &bytes)
        .ok_or_else(|| conversion_failed("host array", NativeError::allocation("host array", bytes.len())))?;
    record_object();
    log_conversion(kind.name(), "ndarray");
    Ok(obj)
}
