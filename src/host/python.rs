//! Live interpreter host through pyo3
//!
//! Array introspection uses the `__array_interface__` protocol, so any
//! object exporting it (not only one array library) can be viewed.
//! Errors raised while unwrapping are kept as a pending `PyErr` until the
//! caller takes them with [`PyHost::take_error`] and returns them to Python.

use super::{HostApi, HostArrayInfo, HostErrorKind, HostType};
use crate::array::{contiguous_strides, element_count, MemoryOrder};
use crate::kind::ElementKind;
use pyo3::exceptions::{PyIndexError, PyMemoryError, PyOverflowError, PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyBytes, PyComplex, PyDict, PyFloat, PyLong, PyTuple};
use std::cell::RefCell;

pub struct PyHost<'py> {
    py: Python<'py>,
    error: RefCell<Option<PyErr>>,
}

impl<'py> PyHost<'py> {
    pub fn new(py: Python<'py>) -> Self {
        Self {
            py,
            error: RefCell::new(None),
        }
    }

    /// Fetch and clear the pending error
    pub fn take_error(&self) -> Option<PyErr> {
        self.error.borrow_mut().take()
    }

    fn stash(&self, err: PyErr) {
        *self.error.borrow_mut() = Some(err);
    }

    /// Convert a pool-owned reference into one the caller owns
    fn owned(&self, obj: &'py PyAny) -> &'py PyAny {
        self.incref(obj);
        obj
    }

    fn interface(&self, obj: &'py PyAny) -> PyResult<Option<HostArrayInfo>> {
        let Ok(iface) = obj.getattr("__array_interface__") else {
            return Ok(None);
        };
        let iface: &'py PyDict = iface.downcast()?;
        let field = |name: &str| -> PyResult<&'py PyAny> {
            iface
                .get_item(name)?
                .ok_or_else(|| PyValueError::new_err(format!("__array_interface__ has no '{}'", name)))
        };

        let shape: Vec<usize> = field("shape")?.extract()?;
        let typestr: String = field("typestr")?.extract()?;
        let (address, _readonly): (usize, bool) = field("data")?.extract()?;

        let Some(kind) = ElementKind::from_typestr(&typestr) else {
            return Ok(None);
        };

        let strides = match iface.get_item("strides")? {
            Some(strides) if !strides.is_none() => strides.extract::<Vec<isize>>()?,
            _ => contiguous_strides(&shape, kind.width(), MemoryOrder::RowMajor).to_vec(),
        };

        let len = element_count(&shape).ok_or_else(|| PyOverflowError::new_err("array too large"))?;
        Ok(Some(HostArrayInfo {
            data: address as *mut u8,
            shape,
            strides,
            type_code: kind.type_code(),
            item_size: kind.width(),
            len,
            byte_len: len * kind.width(),
        }))
    }

    fn build_array(&self, shape: &[usize], kind: ElementKind, bytes: &[u8]) -> PyResult<&'py PyAny> {
        let numpy = self.py.import("numpy")?;
        let flat = numpy.call_method1("frombuffer", (PyBytes::new(self.py, bytes), kind.typestr()))?;
        let shaped = flat.call_method1("reshape", (PyTuple::new(self.py, shape),))?;
        // frombuffer arrays are read-only views of the bytes object.
        shaped.call_method0("copy")
    }
}

impl<'py> HostApi for PyHost<'py> {
    type Object = &'py PyAny;

    fn incref(&self, obj: &'py PyAny) {
        unsafe { pyo3::ffi::Py_IncRef(obj.as_ptr()) }
    }

    fn decref(&self, obj: &'py PyAny) {
        unsafe { pyo3::ffi::Py_DecRef(obj.as_ptr()) }
    }

    fn is_same(&self, a: &'py PyAny, b: &'py PyAny) -> bool {
        a.is(b)
    }

    fn type_of(&self, obj: &'py PyAny) -> HostType {
        // bool is a subclass of int, so it must be tested first.
        if obj.is_instance_of::<PyBool>() {
            HostType::Bool
        } else if obj.is_instance_of::<PyLong>() {
            HostType::Int
        } else if obj.is_instance_of::<PyFloat>() {
            HostType::Float
        } else if obj.is_instance_of::<PyComplex>() {
            HostType::Complex
        } else if obj.is_none() {
            HostType::None
        } else if obj.hasattr("__array_interface__").unwrap_or(false) {
            HostType::Array
        } else {
            HostType::Other
        }
    }

    fn as_i64(&self, obj: &'py PyAny) -> i64 {
        obj.extract::<i64>().unwrap_or_else(|err| {
            self.stash(err);
            -1
        })
    }

    fn as_f64(&self, obj: &'py PyAny) -> f64 {
        obj.extract::<f64>().unwrap_or_else(|err| {
            self.stash(err);
            -1.0
        })
    }

    fn complex_real(&self, obj: &'py PyAny) -> f64 {
        obj.getattr("real").and_then(|v| v.extract::<f64>()).unwrap_or_else(|err| {
            self.stash(err);
            -1.0
        })
    }

    fn complex_imag(&self, obj: &'py PyAny) -> f64 {
        obj.getattr("imag").and_then(|v| v.extract::<f64>()).unwrap_or_else(|err| {
            self.stash(err);
            -1.0
        })
    }

    fn error_occurred(&self) -> bool {
        self.error.borrow().is_some()
    }

    fn set_error(&self, kind: HostErrorKind, message: &str) {
        let message = message.to_string();
        let err = match kind {
            HostErrorKind::TypeError => PyTypeError::new_err(message),
            HostErrorKind::ValueError => PyValueError::new_err(message),
            HostErrorKind::OverflowError => PyOverflowError::new_err(message),
            HostErrorKind::IndexError => PyIndexError::new_err(message),
            HostErrorKind::MemoryError => PyMemoryError::new_err(message),
        };
        self.stash(err);
    }

    fn clear_error(&self) {
        self.error.borrow_mut().take();
    }

    fn true_object(&self) -> &'py PyAny {
        PyBool::new(self.py, true).as_ref()
    }

    fn false_object(&self) -> &'py PyAny {
        PyBool::new(self.py, false).as_ref()
    }

    fn array_info(&self, obj: &'py PyAny) -> Option<HostArrayInfo> {
        // Introspection is a predicate; failures mean "not array-like".
        self.interface(obj).ok().flatten()
    }

    fn new_int(&self, value: i64) -> Option<&'py PyAny> {
        Some(self.owned(value.into_py(self.py).into_ref(self.py)))
    }

    fn new_float(&self, value: f64) -> Option<&'py PyAny> {
        Some(self.owned(PyFloat::new(self.py, value).as_ref()))
    }

    fn new_complex(&self, re: f64, im: f64) -> Option<&'py PyAny> {
        Some(self.owned(PyComplex::from_doubles(self.py, re, im).as_ref()))
    }

    fn new_array(&self, shape: &[usize], type_code: i32, bytes: &[u8]) -> Option<&'py PyAny> {
        let Some(kind) = ElementKind::from_type_code(type_code) else {
            self.set_error(HostErrorKind::TypeError, &format!("unsupported array type {}", type_code));
            return None;
        };
        match self.build_array(shape, kind, bytes) {
            Ok(array) => Some(self.owned(array)),
            Err(err) => {
                self.stash(err);
                None
            }
        }
    }
}
