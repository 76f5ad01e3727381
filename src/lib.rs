//! pyrt - Native runtime support for compiled Python
//!
//! This crate is statically linked into code generated from Python
//! sources. It provides:
//! - [`TypedBuffer`] - type-erased growable sequence of fixed-size elements
//! - [`ArrayDescriptor`] - shape/stride view over native or host memory
//! - [`marshal`] - conversions between host interpreter objects and native
//!   values, generic over the [`host::HostApi`] boundary
//! - [`ffi`] - the C ABI generated code calls

pub mod array;
pub mod buffer;
pub mod config;
pub mod error;
pub mod ffi;
pub mod host;
pub mod kind;
pub mod logging;
pub mod marshal;

// Re-export core types
pub use array::{ArrayData, ArrayDescriptor, MemoryOrder};
pub use buffer::{BufferView, TypedBuffer};
pub use config::RuntimeConfig;
pub use error::{ErrorCategory, ErrorKind, NativeError, Result};
pub use host::{HostApi, HostArrayInfo, HostErrorKind, HostType};
pub use kind::{Complex, Complex128, Complex64, Element, ElementKind};
pub use marshal::MarshalStats;
