//! Runtime init/cleanup through the C ABI.
//!
//! Kept in its own test binary: it installs the process-wide configuration
//! from the environment.

use pyrt::ffi::{pyrt_last_error, pyrt_runtime_cleanup, pyrt_runtime_init, PYRT_OK};
use pyrt::{config, marshal, ElementKind, MemoryOrder, TypedBuffer};

#[test]
fn test_init_installs_environment_config() {
    std::env::set_var("PYRT_DEFAULT_CAPACITY", "16");
    std::env::set_var("PYRT_ARRAY_ORDER", "F");
    std::env::set_var("PYRT_LOG_LEVEL", "warn");

    assert_eq!(pyrt_runtime_init(), PYRT_OK);
    assert!(pyrt::logging::is_initialized());

    let config = config::current();
    assert_eq!(config.buffer.default_capacity, 16);
    assert_eq!(config.array.default_order, MemoryOrder::ColumnMajor);
    assert_eq!(config.log.level, "warn");

    let buffer = TypedBuffer::new(ElementKind::Float32).unwrap();
    assert_eq!(buffer.capacity(), 16);

    // Column-major default applies to C callers passing an unspecified order.
    let shape = [2usize, 3];
    let mut array = unsafe { pyrt::ffi::pyrt_array_zeros(2, shape.as_ptr(), ElementKind::Int16 as u8, -1) };
    let strides = unsafe { std::slice::from_raw_parts(pyrt::ffi::pyrt_array_strides(array), 2) };
    assert_eq!(strides, &[2, 4]);
    unsafe { pyrt::ffi::pyrt_array_destroy(&mut array) };

    assert_eq!(marshal::stats(), marshal::MarshalStats::default());

    // A second init keeps the installed configuration.
    std::env::set_var("PYRT_DEFAULT_CAPACITY", "64");
    assert_eq!(pyrt_runtime_init(), PYRT_OK);
    assert_eq!(config::current().buffer.default_capacity, 16);

    pyrt_runtime_cleanup();
    assert_eq!(pyrt_last_error(), PYRT_OK);
}
