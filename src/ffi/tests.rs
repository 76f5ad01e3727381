//! C ABI tests - handles driven the way generated code drives them

use super::*;
use crate::array::ArrayDescriptor;
use crate::buffer::TypedBuffer;
use crate::kind::ElementKind;
use std::ptr;

const INT32: u8 = ElementKind::Int32 as u8;
const FLOAT64: u8 = ElementKind::Float64 as u8;

unsafe fn contents(buffer: *const TypedBuffer) -> Vec<i32> {
    (*buffer).to_vec::<i32>().unwrap()
}

unsafe fn new_i32(values: &[i32]) -> *mut TypedBuffer {
    pyrt_buffer_create(INT32, values.as_ptr() as *const u8, values.len())
}

#[test]
fn test_create_and_destroy_nulls_handle() {
    unsafe {
        let mut buffer = pyrt_buffer_create(INT32, ptr::null(), 0);
        assert!(!buffer.is_null());
        assert_eq!(pyrt_last_error(), PYRT_OK);
        assert_eq!(pyrt_buffer_len(buffer), 0);
        assert!(pyrt_buffer_capacity(buffer) > 0);
        assert_eq!(pyrt_buffer_kind(buffer), INT32 as i32);

        pyrt_buffer_destroy(&mut buffer);
        assert!(buffer.is_null());
        // Destroying again is a no-op on the nulled handle.
        pyrt_buffer_destroy(&mut buffer);
    }
}

#[test]
fn test_create_rejects_bad_arguments() {
    unsafe {
        assert!(pyrt_buffer_create(42, ptr::null(), 0).is_null());
        assert_eq!(pyrt_last_error(), PYRT_ERR_INVALID);

        assert!(pyrt_buffer_create(INT32, ptr::null(), 3).is_null());
        assert_eq!(pyrt_last_error(), PYRT_ERR_INVALID);
    }
}

#[test]
fn test_append_scenario() {
    unsafe {
        let mut buffer = new_i32(&[]);
        for v in [1, 2, 3] {
            let mut single = new_i32(&[v]);
            assert_eq!(pyrt_buffer_append(buffer, single), PYRT_OK);
            pyrt_buffer_destroy(&mut single);
        }
        assert_eq!(contents(buffer), vec![1, 2, 3]);
        assert!(pyrt_buffer_capacity(buffer).is_power_of_two());
        pyrt_buffer_destroy(&mut buffer);
    }
}

#[test]
fn test_append_to_itself() {
    unsafe {
        let mut buffer = new_i32(&[1, 2, 3]);
        assert_eq!(pyrt_buffer_append(buffer, buffer), PYRT_OK);
        assert_eq!(contents(buffer), vec![1, 2, 3, 1, 2, 3]);
        pyrt_buffer_destroy(&mut buffer);
    }
}

#[test]
fn test_append_kind_mismatch() {
    unsafe {
        let mut ints = new_i32(&[1]);
        let floats = [1.0f64];
        let mut other = pyrt_buffer_create(FLOAT64, floats.as_ptr() as *const u8, 1);

        assert_eq!(pyrt_buffer_append(ints, other), PYRT_ERR_CONVERSION);
        assert_eq!(pyrt_last_error(), PYRT_ERR_CONVERSION);
        assert_eq!(contents(ints), vec![1]);

        pyrt_buffer_destroy(&mut ints);
        pyrt_buffer_destroy(&mut other);
    }
}

#[test]
fn test_search_and_remove() {
    unsafe {
        let mut buffer = new_i32(&[5, 3, 5, 1]);
        let five = 5i32;
        let nine = 9i32;
        let five_ptr = &five as *const i32 as *const u8;

        assert_eq!(pyrt_buffer_find_first(buffer, five_ptr), 0);
        assert_eq!(pyrt_buffer_find_first(buffer, &nine as *const i32 as *const u8), -1);
        assert_eq!(pyrt_last_error(), PYRT_OK);
        assert_eq!(pyrt_buffer_count(buffer, five_ptr), 2);

        let mut removed = false;
        assert_eq!(pyrt_buffer_remove_value(buffer, five_ptr, &mut removed), PYRT_OK);
        assert!(removed);
        assert_eq!(contents(buffer), vec![3, 5, 1]);

        assert_eq!(
            pyrt_buffer_remove_value(buffer, &nine as *const i32 as *const u8, &mut removed),
            PYRT_OK
        );
        assert!(!removed);
        assert_eq!(pyrt_buffer_remove_value(buffer, five_ptr, ptr::null_mut()), PYRT_OK);
        assert_eq!(contents(buffer), vec![3, 1]);

        pyrt_buffer_destroy(&mut buffer);
    }
}

#[test]
fn test_insert_and_remove_at() {
    unsafe {
        let mut buffer = new_i32(&[1, 3]);
        let two = 2i32;
        assert_eq!(pyrt_buffer_insert(buffer, 1, &two as *const i32 as *const u8), PYRT_OK);
        assert_eq!(contents(buffer), vec![1, 2, 3]);

        assert_eq!(pyrt_buffer_insert(buffer, 4, &two as *const i32 as *const u8), PYRT_ERR_INDEX);
        assert_eq!(pyrt_buffer_remove_at(buffer, 3), PYRT_ERR_INDEX);
        assert_eq!(contents(buffer), vec![1, 2, 3]);

        assert_eq!(pyrt_buffer_remove_at(buffer, 0), PYRT_OK);
        assert_eq!(contents(buffer), vec![2, 3]);

        // Inserting an element that lives inside the buffer itself.
        let first = pyrt_buffer_element_at(buffer, 0);
        assert_eq!(pyrt_buffer_insert(buffer, 2, first), PYRT_OK);
        assert_eq!(contents(buffer), vec![2, 3, 2]);

        pyrt_buffer_destroy(&mut buffer);
    }
}

#[test]
fn test_reverse_clear_copy() {
    unsafe {
        let mut buffer = new_i32(&[1, 2, 3]);
        assert_eq!(pyrt_buffer_reverse(buffer), PYRT_OK);
        assert_eq!(contents(buffer), vec![3, 2, 1]);

        let mut copy = pyrt_buffer_copy(buffer);
        assert_eq!(pyrt_buffer_clear(buffer), PYRT_OK);
        assert_eq!(pyrt_buffer_len(buffer), 0);
        assert!(pyrt_buffer_capacity(buffer) > 0);
        assert_eq!(contents(copy), vec![3, 2, 1]);

        pyrt_buffer_destroy(&mut buffer);
        pyrt_buffer_destroy(&mut copy);
    }
}

#[test]
fn test_element_at() {
    unsafe {
        let mut buffer = new_i32(&[10, 20]);
        let second = pyrt_buffer_element_at(buffer, 1) as *mut i32;
        assert_eq!(second.read_unaligned(), 20);
        second.write_unaligned(21);
        assert_eq!(contents(buffer), vec![10, 21]);

        assert!(pyrt_buffer_element_at(buffer, 2).is_null());
        assert_eq!(pyrt_last_error(), PYRT_ERR_INDEX);
        pyrt_buffer_destroy(&mut buffer);
    }
}

#[test]
fn test_null_handles() {
    unsafe {
        assert_eq!(pyrt_buffer_reverse(ptr::null_mut()), PYRT_ERR_INVALID);
        assert_eq!(pyrt_buffer_append(ptr::null_mut(), ptr::null()), PYRT_ERR_INVALID);
        assert_eq!(pyrt_buffer_len(ptr::null()), 0);
        assert_eq!(pyrt_buffer_kind(ptr::null()), PYRT_ERR_INVALID);
        assert_eq!(pyrt_array_rank(ptr::null()), 0);
        assert!(pyrt_array_shape(ptr::null()).is_null());
        pyrt_buffer_destroy(ptr::null_mut());
        pyrt_array_destroy(ptr::null_mut());
    }
}

#[test]
fn test_array_from_view_metadata() {
    unsafe {
        let mut data = [0.0f64; 24];
        let shape = [2usize, 3, 4];
        let mut array = pyrt_array_from_view(data.as_mut_ptr() as *mut u8, 3, shape.as_ptr(), FLOAT64, 0);
        assert!(!array.is_null());
        assert!(pyrt_array_is_view(array));
        assert_eq!(pyrt_array_rank(array), 3);
        assert_eq!(std::slice::from_raw_parts(pyrt_array_shape(array), 3), &[2, 3, 4]);
        assert_eq!(std::slice::from_raw_parts(pyrt_array_strides(array), 3), &[96, 32, 8]);
        assert_eq!(pyrt_array_kind(array), FLOAT64 as i32);
        assert_eq!(pyrt_array_len(array), 24);
        assert_eq!(pyrt_array_byte_len(array), 192);

        let index = [1usize, 2, 3];
        let element = pyrt_array_element(array, index.as_ptr()) as *mut f64;
        element.write(7.5);
        assert_eq!(data[23], 7.5);

        let bad = [2usize, 0, 0];
        assert!(pyrt_array_element(array, bad.as_ptr()).is_null());
        assert_eq!(pyrt_last_error(), PYRT_ERR_INDEX);

        pyrt_array_destroy(&mut array);
        assert!(array.is_null());
        assert_eq!(data[23], 7.5);
    }
}

#[test]
fn test_array_column_major_and_strided() {
    unsafe {
        let mut data = [0i32; 6];
        let shape = [2usize, 3];
        let mut array = pyrt_array_from_view(data.as_mut_ptr() as *mut u8, 2, shape.as_ptr(), INT32, 1);
        assert_eq!(std::slice::from_raw_parts(pyrt_array_strides(array), 2), &[4, 8]);
        pyrt_array_destroy(&mut array);

        let strides = [4isize];
        let mut strided = pyrt_array_from_strided_view(data.as_mut_ptr() as *mut u8, 1, shape.as_ptr(), ptr::null(), INT32);
        assert!(strided.is_null());
        assert_eq!(pyrt_last_error(), PYRT_ERR_INVALID);

        strided = pyrt_array_from_strided_view(data.as_mut_ptr() as *mut u8, 1, shape.as_ptr(), strides.as_ptr(), INT32);
        assert_eq!(pyrt_array_len(strided), 2);
        pyrt_array_destroy(&mut strided);
    }
}

#[test]
fn test_array_zeros_owns_memory() {
    unsafe {
        let shape = [4usize, 4];
        let mut array = pyrt_array_zeros(2, shape.as_ptr(), ElementKind::Complex128 as u8, 0);
        assert!(!pyrt_array_is_view(array));
        assert_eq!(pyrt_array_byte_len(array), 256);
        assert_eq!((*array).read::<crate::kind::Complex128>(&[3, 3]).unwrap().re, 0.0);
        pyrt_array_destroy(&mut array);

        assert!(pyrt_array_zeros(2, shape.as_ptr(), 99, 0).is_null());
    }
}

#[test]
fn test_buffer_as_array() {
    unsafe {
        let mut buffer = new_i32(&[1, 2, 3]);
        let mut view = pyrt_buffer_as_array(buffer);
        assert_eq!(pyrt_array_rank(view), 1);
        assert_eq!(pyrt_array_len(view), 3);
        assert_eq!((*view).read::<i32>(&[2]).unwrap(), 3);
        assert_eq!((*view).as_ptr(), (*buffer).as_ptr());

        pyrt_array_destroy(&mut view);
        assert_eq!(contents(buffer), vec![1, 2, 3]);
        pyrt_buffer_destroy(&mut buffer);
    }
}

#[test]
fn test_descriptor_handle_is_boxed_descriptor() {
    let array = ArrayDescriptor::zeros(&[2], ElementKind::Int8, crate::array::MemoryOrder::RowMajor).unwrap();
    let mut handle = Box::into_raw(Box::new(array));
    unsafe {
        assert_eq!(pyrt_array_len(handle), 2);
        pyrt_array_destroy(&mut handle);
    }
    assert!(handle.is_null());
}
