//! Tests for array descriptors and stride arithmetic

use super::*;

fn f64_block(values: &[f64]) -> Vec<f64> {
    values.to_vec()
}

#[test]
fn test_row_major_strides_2d() {
    let strides = contiguous_strides(&[2, 3], 8, MemoryOrder::RowMajor);
    assert_eq!(strides.as_slice(), &[24, 8]);
}

#[test]
fn test_row_major_strides_3d() {
    let strides = contiguous_strides(&[2, 3, 4], 8, MemoryOrder::RowMajor);
    assert_eq!(strides.as_slice(), &[96, 32, 8]);
}

#[test]
fn test_column_major_strides() {
    let strides = contiguous_strides(&[2, 3], 8, MemoryOrder::ColumnMajor);
    assert_eq!(strides.as_slice(), &[8, 16]);

    let strides = contiguous_strides(&[2, 3, 4], 4, MemoryOrder::ColumnMajor);
    assert_eq!(strides.as_slice(), &[4, 8, 24]);
}

#[test]
fn test_strides_every_rank() {
    // Row-major stride of axis i is width * product(shape[i+1..]).
    let shape = [3usize, 1, 4, 2, 5];
    for rank in 0..=shape.len() {
        let dims = &shape[..rank];
        let c = contiguous_strides(dims, 2, MemoryOrder::RowMajor);
        let f = contiguous_strides(dims, 2, MemoryOrder::ColumnMajor);
        for axis in 0..rank {
            let after: usize = dims[axis + 1..].iter().product();
            let before: usize = dims[..axis].iter().product();
            assert_eq!(c[axis], (2 * after) as isize);
            assert_eq!(f[axis], (2 * before) as isize);
        }
    }
}

#[test]
fn test_empty_dimension_strides() {
    let strides = contiguous_strides(&[2, 0, 3], 8, MemoryOrder::RowMajor);
    assert_eq!(strides.as_slice(), &[24, 24, 8]);
    assert_eq!(element_count(&[2, 0, 3]), Some(0));
}

#[test]
fn test_element_count_overflow() {
    assert_eq!(element_count(&[]), Some(1));
    assert_eq!(element_count(&[usize::MAX, 2]), None);
}

#[test]
fn test_view_metadata() {
    let mut data = f64_block(&[0.0; 6]);
    let view = unsafe {
        ArrayDescriptor::from_view(data.as_mut_ptr() as *mut u8, &[2, 3], ElementKind::Float64, MemoryOrder::RowMajor)
    }
    .unwrap();

    assert!(view.is_view());
    assert_eq!(view.rank(), 2);
    assert_eq!(view.shape(), &[2, 3]);
    assert_eq!(view.strides(), &[24, 8]);
    assert_eq!(view.element_strides().unwrap().as_slice(), &[3, 1]);
    assert_eq!(view.element_kind(), ElementKind::Float64);
    assert_eq!(view.len(), 6);
    assert_eq!(view.byte_len(), 48);
    assert!(view.is_c_contiguous());
    assert!(!view.is_f_contiguous());
}

#[test]
fn test_view_aliases_memory() {
    let mut data = f64_block(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    let view = unsafe {
        ArrayDescriptor::from_view(data.as_mut_ptr() as *mut u8, &[2, 3], ElementKind::Float64, MemoryOrder::RowMajor)
    }
    .unwrap();

    assert_eq!(view.read::<f64>(&[1, 2]).unwrap(), 6.0);
    assert_eq!(view.as_ptr(), data.as_ptr() as *const u8);

    // Mutate the underlying memory; the view sees it without re-fetching.
    unsafe { *data.as_mut_ptr().add(4) = 42.0 };
    assert_eq!(view.read::<f64>(&[1, 1]).unwrap(), 42.0);
}

#[test]
fn test_column_major_view_ordering() {
    // Column-major 2x3: memory order is a00 a10 a01 a11 a02 a12
    let mut data: Vec<i32> = vec![0, 10, 1, 11, 2, 12];
    let view = unsafe {
        ArrayDescriptor::from_view(data.as_mut_ptr() as *mut u8, &[2, 3], ElementKind::Int32, MemoryOrder::ColumnMajor)
    }
    .unwrap();

    for row in 0..2 {
        for col in 0..3 {
            let expected = (row * 10 + col) as i32;
            assert_eq!(view.read::<i32>(&[row, col]).unwrap(), expected);
        }
    }
    assert!(view.is_f_contiguous());
    assert!(!view.is_c_contiguous());
}

#[test]
fn test_strided_view_with_negative_stride() {
    // Reversed 1-D view: start at the last element, step back.
    let mut data: Vec<i64> = vec![1, 2, 3, 4];
    let last = unsafe { (data.as_mut_ptr() as *mut u8).add(24) };
    let view = unsafe { ArrayDescriptor::from_strided_view(last, &[4], &[-8], ElementKind::Int64) }.unwrap();

    let values: Vec<i64> = (0..4).map(|i| view.read::<i64>(&[i]).unwrap()).collect();
    assert_eq!(values, vec![4, 3, 2, 1]);
    assert!(!view.is_c_contiguous());
}

#[test]
fn test_strided_view_rejects_mismatched_strides() {
    let mut data = [0u8; 8];
    let err = unsafe { ArrayDescriptor::from_strided_view(data.as_mut_ptr(), &[2, 4], &[4], ElementKind::Int8) }
        .unwrap_err();
    assert_eq!(err.category(), crate::error::ErrorCategory::Shape);
}

#[test]
fn test_null_view() {
    let err = unsafe {
        ArrayDescriptor::from_view(std::ptr::null_mut(), &[3], ElementKind::Int8, MemoryOrder::RowMajor)
    }
    .unwrap_err();
    assert_eq!(err.category(), crate::error::ErrorCategory::Conversion);

    // Empty arrays may have no storage at all.
    let empty = unsafe {
        ArrayDescriptor::from_view(std::ptr::null_mut(), &[0, 3], ElementKind::Int8, MemoryOrder::RowMajor)
    }
    .unwrap();
    assert!(empty.is_empty());
    assert_eq!(empty.byte_len(), 0);
}

#[test]
fn test_rank_zero() {
    let mut value = 7.5f32;
    let view = unsafe {
        ArrayDescriptor::from_view(&mut value as *mut f32 as *mut u8, &[], ElementKind::Float32, MemoryOrder::RowMajor)
    }
    .unwrap();

    assert_eq!(view.rank(), 0);
    assert_eq!(view.len(), 1);
    assert_eq!(view.byte_len(), 4);
    assert!(view.strides().is_empty());
    assert_eq!(view.read::<f32>(&[]).unwrap(), 7.5);
}

#[test]
fn test_index_errors() {
    let owned = ArrayDescriptor::zeros(&[2, 3], ElementKind::Int16, MemoryOrder::RowMajor).unwrap();

    let err = owned.byte_offset(&[2, 0]).unwrap_err();
    assert_eq!(err.category(), crate::error::ErrorCategory::Index);

    let err = owned.byte_offset(&[1]).unwrap_err();
    assert_eq!(err.category(), crate::error::ErrorCategory::Shape);

    let err = owned.read::<i32>(&[0, 0]).unwrap_err();
    assert_eq!(err.category(), crate::error::ErrorCategory::Conversion);
}

#[test]
fn test_owned_zeros() {
    let mut owned = ArrayDescriptor::zeros(&[3, 2], ElementKind::Complex128, MemoryOrder::ColumnMajor).unwrap();
    assert!(!owned.is_view());
    assert_eq!(owned.byte_len(), 6 * 16);
    assert_eq!(owned.strides(), &[16, 48]);
    assert_eq!(owned.as_ptr() as usize % 8, 0);

    let z = crate::kind::Complex128::new(1.0, -1.0);
    owned.write(&[2, 1], z).unwrap();
    assert_eq!(owned.read::<crate::kind::Complex128>(&[2, 1]).unwrap(), z);
    assert_eq!(owned.read::<crate::kind::Complex128>(&[0, 0]).unwrap(), Default::default());

    owned.destroy();
}

#[test]
fn test_to_owned_gathers_strided_data() {
    let mut data: Vec<i32> = (0..6).collect();
    // Column-major view of a 2x3 block, copied into row-major order.
    let view = unsafe {
        ArrayDescriptor::from_view(data.as_mut_ptr() as *mut u8, &[2, 3], ElementKind::Int32, MemoryOrder::ColumnMajor)
    }
    .unwrap();

    let owned = view.to_owned().unwrap();
    assert!(!owned.is_view());
    assert!(owned.is_c_contiguous());
    for index in IndexIter::new(&[2, 3]) {
        assert_eq!(owned.read::<i32>(&index).unwrap(), view.read::<i32>(&index).unwrap());
    }

    // The copy is independent of the source memory.
    data[0] = 99;
    assert_eq!(owned.read::<i32>(&[0, 0]).unwrap(), 0);
}

#[test]
fn test_index_iter() {
    let all: Vec<Vec<usize>> = IndexIter::new(&[2, 2]).map(|i| i.to_vec()).collect();
    assert_eq!(all, vec![vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]]);

    assert_eq!(IndexIter::new(&[]).count(), 1);
    assert_eq!(IndexIter::new(&[3, 0]).count(), 0);
    assert_eq!(IndexIter::new(&[2, 3, 4]).count(), 24);
}

#[test]
fn test_unaligned_element_strides() {
    let mut data = [0u8; 16];
    let view = unsafe { ArrayDescriptor::from_strided_view(data.as_mut_ptr(), &[2], &[6], ElementKind::Int32) }.unwrap();
    assert!(view.element_strides().is_none());
}
