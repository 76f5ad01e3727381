//! Shape and stride arithmetic

use super::MemoryOrder;
use smallvec::SmallVec;

pub type Shape = SmallVec<[usize; 4]>;
pub type Strides = SmallVec<[isize; 4]>;

/// Contiguous byte strides for `shape`.
///
/// Zero-length dimensions count as length 1 when accumulating, which is
/// how the host array library lays out empty arrays.
pub fn contiguous_strides(shape: &[usize], width: usize, order: MemoryOrder) -> Strides {
    let mut strides: Strides = SmallVec::from_elem(0, shape.len());
    let mut step = width as isize;

    match order {
        MemoryOrder::RowMajor => {
            for (stride, &extent) in strides.iter_mut().zip(shape).rev() {
                *stride = step;
                step *= extent.max(1) as isize;
            }
        }
        MemoryOrder::ColumnMajor => {
            for (stride, &extent) in strides.iter_mut().zip(shape) {
                *stride = step;
                step *= extent.max(1) as isize;
            }
        }
    }

    strides
}

/// Product of extents, `None` on overflow. Rank 0 holds one element.
pub fn element_count(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &extent| acc.checked_mul(extent))
}

/// Whether `strides` describe a dense layout in `order`. Dimensions of
/// extent 1 may carry any stride.
pub fn is_contiguous(shape: &[usize], strides: &[isize], width: usize, order: MemoryOrder) -> bool {
    if shape.iter().any(|&extent| extent == 0) {
        return true;
    }

    let mut expected = width as isize;
    let mut check = |extent: usize, stride: isize| {
        if extent == 1 {
            return true;
        }
        let ok = stride == expected;
        expected *= extent as isize;
        ok
    };

    match order {
        MemoryOrder::RowMajor => shape.iter().zip(strides).rev().all(|(&e, &s)| check(e, s)),
        MemoryOrder::ColumnMajor => shape.iter().zip(strides).all(|(&e, &s)| check(e, s)),
    }
}

/// Odometer over every multi-index of `shape` in row-major order
pub struct IndexIter {
    shape: Shape,
    next: Option<Shape>,
}

impl IndexIter {
    pub fn new(shape: &[usize]) -> Self {
        let empty = shape.iter().any(|&extent| extent == 0);
        Self {
            shape: shape.iter().copied().collect(),
            next: if empty { None } else { Some(SmallVec::from_elem(0, shape.len())) },
        }
    }
}

impl Iterator for IndexIter {
    type Item = Shape;

    fn next(&mut self) -> Option<Shape> {
        let current = self.next.take()?;

        let mut following = current.clone();
        for axis in (0..self.shape.len()).rev() {
            following[axis] += 1;
            if following[axis] < self.shape[axis] {
                self.next = Some(following);
                return Some(current);
            }
            following[axis] = 0;
        }

        // Wrapped every axis (or rank 0): `current` was the last index.
        Some(current)
    }
}
