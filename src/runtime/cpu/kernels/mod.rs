//! CPU kernels for strided tensor memory
//!
//! Every kernel takes raw element pointers plus per-operand element strides
//! and a starting element offset. Strides may be zero (broadcast) or negative
//! (reversed slices). Outputs are written in row-major order of `shape`.

mod binary;
mod compare;
mod index;
mod logical;
mod memory;
mod unary;

pub use binary::binary_op_strided_kernel;
pub use compare::compare_op_strided_kernel;
pub use index::{gather_kernel, scatter_kernel};
pub use logical::logical_op_strided_kernel;
pub use memory::{cast_copy_strided, fill_strided};
pub use unary::{any_zero_strided, unary_op_strided_kernel};

/// Row-major walk over `shape` tracking one element offset per operand
///
/// Offsets are updated incrementally: advancing dimension `d` adds
/// `strides[d]`, and wrapping it back to zero subtracts `strides[d] * shape[d]`.
pub(crate) struct StridedCursor<'a, const N: usize> {
    shape: &'a [usize],
    strides: [&'a [isize]; N],
    index: Vec<usize>,
    offsets: [isize; N],
}

impl<'a, const N: usize> StridedCursor<'a, N> {
    pub(crate) fn new(shape: &'a [usize], strides: [&'a [isize]; N], offsets: [isize; N]) -> Self {
        debug_assert!(strides.iter().all(|s| s.len() == shape.len()));
        Self {
            shape,
            strides,
            index: vec![0; shape.len()],
            offsets,
        }
    }

    /// Element offsets of the current position
    #[inline]
    pub(crate) fn offsets(&self) -> [isize; N] {
        self.offsets
    }

    /// Move to the next position in row-major order
    #[inline]
    pub(crate) fn step(&mut self) {
        for dim in (0..self.shape.len()).rev() {
            self.index[dim] += 1;
            for (off, strides) in self.offsets.iter_mut().zip(self.strides.iter()) {
                *off += strides[dim];
            }
            if self.index[dim] < self.shape[dim] {
                return;
            }
            let extent = self.shape[dim] as isize;
            for (off, strides) in self.offsets.iter_mut().zip(self.strides.iter()) {
                *off -= strides[dim] * extent;
            }
            self.index[dim] = 0;
        }
    }
}

/// Row-major strides of a contiguous tensor with `shape`
pub(crate) fn contiguous_strides(shape: &[usize]) -> Vec<isize> {
    let mut strides = vec![0isize; shape.len()];
    let mut acc = 1isize;
    for (stride, &dim) in strides.iter_mut().zip(shape.iter()).rev() {
        *stride = acc;
        acc *= dim.max(1) as isize;
    }
    strides
}
