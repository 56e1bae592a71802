//! Comparison kernels

use super::StridedCursor;
use crate::dtype::Element;
use crate::ops::CompareOp;

/// Compare two strided operands elementwise into a contiguous bool buffer
///
/// # Safety
/// - All pointers must be valid for the specified shapes, strides and offsets
/// - `out` must hold `out_shape.product()` elements
#[inline]
#[allow(clippy::too_many_arguments)]
pub unsafe fn compare_op_strided_kernel<T: Element>(
    op: CompareOp,
    a: *const T,
    b: *const T,
    out: *mut bool,
    out_shape: &[usize],
    a_strides: &[isize],
    b_strides: &[isize],
    a_offset: isize,
    b_offset: isize,
) {
    let total = out_shape.iter().product::<usize>();
    if total == 0 {
        return;
    }

    let mut cursor = StridedCursor::new(out_shape, [a_strides, b_strides], [a_offset, b_offset]);
    for i in 0..total {
        let [ao, bo] = cursor.offsets();
        *out.add(i) = op.apply(*a.offset(ao), *b.offset(bo));
        cursor.step();
    }
}
