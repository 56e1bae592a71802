//! Unary operation kernels

use super::StridedCursor;
use crate::dtype::Element;
use crate::ops::UnaryOp;

/// Apply a unary op to a strided input, writing a contiguous output
///
/// # Safety
/// - `a` must be valid for `shape`, `strides` and `offset`
/// - `out` must hold `shape.product()` elements and not overlap `a`
pub unsafe fn unary_op_strided_kernel<T: Element>(
    op: UnaryOp,
    a: *const T,
    out: *mut T,
    shape: &[usize],
    strides: &[isize],
    offset: isize,
) {
    let total = shape.iter().product::<usize>();
    let mut cursor = StridedCursor::new(shape, [strides], [offset]);
    for i in 0..total {
        let [ao] = cursor.offsets();
        *out.add(i) = op.apply(*a.offset(ao));
        cursor.step();
    }
}

/// Whether any element of a strided input is zero
///
/// # Safety
/// - `a` must be valid for `shape`, `strides` and `offset`
pub unsafe fn any_zero_strided<T: Element>(
    a: *const T,
    shape: &[usize],
    strides: &[isize],
    offset: isize,
) -> bool {
    let total = shape.iter().product::<usize>();
    let mut cursor = StridedCursor::new(shape, [strides], [offset]);
    for _ in 0..total {
        let [ao] = cursor.offsets();
        if !(*a.offset(ao)).truthy() {
            return true;
        }
        cursor.step();
    }
    false
}
