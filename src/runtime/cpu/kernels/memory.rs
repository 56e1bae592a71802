//! Copy, cast and fill kernels

use super::StridedCursor;
use crate::dtype::Element;

/// Copy a strided source into a strided destination, casting `S` to `D`
///
/// Both sides are walked in row-major order of `shape`, so this single kernel
/// covers `contiguous()`, dtype conversion and writes into views.
///
/// # Safety
/// - Both pointers must be valid for `shape` with their strides and offsets
/// - Source and destination must not overlap
#[allow(clippy::too_many_arguments)]
pub unsafe fn cast_copy_strided<S: Element, D: Element>(
    src: *const S,
    src_strides: &[isize],
    src_offset: isize,
    dst: *mut D,
    dst_strides: &[isize],
    dst_offset: isize,
    shape: &[usize],
) {
    let total = shape.iter().product::<usize>();
    let mut cursor = StridedCursor::new(shape, [src_strides, dst_strides], [src_offset, dst_offset]);
    for _ in 0..total {
        let [so, do_] = cursor.offsets();
        *dst.offset(do_) = (*src.offset(so)).cast::<D>();
        cursor.step();
    }
}

/// Write `value` to every element of a strided destination
///
/// # Safety
/// - `dst` must be valid for `shape` with `strides` and `offset`
pub unsafe fn fill_strided<T: Element>(
    dst: *mut T,
    shape: &[usize],
    strides: &[isize],
    offset: isize,
    value: T,
) {
    let total = shape.iter().product::<usize>();
    let mut cursor = StridedCursor::new(shape, [strides], [offset]);
    for _ in 0..total {
        let [o] = cursor.offsets();
        *dst.offset(o) = value;
        cursor.step();
    }
}
