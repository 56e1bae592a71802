//! Gather/scatter kernels for index-list keys
//!
//! An index-list selection is described by one offset map per output
//! dimension: `maps[d][i]` is the element offset contributed when output
//! coordinate `d` equals `i`. A plain slice dimension maps `i` to
//! `start * stride + i * step * stride`; an index-list dimension maps `i` to
//! `list[i] * stride`. Integer keys drop their dimension and fold into `base`.

use super::StridedCursor;
use crate::dtype::Element;

/// Walks the cartesian product of offset maps in row-major order
struct MapCursor<'a> {
    maps: &'a [Vec<isize>],
    index: Vec<usize>,
    offset: isize,
}

impl<'a> MapCursor<'a> {
    fn new(maps: &'a [Vec<isize>], base: isize) -> Self {
        let offset = base + maps.iter().map(|m| m.first().copied().unwrap_or(0)).sum::<isize>();
        Self {
            maps,
            index: vec![0; maps.len()],
            offset,
        }
    }

    #[inline]
    fn step(&mut self) {
        for dim in (0..self.maps.len()).rev() {
            let map = &self.maps[dim];
            let old = map[self.index[dim]];
            self.index[dim] += 1;
            if self.index[dim] < map.len() {
                self.offset += map[self.index[dim]] - old;
                return;
            }
            self.index[dim] = 0;
            self.offset += map[0] - old;
        }
    }
}

/// Copy the selected elements of `src` into a contiguous `out`
///
/// # Safety
/// - Every offset `base + sum(maps[d][i_d])` must be valid for `src`
/// - `out` must hold the product of the map lengths
pub unsafe fn gather_kernel<T: Element>(src: *const T, base: isize, maps: &[Vec<isize>], out: *mut T) {
    let total = maps.iter().map(Vec::len).product::<usize>();
    if total == 0 {
        return;
    }

    let mut cursor = MapCursor::new(maps, base);
    for i in 0..total {
        *out.add(i) = *src.offset(cursor.offset);
        cursor.step();
    }
}

/// Write a strided `value` (shaped like the selection) into the selected
/// elements of `dst`
///
/// Repeated indices are written in row-major order, so the last write wins.
///
/// # Safety
/// - Every offset `base + sum(maps[d][i_d])` must be valid for `dst`
/// - `value` must be valid for the selection shape with its strides and offset
/// - `value` must not overlap `dst`
pub unsafe fn scatter_kernel<T: Element>(
    dst: *mut T,
    base: isize,
    maps: &[Vec<isize>],
    value: *const T,
    value_strides: &[isize],
    value_offset: isize,
) {
    let shape: Vec<usize> = maps.iter().map(Vec::len).collect();
    let total = shape.iter().product::<usize>();
    if total == 0 {
        return;
    }

    let mut dst_cursor = MapCursor::new(maps, base);
    let mut value_cursor = StridedCursor::new(&shape, [value_strides], [value_offset]);
    for _ in 0..total {
        let [vo] = value_cursor.offsets();
        *dst.offset(dst_cursor.offset) = *value.offset(vo);
        dst_cursor.step();
        value_cursor.step();
    }
}
