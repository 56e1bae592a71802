//! Index keys and their resolution against a layout

use super::layout::{Layout, Shape, Strides};
use crate::error::{Error, Result};
use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

/// One per-dimension index descriptor
///
/// A sequence of keys is matched to the leading dimensions of a tensor;
/// dimensions without a key are taken in full.
///
/// | Key         | Result                                          |
/// |-------------|-------------------------------------------------|
/// | `Index`     | dimension removed, strict bounds                |
/// | `Slice`     | dimension kept, bounds clamped, zero-copy view  |
/// | `IndexList` | dimension kept, gathered into a new tensor      |
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TensorKey {
    /// A single position; negative values count from the end
    Index(isize),
    /// `start:stop:step` with the usual defaults for missing parts
    Slice {
        /// First position (default: 0, or the last element for negative step)
        start: Option<isize>,
        /// One past the last position (default: the end in step direction)
        stop: Option<isize>,
        /// Stride between positions (default: 1, must not be 0)
        step: Option<isize>,
    },
    /// Explicit positions, each checked like `Index`
    IndexList(Vec<isize>),
}

impl TensorKey {
    /// `Index(i)`
    pub fn index(i: isize) -> Self {
        Self::Index(i)
    }

    /// `Slice(start, stop, step)`
    pub fn slice(start: Option<isize>, stop: Option<isize>, step: Option<isize>) -> Self {
        Self::Slice { start, stop, step }
    }

    /// The full range `:`
    pub fn full() -> Self {
        Self::slice(None, None, None)
    }

    /// `IndexList(indices)`
    pub fn list(indices: Vec<isize>) -> Self {
        Self::IndexList(indices)
    }
}

impl From<isize> for TensorKey {
    fn from(i: isize) -> Self {
        Self::Index(i)
    }
}

impl From<Range<isize>> for TensorKey {
    fn from(r: Range<isize>) -> Self {
        Self::slice(Some(r.start), Some(r.end), None)
    }
}

impl From<RangeFrom<isize>> for TensorKey {
    fn from(r: RangeFrom<isize>) -> Self {
        Self::slice(Some(r.start), None, None)
    }
}

impl From<RangeTo<isize>> for TensorKey {
    fn from(r: RangeTo<isize>) -> Self {
        Self::slice(None, Some(r.end), None)
    }
}

impl From<RangeFull> for TensorKey {
    fn from(_: RangeFull) -> Self {
        Self::full()
    }
}

impl From<Vec<isize>> for TensorKey {
    fn from(v: Vec<isize>) -> Self {
        Self::IndexList(v)
    }
}

/// Wrap a possibly negative index into `[0, size)`
pub(crate) fn normalize_index(index: isize, dim: usize, size: usize) -> Result<usize> {
    let n = size as isize;
    let wrapped = if index < 0 { index + n } else { index };
    if wrapped < 0 || wrapped >= n {
        return Err(Error::IndexOutOfBounds { index, dim, size });
    }
    Ok(wrapped as usize)
}

/// Resolve slice bounds to `(start, step, len)` with clamping
///
/// Follows Python's `slice.indices`: out-of-range bounds clamp instead of
/// failing, and a negative step walks backwards from the last element.
pub(crate) fn slice_indices(
    start: Option<isize>,
    stop: Option<isize>,
    step: Option<isize>,
    size: usize,
) -> Result<(isize, isize, usize)> {
    let step = step.unwrap_or(1);
    if step == 0 {
        return Err(Error::invalid_argument("step", "slice step cannot be zero"));
    }

    let n = size as isize;
    let (lower, upper) = if step < 0 { (-1, n - 1) } else { (0, n) };

    let clamp = |bound: isize| {
        if bound < 0 {
            (bound + n).max(lower)
        } else {
            bound.min(upper)
        }
    };

    let start = start.map_or(if step < 0 { upper } else { lower }, clamp);
    let stop = stop.map_or(if step < 0 { lower } else { upper }, clamp);

    let len = if step > 0 && start < stop {
        (stop - start - 1) as usize / step.unsigned_abs() + 1
    } else if step < 0 && stop < start {
        (start - stop - 1) as usize / step.unsigned_abs() + 1
    } else {
        0
    };

    Ok((start, step, len))
}

/// Result of resolving keys against a layout
#[derive(Debug)]
pub(crate) enum Selection {
    /// Strided view over the same storage
    View(Layout),
    /// Gather over per-dimension offset maps (see the index kernels)
    Gather {
        /// Element offset shared by every selected element
        base: isize,
        /// Offset contributions per output dimension
        maps: Vec<Vec<isize>>,
    },
}

impl Selection {
    /// Shape of the selected elements
    pub(crate) fn shape(&self) -> Vec<usize> {
        match self {
            Self::View(layout) => layout.shape().to_vec(),
            Self::Gather { maps, .. } => maps.iter().map(Vec::len).collect(),
        }
    }
}

/// Resolve `keys` against `layout`
///
/// Validation covers every key before anything is returned, so callers can
/// rely on a successful resolution being fully in range.
pub(crate) fn resolve(layout: &Layout, keys: &[TensorKey]) -> Result<Selection> {
    let ndim = layout.ndim();
    if keys.len() > ndim {
        return Err(Error::TooManyIndices {
            keys: keys.len(),
            ndim,
        });
    }

    let full = TensorKey::full();
    let mut base = layout.offset() as isize;
    let mut shape = Shape::new();
    let mut strides = Strides::new();
    let mut maps: Vec<Vec<isize>> = Vec::new();
    let mut gather = false;

    for (dim, (&size, &stride)) in layout.shape().iter().zip(layout.strides()).enumerate() {
        match keys.get(dim).unwrap_or(&full) {
            TensorKey::Index(i) => {
                base += normalize_index(*i, dim, size)? as isize * stride;
            }
            TensorKey::Slice { start, stop, step } => {
                let (start, step, len) = slice_indices(*start, *stop, *step, size)?;
                if len > 0 {
                    base += start * stride;
                }
                // A dimension of length 0 or 1 is never stepped, whatever the step
                let step_stride = if len <= 1 {
                    0
                } else {
                    stride.checked_mul(step).ok_or_else(|| {
                        Error::invalid_argument("step", format!("slice step {step} overflows"))
                    })?
                };
                shape.push(len);
                strides.push(step_stride);
                maps.push((0..len as isize).map(|k| k * step_stride).collect());
            }
            TensorKey::IndexList(list) => {
                let offsets = list
                    .iter()
                    .map(|&i| normalize_index(i, dim, size).map(|i| i as isize * stride))
                    .collect::<Result<Vec<_>>>()?;
                shape.push(offsets.len());
                strides.push(stride);
                maps.push(offsets);
                gather = true;
            }
        }
    }

    if gather {
        return Ok(Selection::Gather { base, maps });
    }

    // An empty selection may have been clamped past the end; pin it to the
    // parent offset so the view never points outside the storage.
    if shape.iter().any(|&s| s == 0) {
        base = layout.offset() as isize;
    }
    Ok(Selection::View(Layout::new(shape, strides, base as usize)))
}
