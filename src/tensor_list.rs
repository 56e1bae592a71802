//! Growable sequences of equally shaped tensors
//!
//! A [`TensorList`] stores its elements as the rows of one backing tensor of
//! shape `[capacity, element_shape...]`. Appending past the capacity allocates
//! a block twice as large, copies the stored rows over and releases the old
//! block.
//!
//! # Aliasing hazard
//!
//! [`TensorList::from_tensor`] with `inplace = true` adopts the tensor's
//! storage as the backing block. Until the first reallocation, writes through
//! the list and through the original tensor are visible to each other. Once an
//! append (or `reserve`/`resize`) reallocates, the list moves to a new block
//! and the original tensor silently stops aliasing it: it stays valid, but it
//! no longer reflects the list's contents.

use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::runtime::Device;
use crate::tensor::{Tensor, TensorKey};
use std::fmt;

/// A list of tensors sharing one element shape, dtype and device
///
/// # Example
///
/// ```
/// use tensorkit::prelude::*;
///
/// let mut list = TensorList::new(&[3], DType::F32, &Device::cpu(), 0)?;
/// for i in 0..5 {
///     let row = Tensor::full(&[3], DType::F32, i as f64, &Device::cpu())?;
///     list.push_back(&row)?;
/// }
/// assert_eq!(list.len(), 5);
/// assert_eq!(list.capacity(), 8);
/// assert_eq!(list.get(-1)?.to_vec::<f32>()?, vec![4.0; 3]);
/// # Ok::<(), tensorkit::error::Error>(())
/// ```
pub struct TensorList {
    element_shape: Vec<usize>,
    /// Rows `[0, size)` hold the elements; the rest is spare capacity
    buffer: Tensor,
    size: usize,
}

impl TensorList {
    /// Create a list of `size` zero-filled elements
    pub fn new(element_shape: &[usize], dtype: DType, device: &Device, size: usize) -> Result<Self> {
        let buffer = Tensor::zeros(&Self::buffer_shape(size, element_shape), dtype, device)?;
        Ok(Self {
            element_shape: element_shape.to_vec(),
            buffer,
            size,
        })
    }

    /// Create a list from the rows of `tensor`
    ///
    /// Dimension 0 becomes the list size and the remaining dimensions the
    /// element shape. With `inplace` the list adopts `tensor`'s storage, which
    /// must then be contiguous; see the module docs for what happens to the
    /// sharing once the list reallocates. Without `inplace` the rows are copied.
    pub fn from_tensor(tensor: Tensor, inplace: bool) -> Result<Self> {
        if tensor.ndim() == 0 {
            return Err(Error::InvalidDimension { dim: 0, ndim: 0 });
        }
        let size = tensor.shape()[0];
        let element_shape = tensor.shape()[1..].to_vec();

        let buffer = if inplace {
            if !tensor.is_contiguous() {
                return Err(Error::NotContiguous);
            }
            if !tensor.storage().is_unique() {
                tracing::warn!(
                    shape = ?tensor.shape(),
                    refs = tensor.storage().ref_count(),
                    "tensor list adopts storage that other handles still reference; \
                     they stop seeing the list after its first reallocation"
                );
            }
            tensor
        } else {
            tensor.copy()?
        };

        Ok(Self {
            element_shape,
            buffer,
            size,
        })
    }

    /// Concatenate `tensors` along dimension 0 into a new list on `device`
    ///
    /// Every tensor must have at least one dimension, the same trailing
    /// dimensions and the same dtype. Tensors on other devices are copied.
    pub fn from_tensors(tensors: &[Tensor], device: &Device) -> Result<Self> {
        let first = tensors
            .first()
            .ok_or_else(|| Error::invalid_argument("tensors", "need at least one tensor"))?;
        if first.ndim() == 0 {
            return Err(Error::InvalidDimension { dim: 0, ndim: 0 });
        }
        let element_shape = &first.shape()[1..];

        let mut size = 0;
        for t in tensors {
            if t.ndim() == 0 || &t.shape()[1..] != element_shape {
                let mut expected = vec![t.shape().first().copied().unwrap_or(1)];
                expected.extend_from_slice(element_shape);
                return Err(Error::shape_mismatch(&expected, t.shape()));
            }
            if t.dtype() != first.dtype() {
                return Err(Error::DTypeMismatch {
                    lhs: first.dtype(),
                    rhs: t.dtype(),
                });
            }
            size += t.shape()[0];
        }

        let list = Self::new(element_shape, first.dtype(), device, size)?;
        let mut start = 0;
        for t in tensors {
            let rows = t.shape()[0];
            t.to_device(device, false)?
                .copy_into(&list.rows(start, start + rows)?)?;
            start += rows;
        }
        Ok(list)
    }

    fn buffer_shape(rows: usize, element_shape: &[usize]) -> Vec<usize> {
        let mut shape = Vec::with_capacity(element_shape.len() + 1);
        shape.push(rows);
        shape.extend_from_slice(element_shape);
        shape
    }

    /// View of buffer rows `[start, end)`
    fn rows(&self, start: usize, end: usize) -> Result<Tensor> {
        self.buffer.get(&[TensorKey::slice(
            Some(start as isize),
            Some(end as isize),
            None,
        )])
    }

    /// Move the stored rows into a fresh block of `capacity` rows
    fn reallocate(&mut self, capacity: usize) -> Result<()> {
        let shape = Self::buffer_shape(capacity, &self.element_shape);
        let buffer = Tensor::zeros(&shape, self.dtype(), self.device())?;
        tracing::debug!(
            from = self.capacity(),
            to = capacity,
            size = self.size,
            element_shape = ?self.element_shape,
            "tensor list reallocation"
        );

        let old = std::mem::replace(&mut self.buffer, buffer);
        if self.size > 0 {
            let kept = old.get(&[TensorKey::slice(None, Some(self.size as isize), None)])?;
            kept.copy_into(&self.rows(0, self.size)?)?;
        }
        drop(old);
        Ok(())
    }

    /// Make room for `needed` elements, at least doubling when growing
    fn grow_for(&mut self, needed: usize) -> Result<()> {
        if needed > self.capacity() {
            self.reallocate(needed.max(self.capacity() * 2).max(1))?;
        }
        Ok(())
    }

    fn check_element(&self, tensor: &Tensor) -> Result<()> {
        if tensor.shape() != self.element_shape.as_slice() {
            return Err(Error::shape_mismatch(&self.element_shape, tensor.shape()));
        }
        if tensor.dtype() != self.dtype() {
            return Err(Error::DTypeMismatch {
                lhs: self.dtype(),
                rhs: tensor.dtype(),
            });
        }
        if tensor.device() != self.device() {
            return Err(Error::DeviceMismatch {
                lhs: *self.device(),
                rhs: *tensor.device(),
            });
        }
        Ok(())
    }

    /// Append a copy of `tensor`
    ///
    /// When the list is full the capacity grows to `max(1, 2 * capacity)`.
    pub fn push_back(&mut self, tensor: &Tensor) -> Result<()> {
        self.check_element(tensor)?;
        self.grow_for(self.size + 1)?;
        tensor.copy_into(&self.buffer.get(&[TensorKey::Index(self.size as isize)])?)?;
        self.size += 1;
        Ok(())
    }

    /// Change the number of elements
    ///
    /// Shrinking only lowers the size. Growing reallocates when needed and
    /// zero-fills the new elements.
    pub fn resize(&mut self, new_size: usize) -> Result<()> {
        if new_size > self.size {
            self.grow_for(new_size)?;
            self.rows(self.size, new_size)?.fill_scalar(0i64.into());
        }
        self.size = new_size;
        Ok(())
    }

    /// Ensure room for at least `capacity` elements without reallocating
    pub fn reserve(&mut self, capacity: usize) -> Result<()> {
        if capacity > self.capacity() {
            self.reallocate(capacity)?;
        }
        Ok(())
    }

    /// View of element `index`; negative indices count from the end
    ///
    /// The view shares the list's current block.
    pub fn get(&self, index: isize) -> Result<Tensor> {
        let i = self.normalize(index)?;
        self.buffer.get(&[TensorKey::Index(i as isize)])
    }

    /// Overwrite element `index` with `value`, broadcasting and casting it
    pub fn set(&self, index: isize, value: &Tensor) -> Result<()> {
        let i = self.normalize(index)?;
        self.buffer.set(&[TensorKey::Index(i as isize)], value)
    }

    fn normalize(&self, index: isize) -> Result<usize> {
        let n = self.size as isize;
        let wrapped = if index < 0 { index + n } else { index };
        if wrapped < 0 || wrapped >= n {
            return Err(Error::IndexOutOfBounds {
                index,
                dim: 0,
                size: self.size,
            });
        }
        Ok(wrapped as usize)
    }

    /// All elements as one tensor of shape `[len, element_shape...]`
    ///
    /// The result is a view of the current block.
    pub fn as_tensor(&self) -> Result<Tensor> {
        self.rows(0, self.size)
    }

    /// Append copies of every element of `other`
    pub fn extend(&mut self, other: &TensorList) -> Result<()> {
        if other.element_shape != self.element_shape {
            return Err(Error::shape_mismatch(&self.element_shape, &other.element_shape));
        }
        if other.dtype() != self.dtype() {
            return Err(Error::DTypeMismatch {
                lhs: self.dtype(),
                rhs: other.dtype(),
            });
        }
        if other.device() != self.device() {
            return Err(Error::DeviceMismatch {
                lhs: *self.device(),
                rhs: *other.device(),
            });
        }

        let mut src = other.as_tensor()?;
        if src.shares_storage_with(&self.buffer) {
            src = src.copy()?;
        }
        let end = self.size + other.size;
        self.grow_for(end)?;
        src.copy_into(&self.rows(self.size, end)?)?;
        self.size = end;
        Ok(())
    }

    /// A new list holding the elements of `a` followed by those of `b`
    pub fn concat(a: &TensorList, b: &TensorList) -> Result<TensorList> {
        let mut out = TensorList::from_tensor(a.as_tensor()?, false)?;
        out.extend(b)?;
        Ok(out)
    }

    /// Remove every element, keeping the capacity
    pub fn clear(&mut self) {
        self.size = 0;
    }

    /// Number of elements
    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Number of elements (alias of [`Self::len`])
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether the list has no elements
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Number of elements the current block can hold
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.shape()[0]
    }

    /// Shape of each element
    #[inline]
    pub fn element_shape(&self) -> &[usize] {
        &self.element_shape
    }

    /// Element type
    #[inline]
    pub fn dtype(&self) -> DType {
        self.buffer.dtype()
    }

    /// Device holding the elements
    #[inline]
    pub fn device(&self) -> &Device {
        self.buffer.device()
    }
}

impl fmt::Debug for TensorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TensorList")
            .field("size", &self.size)
            .field("capacity", &self.capacity())
            .field("element_shape", &self.element_shape)
            .field("dtype", &self.dtype())
            .field("device", self.device())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu() -> Device {
        Device::cpu()
    }

    fn row(values: &[f32]) -> Tensor {
        Tensor::from_slice(values, &[values.len()], &cpu()).unwrap()
    }

    #[test]
    fn test_push_back_doubles_and_preserves() {
        let mut list = TensorList::new(&[3], DType::F32, &cpu(), 0).unwrap();
        assert_eq!(list.capacity(), 0);

        let mut capacities = Vec::new();
        for i in 0..5 {
            let v = i as f32;
            list.push_back(&row(&[v, v + 0.5, -v])).unwrap();
            assert_eq!(list.len(), i + 1);
            capacities.push(list.capacity());
            for j in 0..=i {
                let w = j as f32;
                assert_eq!(
                    list.get(j as isize).unwrap().to_vec::<f32>().unwrap(),
                    vec![w, w + 0.5, -w]
                );
            }
        }
        assert_eq!(capacities, vec![1, 2, 4, 4, 8]);
    }

    #[test]
    fn test_push_back_checks_element() {
        let mut list = TensorList::new(&[2], DType::F32, &cpu(), 0).unwrap();
        assert!(matches!(
            list.push_back(&row(&[1.0, 2.0, 3.0])),
            Err(Error::ShapeMismatch { .. })
        ));
        let ints = Tensor::from_slice(&[1i32, 2], &[2], &cpu()).unwrap();
        assert!(matches!(
            list.push_back(&ints),
            Err(Error::DTypeMismatch { .. })
        ));
        assert!(list.is_empty());
    }

    #[test]
    fn test_from_tensors_concatenates_rows() {
        let a = Tensor::ones(&[2, 3], DType::I64, &cpu()).unwrap();
        let b = Tensor::zeros(&[3, 3], DType::I64, &cpu()).unwrap();
        let list = TensorList::from_tensors(&[a, b.clone()], &cpu()).unwrap();
        assert_eq!(list.len(), 5);
        assert_eq!(list.element_shape(), &[3]);
        assert_eq!(list.get(1).unwrap().to_vec::<i64>().unwrap(), vec![1, 1, 1]);
        assert_eq!(list.get(2).unwrap().to_vec::<i64>().unwrap(), vec![0, 0, 0]);

        let c = Tensor::zeros(&[3, 4], DType::I64, &cpu()).unwrap();
        let err = TensorList::from_tensors(&[b, c], &cpu()).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));

        assert!(TensorList::from_tensors(&[], &cpu()).is_err());
    }

    #[test]
    fn test_from_tensor_inplace_shares_until_reallocation() {
        let t = Tensor::from_slice(&[1u8, 2, 3, 4], &[2, 2], &cpu()).unwrap();
        let mut list = TensorList::from_tensor(t.clone(), true).unwrap();
        assert_eq!(list.capacity(), 2);

        list.set(0, &Tensor::from_slice(&[9u8, 9], &[2], &cpu()).unwrap())
            .unwrap();
        assert_eq!(t.to_vec::<u8>().unwrap(), vec![9, 9, 3, 4]);

        list.push_back(&Tensor::from_slice(&[5u8, 6], &[2], &cpu()).unwrap())
            .unwrap();
        assert_eq!(list.capacity(), 4);
        list.set(1, &Tensor::zeros(&[2], DType::U8, &cpu()).unwrap())
            .unwrap();
        assert_eq!(t.to_vec::<u8>().unwrap(), vec![9, 9, 3, 4]);
        assert_eq!(
            list.as_tensor().unwrap().to_vec::<u8>().unwrap(),
            vec![9, 9, 0, 0, 5, 6]
        );
    }

    #[test]
    fn test_from_tensor_copy_is_independent() {
        let t = Tensor::from_slice(&[1i32, 2, 3], &[3], &cpu()).unwrap();
        let list = TensorList::from_tensor(t.clone(), false).unwrap();
        assert_eq!(list.element_shape(), &[] as &[usize]);
        list.set(0, &Tensor::full(&[], DType::I32, 7, &cpu()).unwrap())
            .unwrap();
        assert_eq!(t.to_vec::<i32>().unwrap(), vec![1, 2, 3]);
        assert_eq!(list.get(0).unwrap().item::<i32>().unwrap(), 7);
    }

    #[test]
    fn test_from_tensor_inplace_requires_contiguous() {
        let t = Tensor::zeros(&[2, 3], DType::F64, &cpu()).unwrap();
        let err = TensorList::from_tensor(t.transpose(0, 1).unwrap(), true).unwrap_err();
        assert!(matches!(err, Error::NotContiguous));
    }

    #[test]
    fn test_resize_zero_fills_growth() {
        let mut list = TensorList::from_tensor(
            Tensor::from_slice(&[1.0f64, 2.0, 3.0], &[3, 1], &cpu()).unwrap(),
            false,
        )
        .unwrap();
        list.resize(1).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list.capacity(), 3);

        // Regrowing within capacity clears the stale rows
        list.resize(3).unwrap();
        assert_eq!(list.capacity(), 3);
        assert_eq!(
            list.as_tensor().unwrap().to_vec::<f64>().unwrap(),
            vec![1.0, 0.0, 0.0]
        );

        list.resize(4).unwrap();
        assert_eq!(list.capacity(), 6);
        assert_eq!(
            list.as_tensor().unwrap().to_vec::<f64>().unwrap(),
            vec![1.0, 0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn test_get_bounds() {
        let list = TensorList::new(&[2], DType::I32, &cpu(), 3).unwrap();
        assert!(list.get(-3).is_ok());
        assert!(matches!(
            list.get(3),
            Err(Error::IndexOutOfBounds { index: 3, .. })
        ));
    }

    #[test]
    fn test_extend_and_concat() {
        let a = TensorList::from_tensor(
            Tensor::from_slice(&[1i64, 2], &[2, 1], &cpu()).unwrap(),
            false,
        )
        .unwrap();
        let b = TensorList::from_tensor(
            Tensor::from_slice(&[3i64, 4, 5], &[3, 1], &cpu()).unwrap(),
            false,
        )
        .unwrap();

        let c = TensorList::concat(&a, &b).unwrap();
        assert_eq!(c.len(), 5);
        assert_eq!(
            c.as_tensor().unwrap().to_vec::<i64>().unwrap(),
            vec![1, 2, 3, 4, 5]
        );
        assert_eq!(a.len(), 2);

        let mut d = TensorList::new(&[1], DType::I64, &cpu(), 0).unwrap();
        d.extend(&b).unwrap();
        d.extend(&a).unwrap();
        assert_eq!(
            d.as_tensor().unwrap().to_vec::<i64>().unwrap(),
            vec![3, 4, 5, 1, 2]
        );
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut list = TensorList::new(&[4], DType::Bool, &cpu(), 3).unwrap();
        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.capacity(), 3);
    }
}
