//! `ndarray` interop for CPU tensors

use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::runtime::Device;
use crate::tensor::{Layout, Storage, Tensor};
use ndarray::{ArrayD, ArrayView, CowArray, IxDyn, ShapeBuilder};
use std::sync::Arc;

impl Tensor {
    /// View this tensor as an `ndarray` array
    ///
    /// The result borrows the tensor's storage when every stride is
    /// non-negative, and is an owned row-major copy otherwise (reversed
    /// slices). The storage must not be written through any other handle
    /// while a borrowed view is alive: the view is a shared borrow of memory
    /// that `set` and the in-place ops mutate without synchronization.
    ///
    /// # Errors
    ///
    /// - `NotHostAccessible` when the tensor is not on the CPU
    /// - `DTypeMismatch` when `T` is not the tensor's element type
    ///
    /// # Example
    ///
    /// ```
    /// use tensorkit::prelude::*;
    ///
    /// let t = Tensor::from_host_buffer(&[0, 1, 2, 3, 4, 5], &[2, 3], DType::F32, &Device::cpu())?;
    /// let a = t.to_host_array::<f32>()?;
    /// assert_eq!(a, ndarray::arr2(&[[0.0f32, 1.0, 2.0], [3.0, 4.0, 5.0]]).into_dyn());
    /// # Ok::<(), tensorkit::error::Error>(())
    /// ```
    pub fn to_host_array<T: Element>(&self) -> Result<CowArray<'_, T, IxDyn>> {
        if !self.device().is_cpu() {
            return Err(Error::NotHostAccessible {
                op: "to_host_array",
                device: *self.device(),
            });
        }
        self.expect_dtype::<T>()?;

        if self.numel() > 0 && self.strides().iter().all(|&s| s >= 0) {
            let strides: Vec<usize> = self.strides().iter().map(|&s| s as usize).collect();
            let shape = IxDyn(self.shape()).strides(IxDyn(&strides));
            // SAFETY: the layout was validated against the storage extent when
            // the tensor was built, and the view borrows `self`, which keeps the
            // storage alive.
            let view = unsafe {
                ArrayView::from_shape_ptr(shape, self.data_ptr::<T>().add(self.offset()))
            };
            return Ok(CowArray::from(view));
        }

        let owned = ArrayD::from_shape_vec(IxDyn(self.shape()), self.to_vec::<T>()?)
            .map_err(|e| Error::Internal(format!("host array from tensor: {e}")))?;
        Ok(CowArray::from(owned))
    }

    /// Build a CPU tensor that takes over the buffer of `array` without copying
    ///
    /// Shape, strides and offset are carried over as they are. Arrays with a
    /// negative stride are first rewritten in row-major order.
    ///
    /// # Example
    ///
    /// ```
    /// use tensorkit::prelude::*;
    ///
    /// let a = ndarray::arr2(&[[1i64, 2], [3, 4]]).reversed_axes().into_dyn();
    /// let t = Tensor::from_host_array(a)?;
    /// assert_eq!(t.shape(), &[2, 2]);
    /// assert_eq!(t.to_vec::<i64>()?, vec![1, 3, 2, 4]);
    /// # Ok::<(), tensorkit::error::Error>(())
    /// ```
    pub fn from_host_array<T: Element>(array: ArrayD<T>) -> Result<Tensor> {
        let array = if array.strides().iter().any(|&s| s < 0) {
            array.as_standard_layout().into_owned()
        } else {
            array
        };

        let shape = array.shape().iter().copied().collect();
        let strides = array.strides().iter().copied().collect();
        let (buffer, offset) = array.into_raw_vec_and_offset();

        let ptr = buffer.as_ptr() as u64;
        let len = buffer.len();
        // SAFETY: moving the Vec into the owner does not move its heap buffer,
        // and the owner lives as long as the storage.
        let storage =
            unsafe { Storage::from_owner(ptr, len, T::DTYPE, &Device::cpu(), Arc::new(buffer)) };
        Tensor::from_parts(storage, Layout::new(shape, strides, offset.unwrap_or(0)))
    }
}
