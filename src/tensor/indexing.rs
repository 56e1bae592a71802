//! Key-based reads and writes: `get` and `set`

use super::key::{self, Selection, TensorKey};
use super::Tensor;
use crate::error::{Error, Result};
use crate::ops::Operand;
use crate::runtime::cpu::kernels;

impl Tensor {
    /// Select elements with per-dimension keys
    ///
    /// `Index` and `Slice` keys produce a zero-copy view sharing this tensor's
    /// storage. Any `IndexList` key produces a materialized copy instead.
    /// Dimensions without a key are taken in full.
    ///
    /// # Errors
    ///
    /// - `TooManyIndices` when there are more keys than dimensions
    /// - `IndexOutOfBounds` for an `Index` (or list entry) outside `[-n, n)`
    /// - `InvalidArgument` for a slice step of zero
    ///
    /// # Example
    ///
    /// ```
    /// use tensorkit::prelude::*;
    ///
    /// let t = Tensor::from_slice(&[0i64, 1, 2, 3, 4, 5], &[2, 3], &Device::cpu())?;
    /// let last_col = t.get(&[TensorKey::full(), TensorKey::Index(-1)])?;
    /// assert_eq!(last_col.to_vec::<i64>()?, vec![2, 5]);
    /// assert!(last_col.shares_storage_with(&t));
    /// # Ok::<(), tensorkit::error::Error>(())
    /// ```
    pub fn get(&self, keys: &[TensorKey]) -> Result<Tensor> {
        match key::resolve(self.layout(), keys)? {
            Selection::View(layout) => Ok(self.with_layout(layout)),
            Selection::Gather { base, maps } => {
                let shape: Vec<usize> = maps.iter().map(Vec::len).collect();
                let out = Tensor::empty(&shape, self.dtype(), self.device())?;
                crate::dispatch_dtype!(self.dtype(), T => {
                    unsafe {
                        kernels::gather_kernel::<T>(
                            self.data_ptr::<T>(),
                            base,
                            &maps,
                            out.data_ptr::<T>() as *mut T,
                        );
                    }
                });
                Ok(out)
            }
        }
    }

    /// Write `value` into the elements selected by `keys`
    ///
    /// Keys resolve exactly as in [`Self::get`], but an `IndexList` selection
    /// scatters into this tensor's own storage. `value` is a tensor on the same
    /// device or a host scalar; it is broadcast to the selection's shape and
    /// cast to this tensor's dtype. Every view sharing the storage sees the
    /// write.
    ///
    /// All checks run before the first element is written.
    ///
    /// # Example
    ///
    /// ```
    /// use tensorkit::prelude::*;
    ///
    /// let t = Tensor::zeros(&[2, 3], DType::F32, &Device::cpu())?;
    /// let row = Tensor::from_slice(&[1.0f32, 2.0, 3.0], &[1, 3], &Device::cpu())?;
    /// t.set(&[], &row)?; // broadcast (1, 3) into (2, 3)
    /// assert_eq!(t.to_vec::<f32>()?, vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0]);
    /// # Ok::<(), tensorkit::error::Error>(())
    /// ```
    pub fn set<'a>(&self, keys: &[TensorKey], value: impl Into<Operand<'a>>) -> Result<()> {
        let selection = key::resolve(self.layout(), keys)?;
        let target_shape = selection.shape();

        let value = match value.into() {
            Operand::Tensor(t) => {
                if t.device() != self.device() {
                    return Err(Error::DeviceMismatch {
                        lhs: *self.device(),
                        rhs: *t.device(),
                    });
                }
                t.clone()
            }
            Operand::Scalar(s) => Tensor::full(&[], self.dtype(), s, self.device())?,
        };
        let value = value.broadcast_to(&target_shape)?;

        // Scatter needs matching dtypes, and a value aliasing the destination
        // must be read completely before any write lands.
        let needs_copy = value.shares_storage_with(self)
            || (matches!(selection, Selection::Gather { .. }) && value.dtype() != self.dtype());
        let value = if needs_copy {
            value.to(self.dtype(), true)?
        } else {
            value
        };

        match selection {
            Selection::View(layout) => value.copy_into(&self.with_layout(layout)),
            Selection::Gather { base, maps } => {
                crate::dispatch_dtype!(self.dtype(), T => {
                    unsafe {
                        kernels::scatter_kernel::<T>(
                            self.data_ptr::<T>() as *mut T,
                            base,
                            &maps,
                            value.data_ptr::<T>(),
                            value.strides(),
                            value.offset() as isize,
                        );
                    }
                });
                Ok(())
            }
        }
    }
}
