//! Dtype and device conversion, plus whole-tensor comparisons

use super::Tensor;
use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::runtime::{self, Device};

impl Tensor {
    /// Convert to `dtype`
    ///
    /// Returns a view of `self` when `copy` is false and the dtype already
    /// matches. Otherwise a new contiguous tensor is allocated on the same
    /// device and every element is cast (floats truncate toward zero when
    /// converted to integers; anything non-zero becomes `true`).
    ///
    /// # Example
    ///
    /// ```
    /// use tensorkit::prelude::*;
    ///
    /// let t = Tensor::from_slice(&[1.9f64, -1.9, 0.0], &[3], &Device::cpu())?;
    /// assert_eq!(t.to(DType::I32, false)?.to_vec::<i32>()?, vec![1, -1, 0]);
    /// assert_eq!(t.to(DType::Bool, false)?.to_vec::<bool>()?, vec![true, true, false]);
    /// # Ok::<(), tensorkit::error::Error>(())
    /// ```
    pub fn to(&self, dtype: DType, copy: bool) -> Result<Tensor> {
        if !copy && dtype == self.dtype() {
            return Ok(self.clone());
        }

        tracing::debug!(
            from = %self.dtype(),
            to = %dtype,
            numel = self.numel(),
            device = %self.device(),
            "cast into new storage"
        );
        let out = Tensor::empty(self.shape(), dtype, self.device())?;
        self.copy_into(&out)?;
        Ok(out)
    }

    /// Move to `device`
    ///
    /// A storage block lives on exactly one device, so a transfer to another
    /// device always copies. On the same device a view of `self` is returned
    /// unless `copy` is set.
    pub fn to_device(&self, device: &Device, copy: bool) -> Result<Tensor> {
        if device == self.device() {
            return if copy { self.copy() } else { Ok(self.clone()) };
        }

        let src = self.contiguous()?;
        let out = Tensor::empty(self.shape(), self.dtype(), device)?;
        let size_bytes = self.numel() * self.dtype().size_in_bytes();
        runtime::memcpy(
            out.storage().ptr(),
            device,
            src.storage().ptr() + src.byte_offset() as u64,
            src.device(),
            size_bytes,
        )?;
        Ok(out)
    }

    /// Tensor on the CPU; no copy when already there
    pub fn cpu(&self) -> Result<Tensor> {
        self.to_device(&Device::cpu(), false)
    }

    /// Tensor on CUDA device `index`; no copy when already there
    pub fn cuda(&self, index: usize) -> Result<Tensor> {
        self.to_device(&Device::cuda(index), false)
    }

    /// Whether every element of `self` equals the matching element of `other`
    ///
    /// Tensors of different shape or dtype are never equal. Both tensors must
    /// live on the same device.
    pub fn all_equal(&self, other: &Tensor) -> Result<bool> {
        if self.shape() != other.shape() || self.dtype() != other.dtype() {
            return Ok(false);
        }
        let eq = self.eq(other)?.cpu()?;
        Ok(eq.to_vec::<bool>()?.into_iter().all(|v| v))
    }

    /// Whether `|self - other| <= atol + rtol * |other|` holds for every element
    ///
    /// Comparison runs in f64. NaN is never close to anything. Tensors of
    /// different shape are not close; dtypes and devices must match.
    ///
    /// # Example
    ///
    /// ```
    /// use tensorkit::prelude::*;
    ///
    /// let a = Tensor::from_slice(&[1.0f32, 2.0], &[2], &Device::cpu())?;
    /// let b = Tensor::from_slice(&[1.0f32, 2.000001], &[2], &Device::cpu())?;
    /// assert!(a.allclose(&b, 1e-5, 1e-8)?);
    /// # Ok::<(), tensorkit::error::Error>(())
    /// ```
    pub fn allclose(&self, other: &Tensor, rtol: f64, atol: f64) -> Result<bool> {
        if self.device() != other.device() {
            return Err(Error::DeviceMismatch {
                lhs: *self.device(),
                rhs: *other.device(),
            });
        }
        if self.dtype() != other.dtype() {
            return Err(Error::DTypeMismatch {
                lhs: self.dtype(),
                rhs: other.dtype(),
            });
        }
        if self.shape() != other.shape() {
            return Ok(false);
        }

        let a = self.cpu()?.to(DType::F64, false)?.to_vec::<f64>()?;
        let b = other.cpu()?.to(DType::F64, false)?.to_vec::<f64>()?;
        Ok(a
            .iter()
            .zip(&b)
            .all(|(&x, &y)| (x - y).abs() <= atol + rtol * y.abs()))
    }
}
