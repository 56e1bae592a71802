//! Core Tensor type

use super::{checked_numel, Layout, Storage};
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::ops::Scalar;
use crate::runtime::cpu::kernels;
use crate::runtime::{self, Device};
use std::fmt;

/// N-dimensional array stored on a compute device
///
/// `Tensor` is the fundamental data structure in tensorkit. It consists of:
/// - **Storage**: Reference-counted device memory, tagged with dtype and device
/// - **Layout**: Shape, strides, and offset defining the view into storage
///
/// # Zero-Copy Views
///
/// Operations like `transpose`, `reshape`, `broadcast_to` and slicing with
/// [`TensorKey`](super::TensorKey) create new tensors that share the same
/// underlying storage. Writes through one view are visible through all others.
///
/// # Example
///
/// ```
/// use tensorkit::prelude::*;
///
/// let a = Tensor::from_slice(&[1.0f32, 2.0, 3.0, 4.0], &[2, 2], &Device::cpu())?;
/// let b = a.transpose(-1, -2)?; // Zero-copy, shares storage with a
/// assert!(a.shares_storage_with(&b));
/// # Ok::<(), tensorkit::error::Error>(())
/// ```
pub struct Tensor {
    /// Device memory
    storage: Storage,
    /// Shape, strides, offset
    layout: Layout,
}

impl Tensor {
    /// Create a tensor from storage and layout
    ///
    /// Fails with `ShapeMismatch` if `layout` reaches outside `storage`.
    pub fn from_parts(storage: Storage, layout: Layout) -> Result<Self> {
        if let Some((start, end)) = layout.extent() {
            if start < 0 || end > storage.len() as isize {
                return Err(Error::ShapeMismatch {
                    expected: vec![storage.len()],
                    got: layout.shape().to_vec(),
                });
            }
        }
        Ok(Self { storage, layout })
    }

    /// Create a tensor that reuses `self`'s storage with a new layout
    #[inline]
    pub(crate) fn with_layout(&self, layout: Layout) -> Self {
        Self {
            storage: self.storage.clone(),
            layout,
        }
    }

    /// Create a tensor from a slice of data
    ///
    /// The dtype is inferred from `T`. Returns an error if `data.len()` does
    /// not equal the product of the `shape` dimensions, or if memory
    /// allocation fails.
    pub fn from_slice<T: Element>(data: &[T], shape: &[usize], device: &Device) -> Result<Self> {
        if checked_numel(shape) != Some(data.len()) {
            return Err(Error::ShapeMismatch {
                expected: shape.to_vec(),
                got: vec![data.len()],
            });
        }

        let storage = Storage::from_slice(data, device)?;
        Ok(Self {
            storage,
            layout: Layout::contiguous(shape),
        })
    }

    /// Create a tensor of `dtype` from host values, casting each element
    ///
    /// # Example
    /// ```
    /// use tensorkit::prelude::*;
    ///
    /// let t = Tensor::from_host_buffer(&[0, 1, 2, 3, 4, 5], &[2, 3], DType::F32, &Device::cpu())?;
    /// assert_eq!(t.to_vec::<f32>()?, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    /// # Ok::<(), tensorkit::error::Error>(())
    /// ```
    pub fn from_host_buffer<T: Element>(
        data: &[T],
        shape: &[usize],
        dtype: DType,
        device: &Device,
    ) -> Result<Self> {
        Self::from_slice(data, shape, device)?.to(dtype, false)
    }

    /// Create a zero-initialized tensor
    ///
    /// Both backends hand out zeroed memory, so this is the same as
    /// [`Self::zeros`]; the name mirrors tensors that are written before read.
    pub fn empty(shape: &[usize], dtype: DType, device: &Device) -> Result<Self> {
        let len = checked_numel(shape).ok_or(Error::OutOfMemory {
            size: usize::MAX,
            device: *device,
        })?;
        let storage = Storage::new(len, dtype, device)?;
        Ok(Self {
            storage,
            layout: Layout::contiguous(shape),
        })
    }

    /// Create a tensor filled with zeros
    pub fn zeros(shape: &[usize], dtype: DType, device: &Device) -> Result<Self> {
        Self::empty(shape, dtype, device)
    }

    /// Create a tensor filled with ones
    pub fn ones(shape: &[usize], dtype: DType, device: &Device) -> Result<Self> {
        Self::full(shape, dtype, 1i64, device)
    }

    /// Create a tensor filled with a scalar value
    ///
    /// The scalar is converted to the target dtype.
    pub fn full(
        shape: &[usize],
        dtype: DType,
        value: impl Into<Scalar>,
        device: &Device,
    ) -> Result<Self> {
        let tensor = Self::empty(shape, dtype, device)?;
        tensor.fill_scalar(value.into());
        Ok(tensor)
    }

    /// Write `value` into every element of this view
    pub(crate) fn fill_scalar(&self, value: Scalar) {
        crate::dispatch_dtype!(self.dtype(), T => {
            unsafe {
                kernels::fill_strided::<T>(
                    self.data_ptr::<T>() as *mut T,
                    self.shape(),
                    self.strides(),
                    self.offset() as isize,
                    value.cast::<T>(),
                );
            }
        })
    }

    // ===== Accessors =====

    /// Get the storage
    #[inline]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Get the layout
    #[inline]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Get the shape
    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.layout.shape()
    }

    /// Get the strides, in elements
    #[inline]
    pub fn strides(&self) -> &[isize] {
        self.layout.strides()
    }

    /// Get the strides, in bytes
    pub fn byte_strides(&self) -> Vec<isize> {
        self.layout.byte_strides(self.dtype().size_in_bytes())
    }

    /// Offset of the first element into the storage, in elements
    #[inline]
    pub fn offset(&self) -> usize {
        self.layout.offset()
    }

    /// Offset of the first element into the storage, in bytes
    #[inline]
    pub fn byte_offset(&self) -> usize {
        self.layout.byte_offset(self.dtype().size_in_bytes())
    }

    /// Get number of dimensions
    #[inline]
    pub fn ndim(&self) -> usize {
        self.layout.ndim()
    }

    /// Get total number of elements
    #[inline]
    pub fn numel(&self) -> usize {
        self.layout.elem_count()
    }

    /// Get the element type
    #[inline]
    pub fn dtype(&self) -> DType {
        self.storage.dtype()
    }

    /// Get the device
    #[inline]
    pub fn device(&self) -> &Device {
        self.storage.device()
    }

    /// Check if the tensor is contiguous in memory
    #[inline]
    pub fn is_contiguous(&self) -> bool {
        self.layout.is_contiguous()
    }

    /// Whether `self` and `other` view the same storage block
    #[inline]
    pub fn shares_storage_with(&self, other: &Tensor) -> bool {
        self.storage.same_block(&other.storage)
    }

    /// Typed base pointer of the storage (not offset)
    #[inline]
    pub(crate) fn data_ptr<T: Element>(&self) -> *const T {
        self.storage.ptr() as *const T
    }

    // ===== View Operations (Zero-Copy) =====

    /// Transpose two dimensions (zero-copy)
    pub fn transpose(&self, dim0: isize, dim1: isize) -> Result<Self> {
        let new_layout =
            self.layout
                .transpose(dim0, dim1)
                .ok_or_else(|| Error::InvalidDimension {
                    dim: if self.layout.normalize_dim(dim0).is_none() {
                        dim0
                    } else {
                        dim1
                    },
                    ndim: self.ndim(),
                })?;

        Ok(self.with_layout(new_layout))
    }

    /// Reshape to a new shape (zero-copy, contiguous tensors only)
    pub fn reshape(&self, shape: &[usize]) -> Result<Self> {
        if checked_numel(shape) != Some(self.numel()) {
            return Err(Error::shape_mismatch(shape, self.shape()));
        }
        let new_layout = self.layout.reshape(shape).ok_or(Error::NotContiguous)?;
        Ok(self.with_layout(new_layout))
    }

    /// Broadcast to a target shape (zero-copy)
    pub fn broadcast_to(&self, shape: &[usize]) -> Result<Self> {
        let new_layout = self
            .layout
            .broadcast_to(shape)
            .ok_or_else(|| Error::broadcast(self.shape(), shape))?;

        Ok(self.with_layout(new_layout))
    }

    // ===== Materialization =====

    /// Make tensor contiguous (copy if needed)
    ///
    /// If the tensor is already contiguous, returns a view sharing storage.
    pub fn contiguous(&self) -> Result<Self> {
        if self.is_contiguous() {
            return Ok(self.clone());
        }
        self.copy()
    }

    /// Materialize into fresh, contiguous storage on the same device
    pub fn copy(&self) -> Result<Self> {
        let out = Self::empty(self.shape(), self.dtype(), self.device())?;
        self.copy_into(&out)?;
        Ok(out)
    }

    /// Copy (and cast) every element of `self` into `dst`
    ///
    /// Shapes must match exactly and both tensors must live on the same
    /// device. `dst` must not overlap `self`.
    pub(crate) fn copy_into(&self, dst: &Tensor) -> Result<()> {
        if self.shape() != dst.shape() {
            return Err(Error::shape_mismatch(dst.shape(), self.shape()));
        }
        if self.device() != dst.device() {
            return Err(Error::DeviceMismatch {
                lhs: *dst.device(),
                rhs: *self.device(),
            });
        }

        crate::dispatch_dtype!(self.dtype(), S => {
            crate::dispatch_dtype!(dst.dtype(), D => {
                unsafe {
                    kernels::cast_copy_strided::<S, D>(
                        self.data_ptr::<S>(),
                        self.strides(),
                        self.offset() as isize,
                        dst.data_ptr::<D>() as *mut D,
                        dst.strides(),
                        dst.offset() as isize,
                        self.shape(),
                    );
                }
            })
        });
        Ok(())
    }

    // ===== Data Access =====

    /// Copy tensor data to a Vec on the host, in logical row-major order
    ///
    /// Only CPU tensors can be read this way; move device tensors with
    /// [`Self::cpu`] first. `T` must match the tensor's dtype.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>> {
        if !self.device().is_cpu() {
            return Err(Error::NotHostAccessible {
                op: "to_vec",
                device: *self.device(),
            });
        }
        self.expect_dtype::<T>()?;

        let numel = self.numel();
        let mut result = vec![T::zero(); numel];
        let contiguous = kernels::contiguous_strides(self.shape());
        unsafe {
            kernels::cast_copy_strided::<T, T>(
                self.data_ptr::<T>(),
                self.strides(),
                self.offset() as isize,
                result.as_mut_ptr(),
                &contiguous,
                0,
                self.shape(),
            );
        }
        Ok(result)
    }

    /// Extract the scalar value from a single-element tensor
    ///
    /// Works on any device (device memory is copied back synchronously).
    ///
    /// # Example
    ///
    /// ```
    /// use tensorkit::prelude::*;
    ///
    /// let t = Tensor::from_slice(&[42i32], &[1, 1], &Device::cpu())?;
    /// assert_eq!(t.item::<i32>()?, 42);
    /// # Ok::<(), tensorkit::error::Error>(())
    /// ```
    pub fn item<T: Element>(&self) -> Result<T> {
        if self.numel() != 1 {
            return Err(Error::ShapeMismatch {
                expected: vec![1],
                got: self.shape().to_vec(),
            });
        }
        self.expect_dtype::<T>()?;

        // A single element sits at `offset` whatever the strides are
        let elem_size = std::mem::size_of::<T>();
        let src = self.storage.ptr() + self.byte_offset() as u64;
        let mut buf = [0u8; 8];
        runtime::copy_from_device(src, &mut buf[..elem_size], self.device())?;
        Ok(unsafe { std::ptr::read_unaligned(buf.as_ptr() as *const T) })
    }

    /// Fail with `DTypeMismatch` unless the tensor holds `T`
    pub(crate) fn expect_dtype<T: Element>(&self) -> Result<()> {
        if T::DTYPE != self.dtype() {
            return Err(Error::DTypeMismatch {
                lhs: self.dtype(),
                rhs: T::DTYPE,
            });
        }
        Ok(())
    }
}

impl Clone for Tensor {
    /// Clone creates a new tensor sharing the same storage (zero-copy)
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            layout: self.layout.clone(),
        }
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &self.shape())
            .field("strides", &self.strides())
            .field("offset", &self.offset())
            .field("dtype", &self.dtype())
            .field("device", self.device())
            .finish()
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tensor({:?}, dtype={}, device={})",
            self.shape(),
            self.dtype(),
            self.device()
        )
    }
}
