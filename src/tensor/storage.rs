//! Storage: device memory management with Arc-based sharing

use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::runtime::{self, Device};
use std::any::Any;
use std::sync::Arc;

/// Storage for tensor data on a device
///
/// Storage wraps device memory with reference counting, enabling zero-copy
/// views (transpose, slice, etc.) that share the underlying buffer. The count
/// is atomic, so handles may be dropped on any thread.
///
/// Memory is automatically deallocated when the last reference is dropped.
pub struct Storage {
    inner: Arc<StorageInner>,
}

struct StorageInner {
    /// Raw device pointer (CPU ptr cast to u64)
    ptr: u64,
    /// Number of elements (not bytes)
    len: usize,
    /// Element type
    dtype: DType,
    /// Device where memory is allocated
    device: Device,
    /// If true, we own this memory and should deallocate on drop
    owned: bool,
    /// Foreign object keeping borrowed memory alive
    keep_alive: Option<Arc<dyn Any + Send + Sync>>,
}

impl Storage {
    /// Create new zero-filled storage
    ///
    /// Allocates `len` elements of type `dtype` on the specified device.
    /// Fails with `OutOfMemory` when the device cannot satisfy the request and
    /// with `DeviceUnavailable` for a device that does not exist.
    pub fn new(len: usize, dtype: DType, device: &Device) -> Result<Self> {
        device.validate()?;
        let size_bytes = len
            .checked_mul(dtype.size_in_bytes())
            .filter(|&bytes| bytes <= isize::MAX as usize)
            .ok_or(Error::OutOfMemory {
                size: len.saturating_mul(dtype.size_in_bytes()),
                device: *device,
            })?;
        let ptr = runtime::allocate(size_bytes, device)?;
        Ok(Self::owned(ptr, len, dtype, *device))
    }

    /// Create storage from existing data with inferred dtype
    ///
    /// Copies `data` to the device. The dtype is inferred from the Element type.
    pub fn from_slice<T: Element>(data: &[T], device: &Device) -> Result<Self> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        Self::from_bytes(bytes, T::DTYPE, device)
    }

    /// Create storage from raw bytes with explicit dtype
    ///
    /// `data.len()` must be a multiple of the dtype width. Bool bytes are
    /// normalized so that any non-zero byte is stored as 1.
    pub fn from_bytes(data: &[u8], dtype: DType, device: &Device) -> Result<Self> {
        let width = dtype.size_in_bytes();
        if data.len() % width != 0 {
            return Err(Error::invalid_argument(
                "data",
                format!(
                    "{} bytes is not a whole number of {} elements",
                    data.len(),
                    dtype
                ),
            ));
        }

        let storage = Self::new(data.len() / width, dtype, device)?;
        if dtype == DType::Bool && data.iter().any(|&b| b > 1) {
            let normalized: Vec<u8> = data.iter().map(|&b| u8::from(b != 0)).collect();
            runtime::copy_to_device(&normalized, storage.ptr(), device)?;
        } else {
            runtime::copy_to_device(data, storage.ptr(), device)?;
        }
        Ok(storage)
    }

    /// Wrap existing device memory without taking ownership
    ///
    /// # Safety
    /// - `ptr` must point to valid device memory of at least `len` elements
    /// - The memory must remain valid for the lifetime of this Storage
    /// - Caller is responsible for eventual deallocation
    pub unsafe fn from_ptr(ptr: u64, len: usize, dtype: DType, device: &Device) -> Self {
        Self {
            inner: Arc::new(StorageInner {
                ptr,
                len,
                dtype,
                device: *device,
                owned: false,
                keep_alive: None,
            }),
        }
    }

    /// Wrap memory owned by `owner`, which is dropped with the last handle
    ///
    /// # Safety
    /// `ptr` must address `len` elements of `dtype` on `device` that stay
    /// valid and unmoved for as long as `owner` is alive.
    pub(crate) unsafe fn from_owner(
        ptr: u64,
        len: usize,
        dtype: DType,
        device: &Device,
        owner: Arc<dyn Any + Send + Sync>,
    ) -> Self {
        Self {
            inner: Arc::new(StorageInner {
                ptr,
                len,
                dtype,
                device: *device,
                owned: false,
                keep_alive: Some(owner),
            }),
        }
    }

    fn owned(ptr: u64, len: usize, dtype: DType, device: Device) -> Self {
        Self {
            inner: Arc::new(StorageInner {
                ptr,
                len,
                dtype,
                device,
                owned: true,
                keep_alive: None,
            }),
        }
    }

    /// Take another counted reference to the same block
    #[inline]
    pub fn share(&self) -> Self {
        self.clone()
    }

    /// Give up this reference; the block is freed when it was the last one
    #[inline]
    pub fn release(self) {
        drop(self);
    }

    /// Get the raw device pointer
    #[inline]
    pub fn ptr(&self) -> u64 {
        self.inner.ptr
    }

    /// Get the number of elements
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len
    }

    /// Check if storage is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.len == 0
    }

    /// Get the element type
    #[inline]
    pub fn dtype(&self) -> DType {
        self.inner.dtype
    }

    /// Get the device
    #[inline]
    pub fn device(&self) -> &Device {
        &self.inner.device
    }

    /// Get size in bytes
    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        self.inner.len * self.inner.dtype.size_in_bytes()
    }

    /// Whether dropping the last handle frees the memory
    #[inline]
    pub fn is_owned(&self) -> bool {
        self.inner.owned
    }

    /// Get the reference count
    #[inline]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Check if this is the only reference
    #[inline]
    pub fn is_unique(&self) -> bool {
        Arc::strong_count(&self.inner) == 1
    }

    /// Whether two handles refer to the same block
    #[inline]
    pub fn same_block(&self, other: &Storage) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Clone for Storage {
    /// Clone increments the reference count (zero-copy)
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Drop for StorageInner {
    fn drop(&mut self) {
        if self.owned && self.ptr != 0 {
            runtime::deallocate(
                self.ptr,
                self.len * self.dtype.size_in_bytes(),
                &self.device,
            );
        }
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("ptr", &format!("0x{:x}", self.inner.ptr))
            .field("len", &self.inner.len)
            .field("dtype", &self.inner.dtype)
            .field("device", &self.inner.device)
            .field("owned", &self.inner.owned)
            .field("kept_alive", &self.inner.keep_alive.is_some())
            .field("refs", &Arc::strong_count(&self.inner))
            .finish()
    }
}
