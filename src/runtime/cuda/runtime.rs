//! CUDA runtime implementation

use super::POOLS;
use crate::config;
use crate::error::{Error, Result};
use crate::runtime::cpu::{host_alloc, host_free};
use crate::runtime::{Device, Runtime};

/// CUDA Runtime adapter
///
/// Implements the Runtime trait for CUDA devices on top of accounted host
/// memory pools.
#[derive(Clone, Debug, Default)]
pub struct CudaRuntime;

impl CudaRuntime {
    /// Number of configured CUDA devices
    pub fn device_count() -> usize {
        config::current().cuda_device_count
    }

    /// Check that `CUDA:index` exists
    pub fn validate_index(index: usize) -> Result<()> {
        let count = Self::device_count();
        if index >= count {
            return Err(Error::DeviceUnavailable {
                device: Device::cuda(index),
                reason: format!("{count} CUDA device(s) configured"),
            });
        }
        Ok(())
    }

    /// Override the byte budget of one device
    ///
    /// `None` removes the budget entirely. Memory already allocated is not
    /// affected, but later allocations fail once usage would exceed the limit.
    pub fn set_memory_limit(index: usize, limit: Option<usize>) {
        tracing::debug!(index, ?limit, "setting CUDA memory limit");
        POOLS.lock().entry(index).or_default().limit = Some(limit);
    }

    /// Bytes currently allocated on `CUDA:index`
    pub fn allocated_bytes(index: usize) -> usize {
        POOLS.lock().get(&index).map_or(0, |pool| pool.allocated)
    }
}

impl Runtime for CudaRuntime {
    fn name() -> &'static str {
        "cuda"
    }

    /// Allocate device memory.
    ///
    /// Returns `Err(OutOfMemory)` if the device budget would be exceeded.
    fn allocate(size_bytes: usize, device: &Device) -> Result<u64> {
        Self::validate_index(device.index())?;
        if size_bytes == 0 {
            return Ok(0);
        }

        let default_limit = config::current().cuda_memory_limit;
        let mut pools = POOLS.lock();
        let pool = pools.entry(device.index()).or_default();
        let limit = pool.limit.unwrap_or(default_limit);

        let requested = pool.allocated.saturating_add(size_bytes);
        if limit.is_some_and(|limit| requested > limit) {
            tracing::debug!(
                device = %device,
                bytes = size_bytes,
                in_use = pool.allocated,
                ?limit,
                "CUDA allocation exceeds device budget"
            );
            return Err(Error::OutOfMemory {
                size: size_bytes,
                device: *device,
            });
        }

        let ptr = host_alloc(size_bytes, device)?;
        pool.allocated = requested;
        tracing::trace!(device = %device, bytes = size_bytes, ptr, "cuda alloc");
        Ok(ptr)
    }

    fn deallocate(ptr: u64, size_bytes: usize, device: &Device) {
        if ptr == 0 || size_bytes == 0 {
            return;
        }

        if let Some(pool) = POOLS.lock().get_mut(&device.index()) {
            pool.allocated = pool.allocated.saturating_sub(size_bytes);
        }
        tracing::trace!(device = %device, bytes = size_bytes, ptr, "cuda free");
        host_free(ptr, size_bytes);
    }

    fn copy_to_device(src: &[u8], dst: u64, _device: &Device) -> Result<()> {
        if src.is_empty() || dst == 0 {
            return Ok(());
        }

        unsafe {
            std::ptr::copy_nonoverlapping(src.as_ptr(), dst as *mut u8, src.len());
        }
        Ok(())
    }

    fn copy_from_device(src: u64, dst: &mut [u8], _device: &Device) -> Result<()> {
        if dst.is_empty() || src == 0 {
            return Ok(());
        }

        unsafe {
            std::ptr::copy_nonoverlapping(src as *const u8, dst.as_mut_ptr(), dst.len());
        }
        Ok(())
    }

    fn copy_within_device(src: u64, dst: u64, size_bytes: usize, _device: &Device) -> Result<()> {
        if size_bytes == 0 || src == 0 || dst == 0 {
            return Ok(());
        }

        unsafe {
            std::ptr::copy(src as *const u8, dst as *mut u8, size_bytes);
        }
        Ok(())
    }

    fn default_device() -> Device {
        Device::cuda(0)
    }
}
