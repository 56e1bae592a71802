//! CPU runtime implementation

use crate::error::{Error, Result};
use crate::runtime::{Device, Runtime};
use std::alloc::{Layout as AllocLayout, alloc_zeroed, dealloc};

/// Alignment of every host allocation (AVX-512 width)
pub(crate) const HOST_ALIGN: usize = 64;

/// Allocate zeroed, 64-byte aligned host memory
///
/// Returns 0 for a zero-byte request.
pub(crate) fn host_alloc(size_bytes: usize, device: &Device) -> Result<u64> {
    if size_bytes == 0 {
        return Ok(0);
    }

    let layout = AllocLayout::from_size_align(size_bytes, HOST_ALIGN).map_err(|_| {
        Error::OutOfMemory {
            size: size_bytes,
            device: *device,
        }
    })?;

    let ptr = unsafe { alloc_zeroed(layout) };
    if ptr.is_null() {
        return Err(Error::OutOfMemory {
            size: size_bytes,
            device: *device,
        });
    }

    Ok(ptr as u64)
}

/// Free memory obtained from [`host_alloc`] with the same size
pub(crate) fn host_free(ptr: u64, size_bytes: usize) {
    if ptr == 0 || size_bytes == 0 {
        return;
    }

    if let Ok(layout) = AllocLayout::from_size_align(size_bytes, HOST_ALIGN) {
        unsafe {
            dealloc(ptr as *mut u8, layout);
        }
    }
}

/// CPU compute runtime
///
/// This is the default runtime that works on any platform.
/// Memory is allocated on the heap using the system allocator.
#[derive(Clone, Debug, Default)]
pub struct CpuRuntime;

impl Runtime for CpuRuntime {
    fn name() -> &'static str {
        "cpu"
    }

    fn allocate(size_bytes: usize, device: &Device) -> Result<u64> {
        let ptr = host_alloc(size_bytes, device)?;
        tracing::trace!(bytes = size_bytes, ptr, "cpu alloc");
        Ok(ptr)
    }

    fn deallocate(ptr: u64, size_bytes: usize, _device: &Device) {
        tracing::trace!(bytes = size_bytes, ptr, "cpu free");
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
            // Use copy (not copy_nonoverlapping) in case src and dst overlap
            std::ptr::copy(src as *const u8, dst as *mut u8, size_bytes);
        }
        Ok(())
    }

    fn default_device() -> Device {
        Device::cpu()
    }
}
