//! Runtime backends for tensor memory
//!
//! This module defines the `Runtime` trait, the `Device` tag that every
//! storage block carries, and the CPU and CUDA implementations.
//!
//! # Architecture
//!
//! ```text
//! Device (kind + index, a plain value)
//! └── Runtime (backend selected by Device::kind)
//!     ├── CpuRuntime   64-byte aligned host heap
//!     └── CudaRuntime  per-device memory pools with budgets
//! ```
//!
//! Device pointers are handed around as `u64`. Both backends hand out
//! host-addressable memory, so the strided kernels in [`cpu::kernels`] run
//! against either; what differs per device is allocation accounting and the
//! rule that only CPU memory may be exposed to host-array interop.

pub mod cpu;
pub mod cuda;

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

pub use cpu::CpuRuntime;
pub use cuda::CudaRuntime;

/// Kind of execution target
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    /// Host CPU
    Cpu,
    /// CUDA GPU
    Cuda,
}

impl DeviceKind {
    /// Upper-case name used in device strings ("CPU", "CUDA")
    pub const fn name(self) -> &'static str {
        match self {
            Self::Cpu => "CPU",
            Self::Cuda => "CUDA",
        }
    }
}

/// A specific execution target: a kind plus a device index
///
/// Two devices are equal iff kind and index match.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Device {
    kind: DeviceKind,
    index: usize,
}

impl Device {
    /// Create a device from kind and index
    pub const fn new(kind: DeviceKind, index: usize) -> Self {
        Self { kind, index }
    }

    /// The host CPU (`CPU:0`)
    pub const fn cpu() -> Self {
        Self::new(DeviceKind::Cpu, 0)
    }

    /// CUDA device `index`
    pub const fn cuda(index: usize) -> Self {
        Self::new(DeviceKind::Cuda, index)
    }

    /// Device kind
    #[inline]
    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    /// Device index
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether this is the host CPU
    #[inline]
    pub fn is_cpu(&self) -> bool {
        self.kind == DeviceKind::Cpu
    }

    /// Whether this is a CUDA device
    #[inline]
    pub fn is_cuda(&self) -> bool {
        self.kind == DeviceKind::Cuda
    }

    /// Check that the device exists under the current configuration
    pub fn validate(&self) -> Result<()> {
        match self.kind {
            DeviceKind::Cpu if self.index == 0 => Ok(()),
            DeviceKind::Cpu => Err(Error::DeviceUnavailable {
                device: *self,
                reason: "only CPU:0 exists".to_string(),
            }),
            DeviceKind::Cuda => CudaRuntime::validate_index(self.index),
        }
    }
}

impl Default for Device {
    fn default() -> Self {
        Self::cpu()
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.name(), self.index)
    }
}

impl FromStr for Device {
    type Err = Error;

    /// Parse "CPU:0", "cuda:1" or a bare kind ("cuda", index 0)
    fn from_str(s: &str) -> Result<Self> {
        let (kind_str, index_str) = match s.split_once(':') {
            Some((kind, index)) => (kind, Some(index)),
            None => (s, None),
        };

        let kind = match kind_str.trim().to_ascii_uppercase().as_str() {
            "CPU" => DeviceKind::Cpu,
            "CUDA" | "GPU" => DeviceKind::Cuda,
            other => {
                return Err(Error::invalid_argument(
                    "device",
                    format!("unknown device kind '{other}' in '{s}'"),
                ))
            }
        };

        let index = match index_str {
            Some(idx) => idx.trim().parse::<usize>().map_err(|_| {
                Error::invalid_argument("device", format!("invalid device index in '{s}'"))
            })?,
            None => 0,
        };

        Ok(Self::new(kind, index))
    }
}

/// Core trait for memory backends
///
/// `Runtime` abstracts over the memory of different devices. Implementations
/// are stateless types; per-device state (pools, budgets) lives behind the
/// static methods.
///
/// # Example
///
/// ```
/// use tensorkit::runtime::{CpuRuntime, Device, Runtime};
///
/// let device = Device::cpu();
/// let ptr = CpuRuntime::allocate(1024, &device).unwrap();
/// // ... use memory ...
/// CpuRuntime::deallocate(ptr, 1024, &device);
/// ```
pub trait Runtime: Clone + Send + Sync + 'static {
    /// Human-readable name of this runtime
    fn name() -> &'static str;

    /// Allocate zero-initialized device memory
    ///
    /// Returns a device pointer (u64), or 0 for a zero-byte request.
    /// Returns `Err(OutOfMemory)` if allocation fails.
    fn allocate(size_bytes: usize, device: &Device) -> Result<u64>;

    /// Deallocate device memory
    fn deallocate(ptr: u64, size_bytes: usize, device: &Device);

    /// Copy data from host to device
    fn copy_to_device(src: &[u8], dst: u64, device: &Device) -> Result<()>;

    /// Copy data from device to host
    fn copy_from_device(src: u64, dst: &mut [u8], device: &Device) -> Result<()>;

    /// Copy data within device (device to device)
    fn copy_within_device(src: u64, dst: u64, size_bytes: usize, device: &Device) -> Result<()>;

    /// Get the default device
    fn default_device() -> Device;
}

/// Run `$body` with `$R` bound to the runtime serving `$device`
macro_rules! with_runtime {
    ($device:expr, $R:ident => $body:expr) => {
        match $device.kind() {
            $crate::runtime::DeviceKind::Cpu => {
                type $R = $crate::runtime::cpu::CpuRuntime;
                $body
            }
            $crate::runtime::DeviceKind::Cuda => {
                type $R = $crate::runtime::cuda::CudaRuntime;
                $body
            }
        }
    };
}

/// Allocate `size_bytes` on `device` using its runtime
pub(crate) fn allocate(size_bytes: usize, device: &Device) -> Result<u64> {
    with_runtime!(device, R => R::allocate(size_bytes, device))
}

/// Release memory obtained from [`allocate`]
pub(crate) fn deallocate(ptr: u64, size_bytes: usize, device: &Device) {
    with_runtime!(device, R => R::deallocate(ptr, size_bytes, device))
}

/// Copy host bytes into device memory
pub(crate) fn copy_to_device(src: &[u8], dst: u64, device: &Device) -> Result<()> {
    with_runtime!(device, R => R::copy_to_device(src, dst, device))
}

/// Copy device memory into a host buffer
pub(crate) fn copy_from_device(src: u64, dst: &mut [u8], device: &Device) -> Result<()> {
    with_runtime!(device, R => R::copy_from_device(src, dst, device))
}

/// Copy `size_bytes` between any two devices
///
/// Copies on the same device go through `copy_within_device`; transfers
/// between devices are staged through a host buffer and block until done.
pub fn memcpy(
    dst: u64,
    dst_device: &Device,
    src: u64,
    src_device: &Device,
    size_bytes: usize,
) -> Result<()> {
    if size_bytes == 0 {
        return Ok(());
    }

    if dst_device == src_device {
        return with_runtime!(dst_device, R => R::copy_within_device(src, dst, size_bytes, dst_device));
    }

    tracing::debug!(
        bytes = size_bytes,
        from = %src_device,
        to = %dst_device,
        "cross-device copy"
    );
    let mut staging = vec![0u8; size_bytes];
    copy_from_device(src, &mut staging, src_device)?;
    copy_to_device(&staging, dst, dst_device)
}
