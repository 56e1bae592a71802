//! CUDA runtime implementation
//!
//! Device memory is modeled as host-resident pools, one per device index.
//! Each pool tracks the bytes it has handed out and enforces the budget from
//! [`RuntimeConfig`](crate::config::RuntimeConfig) or
//! [`CudaRuntime::set_memory_limit`]. Tensors on a CUDA device therefore keep
//! every device rule (mismatch errors, no host-array views, out-of-memory on
//! exhaustion) without a driver being present.
//!
//! # Errors
//!
//! - `DeviceUnavailable` for an index at or beyond the configured device count
//! - `OutOfMemory` when an allocation would exceed the device budget

mod runtime;

pub use runtime::CudaRuntime;

use parking_lot::Mutex;
use std::collections::BTreeMap;

/// Per-device accounting
#[derive(Debug, Default)]
struct DevicePool {
    /// Bytes currently handed out
    allocated: usize,
    /// Explicit budget; outer `None` follows the process configuration
    limit: Option<Option<usize>>,
}

/// Global pool table: device index -> accounting
static POOLS: Mutex<BTreeMap<usize, DevicePool>> = parking_lot::const_mutex(BTreeMap::new());
