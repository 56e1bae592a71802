//! CPU runtime implementation
//!
//! The CPU runtime uses standard heap allocation. Its kernels are the
//! reference implementation for every tensor operation.
//!
//! # Non-contiguous Tensors
//!
//! Kernels take element strides and offsets for every operand, so views
//! (slices, transposes, broadcasts with stride 0, negative-step slices) are
//! processed in place without first being made contiguous.

pub(crate) mod kernels;
mod runtime;

pub use runtime::CpuRuntime;
pub(crate) use runtime::{host_alloc, host_free};
