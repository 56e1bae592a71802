//! # tensorkit
//!
//! **Device-aware strided tensors with zero-copy views.**
//!
//! tensorkit provides an n-dimensional [`Tensor`](tensor::Tensor) backed by a
//! reference-counted storage block on a CPU or CUDA device, Python-style
//! key indexing, broadcasting elementwise operations, `ndarray` and DLPack
//! interop, and a growable [`TensorList`](tensor_list::TensorList).
//!
//! ## Features
//!
//! - **Views**: indexing with `Index` and `Slice` keys, `transpose`, `reshape`
//!   and `broadcast_to` share storage; writes through one view are visible
//!   through every other
//! - **Gather/scatter**: `IndexList` keys copy on read and scatter on write
//! - **Elementwise ops**: arithmetic, comparison and logical operations, each
//!   with an in-place form that keeps the tensor's dtype
//! - **Dtypes**: f64, f32, i64, i32, u8, bool
//! - **Devices**: CPU and (emulated, budgeted) CUDA memory, with explicit
//!   transfers between them
//!
//! ## Quick Start
//!
//! ```
//! use tensorkit::prelude::*;
//!
//! let t = Tensor::from_host_buffer(&[0, 1, 2, 3, 4, 5], &[2, 3], DType::F32, &Device::cpu())?;
//! let row = t.get(&[TensorKey::Index(-1)])?; // view of [3, 4, 5]
//! row.add_(10)?;
//! assert_eq!(t.to_vec::<f32>()?, vec![0.0, 1.0, 2.0, 13.0, 14.0, 15.0]);
//!
//! let doubled = (&t * 2.0f32)?;
//! assert_eq!(doubled.get(&[TensorKey::Index(0), TensorKey::Index(2)])?.item::<f32>()?, 4.0);
//! # Ok::<(), tensorkit::error::Error>(())
//! ```
//!
//! ## Configuration
//!
//! The number of CUDA devices and their memory budget come from
//! [`config::RuntimeConfig`], read from the environment on first use or
//! installed explicitly with [`config::install`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod dtype;
pub mod error;
pub mod interop;
pub mod ops;
pub mod runtime;
pub mod tensor;
pub mod tensor_list;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::RuntimeConfig;
    pub use crate::dtype::{DType, Element};
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::ops::{Operand, Scalar};
    pub use crate::runtime::{CpuRuntime, CudaRuntime, Device, DeviceKind, Runtime};
    pub use crate::tensor::{Layout, Tensor, TensorKey};
    pub use crate::tensor_list::TensorList;
}
