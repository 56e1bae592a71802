//! Tensor types and operations
//!
//! This module provides the core `Tensor` type, which represents an n-dimensional
//! array stored on a compute device (CPU or CUDA), together with the keys used
//! to index it and the storage and layout it is built from.

mod conversion;
mod core;
mod elementwise;
mod indexing;
mod key;
mod layout;
mod storage;

pub use core::Tensor;
pub use key::TensorKey;
pub use layout::{Layout, Shape, Strides};
pub(crate) use layout::checked_numel;
pub use storage::Storage;
