//! Elementwise operation kinds and operand plumbing
//!
//! The tensor methods in `tensor::elementwise` are thin wrappers: they
//! validate operands, pick an op kind from this module, and hand the strided
//! layouts to the kernels in `runtime::cpu::kernels`.
//!
//! ```text
//! Tensor::add(&self, rhs: impl Into<Operand>)
//!   ├── Operand::Tensor | Operand::Scalar   (scalar.rs)
//!   ├── broadcast_shape                     (arithmetic.rs)
//!   └── dispatch_dtype!(dtype, T => kernel) (dispatch.rs)
//! ```

mod arithmetic;
pub(crate) mod dispatch;
mod scalar;

pub use arithmetic::{BinaryOp, CompareOp, LogicalOp, UnaryOp, broadcast_shape};
pub use scalar::{Operand, Scalar};
