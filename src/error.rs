//! Error types for tensorkit

use crate::dtype::DType;
use crate::runtime::Device;
use thiserror::Error;

/// Result type alias using tensorkit's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tensorkit operations
///
/// Every error is raised before any tensor memory is written, so a failed
/// call never leaves an operand partially mutated.
#[derive(Error, Debug)]
pub enum Error {
    /// Shape mismatch in an operation
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected shape
        expected: Vec<usize>,
        /// Actual shape
        got: Vec<usize>,
    },

    /// Shapes cannot be broadcast together
    #[error("Cannot broadcast shapes {lhs:?} and {rhs:?}")]
    BroadcastError {
        /// Left-hand side shape
        lhs: Vec<usize>,
        /// Right-hand side shape
        rhs: Vec<usize>,
    },

    /// Invalid dimension index
    #[error("Invalid dimension {dim} for tensor with {ndim} dimensions")]
    InvalidDimension {
        /// The invalid dimension
        dim: isize,
        /// Number of dimensions
        ndim: usize,
    },

    /// Index out of bounds
    #[error("Index {index} out of bounds for dimension {dim} of size {size}")]
    IndexOutOfBounds {
        /// The invalid index, as given by the caller
        index: isize,
        /// Dimension being indexed
        dim: usize,
        /// Size of the dimension
        size: usize,
    },

    /// More index keys than the tensor has dimensions
    #[error("Too many indices: {keys} keys for tensor with {ndim} dimensions")]
    TooManyIndices {
        /// Number of keys supplied
        keys: usize,
        /// Number of dimensions
        ndim: usize,
    },

    /// Unsupported dtype for an operation
    #[error("Unsupported dtype {dtype:?} for operation '{op}'")]
    UnsupportedDType {
        /// The unsupported dtype
        dtype: DType,
        /// The operation name
        op: &'static str,
    },

    /// DType mismatch between operands
    #[error("DType mismatch: {lhs:?} vs {rhs:?}")]
    DTypeMismatch {
        /// Left-hand side dtype
        lhs: DType,
        /// Right-hand side dtype
        rhs: DType,
    },

    /// No dtype corresponds to a host type
    #[error("Unsupported host type '{type_name}': no dtype mapping")]
    UnsupportedType {
        /// Name of the host type
        type_name: String,
    },

    /// Device mismatch between operands
    #[error("Device mismatch: {lhs} vs {rhs}")]
    DeviceMismatch {
        /// Device of the left-hand operand
        lhs: Device,
        /// Device of the right-hand operand
        rhs: Device,
    },

    /// Requested device does not exist
    #[error("Device {device} is not available: {reason}")]
    DeviceUnavailable {
        /// The requested device
        device: Device,
        /// Why it is not available
        reason: String,
    },

    /// Operation requires host-resident memory
    #[error("Operation '{op}' requires a CPU tensor, tensor is on {device}")]
    NotHostAccessible {
        /// The operation name
        op: &'static str,
        /// Device the tensor lives on
        device: Device,
    },

    /// Out of memory
    #[error("Out of memory: failed to allocate {size} bytes on {device}")]
    OutOfMemory {
        /// Requested size in bytes
        size: usize,
        /// Device the allocation was attempted on
        device: Device,
    },

    /// Invalid argument provided to an operation
    #[error("Invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// The argument name
        arg: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// Tensor is not contiguous when contiguous memory is required
    #[error("Operation requires contiguous tensor")]
    NotContiguous,

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error category, one per class of contract violation
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Rank or dimension mismatch
    Shape,
    /// Out-of-range index key or too many keys
    Index,
    /// Incompatible element types
    DtypeMismatch,
    /// Device constraint violated
    Device,
    /// Memory exhausted
    Allocation,
    /// No dtype mapping for a host type
    UnsupportedType,
    /// Malformed argument, e.g. a zero-step slice
    Value,
    /// Broken internal invariant
    Internal,
}

impl Error {
    /// Create a shape mismatch error
    pub fn shape_mismatch(expected: &[usize], got: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
    }

    /// Create a broadcast error
    pub fn broadcast(lhs: &[usize], rhs: &[usize]) -> Self {
        Self::BroadcastError {
            lhs: lhs.to_vec(),
            rhs: rhs.to_vec(),
        }
    }

    /// Create an unsupported dtype error
    pub fn unsupported_dtype(dtype: DType, op: &'static str) -> Self {
        Self::UnsupportedDType { dtype, op }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(arg: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            arg,
            reason: reason.into(),
        }
    }

    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ShapeMismatch { .. }
            | Self::BroadcastError { .. }
            | Self::InvalidDimension { .. }
            | Self::NotContiguous => ErrorKind::Shape,
            Self::IndexOutOfBounds { .. } | Self::TooManyIndices { .. } => ErrorKind::Index,
            Self::UnsupportedDType { .. } | Self::DTypeMismatch { .. } => {
                ErrorKind::DtypeMismatch
            }
            Self::DeviceMismatch { .. }
            | Self::DeviceUnavailable { .. }
            | Self::NotHostAccessible { .. } => ErrorKind::Device,
            Self::OutOfMemory { .. } => ErrorKind::Allocation,
            Self::UnsupportedType { .. } => ErrorKind::UnsupportedType,
            Self::InvalidArgument { .. } => ErrorKind::Value,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}
