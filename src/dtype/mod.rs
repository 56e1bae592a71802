//! Data type system for tensorkit tensors
//!
//! This module provides the `DType` enum representing all supported element types,
//! the mapping from host (Rust) types to dtypes, and name parsing.

mod element;

pub use element::Element;

use crate::error::{Error, Result};
use std::any::TypeId;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// DType Enum
// ============================================================================

/// Data types supported by tensorkit tensors
///
/// This enum represents the element type of a tensor at runtime. A tensor has
/// exactly one dtype for its whole lifetime.
///
/// # Discriminant Values (Serialization Stability)
///
/// The discriminant values are **stable** for serialization purposes and are
/// grouped by family:
/// - Floats: 0-9 (F64=0, F32=1)
/// - Signed ints: 10-19 (I64=10, I32=11)
/// - Unsigned ints: 20-29 (U8=23)
/// - Bool: 30
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DType {
    /// 64-bit floating point
    F64 = 0,
    /// 32-bit floating point (most common)
    F32 = 1,
    /// 64-bit signed integer
    I64 = 10,
    /// 32-bit signed integer
    I32 = 11,
    /// 8-bit unsigned integer
    U8 = 23,
    /// Boolean type, stored as one byte holding 0 or 1
    Bool = 30,
}

impl DType {
    /// All dtypes, in discriminant order
    pub const ALL: [DType; 6] = [
        DType::F64,
        DType::F32,
        DType::I64,
        DType::I32,
        DType::U8,
        DType::Bool,
    ];

    /// Size of one element in bytes
    #[inline]
    pub const fn size_in_bytes(self) -> usize {
        match self {
            Self::F64 | Self::I64 => 8,
            Self::F32 | Self::I32 => 4,
            Self::U8 | Self::Bool => 1,
        }
    }

    /// Returns true if this is a floating point type
    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F64 | Self::F32)
    }

    /// Returns true if this is any integer type (signed or unsigned)
    #[inline]
    pub const fn is_int(self) -> bool {
        matches!(self, Self::I64 | Self::I32 | Self::U8)
    }

    /// Returns true if this is a boolean type
    #[inline]
    pub const fn is_bool(self) -> bool {
        matches!(self, Self::Bool)
    }

    /// Returns true if this type can represent negative values
    #[inline]
    pub const fn is_signed(self) -> bool {
        matches!(self, Self::F64 | Self::F32 | Self::I64 | Self::I32)
    }

    /// Short name for display (e.g., "f32", "i64")
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::F64 => "f64",
            Self::F32 => "f32",
            Self::I64 => "i64",
            Self::I32 => "i32",
            Self::U8 => "u8",
            Self::Bool => "bool",
        }
    }

    /// Long name matching the host array library's spelling (e.g. "Float32")
    pub const fn long_name(self) -> &'static str {
        match self {
            Self::F64 => "Float64",
            Self::F32 => "Float32",
            Self::I64 => "Int64",
            Self::I32 => "Int32",
            Self::U8 => "UInt8",
            Self::Bool => "Bool",
        }
    }

    /// Map a host Rust type to its dtype
    ///
    /// Returns `UnsupportedType` when no mapping exists (for example `u16`,
    /// `i8`, or a complex pair).
    ///
    /// # Example
    /// ```
    /// use tensorkit::dtype::DType;
    /// assert_eq!(DType::from_host_type::<f32>().unwrap(), DType::F32);
    /// assert!(DType::from_host_type::<u16>().is_err());
    /// ```
    pub fn from_host_type<T: 'static>() -> Result<Self> {
        let id = TypeId::of::<T>();
        let dtype = if id == TypeId::of::<f64>() {
            Self::F64
        } else if id == TypeId::of::<f32>() {
            Self::F32
        } else if id == TypeId::of::<i64>() {
            Self::I64
        } else if id == TypeId::of::<i32>() {
            Self::I32
        } else if id == TypeId::of::<u8>() {
            Self::U8
        } else if id == TypeId::of::<bool>() {
            Self::Bool
        } else {
            return Err(Error::UnsupportedType {
                type_name: std::any::type_name::<T>().to_string(),
            });
        };
        Ok(dtype)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

impl FromStr for DType {
    type Err = Error;

    /// Parse a dtype from its short name ("f32"), long name ("Float32") or
    /// NumPy-style name ("float32"). Matching is case-insensitive.
    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        let dtype = match lower.as_str() {
            "f64" | "float64" | "double" => Self::F64,
            "f32" | "float32" | "float" => Self::F32,
            "i64" | "int64" | "long" => Self::I64,
            "i32" | "int32" | "int" => Self::I32,
            "u8" | "uint8" | "byte" => Self::U8,
            "bool" | "boolean" => Self::Bool,
            _ => {
                return Err(Error::UnsupportedType {
                    type_name: s.to_string(),
                })
            }
        };
        Ok(dtype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_size() {
        assert_eq!(DType::F64.size_in_bytes(), 8);
        assert_eq!(DType::F32.size_in_bytes(), 4);
        assert_eq!(DType::I64.size_in_bytes(), 8);
        assert_eq!(DType::I32.size_in_bytes(), 4);
        assert_eq!(DType::U8.size_in_bytes(), 1);
        assert_eq!(DType::Bool.size_in_bytes(), 1);
    }

    #[test]
    fn test_dtype_categories() {
        assert!(DType::F32.is_float());
        assert!(!DType::I32.is_float());
        assert!(DType::U8.is_int());
        assert!(!DType::U8.is_signed());
        assert!(DType::Bool.is_bool());
        assert!(!DType::Bool.is_int());
    }

    #[test]
    fn test_from_host_type() {
        assert_eq!(DType::from_host_type::<f64>().unwrap(), DType::F64);
        assert_eq!(DType::from_host_type::<i32>().unwrap(), DType::I32);
        assert_eq!(DType::from_host_type::<bool>().unwrap(), DType::Bool);

        let err = DType::from_host_type::<(f32, f32)>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedType { .. }));
        assert!(DType::from_host_type::<u16>().is_err());
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("Float32".parse::<DType>().unwrap(), DType::F32);
        assert_eq!("uint8".parse::<DType>().unwrap(), DType::U8);
        assert_eq!("i64".parse::<DType>().unwrap(), DType::I64);
        assert!("complex64".parse::<DType>().is_err());

        for dtype in DType::ALL {
            assert_eq!(dtype.long_name().parse::<DType>().unwrap(), dtype);
            assert_eq!(dtype.short_name().parse::<DType>().unwrap(), dtype);
        }
    }
}
