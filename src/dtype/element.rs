//! Element trait for mapping Rust types to DType

use super::DType;
use bytemuck::NoUninit;
use std::fmt::Debug;

/// Trait for types that can be elements of a tensor
///
/// This trait connects Rust's type system to tensorkit's runtime dtype system.
/// It's implemented for `f64`, `f32`, `i64`, `i32`, `u8` and `bool`.
///
/// # Bounds
/// - `Copy + Send + Sync + 'static` - Basic trait requirements
/// - `NoUninit` - Safe view as bytes when copying to a device (bytemuck)
/// - `PartialOrd` - Comparison kernels
///
/// Arithmetic goes through the `elem_*` methods rather than `std::ops` so that
/// integer kernels wrap instead of panicking on overflow.
pub trait Element: Copy + Send + Sync + NoUninit + PartialOrd + Debug + 'static {
    /// The corresponding DType for this Rust type
    const DTYPE: DType;

    /// Convert to f64 for float conversions
    fn to_f64(self) -> f64;

    /// Convert from f64, truncating toward zero for integer types
    fn from_f64(v: f64) -> Self;

    /// Convert to i64 for exact integer conversions
    fn to_i64(self) -> i64;

    /// Convert from i64, wrapping for narrower integer types
    fn from_i64(v: i64) -> Self;

    /// Zero value
    fn zero() -> Self;

    /// One value
    fn one() -> Self;

    /// Truth value: zero is false, everything else is true
    fn truthy(self) -> bool;

    /// Convert a boolean to this type (1 or 0)
    fn from_bool(v: bool) -> Self;

    /// Elementwise addition
    fn elem_add(self, rhs: Self) -> Self;

    /// Elementwise subtraction
    fn elem_sub(self, rhs: Self) -> Self;

    /// Elementwise multiplication
    fn elem_mul(self, rhs: Self) -> Self;

    /// Elementwise division. Integer division truncates toward zero;
    /// callers must rule out a zero integer divisor beforehand.
    fn elem_div(self, rhs: Self) -> Self;

    /// Absolute value
    fn elem_abs(self) -> Self;

    /// Cast to another element type
    ///
    /// Conversions involving a float go through f64 (`as` semantics:
    /// truncation toward zero, saturating at the integer bounds). Integer to
    /// integer conversions go through i64 and wrap. Anything cast to `bool`
    /// is "non-zero".
    #[inline]
    fn cast<U: Element>(self) -> U {
        if U::DTYPE == DType::Bool {
            U::from_bool(self.truthy())
        } else if Self::DTYPE.is_float() || U::DTYPE.is_float() {
            U::from_f64(self.to_f64())
        } else {
            U::from_i64(self.to_i64())
        }
    }
}

macro_rules! impl_float_element {
    ($ty:ty, $dtype:expr) => {
        impl Element for $ty {
            const DTYPE: DType = $dtype;

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(v: f64) -> Self {
                v as $ty
            }

            #[inline]
            fn to_i64(self) -> i64 {
                self as i64
            }

            #[inline]
            fn from_i64(v: i64) -> Self {
                v as $ty
            }

            #[inline]
            fn zero() -> Self {
                0.0
            }

            #[inline]
            fn one() -> Self {
                1.0
            }

            #[inline]
            fn truthy(self) -> bool {
                self != 0.0
            }

            #[inline]
            fn from_bool(v: bool) -> Self {
                if v {
                    1.0
                } else {
                    0.0
                }
            }

            #[inline]
            fn elem_add(self, rhs: Self) -> Self {
                self + rhs
            }

            #[inline]
            fn elem_sub(self, rhs: Self) -> Self {
                self - rhs
            }

            #[inline]
            fn elem_mul(self, rhs: Self) -> Self {
                self * rhs
            }

            #[inline]
            fn elem_div(self, rhs: Self) -> Self {
                self / rhs
            }

            #[inline]
            fn elem_abs(self) -> Self {
                self.abs()
            }
        }
    };
}

macro_rules! impl_int_element {
    ($ty:ty, $dtype:expr, $abs:expr) => {
        impl Element for $ty {
            const DTYPE: DType = $dtype;

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(v: f64) -> Self {
                v as $ty
            }

            #[inline]
            fn to_i64(self) -> i64 {
                self as i64
            }

            #[inline]
            fn from_i64(v: i64) -> Self {
                v as $ty
            }

            #[inline]
            fn zero() -> Self {
                0
            }

            #[inline]
            fn one() -> Self {
                1
            }

            #[inline]
            fn truthy(self) -> bool {
                self != 0
            }

            #[inline]
            fn from_bool(v: bool) -> Self {
                v as $ty
            }

            #[inline]
            fn elem_add(self, rhs: Self) -> Self {
                self.wrapping_add(rhs)
            }

            #[inline]
            fn elem_sub(self, rhs: Self) -> Self {
                self.wrapping_sub(rhs)
            }

            #[inline]
            fn elem_mul(self, rhs: Self) -> Self {
                self.wrapping_mul(rhs)
            }

            #[inline]
            fn elem_div(self, rhs: Self) -> Self {
                self.wrapping_div(rhs)
            }

            #[inline]
            fn elem_abs(self) -> Self {
                let abs: fn($ty) -> $ty = $abs;
                abs(self)
            }
        }
    };
}

impl_float_element!(f64, DType::F64);
impl_float_element!(f32, DType::F32);
impl_int_element!(i64, DType::I64, i64::wrapping_abs);
impl_int_element!(i32, DType::I32, i32::wrapping_abs);
impl_int_element!(u8, DType::U8, std::convert::identity);

// Bool arithmetic is rejected before reaching a kernel; the lattice operations
// below only keep the trait total.
impl Element for bool {
    const DTYPE: DType = DType::Bool;

    #[inline]
    fn to_f64(self) -> f64 {
        if self {
            1.0
        } else {
            0.0
        }
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v != 0.0
    }

    #[inline]
    fn to_i64(self) -> i64 {
        self as i64
    }

    #[inline]
    fn from_i64(v: i64) -> Self {
        v != 0
    }

    #[inline]
    fn zero() -> Self {
        false
    }

    #[inline]
    fn one() -> Self {
        true
    }

    #[inline]
    fn truthy(self) -> bool {
        self
    }

    #[inline]
    fn from_bool(v: bool) -> Self {
        v
    }

    #[inline]
    fn elem_add(self, rhs: Self) -> Self {
        self | rhs
    }

    #[inline]
    fn elem_sub(self, rhs: Self) -> Self {
        self ^ rhs
    }

    #[inline]
    fn elem_mul(self, rhs: Self) -> Self {
        self & rhs
    }

    #[inline]
    fn elem_div(self, _rhs: Self) -> Self {
        self
    }

    #[inline]
    fn elem_abs(self) -> Self {
        self
    }
}
