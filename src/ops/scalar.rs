//! Scalar values and the right-hand operand of elementwise ops

use crate::dtype::Element;
use crate::tensor::Tensor;

/// A host scalar, widened to one of three kinds
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Scalar {
    /// Boolean
    Bool(bool),
    /// Any integer, widened to i64
    Int(i64),
    /// Any float, widened to f64
    Float(f64),
}

impl Scalar {
    /// Coerce to element type `T` with the usual cast rules
    #[inline]
    pub fn cast<T: Element>(self) -> T {
        match self {
            Self::Bool(v) => v.cast::<T>(),
            Self::Int(v) => v.cast::<T>(),
            Self::Float(v) => v.cast::<T>(),
        }
    }
}

macro_rules! impl_scalar_from {
    ($variant:ident, $wide:ty: $($ty:ty),*) => {
        $(
            impl From<$ty> for Scalar {
                #[inline]
                fn from(v: $ty) -> Self {
                    Self::$variant(v as $wide)
                }
            }

            impl From<$ty> for Operand<'_> {
                #[inline]
                fn from(v: $ty) -> Self {
                    Operand::Scalar(Scalar::from(v))
                }
            }
        )*
    };
}

impl_scalar_from!(Float, f64: f64, f32);
impl_scalar_from!(Int, i64: i64, i32, u8, usize);

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<bool> for Operand<'_> {
    fn from(v: bool) -> Self {
        Operand::Scalar(Scalar::Bool(v))
    }
}

/// Right-hand side of a binary op or the value of an indexed assignment
#[derive(Copy, Clone, Debug)]
pub enum Operand<'a> {
    /// A tensor, broadcast against the other side
    Tensor(&'a Tensor),
    /// A scalar, coerced to the other side's dtype
    Scalar(Scalar),
}

impl<'a> From<&'a Tensor> for Operand<'a> {
    fn from(t: &'a Tensor) -> Self {
        Operand::Tensor(t)
    }
}

impl From<Scalar> for Operand<'_> {
    fn from(s: Scalar) -> Self {
        Operand::Scalar(s)
    }
}
