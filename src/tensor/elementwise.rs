//! Elementwise arithmetic, comparison and logical operations
//!
//! Every operation comes as a pair: `op` returns a new tensor, `op_` writes the
//! result back into `self` and keeps `self`'s dtype. The right-hand side is a
//! tensor (broadcast against `self`) or a host scalar (cast to `self`'s dtype).
//!
//! | Family     | Methods                                      | Output dtype |
//! |------------|----------------------------------------------|--------------|
//! | arithmetic | `add sub mul div`                            | input dtype  |
//! | comparison | `eq ne lt le gt ge`                          | `Bool`       |
//! | logical    | `logical_and logical_or logical_xor`         | `Bool`       |

use super::Tensor;
use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::ops::{BinaryOp, CompareOp, LogicalOp, Operand, Scalar, UnaryOp, broadcast_shape};
use crate::runtime::cpu::kernels;

#[derive(Copy, Clone, Debug)]
enum ElementwiseOp {
    Binary(BinaryOp),
    Compare(CompareOp),
    Logical(LogicalOp),
}

impl ElementwiseOp {
    fn name(self) -> &'static str {
        match self {
            Self::Binary(op) => op.name(),
            Self::Compare(op) => op.name(),
            Self::Logical(op) => op.name(),
        }
    }

    fn output_dtype(self, input: DType) -> DType {
        match self {
            Self::Binary(_) => input,
            Self::Compare(_) | Self::Logical(_) => DType::Bool,
        }
    }
}

impl Tensor {
    /// Turn the right-hand operand into a tensor on `self`'s device
    ///
    /// Scalars become 0-d tensors of `self`'s dtype. Tensors must share the
    /// device; with `coerce` they are cast to `self`'s dtype, otherwise the
    /// dtypes must already match.
    fn rhs_tensor(&self, rhs: Operand<'_>, coerce: bool) -> Result<Tensor> {
        match rhs {
            Operand::Scalar(s) => Tensor::full(&[], self.dtype(), s, self.device()),
            Operand::Tensor(t) => {
                if t.device() != self.device() {
                    return Err(Error::DeviceMismatch {
                        lhs: *self.device(),
                        rhs: *t.device(),
                    });
                }
                if t.dtype() == self.dtype() {
                    Ok(t.clone())
                } else if coerce {
                    t.to(self.dtype(), true)
                } else {
                    Err(Error::DTypeMismatch {
                        lhs: self.dtype(),
                        rhs: t.dtype(),
                    })
                }
            }
        }
    }

    /// Validate `op` on `self` and `rhs`, returning the broadcast output shape
    fn check_elementwise(&self, op: ElementwiseOp, rhs: &Tensor) -> Result<Vec<usize>> {
        if let ElementwiseOp::Binary(binary) = op {
            if self.dtype().is_bool() {
                return Err(Error::unsupported_dtype(self.dtype(), op.name()));
            }
            if binary == BinaryOp::Div && !self.dtype().is_float() && rhs.contains_zero() {
                return Err(Error::invalid_argument(
                    "rhs",
                    format!("integer division by zero in {} tensor", self.dtype()),
                ));
            }
        }

        broadcast_shape(self.shape(), rhs.shape())
            .ok_or_else(|| Error::broadcast(self.shape(), rhs.shape()))
    }

    fn contains_zero(&self) -> bool {
        crate::dispatch_dtype!(self.dtype(), T => {
            unsafe {
                kernels::any_zero_strided::<T>(
                    self.data_ptr::<T>(),
                    self.shape(),
                    self.strides(),
                    self.offset() as isize,
                )
            }
        })
    }

    /// Run `op` into a fresh contiguous output
    fn elementwise(&self, op: ElementwiseOp, rhs: &Tensor, out_shape: &[usize]) -> Result<Tensor> {
        let lhs = self.broadcast_to(out_shape)?;
        let rhs = rhs.broadcast_to(out_shape)?;
        let out = Tensor::empty(out_shape, op.output_dtype(self.dtype()), self.device())?;

        let (a_strides, b_strides) = (lhs.strides(), rhs.strides());
        let (a_offset, b_offset) = (lhs.offset() as isize, rhs.offset() as isize);

        crate::dispatch_dtype!(self.dtype(), T => {
            let a = lhs.data_ptr::<T>();
            let b = rhs.data_ptr::<T>();
            unsafe {
                match op {
                    ElementwiseOp::Binary(op) => kernels::binary_op_strided_kernel::<T>(
                        op,
                        a,
                        b,
                        out.data_ptr::<T>() as *mut T,
                        out_shape,
                        a_strides,
                        b_strides,
                        a_offset,
                        b_offset,
                    ),
                    ElementwiseOp::Compare(op) => kernels::compare_op_strided_kernel::<T>(
                        op,
                        a,
                        b,
                        out.data_ptr::<bool>() as *mut bool,
                        out_shape,
                        a_strides,
                        b_strides,
                        a_offset,
                        b_offset,
                    ),
                    ElementwiseOp::Logical(op) => kernels::logical_op_strided_kernel::<T>(
                        op,
                        a,
                        b,
                        out.data_ptr::<bool>() as *mut bool,
                        out_shape,
                        a_strides,
                        b_strides,
                        a_offset,
                        b_offset,
                    ),
                }
            }
        });
        Ok(out)
    }

    fn apply_elementwise(&self, op: ElementwiseOp, rhs: Operand<'_>) -> Result<Tensor> {
        let rhs = self.rhs_tensor(rhs, false)?;
        let out_shape = self.check_elementwise(op, &rhs)?;
        self.elementwise(op, &rhs, &out_shape)
    }

    fn apply_elementwise_(&self, op: ElementwiseOp, rhs: Operand<'_>) -> Result<&Self> {
        let rhs = self.rhs_tensor(rhs, true)?;
        let out_shape = self.check_elementwise(op, &rhs)?;
        if out_shape != self.shape() {
            return Err(Error::broadcast(self.shape(), rhs.shape()));
        }

        // Compute into a temporary first so that an operand aliasing `self`
        // is read in full before the write-back.
        let result = self.elementwise(op, &rhs, &out_shape)?;
        result.copy_into(self)?;
        Ok(self)
    }

    /// Absolute value, as a new tensor
    pub fn abs(&self) -> Result<Tensor> {
        let op = UnaryOp::Abs;
        if self.dtype().is_bool() {
            return Err(Error::unsupported_dtype(self.dtype(), op.name()));
        }

        let out = Tensor::empty(self.shape(), self.dtype(), self.device())?;
        crate::dispatch_dtype!(self.dtype(), T => {
            unsafe {
                kernels::unary_op_strided_kernel::<T>(
                    op,
                    self.data_ptr::<T>(),
                    out.data_ptr::<T>() as *mut T,
                    self.shape(),
                    self.strides(),
                    self.offset() as isize,
                );
            }
        });
        Ok(out)
    }

    /// Absolute value, in place
    pub fn abs_(&self) -> Result<&Self> {
        self.abs()?.copy_into(self)?;
        Ok(self)
    }
}

macro_rules! elementwise_methods {
    ($($name:ident => $op:expr, $doc:literal;)*) => {
        paste::paste! {
            impl Tensor {
                $(
                    #[doc = $doc]
                    ///
                    /// Tensor operands must share `self`'s dtype and device; scalars are
                    /// cast to `self`'s dtype.
                    pub fn $name<'a>(&self, rhs: impl Into<Operand<'a>>) -> Result<Tensor> {
                        self.apply_elementwise($op, rhs.into())
                    }

                    #[doc = concat!("In-place form of [`Tensor::", stringify!($name), "`]")]
                    ///
                    /// The operand is cast to `self`'s dtype and the result is written back
                    /// without changing it. The broadcast result must have `self`'s shape.
                    pub fn [<$name _>]<'a>(&self, rhs: impl Into<Operand<'a>>) -> Result<&Self> {
                        self.apply_elementwise_($op, rhs.into())
                    }
                )*
            }
        }
    };
}

elementwise_methods! {
    add => ElementwiseOp::Binary(BinaryOp::Add), "Elementwise sum";
    sub => ElementwiseOp::Binary(BinaryOp::Sub), "Elementwise difference";
    mul => ElementwiseOp::Binary(BinaryOp::Mul), "Elementwise product";
    div => ElementwiseOp::Binary(BinaryOp::Div), "Elementwise quotient; integer dtypes truncate toward zero and reject a zero divisor";
    eq => ElementwiseOp::Compare(CompareOp::Eq), "Elementwise `==`, as a `Bool` tensor";
    ne => ElementwiseOp::Compare(CompareOp::Ne), "Elementwise `!=`, as a `Bool` tensor";
    lt => ElementwiseOp::Compare(CompareOp::Lt), "Elementwise `<`, as a `Bool` tensor";
    le => ElementwiseOp::Compare(CompareOp::Le), "Elementwise `<=`, as a `Bool` tensor";
    gt => ElementwiseOp::Compare(CompareOp::Gt), "Elementwise `>`, as a `Bool` tensor";
    ge => ElementwiseOp::Compare(CompareOp::Ge), "Elementwise `>=`, as a `Bool` tensor";
    logical_and => ElementwiseOp::Logical(LogicalOp::And), "Elementwise logical AND (non-zero is true), as a `Bool` tensor";
    logical_or => ElementwiseOp::Logical(LogicalOp::Or), "Elementwise logical OR (non-zero is true), as a `Bool` tensor";
    logical_xor => ElementwiseOp::Logical(LogicalOp::Xor), "Elementwise logical XOR (non-zero is true), as a `Bool` tensor";
}

macro_rules! impl_operator {
    ($trait:ident, $method:ident) => {
        impl<'a> std::ops::$trait<&'a Tensor> for &Tensor {
            type Output = Result<Tensor>;

            fn $method(self, rhs: &'a Tensor) -> Result<Tensor> {
                Tensor::$method(self, rhs)
            }
        }

        impl_operator!(@scalar $trait, $method, f64, f32, i64, i32, u8, usize, Scalar);
    };
    (@scalar $trait:ident, $method:ident, $($s:ty),*) => {
        $(
            impl std::ops::$trait<$s> for &Tensor {
                type Output = Result<Tensor>;

                fn $method(self, rhs: $s) -> Result<Tensor> {
                    Tensor::$method(self, Operand::Scalar(rhs.into()))
                }
            }
        )*
    };
}

impl_operator!(Add, add);
impl_operator!(Sub, sub);
impl_operator!(Mul, mul);
impl_operator!(Div, div);
