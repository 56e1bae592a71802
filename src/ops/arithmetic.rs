//! Operation kinds for elementwise kernels

use crate::dtype::Element;

/// Compute the output shape for binary operations with broadcasting
///
/// Returns None if the shapes are incompatible for broadcasting.
pub fn broadcast_shape(a: &[usize], b: &[usize]) -> Option<Vec<usize>> {
    let max_ndim = a.len().max(b.len());
    let mut result = Vec::with_capacity(max_ndim);

    // Iterate from right to left
    for i in 0..max_ndim {
        let a_dim = if i < a.len() { a[a.len() - 1 - i] } else { 1 };
        let b_dim = if i < b.len() { b[b.len() - 1 - i] } else { 1 };

        if a_dim == b_dim {
            result.push(a_dim);
        } else if a_dim == 1 {
            result.push(b_dim);
        } else if b_dim == 1 {
            result.push(a_dim);
        } else {
            return None;
        }
    }

    result.reverse();
    Some(result)
}

/// Binary arithmetic operation kind
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    /// Addition: a + b
    Add,
    /// Subtraction: a - b
    Sub,
    /// Multiplication: a * b
    Mul,
    /// Division: a / b (integers truncate toward zero)
    Div,
}

impl BinaryOp {
    /// Operation name used in error messages
    pub const fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
        }
    }

    /// Apply to one pair of elements
    #[inline]
    pub fn apply<T: Element>(self, a: T, b: T) -> T {
        match self {
            Self::Add => a.elem_add(b),
            Self::Sub => a.elem_sub(b),
            Self::Mul => a.elem_mul(b),
            Self::Div => a.elem_div(b),
        }
    }
}

/// Comparison operation kind; results are always `Bool`
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CompareOp {
    /// a == b
    Eq,
    /// a != b
    Ne,
    /// a < b
    Lt,
    /// a <= b
    Le,
    /// a > b
    Gt,
    /// a >= b
    Ge,
}

impl CompareOp {
    /// Operation name used in error messages
    pub const fn name(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Lt => "lt",
            Self::Le => "le",
            Self::Gt => "gt",
            Self::Ge => "ge",
        }
    }

    /// Apply to one pair of elements
    #[inline]
    pub fn apply<T: Element>(self, a: T, b: T) -> bool {
        match self {
            Self::Eq => a == b,
            Self::Ne => a != b,
            Self::Lt => a < b,
            Self::Le => a <= b,
            Self::Gt => a > b,
            Self::Ge => a >= b,
        }
    }
}

/// Logical operation kind; operands are read as "non-zero is true"
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LogicalOp {
    /// a && b
    And,
    /// a || b
    Or,
    /// a != b (as truth values)
    Xor,
}

impl LogicalOp {
    /// Operation name used in error messages
    pub const fn name(self) -> &'static str {
        match self {
            Self::And => "logical_and",
            Self::Or => "logical_or",
            Self::Xor => "logical_xor",
        }
    }

    /// Apply to one pair of elements
    #[inline]
    pub fn apply<T: Element>(self, a: T, b: T) -> bool {
        let (a, b) = (a.truthy(), b.truthy());
        match self {
            Self::And => a && b,
            Self::Or => a || b,
            Self::Xor => a ^ b,
        }
    }
}

/// Unary operation kind
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    /// Absolute value: |a|
    Abs,
}

impl UnaryOp {
    /// Operation name used in error messages
    pub const fn name(self) -> &'static str {
        match self {
            Self::Abs => "abs",
        }
    }

    /// Apply to one element
    #[inline]
    pub fn apply<T: Element>(self, a: T) -> T {
        match self {
            Self::Abs => a.elem_abs(),
        }
    }
}
