/*!
Fixed-dimension linear algebra.

Every container carries its shape in its type: a `Matrix<f32, 3, 2>` and a `Matrix<f32, 2, 3>` are different types,
so mismatched element-wise operations and matrix products with disagreeing inner dimensions are rejected by the
compiler rather than at runtime. The only runtime shape checks left are the ones a type cannot express: slice index
bounds, reshape element counts, and squareness for the determinant.

All containers are plain values. Arithmetic returns a fresh container; the only in-place mutation is through
[`Matrix::for_each`] and friends.
*/
use std::fmt::{self, Display, Formatter};
use thiserror::Error;

/// Implement `Mul<scalar>` and `MulAssign<scalar>` for a container over each listed primitive type.
///
/// These cannot be written generically over `T: Scalar` without overlapping the element-wise `Mul<Self>` impl.
macro_rules! impl_scalar_mul {
    (@one $container:ident [$($dim:ident),*] $t:ident) => {
        impl<$(const $dim: usize),*> std::ops::Mul<$t> for $container<$t, $($dim),*> {
            type Output = Self;
            #[inline]
            fn mul(self, rhs: $t) -> Self {
                self.scale(rhs)
            }
        }

        impl<$(const $dim: usize),*> std::ops::MulAssign<$t> for $container<$t, $($dim),*> {
            #[inline]
            fn mul_assign(&mut self, rhs: $t) {
                *self = self.scale(rhs)
            }
        }
    };
    (@each $container:ident $dims:tt; $($t:ident)*) => {
        $( impl_scalar_mul!(@one $container $dims $t); )*
    };
    ($container:ident<$($dim:ident),*>; $($t:ident)*) => {
        impl_scalar_mul!(@each $container [$($dim),*]; $($t)*);
    };
}

mod matrix;
mod tensor;
mod vector;

pub use matrix::Matrix;
pub use tensor::Tensor;
pub use vector::Vector;

/// The element types the containers in this module support
pub trait Scalar: num::Num + Copy + PartialOrd {}

impl<T: num::Num + Copy + PartialOrd> Scalar for T {}

/// A matrix axis, used for error reporting
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Axis {
    /// The row axis
    Row,
    /// The column axis
    Column,
}

impl Display for Axis {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Axis::Row => write!(f, "row"),
            Axis::Column => write!(f, "column"),
        }
    }
}

/// A recoverable error in a linear algebra operation
#[derive(Debug, Copy, Clone, Eq, PartialEq, Error)]
pub enum LinalgError {
    /// A selected index lies outside of the source container
    #[error("{axis} index {index} out of range for dimension {bound}")]
    OutOfRange {
        /// The axis the index selects along
        axis: Axis,
        /// The offending index
        index: usize,
        /// The size of the source container along `axis`
        bound: usize,
    },
    /// The operation is only defined for square matrices
    #[error("operation requires a square matrix, got {rows}x{cols}")]
    NotSquare {
        /// The number of rows
        rows: usize,
        /// The number of columns
        cols: usize,
    },
}
