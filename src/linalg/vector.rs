/*!
Fixed-length vectors
*/
use super::{Matrix, Scalar};
use num::Float;
use rand::distributions::{uniform::SampleUniform, Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::{
    Add, AddAssign, BitAnd, Div, DivAssign, Index, IndexMut, Mul, MulAssign, Rem, RemAssign, Sub,
    SubAssign,
};

/// An `N`-dimensional vector with elements of type `T`
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Vector<T, const N: usize> {
    data: [T; N],
}

impl<T: Copy, const N: usize> Vector<T, N> {
    /// The dimension of this vector type
    pub const DIM: usize = N;

    const NONEMPTY: () = assert!(N > 0, "vector dimension must be strictly positive");

    /// Create a vector from its elements
    #[inline]
    pub fn from_array(data: [T; N]) -> Vector<T, N> {
        #[allow(clippy::let_unit_value)]
        let () = Self::NONEMPTY;
        Vector { data }
    }

    /// Create a vector with every element set to `value`
    #[inline]
    pub fn uniform(value: T) -> Vector<T, N> {
        Self::from_array([value; N])
    }

    /// Create a vector by evaluating `f(i)` for every index, in order
    pub fn from_fn<G: FnMut(usize) -> T>(mut f: G) -> Vector<T, N> {
        let mut result = Self::uniform(f(0));
        for i in 1..N {
            result.data[i] = f(i);
        }
        result
    }

    /// Borrow this vector's elements
    #[inline]
    pub fn as_array(&self) -> &[T; N] {
        &self.data
    }

    /// Iterate over this vector's elements
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Apply `f` to every element, in order
    pub fn for_each<G: FnMut(&mut T)>(&mut self, f: G) {
        self.data.iter_mut().for_each(f)
    }

    /// Map every element of this vector through `f`
    pub fn map<U: Copy, G: FnMut(T) -> U>(&self, mut f: G) -> Vector<U, N> {
        Vector::from_fn(|i| f(self.data[i]))
    }

    /// Combine this vector element-wise with another
    pub fn zip_map<G: FnMut(T, T) -> T>(&self, other: &Vector<T, N>, mut f: G) -> Vector<T, N> {
        Vector::from_fn(|i| f(self.data[i], other.data[i]))
    }
}

impl<T: Scalar, const N: usize> Vector<T, N> {
    /// A vector of zeros
    #[inline]
    pub fn zeros() -> Vector<T, N> {
        Self::uniform(T::zero())
    }

    /// A vector of ones
    #[inline]
    pub fn ones() -> Vector<T, N> {
        Self::uniform(T::one())
    }

    /// Multiply every element by a scalar
    #[inline]
    pub fn scale(&self, k: T) -> Vector<T, N> {
        self.map(|x| x * k)
    }

    /// The dot product of two vectors
    pub fn dot(&self, other: &Vector<T, N>) -> T {
        self.data
            .iter()
            .zip(other.data.iter())
            .fold(T::zero(), |sum, (&x, &y)| sum + x * y)
    }
}

impl<T: Scalar + Float, const N: usize> Vector<T, N> {
    /// The Euclidean length of this vector
    pub fn magnitude(&self) -> T {
        self.dot(self).sqrt()
    }

    /// This vector scaled to unit length
    pub fn normalize(&self) -> Vector<T, N> {
        let magnitude = self.magnitude();
        self.map(|x| x / magnitude)
    }
}

impl<T: Scalar> Vector<T, 3> {
    /// The cross product of two three-dimensional vectors
    pub fn cross(&self, other: &Vector<T, 3>) -> Vector<T, 3> {
        let [a0, a1, a2] = self.data;
        let [b0, b1, b2] = other.data;
        Vector::from_array([a1 * b2 - a2 * b1, a2 * b0 - a0 * b2, a0 * b1 - a1 * b0])
    }
}

impl<T: Scalar + SampleUniform, const N: usize> Vector<T, N> {
    /// A vector with elements drawn independently and uniformly from `[min, max]` using `rng`
    pub fn random_with<G: Rng + ?Sized>(min: T, max: T, rng: &mut G) -> Vector<T, N> {
        let dist: Uniform<T> = Uniform::new_inclusive(min, max);
        Self::from_fn(|_| dist.sample(&mut *rng))
    }

    /// A vector with elements drawn uniformly from `[min, max]`, reproducible given `seed`
    pub fn random_seeded(min: T, max: T, seed: u64) -> Vector<T, N> {
        Self::random_with(min, max, &mut StdRng::seed_from_u64(seed))
    }

    /// A vector with elements drawn uniformly from `[min, max]`, seeded from system entropy
    pub fn random(min: T, max: T) -> Vector<T, N> {
        Self::random_with(min, max, &mut StdRng::from_entropy())
    }
}

impl<T: Copy, const N: usize> From<[T; N]> for Vector<T, N> {
    #[inline]
    fn from(data: [T; N]) -> Vector<T, N> {
        Vector::from_array(data)
    }
}

impl<T: Copy, const N: usize> From<Vector<T, N>> for Matrix<T, N, 1> {
    #[inline]
    fn from(v: Vector<T, N>) -> Matrix<T, N, 1> {
        Matrix::from_fn(|i, _| v.data[i])
    }
}

impl<T: Copy, const N: usize> From<Matrix<T, N, 1>> for Vector<T, N> {
    #[inline]
    fn from(m: Matrix<T, N, 1>) -> Vector<T, N> {
        Vector::from_fn(|i| m[i][0])
    }
}

impl<T, const N: usize> Index<usize> for Vector<T, N> {
    type Output = T;
    #[inline]
    fn index(&self, i: usize) -> &T {
        &self.data[i]
    }
}

impl<T, const N: usize> IndexMut<usize> for Vector<T, N> {
    #[inline]
    fn index_mut(&mut self, i: usize) -> &mut T {
        &mut self.data[i]
    }
}

macro_rules! impl_elementwise {
    ($($op:ident::$method:ident, $assign:ident::$assign_method:ident;)*) => {
        $(
            impl<T: Scalar, const N: usize> $op for Vector<T, N> {
                type Output = Vector<T, N>;
                #[inline]
                fn $method(self, rhs: Vector<T, N>) -> Vector<T, N> {
                    self.zip_map(&rhs, |x, y| x.$method(y))
                }
            }

            impl<T: Scalar, const N: usize> $assign for Vector<T, N> {
                #[inline]
                fn $assign_method(&mut self, rhs: Vector<T, N>) {
                    *self = self.zip_map(&rhs, |x, y| x.$method(y))
                }
            }
        )*
    };
}

impl_elementwise! {
    Add::add, AddAssign::add_assign;
    Sub::sub, SubAssign::sub_assign;
    Mul::mul, MulAssign::mul_assign;
    Div::div, DivAssign::div_assign;
    Rem::rem, RemAssign::rem_assign;
}

impl_scalar_mul!(Vector<N>; f32 f64 i8 i16 i32 i64 i128 isize u8 u16 u32 u64 u128 usize);

/// The cross product
impl<T: Scalar> BitAnd for Vector<T, 3> {
    type Output = Vector<T, 3>;
    #[inline]
    fn bitand(self, rhs: Vector<T, 3>) -> Vector<T, 3> {
        self.cross(&rhs)
    }
}
