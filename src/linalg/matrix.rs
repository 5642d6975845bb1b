/*!
Dense row-major matrices with compile-time dimensions
*/
use super::{Axis, LinalgError, Scalar};
use itertools::iproduct;
use rand::distributions::{uniform::SampleUniform, Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::{
    Add, AddAssign, BitAnd, Div, DivAssign, Index, IndexMut, Mul, MulAssign, Rem, RemAssign, Sub,
    SubAssign,
};

/// An `R x C` matrix with elements of type `T`, stored inline in row-major order
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Matrix<T, const R: usize, const C: usize> {
    data: [[T; C]; R],
}

impl<T: Copy, const R: usize, const C: usize> Matrix<T, R, C> {
    /// The number of rows of this matrix type
    pub const ROWS: usize = R;
    /// The number of columns of this matrix type
    pub const COLS: usize = C;

    const NONEMPTY: () = assert!(R > 0 && C > 0, "matrix dimensions must be strictly positive");

    /// Create a matrix from its rows
    #[inline]
    pub fn from_rows(data: [[T; C]; R]) -> Matrix<T, R, C> {
        #[allow(clippy::let_unit_value)]
        let () = Self::NONEMPTY;
        Matrix { data }
    }

    /// Create a matrix with every element set to `value`
    #[inline]
    pub fn uniform(value: T) -> Matrix<T, R, C> {
        Self::from_rows([[value; C]; R])
    }

    /// Create a matrix by evaluating `f(row, col)` for every position, in row-major order
    pub fn from_fn<G: FnMut(usize, usize) -> T>(mut f: G) -> Matrix<T, R, C> {
        let mut result = Self::uniform(f(0, 0));
        for (i, j) in iproduct!(0..R, 0..C).skip(1) {
            result.data[i][j] = f(i, j);
        }
        result
    }

    /// Get the element at `(row, col)`, or `None` if out of bounds
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        self.data.get(row)?.get(col).copied()
    }

    /// Set the element at `(row, col)`. Panics if out of bounds.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: T) {
        self.data[row][col] = value
    }

    /// Borrow the rows of this matrix
    #[inline]
    pub fn rows(&self) -> &[[T; C]; R] {
        &self.data
    }

    /// Iterate over the elements of this matrix in row-major order
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.data.iter().flat_map(|row| row.iter())
    }

    /// Apply `f` to every element, in row-major order
    pub fn for_each<G: FnMut(&mut T)>(&mut self, mut f: G) {
        for row in self.data.iter_mut() {
            for value in row.iter_mut() {
                f(value)
            }
        }
    }

    /// Apply `f` to every element along with its `(row, col)` position, in row-major order
    pub fn for_each_indexed<G: FnMut(&mut T, usize, usize)>(&mut self, mut f: G) {
        for (i, j) in iproduct!(0..R, 0..C) {
            f(&mut self.data[i][j], i, j)
        }
    }

    /// Map every element of this matrix through `f`
    pub fn map<U: Copy, G: FnMut(T) -> U>(&self, mut f: G) -> Matrix<U, R, C> {
        Matrix::from_fn(|i, j| f(self.data[i][j]))
    }

    /// Combine this matrix element-wise with another of the same shape
    pub fn zip_map<G: FnMut(T, T) -> T>(&self, other: &Matrix<T, R, C>, mut f: G) -> Matrix<T, R, C> {
        Matrix::from_fn(|i, j| f(self.data[i][j], other.data[i][j]))
    }

    /// Get the transpose of this matrix
    pub fn transpose(&self) -> Matrix<T, C, R> {
        Matrix::from_fn(|i, j| self.data[j][i])
    }

    /// Reinterpret this matrix's elements, in row-major order, as an `R2 x C2` matrix.
    ///
    /// Panics if `R2 * C2 != R * C`.
    pub fn reshape<const R2: usize, const C2: usize>(&self) -> Matrix<T, R2, C2> {
        assert_eq!(
            R2 * C2,
            R * C,
            "cannot reshape a {}x{} matrix into a {}x{} matrix",
            R,
            C,
            R2,
            C2
        );
        Matrix::from_fn(|i, j| {
            let k = i * C2 + j;
            self.data[k / C][k % C]
        })
    }

    /// Select the given rows and columns, in the given order, as an `SR x SC` matrix.
    ///
    /// Panics if `rows.len() != SR` or `cols.len() != SC`; returns an error if any index is out of range.
    pub fn splice<const SR: usize, const SC: usize>(
        &self,
        rows: &[usize],
        cols: &[usize],
    ) -> Result<Matrix<T, SR, SC>, LinalgError> {
        assert_eq!(rows.len(), SR, "row selection must cover exactly {} rows", SR);
        assert_eq!(cols.len(), SC, "column selection must cover exactly {} columns", SC);
        if let Some(&index) = rows.iter().find(|&&row| row >= R) {
            return Err(LinalgError::OutOfRange {
                axis: Axis::Row,
                index,
                bound: R,
            });
        }
        if let Some(&index) = cols.iter().find(|&&col| col >= C) {
            return Err(LinalgError::OutOfRange {
                axis: Axis::Column,
                index,
                bound: C,
            });
        }
        Ok(Matrix::from_fn(|i, j| self.data[rows[i]][cols[j]]))
    }

    /// Whether this matrix is square
    #[inline]
    pub fn is_square(&self) -> bool {
        R == C
    }
}

impl<T: Copy + PartialEq, const R: usize, const C: usize> Matrix<T, R, C> {
    /// Whether this matrix is square and equal to its transpose
    pub fn is_symmetric(&self) -> bool {
        if !self.is_square() {
            return false;
        }
        iproduct!(0..R, 0..C).all(|(i, j)| self.data[i][j] == self.data[j][i])
    }
}

impl<T: Scalar, const R: usize, const C: usize> Matrix<T, R, C> {
    /// A matrix of zeros
    #[inline]
    pub fn zeros() -> Matrix<T, R, C> {
        Self::uniform(T::zero())
    }

    /// A matrix of ones
    #[inline]
    pub fn ones() -> Matrix<T, R, C> {
        Self::uniform(T::one())
    }

    /// A matrix with ones on its main diagonal and zeros elsewhere
    #[inline]
    pub fn identity() -> Matrix<T, R, C> {
        Self::eye(0)
    }

    /// A matrix with ones on the diagonal shifted right by `offset` and zeros elsewhere.
    ///
    /// Panics unless `-C < offset < C`.
    pub fn eye(offset: isize) -> Matrix<T, R, C> {
        let cols = C as isize;
        assert!(
            offset > -cols && offset < cols,
            "diagonal offset {} out of range for {} columns",
            offset,
            C
        );
        Self::from_fn(|i, j| {
            if i as isize + offset == j as isize {
                T::one()
            } else {
                T::zero()
            }
        })
    }

    /// Multiply every element by a scalar
    #[inline]
    pub fn scale(&self, k: T) -> Matrix<T, R, C> {
        self.map(|x| x * k)
    }

    /// The matrix product of this `R x C` matrix with a `C x K` matrix
    pub fn matmul<const K: usize>(&self, other: &Matrix<T, C, K>) -> Matrix<T, R, K> {
        Matrix::from_fn(|i, j| {
            (0..C).fold(T::zero(), |sum, k| sum + self.data[i][k] * other.data[k][j])
        })
    }

    /// The determinant of this matrix, by cofactor expansion along the first row.
    ///
    /// This takes time exponential in the dimension, and is only meant for small matrices.
    pub fn determinant(&self) -> Result<T, LinalgError> {
        if !self.is_square() {
            return Err(LinalgError::NotSquare { rows: R, cols: C });
        }
        let rows: Vec<usize> = (0..R).collect();
        let cols: Vec<usize> = (0..C).collect();
        Ok(self.minor_determinant(&rows, &cols))
    }

    /// The determinant of the square submatrix selected by `rows` and `cols`
    fn minor_determinant(&self, rows: &[usize], cols: &[usize]) -> T {
        let d = &self.data;
        match rows.len() {
            1 => d[rows[0]][cols[0]],
            2 => {
                d[rows[0]][cols[0]] * d[rows[1]][cols[1]] - d[rows[0]][cols[1]] * d[rows[1]][cols[0]]
            }
            _ => {
                let mut det = T::zero();
                for (i, &col) in cols.iter().enumerate() {
                    let minor_cols: Vec<usize> = cols.iter().copied().filter(|&c| c != col).collect();
                    let term = d[rows[0]][col] * self.minor_determinant(&rows[1..], &minor_cols);
                    if i % 2 == 0 {
                        det = det + term
                    } else {
                        det = det - term
                    }
                }
                det
            }
        }
    }
}

impl<T: Scalar + SampleUniform, const R: usize, const C: usize> Matrix<T, R, C> {
    /// A matrix with elements drawn independently and uniformly from `[min, max]` using `rng`
    pub fn random_with<G: Rng + ?Sized>(min: T, max: T, rng: &mut G) -> Matrix<T, R, C> {
        let dist: Uniform<T> = Uniform::new_inclusive(min, max);
        Self::from_fn(|_, _| dist.sample(&mut *rng))
    }

    /// A matrix with elements drawn uniformly from `[min, max]`, reproducible given `seed`
    pub fn random_seeded(min: T, max: T, seed: u64) -> Matrix<T, R, C> {
        Self::random_with(min, max, &mut StdRng::seed_from_u64(seed))
    }

    /// A matrix with elements drawn uniformly from `[min, max]`, seeded from system entropy
    pub fn random(min: T, max: T) -> Matrix<T, R, C> {
        Self::random_with(min, max, &mut StdRng::from_entropy())
    }
}

impl<T, const R: usize, const C: usize> From<[[T; C]; R]> for Matrix<T, R, C>
where
    T: Copy,
{
    #[inline]
    fn from(data: [[T; C]; R]) -> Matrix<T, R, C> {
        Matrix::from_rows(data)
    }
}

impl<T, const R: usize, const C: usize> Index<usize> for Matrix<T, R, C> {
    type Output = [T; C];
    #[inline]
    fn index(&self, row: usize) -> &[T; C] {
        &self.data[row]
    }
}

impl<T, const R: usize, const C: usize> IndexMut<usize> for Matrix<T, R, C> {
    #[inline]
    fn index_mut(&mut self, row: usize) -> &mut [T; C] {
        &mut self.data[row]
    }
}

impl<T, const R: usize, const C: usize> Index<(usize, usize)> for Matrix<T, R, C> {
    type Output = T;
    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &T {
        &self.data[row][col]
    }
}

impl<T, const R: usize, const C: usize> IndexMut<(usize, usize)> for Matrix<T, R, C> {
    #[inline]
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut T {
        &mut self.data[row][col]
    }
}

macro_rules! impl_elementwise {
    ($($op:ident::$method:ident, $assign:ident::$assign_method:ident;)*) => {
        $(
            impl<T: Scalar, const R: usize, const C: usize> $op for Matrix<T, R, C> {
                type Output = Matrix<T, R, C>;
                #[inline]
                fn $method(self, rhs: Matrix<T, R, C>) -> Matrix<T, R, C> {
                    self.zip_map(&rhs, |x, y| x.$method(y))
                }
            }

            impl<T: Scalar, const R: usize, const C: usize> $assign for Matrix<T, R, C> {
                #[inline]
                fn $assign_method(&mut self, rhs: Matrix<T, R, C>) {
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

impl_scalar_mul!(Matrix<R, C>; f32 f64 i8 i16 i32 i64 i128 isize u8 u16 u32 u64 u128 usize);

/// The matrix product
impl<T: Scalar, const R: usize, const C: usize, const K: usize> BitAnd<Matrix<T, C, K>>
    for Matrix<T, R, C>
{
    type Output = Matrix<T, R, K>;
    #[inline]
    fn bitand(self, rhs: Matrix<T, C, K>) -> Matrix<T, R, K> {
        self.matmul(&rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_by_three() -> Matrix<i64, 3, 3> {
        Matrix::from_rows([[1, 2, 3], [4, 5, 6], [7, 8, 9]])
    }

    #[test]
    fn construction() {
        let zeros = Matrix::<f32, 2, 3>::zeros();
        assert!(zeros.iter().all(|&x| x == 0.0));
        let ones = Matrix::<f32, 2, 3>::ones();
        assert!(ones.iter().all(|&x| x == 1.0));
        let sevens = Matrix::<i32, 4, 1>::uniform(7);
        assert_eq!(sevens.iter().sum::<i32>(), 28);
        let id = Matrix::<i32, 3, 3>::identity();
        assert_eq!(id, Matrix::from_rows([[1, 0, 0], [0, 1, 0], [0, 0, 1]]));
    }

    #[test]
    fn eye_offsets() {
        let upper = Matrix::<i32, 3, 3>::eye(1);
        assert_eq!(upper, Matrix::from_rows([[0, 1, 0], [0, 0, 1], [0, 0, 0]]));
        let lower = Matrix::<i32, 3, 3>::eye(-2);
        assert_eq!(lower, Matrix::from_rows([[0, 0, 0], [0, 0, 0], [1, 0, 0]]));
        let wide = Matrix::<i32, 2, 4>::eye(2);
        assert_eq!(wide, Matrix::from_rows([[0, 0, 1, 0], [0, 0, 0, 1]]));
    }

    #[test]
    #[should_panic]
    fn eye_offset_out_of_range() {
        Matrix::<i32, 3, 3>::eye(3);
    }

    #[test]
    fn seeded_random_is_reproducible() {
        let a = Matrix::<f64, 4, 5>::random_seeded(-1.0, 1.0, 42);
        let b = Matrix::<f64, 4, 5>::random_seeded(-1.0, 1.0, 42);
        let c = Matrix::<f64, 4, 5>::random_seeded(-1.0, 1.0, 43);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.iter().all(|&x| x >= -1.0 && x <= 1.0));
    }

    #[test]
    fn integer_random_is_inclusive() {
        let m = Matrix::<i32, 10, 10>::random_seeded(1, 3, 7);
        assert!(m.iter().all(|&x| x >= 1 && x <= 3));
        assert!(m.iter().any(|&x| x == 3));
        assert!(m.iter().any(|&x| x == 1));
    }

    #[test]
    fn transpose_round_trip() {
        let m = Matrix::<f32, 3, 5>::random_seeded(-10.0, 10.0, 1);
        let t: Matrix<f32, 5, 3> = m.transpose();
        assert_eq!(t[4][2], m[2][4]);
        assert_eq!(t.transpose(), m);
    }

    #[test]
    fn splice_selects_in_order() {
        let m = three_by_three();
        let block = m.splice::<1, 2>(&[1], &[0, 1]).unwrap();
        assert_eq!(block, Matrix::from_rows([[4, 5]]));
        let reordered = m.splice::<2, 2>(&[2, 0], &[2, 0]).unwrap();
        assert_eq!(reordered, Matrix::from_rows([[9, 7], [3, 1]]));
    }

    #[test]
    fn splice_out_of_range() {
        let m = three_by_three();
        assert_eq!(
            m.splice::<1, 2>(&[5], &[0, 1]),
            Err(LinalgError::OutOfRange {
                axis: Axis::Row,
                index: 5,
                bound: 3
            })
        );
        assert_eq!(
            m.splice::<1, 1>(&[0], &[3]),
            Err(LinalgError::OutOfRange {
                axis: Axis::Column,
                index: 3,
                bound: 3
            })
        );
    }

    #[test]
    #[should_panic]
    fn splice_count_mismatch() {
        let _ = three_by_three().splice::<2, 2>(&[0], &[0, 1]);
    }

    #[test]
    fn reshape_preserves_row_major_order() {
        let m = Matrix::from_rows([[1, 2, 3], [4, 5, 6]]);
        let r: Matrix<i32, 3, 2> = m.reshape();
        assert_eq!(r, Matrix::from_rows([[1, 2], [3, 4], [5, 6]]));
        let flat: Matrix<i32, 1, 6> = m.reshape();
        assert_eq!(flat, Matrix::from_rows([[1, 2, 3, 4, 5, 6]]));
    }

    #[test]
    #[should_panic]
    fn reshape_element_count_mismatch() {
        let _: Matrix<i32, 2, 2> = Matrix::<i32, 2, 3>::zeros().reshape();
    }

    #[test]
    fn determinants() {
        assert_eq!(Matrix::from_rows([[5]]).determinant(), Ok(5));
        assert_eq!(Matrix::from_rows([[3, 8], [4, 6]]).determinant(), Ok(3 * 6 - 8 * 4));
        assert_eq!(three_by_three().determinant(), Ok(0));
        let m = Matrix::from_rows([[6, 1, 1], [4, -2, 5], [2, 8, 7]]);
        assert_eq!(m.determinant(), Ok(-306));
        let m = Matrix::from_rows([[1.0, 0.0, 2.0, -1.0], [3.0, 0.0, 0.0, 5.0], [2.0, 1.0, 4.0, -3.0], [1.0, 0.0, 5.0, 0.0]]);
        assert_eq!(m.determinant(), Ok(30.0));
        assert_eq!(Matrix::<f64, 5, 5>::identity().determinant(), Ok(1.0));
    }

    #[test]
    fn determinant_requires_square() {
        assert_eq!(
            Matrix::<i32, 2, 3>::zeros().determinant(),
            Err(LinalgError::NotSquare { rows: 2, cols: 3 })
        );
    }

    #[test]
    fn symmetry() {
        let s = Matrix::from_rows([[1, 7, 3], [7, 4, 5], [3, 5, 6]]);
        assert!(s.is_square());
        assert!(s.is_symmetric());
        assert!(!three_by_three().is_symmetric());
        assert!(!Matrix::<i32, 2, 3>::zeros().is_symmetric());
    }

    #[test]
    fn elementwise_operators() {
        let a = Matrix::from_rows([[1, 2], [3, 4]]);
        let b = Matrix::from_rows([[5, 6], [7, 8]]);
        assert_eq!(a + b, Matrix::from_rows([[6, 8], [10, 12]]));
        assert_eq!(b - a, Matrix::from_rows([[4, 4], [4, 4]]));
        assert_eq!(a * b, Matrix::from_rows([[5, 12], [21, 32]]));
        assert_eq!(b / a, Matrix::from_rows([[5, 3], [2, 2]]));
        assert_eq!(b % a, Matrix::from_rows([[0, 0], [1, 0]]));
        assert_eq!(a * 3i32, Matrix::from_rows([[3, 6], [9, 12]]));
        let mut c = a;
        c += b;
        c -= a;
        assert_eq!(c, b);
    }

    #[test]
    fn scalar_multiply_primitives() {
        assert_eq!(Matrix::from_rows([[1u8, 2]]) * 3u8, Matrix::from_rows([[3, 6]]));
        assert_eq!(Matrix::from_rows([[1.5f32], [-2.0]]) * 2.0f32, Matrix::from_rows([[3.0], [-4.0]]));
        assert_eq!(Matrix::from_rows([[7usize]]) * 0usize, Matrix::zeros());
        let mut m = Matrix::from_rows([[1i64, -2], [3, -4]]);
        m *= -1i64;
        assert_eq!(m, Matrix::from_rows([[-1, 2], [-3, 4]]));
    }

    #[test]
    fn matrix_product() {
        let a = Matrix::from_rows([[1.0, 2.0], [3.0, 4.0]]);
        let b = Matrix::from_rows([[5.0, 6.0], [7.0, 8.0]]);
        assert_eq!(a & b, Matrix::from_rows([[19.0, 22.0], [43.0, 50.0]]));
        let row = Matrix::from_rows([[1, 2, 3]]);
        let col = Matrix::from_rows([[4], [5], [6]]);
        assert_eq!(row & col, Matrix::from_rows([[32]]));
        let outer: Matrix<i32, 3, 3> = col & row;
        assert_eq!(outer[0], [4, 8, 12]);
        assert_eq!(outer[2], [6, 12, 18]);
    }

    #[test]
    fn product_shape_law() {
        let a = Matrix::<f32, 2, 7>::ones();
        let b = Matrix::<f32, 7, 4>::ones();
        let c = a & b;
        assert_eq!(Matrix::<f32, 2, 4>::ROWS, 2);
        assert_eq!(c.rows().len(), 2);
        assert_eq!(c[0].len(), 4);
        assert!(c.iter().all(|&x| x == 7.0));
    }

    #[test]
    fn for_each_traverses_row_major() {
        let mut m = Matrix::<usize, 2, 3>::zeros();
        let mut counter = 0;
        m.for_each(|x| {
            *x = counter;
            counter += 1;
        });
        assert_eq!(m, Matrix::from_rows([[0, 1, 2], [3, 4, 5]]));
        m.for_each_indexed(|x, i, j| *x = 10 * i + j);
        assert_eq!(m, Matrix::from_rows([[0, 1, 2], [10, 11, 12]]));
    }

    #[test]
    fn indexing() {
        let mut m = three_by_three();
        assert_eq!(m[(1, 2)], 6);
        assert_eq!(m.get(2, 0), Some(7));
        assert_eq!(m.get(3, 0), None);
        m.set(0, 0, -1);
        m[(2, 2)] = 0;
        assert_eq!(m[0][0], -1);
        assert_eq!(m[2][2], 0);
    }
}
