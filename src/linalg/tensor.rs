/*!
Rank-three tensors: a stack of `Z` matrices of shape `R x C`
*/
use super::{Matrix, Scalar};
use rand::distributions::uniform::SampleUniform;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::{
    Add, AddAssign, Div, DivAssign, Index, IndexMut, Mul, MulAssign, Rem, RemAssign, Sub,
    SubAssign,
};

/// `Z` layers of `R x C` matrices
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Tensor<T, const R: usize, const C: usize, const Z: usize> {
    layers: [Matrix<T, R, C>; Z],
}

impl<T: Copy, const R: usize, const C: usize, const Z: usize> Tensor<T, R, C, Z> {
    const NONEMPTY: () = assert!(Z > 0, "tensor depth must be strictly positive");

    /// Create a tensor from its layers
    #[inline]
    pub fn from_layers(layers: [Matrix<T, R, C>; Z]) -> Tensor<T, R, C, Z> {
        #[allow(clippy::let_unit_value)]
        let () = Self::NONEMPTY;
        Tensor { layers }
    }

    /// Create a tensor with every element set to `value`
    #[inline]
    pub fn uniform(value: T) -> Tensor<T, R, C, Z> {
        Self::from_layers([Matrix::uniform(value); Z])
    }

    /// Create a tensor by evaluating `f(layer)` for every layer, in order
    pub fn from_fn<G: FnMut(usize) -> Matrix<T, R, C>>(mut f: G) -> Tensor<T, R, C, Z> {
        let first = f(0);
        let mut layers = [first; Z];
        for (z, layer) in layers.iter_mut().enumerate().skip(1) {
            *layer = f(z)
        }
        Self::from_layers(layers)
    }

    /// Borrow the layers of this tensor
    #[inline]
    pub fn layers(&self) -> &[Matrix<T, R, C>; Z] {
        &self.layers
    }

    /// Iterate over the layers of this tensor
    pub fn iter(&self) -> std::slice::Iter<'_, Matrix<T, R, C>> {
        self.layers.iter()
    }

    /// Iterate mutably over the layers of this tensor
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Matrix<T, R, C>> {
        self.layers.iter_mut()
    }

    /// Apply `f` to every element, layer by layer in row-major order
    pub fn for_each<G: FnMut(&mut T)>(&mut self, mut f: G) {
        for layer in self.layers.iter_mut() {
            layer.for_each(&mut f)
        }
    }

    /// Combine this tensor element-wise with another
    pub fn zip_map<G: FnMut(T, T) -> T>(&self, other: &Tensor<T, R, C, Z>, mut f: G) -> Tensor<T, R, C, Z> {
        Tensor::from_fn(|z| self.layers[z].zip_map(&other.layers[z], &mut f))
    }

    /// Whether every dimension of this tensor is equal
    #[inline]
    pub fn is_cube(&self) -> bool {
        R == C && C == Z
    }
}

impl<T: Scalar, const R: usize, const C: usize, const Z: usize> Tensor<T, R, C, Z> {
    /// A tensor of zeros
    #[inline]
    pub fn zeros() -> Tensor<T, R, C, Z> {
        Self::uniform(T::zero())
    }

    /// A tensor of ones
    #[inline]
    pub fn ones() -> Tensor<T, R, C, Z> {
        Self::uniform(T::one())
    }

    /// A tensor each of whose layers is the identity matrix
    #[inline]
    pub fn identity() -> Tensor<T, R, C, Z> {
        Self::from_layers([Matrix::identity(); Z])
    }

    /// Multiply every element by a scalar
    pub fn scale(&self, k: T) -> Tensor<T, R, C, Z> {
        Tensor::from_fn(|z| self.layers[z].scale(k))
    }
}

impl<T: Scalar + SampleUniform, const R: usize, const C: usize, const Z: usize> Tensor<T, R, C, Z> {
    /// A tensor with elements drawn independently and uniformly from `[min, max]` using `rng`, layer by layer
    pub fn random_with<G: Rng + ?Sized>(min: T, max: T, rng: &mut G) -> Tensor<T, R, C, Z> {
        Self::from_fn(|_| Matrix::random_with(min, max, &mut *rng))
    }

    /// A tensor with elements drawn uniformly from `[min, max]`, reproducible given `seed`
    pub fn random_seeded(min: T, max: T, seed: u64) -> Tensor<T, R, C, Z> {
        Self::random_with(min, max, &mut StdRng::seed_from_u64(seed))
    }

    /// A tensor with elements drawn uniformly from `[min, max]`, seeded from system entropy
    pub fn random(min: T, max: T) -> Tensor<T, R, C, Z> {
        Self::random_with(min, max, &mut StdRng::from_entropy())
    }
}

impl<T, const R: usize, const C: usize, const Z: usize> Index<usize> for Tensor<T, R, C, Z> {
    type Output = Matrix<T, R, C>;
    #[inline]
    fn index(&self, layer: usize) -> &Matrix<T, R, C> {
        &self.layers[layer]
    }
}

impl<T, const R: usize, const C: usize, const Z: usize> IndexMut<usize> for Tensor<T, R, C, Z> {
    #[inline]
    fn index_mut(&mut self, layer: usize) -> &mut Matrix<T, R, C> {
        &mut self.layers[layer]
    }
}

/// Index by `(layer, row, col)`
impl<T, const R: usize, const C: usize, const Z: usize> Index<(usize, usize, usize)>
    for Tensor<T, R, C, Z>
{
    type Output = T;
    #[inline]
    fn index(&self, (layer, row, col): (usize, usize, usize)) -> &T {
        &self.layers[layer][(row, col)]
    }
}

impl<T, const R: usize, const C: usize, const Z: usize> IndexMut<(usize, usize, usize)>
    for Tensor<T, R, C, Z>
{
    #[inline]
    fn index_mut(&mut self, (layer, row, col): (usize, usize, usize)) -> &mut T {
        &mut self.layers[layer][(row, col)]
    }
}

macro_rules! impl_elementwise {
    ($($op:ident::$method:ident, $assign:ident::$assign_method:ident;)*) => {
        $(
            impl<T: Scalar, const R: usize, const C: usize, const Z: usize> $op for Tensor<T, R, C, Z> {
                type Output = Tensor<T, R, C, Z>;
                #[inline]
                fn $method(self, rhs: Tensor<T, R, C, Z>) -> Tensor<T, R, C, Z> {
                    self.zip_map(&rhs, |x, y| x.$method(y))
                }
            }

            impl<T: Scalar, const R: usize, const C: usize, const Z: usize> $assign for Tensor<T, R, C, Z> {
                #[inline]
                fn $assign_method(&mut self, rhs: Tensor<T, R, C, Z>) {
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

impl_scalar_mul!(Tensor<R, C, Z>; f32 f64 i8 i16 i32 i64 i128 isize u8 u16 u32 u64 u128 usize);
