//! Scalars accepted by the LU factorizations.

use std::fmt::Debug;
use std::ops::Neg;

use num_complex::Complex64;
use num_traits::NumAssign;

use crate::Float;

/// Element type of a matrix that can be factorized: `f64` for the real
/// systems and `Complex64` for the complex Radau5 system.
pub trait LinalgScalar:
    Copy + Debug + Default + PartialEq + NumAssign + Neg<Output = Self> + Send + Sync + 'static
{
    /// Absolute value / modulus, used for pivoting.
    fn modulus(self) -> Float;

    /// Promote a real value into `Self`.
    fn from_real(r: Float) -> Self;
}

impl LinalgScalar for Float {
    #[inline]
    fn modulus(self) -> Float {
        self.abs()
    }

    #[inline]
    fn from_real(r: Float) -> Float {
        r
    }
}

impl LinalgScalar for Complex64 {
    #[inline]
    fn modulus(self) -> Float {
        self.norm()
    }

    #[inline]
    fn from_real(r: Float) -> Self {
        Complex64::new(r, 0.0)
    }
}
