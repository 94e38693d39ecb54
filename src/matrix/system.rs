//! Jacobian, mass and iteration matrices in either dense or sparse storage.

use std::ops::{AddAssign, Mul};

use num_traits::{One, Zero};

use crate::{linsol::LinalgScalar, Float};

use super::{base::Matrix, triplet::Triplet};

/// Storage used for Jacobians, mass matrices and the matrices handed to the
/// linear solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Storage {
    #[default]
    Dense,
    Sparse,
}

/// A square system matrix. Writes through [`SystemMatrix::put`] accumulate.
#[derive(Debug)]
pub enum SystemMatrix<T = Float> {
    Dense(Matrix<T>),
    Sparse(Triplet<T>),
}

impl<T: Copy + Zero + One + AddAssign + Mul<Output = T>> SystemMatrix<T> {
    pub fn new(storage: Storage, n: usize) -> Self {
        match storage {
            Storage::Dense => SystemMatrix::Dense(Matrix::zeros(n, n)),
            Storage::Sparse => SystemMatrix::Sparse(Triplet::with_capacity(n, n, 4 * n)),
        }
    }

    pub fn dim(&self) -> usize {
        match self {
            SystemMatrix::Dense(m) => m.nrows(),
            SystemMatrix::Sparse(t) => t.nrows(),
        }
    }

    /// Clear every entry before a new assembly.
    pub fn start(&mut self) {
        match self {
            SystemMatrix::Dense(m) => m.fill(T::zero()),
            SystemMatrix::Sparse(t) => t.start(),
        }
    }

    /// Add `value` to entry `(i, j)`.
    pub fn put(&mut self, i: usize, j: usize, value: T) {
        match self {
            SystemMatrix::Dense(m) => m[(i, j)] += value,
            SystemMatrix::Sparse(t) => t.put(i, j, value),
        }
    }

    /// Add every entry of a triplet, e.g. the gathered result of a
    /// row-partitioned assembly.
    pub fn put_triplet(&mut self, other: &Triplet<T>) {
        match self {
            SystemMatrix::Dense(m) => {
                for (i, j, v) in other.entries() {
                    m[(i, j)] += v;
                }
            }
            SystemMatrix::Sparse(t) => t.extend_from(other),
        }
    }

    /// Calls `visit(i, j, value)` for each stored entry. Dense storage skips
    /// exact zeros; sparse storage may repeat positions.
    pub fn for_each_entry(&self, mut visit: impl FnMut(usize, usize, T))
    where
        T: PartialEq,
    {
        match self {
            SystemMatrix::Dense(m) => {
                for i in 0..m.nrows() {
                    for (j, &v) in m.row(i).iter().enumerate() {
                        if v != T::zero() {
                            visit(i, j, v);
                        }
                    }
                }
            }
            SystemMatrix::Sparse(t) => t.entries().for_each(|(i, j, v)| visit(i, j, v)),
        }
    }

    /// `out = self · x`
    pub fn mul_vec(&self, x: &[T], out: &mut [T]) {
        match self {
            SystemMatrix::Dense(m) => m.mul_vec(x, out),
            SystemMatrix::Sparse(t) => t.mul_vec(x, out),
        }
    }

    /// `out = selfᵀ · x`
    pub fn mul_transpose_vec(&self, x: &[T], out: &mut [T]) {
        match self {
            SystemMatrix::Dense(m) => m.mul_transpose_vec(x, out),
            SystemMatrix::Sparse(t) => t.mul_transpose_vec(x, out),
        }
    }

    pub fn to_dense(&self) -> Matrix<T> {
        match self {
            SystemMatrix::Dense(m) => m.clone(),
            SystemMatrix::Sparse(t) => t.to_dense(),
        }
    }
}

impl<T: LinalgScalar> SystemMatrix<T> {
    /// Assemble `self = a·M + b·J` from real matrices, where `mass == None`
    /// stands for the identity. Used for the Newton iteration matrices of the
    /// implicit methods, e.g. `(γ/h)·M − J`.
    pub fn combine(
        &mut self,
        a: T,
        mass: Option<&SystemMatrix<Float>>,
        b: Float,
        jac: &SystemMatrix<Float>,
    ) {
        self.start();
        match mass {
            Some(m) => m.for_each_entry(|i, j, v| self.put(i, j, a * T::from_real(v))),
            None => {
                for i in 0..self.dim() {
                    self.put(i, i, a);
                }
            }
        }
        jac.for_each_entry(|i, j, v| self.put(i, j, T::from_real(b * v)));
    }
}

#[cfg(test)]
mod tests {
    use num_complex::Complex64;

    use super::*;

    #[test]
    fn dense_and_sparse_agree() {
        for storage in [Storage::Dense, Storage::Sparse] {
            let mut jac: SystemMatrix = SystemMatrix::new(storage, 2);
            jac.put(0, 0, 1.0);
            jac.put(0, 1, 2.0);
            jac.put(0, 1, 1.0);
            jac.put(1, 0, -4.0);
            let mut y = [0.0; 2];
            jac.mul_vec(&[1.0, 1.0], &mut y);
            assert_eq!(y, [4.0, -4.0]);
            jac.mul_transpose_vec(&[1.0, 1.0], &mut y);
            assert_eq!(y, [-3.0, 3.0]);
            assert_eq!(jac.to_dense(), Matrix::from_rows(&[[1.0, 3.0], [-4.0, 0.0]]).unwrap());
        }
    }

    #[test]
    fn combine_shifted_complex() {
        let mut jac: SystemMatrix = SystemMatrix::new(Storage::Sparse, 2);
        jac.put(0, 0, -2.0);
        jac.put(1, 0, 1.0);
        let mut mass: SystemMatrix = SystemMatrix::new(Storage::Dense, 2);
        mass.put(0, 0, 2.0);

        let mut e: SystemMatrix<Complex64> = SystemMatrix::new(Storage::Sparse, 2);
        let shift = Complex64::new(1.0, 3.0);
        e.combine(shift, Some(&mass), -1.0, &jac);
        let d = e.to_dense();
        assert_eq!(d[(0, 0)], Complex64::new(4.0, 6.0));
        assert_eq!(d[(1, 0)], Complex64::new(-1.0, 0.0));
        assert_eq!(d[(1, 1)], Complex64::new(0.0, 0.0));

        let mut e: SystemMatrix<Float> = SystemMatrix::new(Storage::Dense, 2);
        e.combine(1.0, None, -0.5, &jac);
        assert_eq!(e.to_dense(), Matrix::from_rows(&[[2.0, 0.0], [-0.5, 1.0]]).unwrap());
    }
}
