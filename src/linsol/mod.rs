//! Linear solvers for the Newton iterations: factorize once, solve many times.
//!
//! [`LinSol`] owns the factorization of a [`SystemMatrix`]. Dense matrices go
//! to [`DenseLu`], sparse triplets are compressed to CSC (duplicates summed)
//! and go to [`SparseLu`]. The factorization is created lazily on the first
//! [`LinSol::factorize`], reused while storage kind and dimension stay the
//! same, and released by [`LinSol::free`] or on drop.

mod dense;
mod scalar;
mod sparse;

use thiserror::Error;

use crate::matrix::SystemMatrix;

pub use dense::DenseLu;
pub use scalar::LinalgScalar;
pub use sparse::SparseLu;

/// Errors from the factorizations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinalgError {
    #[error("matrix is singular (zero pivot at column {column})")]
    Singular { column: usize },
    #[error("matrix must be square, got {nrows}x{ncols}")]
    NotSquare { nrows: usize, ncols: usize },
    #[error("right-hand side has length {len}, matrix is {n}x{n}")]
    Dimension { n: usize, len: usize },
    #[error("solve called before factorize")]
    NotFactorized,
}

#[derive(Debug)]
enum Factor<T> {
    Dense(DenseLu<T>),
    Sparse(SparseLu<T>),
}

/// Factorization handle for real (`f64`) or complex (`Complex64`) systems.
#[derive(Debug)]
pub struct LinSol<T> {
    factor: Option<Factor<T>>,
    ready: bool,
}

impl<T: LinalgScalar> Default for LinSol<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: LinalgScalar> LinSol<T> {
    pub fn new() -> Self {
        Self {
            factor: None,
            ready: false,
        }
    }

    /// Factorize `a`, replacing any previous factorization.
    pub fn factorize(&mut self, a: &SystemMatrix<T>) -> Result<(), LinalgError> {
        self.ready = false;
        let n = a.dim();
        match a {
            SystemMatrix::Dense(m) => {
                if !matches!(&self.factor, Some(Factor::Dense(lu)) if lu.dim() == n) {
                    log::trace!("acquiring dense LU workspace, n = {n}");
                    self.factor = Some(Factor::Dense(DenseLu::new(n)));
                }
                if let Some(Factor::Dense(lu)) = &mut self.factor {
                    lu.factorize(m)?;
                }
            }
            SystemMatrix::Sparse(t) => {
                if !matches!(&self.factor, Some(Factor::Sparse(lu)) if lu.dim() == n) {
                    log::trace!("acquiring sparse LU workspace, n = {n}");
                    self.factor = Some(Factor::Sparse(SparseLu::new(n)));
                }
                if let Some(Factor::Sparse(lu)) = &mut self.factor {
                    lu.factorize(&t.to_csc())?;
                }
            }
        }
        self.ready = true;
        Ok(())
    }

    /// Overwrite `b` with the solution of `A·x = b` for the last factorized `A`.
    pub fn solve(&mut self, b: &mut [T]) -> Result<(), LinalgError> {
        if !self.ready {
            return Err(LinalgError::NotFactorized);
        }
        match &mut self.factor {
            Some(Factor::Dense(lu)) => lu.solve(b),
            Some(Factor::Sparse(lu)) => lu.solve(b),
            None => Err(LinalgError::NotFactorized),
        }
    }

    /// Release the factorization and its workspace.
    pub fn free(&mut self) {
        self.factor = None;
        self.ready = false;
    }

    pub fn is_factorized(&self) -> bool {
        self.ready
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::matrix::Storage;

    fn system(storage: Storage, n: usize) -> SystemMatrix {
        let mut a = SystemMatrix::new(storage, n);
        for i in 0..n {
            a.put(i, i, 4.0);
            if i > 0 {
                a.put(i, i - 1, -1.0);
                a.put(i - 1, i, -2.0);
            }
        }
        a
    }

    #[test]
    fn dense_and_sparse_give_same_solution() {
        let mut solutions = Vec::new();
        for storage in [Storage::Dense, Storage::Sparse] {
            let mut lis = LinSol::new();
            lis.factorize(&system(storage, 5)).unwrap();
            let mut b = [1.0, 2.0, 3.0, 4.0, 5.0];
            lis.solve(&mut b).unwrap();
            solutions.push(b);
        }
        for (d, s) in solutions[0].iter().zip(&solutions[1]) {
            assert_relative_eq!(*d, *s, epsilon = 1e-14);
        }
    }

    #[test]
    fn reacquires_on_kind_or_dimension_change() {
        let mut lis = LinSol::<f64>::new();
        assert_eq!(lis.solve(&mut [1.0]), Err(LinalgError::NotFactorized));
        lis.factorize(&system(Storage::Dense, 3)).unwrap();
        lis.factorize(&system(Storage::Sparse, 4)).unwrap();
        let mut b = [0.0; 3];
        assert_eq!(lis.solve(&mut b), Err(LinalgError::Dimension { n: 4, len: 3 }));
        lis.free();
        assert!(!lis.is_factorized());
    }

    #[test]
    fn failed_factorization_blocks_solve() {
        let mut lis = LinSol::new();
        let zero: SystemMatrix = SystemMatrix::new(Storage::Sparse, 2);
        assert!(matches!(
            lis.factorize(&zero),
            Err(LinalgError::Singular { column: 0 })
        ));
        assert_eq!(lis.solve(&mut [1.0, 1.0]), Err(LinalgError::NotFactorized));
    }
}
