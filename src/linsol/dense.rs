//! Dense LU with partial pivoting.

use crate::matrix::Matrix;

use super::{scalar::LinalgScalar, LinalgError};

/// Packed `P·A = L·U` factors of a dense square matrix.
#[derive(Debug, Clone)]
pub struct DenseLu<T> {
    n: usize,
    lu: Vec<T>,
    perm: Vec<usize>,
}

impl<T: LinalgScalar> DenseLu<T> {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            lu: vec![T::zero(); n * n],
            perm: (0..n).collect(),
        }
    }

    pub fn dim(&self) -> usize {
        self.n
    }

    /// Factorize `a` in the workspace of `self`.
    pub fn factorize(&mut self, a: &Matrix<T>) -> Result<(), LinalgError> {
        let n = a.nrows();
        if a.ncols() != n {
            return Err(LinalgError::NotSquare {
                nrows: n,
                ncols: a.ncols(),
            });
        }
        if n != self.n {
            *self = Self::new(n);
        }
        let lu = &mut self.lu;
        lu.copy_from_slice(a.as_slice());
        for (i, p) in self.perm.iter_mut().enumerate() {
            *p = i;
        }

        for k in 0..n {
            // pivot
            let mut pivot_row = k;
            let mut pivot_val = lu[k * n + k].modulus();
            for i in (k + 1)..n {
                let val = lu[i * n + k].modulus();
                if val > pivot_val {
                    pivot_val = val;
                    pivot_row = i;
                }
            }
            if pivot_val == 0.0 {
                return Err(LinalgError::Singular { column: k });
            }
            if pivot_row != k {
                for j in 0..n {
                    lu.swap(k * n + j, pivot_row * n + j);
                }
                self.perm.swap(k, pivot_row);
            }
            // Eliminate below the pivot
            let akk = lu[k * n + k];
            for i in (k + 1)..n {
                let factor = lu[i * n + k] / akk;
                lu[i * n + k] = factor;
                if factor == T::zero() {
                    continue;
                }
                for j in (k + 1)..n {
                    let akj = lu[k * n + j];
                    lu[i * n + j] -= factor * akj;
                }
            }
        }
        Ok(())
    }

    /// Overwrite `b` with the solution of `A·x = b`.
    pub fn solve(&self, b: &mut [T]) -> Result<(), LinalgError> {
        let n = self.n;
        if b.len() != n {
            return Err(LinalgError::Dimension { n, len: b.len() });
        }
        let lu = &self.lu;
        let pb: Vec<T> = self.perm.iter().map(|&p| b[p]).collect();
        b.copy_from_slice(&pb);

        // Forward solve Ly = Pb
        for i in 0..n {
            let mut sum = b[i];
            for k in 0..i {
                sum -= lu[i * n + k] * b[k];
            }
            b[i] = sum;
        }
        // Backward solve Ux = y
        for i in (0..n).rev() {
            let mut sum = b[i];
            for k in (i + 1)..n {
                sum -= lu[i * n + k] * b[k];
            }
            b[i] = sum / lu[i * n + i];
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use num_complex::Complex64;

    use super::*;

    #[test]
    fn solve_full_2x2() {
        // [[3, 2],[1, 4]] x = [5, 6] => x = [0.8, 1.3]
        let a = Matrix::from_rows(&[[3.0, 2.0], [1.0, 4.0]]).unwrap();
        let mut lu = DenseLu::new(2);
        lu.factorize(&a).unwrap();
        let mut b = [5.0, 6.0];
        lu.solve(&mut b).unwrap();
        assert_relative_eq!(b[0], 0.8, epsilon = 1e-14);
        assert_relative_eq!(b[1], 1.3, epsilon = 1e-14);
    }

    #[test]
    fn pivoting_required() {
        let a = Matrix::from_rows(&[[0.0, 1.0, 2.0], [1.0, 0.0, 3.0], [4.0, -3.0, 8.0]]).unwrap();
        let mut lu = DenseLu::new(3);
        lu.factorize(&a).unwrap();
        let x = [1.0, -2.0, 0.5];
        let mut b = [0.0; 3];
        a.mul_vec(&x, &mut b);
        lu.solve(&mut b).unwrap();
        for (bi, xi) in b.iter().zip(x) {
            assert_relative_eq!(*bi, xi, epsilon = 1e-14);
        }
    }

    #[test]
    fn complex_system() {
        let i = Complex64::i();
        let one = Complex64::new(1.0, 0.0);
        let a = Matrix::from_rows(&[[2.0 * one + i, -one], [i, 3.0 * one]]).unwrap();
        let x = [Complex64::new(1.0, -1.0), Complex64::new(0.5, 2.0)];
        let mut b = [Complex64::new(0.0, 0.0); 2];
        a.mul_vec(&x, &mut b);
        let mut lu = DenseLu::new(2);
        lu.factorize(&a).unwrap();
        lu.solve(&mut b).unwrap();
        for (bi, xi) in b.iter().zip(x) {
            assert!((bi - xi).norm() < 1e-14);
        }
    }

    #[test]
    fn singular_is_reported() {
        let a = Matrix::from_rows(&[[1.0, 2.0], [2.0, 4.0]]).unwrap();
        let mut lu = DenseLu::new(2);
        assert_eq!(lu.factorize(&a), Err(LinalgError::Singular { column: 1 }));
    }
}
