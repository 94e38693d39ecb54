//! Sparse LU for matrices in compressed sparse column form.
//!
//! Left-looking column factorization with threshold-free partial pivoting:
//! each column of `A` is scattered into a dense work vector, updated by the
//! already computed columns of `L`, and split into its `U` part (pivotal
//! rows) and `L` part (remaining rows). Row pivots are recorded, columns are
//! kept in their natural order.

use sprs::CsMat;

use super::{scalar::LinalgScalar, LinalgError};

const NONE: usize = usize::MAX;

/// Sparse `P·A = L·U` factors.
#[derive(Debug, Clone)]
pub struct SparseLu<T> {
    n: usize,
    /// Below-pivot entries of each column of `L`, as `(original row, value)`.
    lower: Vec<Vec<(usize, T)>>,
    /// Above-diagonal entries of each column of `U`, as `(pivot step, value)`.
    upper: Vec<Vec<(usize, T)>>,
    diag: Vec<T>,
    /// Original row chosen as pivot at each step.
    pivot_row: Vec<usize>,
    /// Pivot step of each original row.
    row_step: Vec<usize>,
    work: Vec<T>,
}

impl<T: LinalgScalar> SparseLu<T> {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            lower: vec![Vec::new(); n],
            upper: vec![Vec::new(); n],
            diag: vec![T::zero(); n],
            pivot_row: vec![NONE; n],
            row_step: vec![NONE; n],
            work: vec![T::zero(); n],
        }
    }

    pub fn dim(&self) -> usize {
        self.n
    }

    /// Number of stored entries of `L` and `U`, diagonal included.
    pub fn fill(&self) -> usize {
        self.n
            + self.lower.iter().map(Vec::len).sum::<usize>()
            + self.upper.iter().map(Vec::len).sum::<usize>()
    }

    pub fn factorize(&mut self, a: &CsMat<T>) -> Result<(), LinalgError> {
        let n = a.rows();
        if a.cols() != n {
            return Err(LinalgError::NotSquare {
                nrows: n,
                ncols: a.cols(),
            });
        }
        if n != self.n {
            *self = Self::new(n);
        }
        self.pivot_row.iter_mut().for_each(|p| *p = NONE);
        self.row_step.iter_mut().for_each(|p| *p = NONE);

        if !a.is_csc() {
            return self.factorize(&a.to_csc());
        }

        for (k, col) in a.outer_iterator().enumerate() {
            let x = &mut self.work;
            x.iter_mut().for_each(|v| *v = T::zero());
            for (i, &v) in col.iter() {
                x[i] += v;
            }

            // Apply the previous columns in pivot order
            let mut ucol = Vec::new();
            for j in 0..k {
                let ujk = x[self.pivot_row[j]];
                if ujk == T::zero() {
                    continue;
                }
                ucol.push((j, ujk));
                for &(i, lij) in &self.lower[j] {
                    x[i] -= lij * ujk;
                }
            }

            // Pivot among the rows not yet used
            let mut p = NONE;
            let mut pmax = 0.0;
            for (i, v) in x.iter().enumerate() {
                if self.row_step[i] == NONE && v.modulus() > pmax {
                    pmax = v.modulus();
                    p = i;
                }
            }
            if p == NONE {
                return Err(LinalgError::Singular { column: k });
            }
            let ukk = x[p];
            self.pivot_row[k] = p;
            self.row_step[p] = k;
            self.diag[k] = ukk;
            self.upper[k] = ucol;
            self.lower[k] = x
                .iter()
                .enumerate()
                .filter(|&(i, v)| self.row_step[i] == NONE && *v != T::zero())
                .map(|(i, &v)| (i, v / ukk))
                .collect();
        }
        Ok(())
    }

    /// Overwrite `b` with the solution of `A·x = b`.
    pub fn solve(&mut self, b: &mut [T]) -> Result<(), LinalgError> {
        let n = self.n;
        if b.len() != n {
            return Err(LinalgError::Dimension { n, len: b.len() });
        }
        // Forward: L·y = P·b, y stored by pivot step
        let w = &mut self.work;
        w.copy_from_slice(b);
        for k in 0..n {
            let yk = w[self.pivot_row[k]];
            b[k] = yk;
            if yk == T::zero() {
                continue;
            }
            for &(i, lik) in &self.lower[k] {
                w[i] -= lik * yk;
            }
        }
        // Backward: U·x = y
        for k in (0..n).rev() {
            let xk = b[k] / self.diag[k];
            b[k] = xk;
            for &(j, ujk) in &self.upper[k] {
                b[j] -= ujk * xk;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use num_complex::Complex64;

    use super::*;
    use crate::matrix::Triplet;

    #[test]
    fn solves_with_duplicates_and_pivoting() {
        // [[0, 2, 0, 1], [3, 0, 0, 0], [0, 1, 4, 0], [1, 0, 2, 5]]
        let mut t = Triplet::new(4, 4);
        t.put(0, 1, 1.5);
        t.put(0, 1, 0.5);
        t.put(0, 3, 1.0);
        t.put(1, 0, 3.0);
        t.put(2, 1, 1.0);
        t.put(2, 2, 4.0);
        t.put(3, 0, 1.0);
        t.put(3, 2, 2.0);
        t.put(3, 3, 5.0);
        let x = [1.0, -1.0, 2.0, 0.25];
        let mut b = [0.0; 4];
        t.mul_vec(&x, &mut b);

        let mut lu = SparseLu::new(4);
        lu.factorize(&t.to_csc()).unwrap();
        lu.solve(&mut b).unwrap();
        for (bi, xi) in b.iter().zip(x) {
            assert_relative_eq!(*bi, xi, epsilon = 1e-14);
        }
        assert!(lu.fill() <= 16);
    }

    #[test]
    fn complex_tridiagonal() {
        let n = 6;
        let shift = Complex64::new(2.5, 1.0);
        let mut t = Triplet::new(n, n);
        for i in 0..n {
            t.put(i, i, shift);
            if i > 0 {
                t.put(i, i - 1, Complex64::new(-1.0, 0.0));
            }
            if i + 1 < n {
                t.put(i, i + 1, Complex64::new(-1.0, 0.5));
            }
        }
        let x: Vec<Complex64> = (0..n).map(|i| Complex64::new(i as f64, 1.0)).collect();
        let mut b = vec![Complex64::new(0.0, 0.0); n];
        t.mul_vec(&x, &mut b);
        let mut lu = SparseLu::new(n);
        lu.factorize(&t.to_csc()).unwrap();
        lu.solve(&mut b).unwrap();
        for (bi, xi) in b.iter().zip(&x) {
            assert!((bi - xi).norm() < 1e-13);
        }
    }

    #[test]
    fn structurally_singular() {
        let mut t = Triplet::new(3, 3);
        t.put(0, 0, 1.0);
        t.put(1, 0, 1.0);
        t.put(2, 2, 1.0);
        let mut lu = SparseLu::new(3);
        assert_eq!(
            lu.factorize(&t.to_csc()),
            Err(LinalgError::Singular { column: 1 })
        );
    }
}
