//! Dense row-major matrix.

use std::ops::{Add, Index, IndexMut, Mul};

use num_traits::{One, Zero};

use crate::{error::Error, Float};

/// Dense `nrows × ncols` matrix stored row by row.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix<T = Float> {
    nrows: usize,
    ncols: usize,
    data: Vec<T>,
}

impl<T: Copy + Zero> Matrix<T> {
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            data: vec![T::zero(); nrows * ncols],
        }
    }

    /// Build from rows; every row must have the same length.
    pub fn from_rows<R: AsRef<[T]>>(rows: &[R]) -> Result<Self, Error> {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, |r| r.as_ref().len());
        let mut data = Vec::with_capacity(nrows * ncols);
        for row in rows {
            let row = row.as_ref();
            if row.len() != ncols {
                return Err(Error::Dimension {
                    what: "row",
                    expected: ncols,
                    got: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self { nrows, ncols, data })
    }

    pub fn fill(&mut self, value: T) {
        self.data.iter_mut().for_each(|v| *v = value);
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn row(&self, i: usize) -> &[T] {
        &self.data[i * self.ncols..(i + 1) * self.ncols]
    }
}

impl<T: Copy + Zero + One> Matrix<T> {
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m[(i, i)] = T::one();
        }
        m
    }
}

impl<T: Copy + Zero + Add<Output = T> + Mul<Output = T>> Matrix<T> {
    /// `out = self · x`
    pub fn mul_vec(&self, x: &[T], out: &mut [T]) {
        for (i, o) in out.iter_mut().enumerate().take(self.nrows) {
            *o = self
                .row(i)
                .iter()
                .zip(x)
                .fold(T::zero(), |acc, (&a, &b)| acc + a * b);
        }
    }

    /// `out = selfᵀ · x`
    pub fn mul_transpose_vec(&self, x: &[T], out: &mut [T]) {
        out.iter_mut().for_each(|v| *v = T::zero());
        for i in 0..self.nrows {
            let xi = x[i];
            for (o, &a) in out.iter_mut().zip(self.row(i)) {
                *o = *o + a * xi;
            }
        }
    }
}

impl Matrix<Float> {
    /// Largest absolute difference between two matrices of equal shape.
    pub fn max_diff(&self, other: &Matrix<Float>) -> Float {
        self.data
            .iter()
            .zip(&other.data)
            .fold(0.0, |acc, (a, b)| acc.max((a - b).abs()))
    }

    /// Frobenius norm.
    pub fn norm_frobenius(&self) -> Float {
        self.data.iter().map(|v| v * v).sum::<Float>().sqrt()
    }
}

impl<T> Index<(usize, usize)> for Matrix<T> {
    type Output = T;

    fn index(&self, (i, j): (usize, usize)) -> &T {
        &self.data[i * self.ncols + j]
    }
}

impl<T> IndexMut<(usize, usize)> for Matrix<T> {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut T {
        &mut self.data[i * self.ncols + j]
    }
}
