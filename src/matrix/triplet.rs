//! Coordinate-list (triplet) sparse matrix.
//!
//! Entries are appended with [`Triplet::put`]; repeated `(i, j)` pairs are
//! kept as separate entries and summed whenever the matrix is used
//! (products, densification or compression to CSC).

use std::ops::{Add, AddAssign, Mul};

use num_traits::Zero;
use sprs::{CsMat, TriMat};

use crate::Float;

use super::base::Matrix;

/// Sparse matrix in coordinate form backed by [`sprs::TriMat`].
#[derive(Debug)]
pub struct Triplet<T = Float> {
    inner: TriMat<T>,
    capacity: usize,
}

impl<T: Copy + Zero> Triplet<T> {
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Self::with_capacity(nrows, ncols, 0)
    }

    /// Reserve room for `capacity` entries; growing past it is allowed.
    pub fn with_capacity(nrows: usize, ncols: usize, capacity: usize) -> Self {
        Self {
            inner: TriMat::with_capacity((nrows, ncols), capacity),
            capacity,
        }
    }

    /// Drop all entries, keeping the shape.
    pub fn start(&mut self) {
        let shape = (self.inner.rows(), self.inner.cols());
        self.inner = TriMat::with_capacity(shape, self.capacity.max(self.inner.nnz()));
    }

    /// Append `value` at `(i, j)`. Panics when the position is out of bounds.
    pub fn put(&mut self, i: usize, j: usize, value: T) {
        self.inner.add_triplet(i, j, value);
    }

    /// Append every entry of `other` (same shape).
    pub fn extend_from(&mut self, other: &Triplet<T>) {
        for (i, j, v) in other.entries() {
            self.inner.add_triplet(i, j, v);
        }
    }

    pub fn nrows(&self) -> usize {
        self.inner.rows()
    }

    pub fn ncols(&self) -> usize {
        self.inner.cols()
    }

    /// Number of stored entries, duplicates included.
    pub fn len(&self) -> usize {
        self.inner.nnz()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored entries `(row, col, value)` in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        self.inner
            .row_inds()
            .iter()
            .zip(self.inner.col_inds())
            .zip(self.inner.data())
            .map(|((&i, &j), &v)| (i, j, v))
    }
}

impl<T: Copy + Zero + AddAssign> Triplet<T> {
    /// Dense copy with duplicates summed.
    pub fn to_dense(&self) -> Matrix<T> {
        let mut m = Matrix::zeros(self.nrows(), self.ncols());
        for (i, j, v) in self.entries() {
            m[(i, j)] += v;
        }
        m
    }
}

impl<T: Copy + Zero + AddAssign + Mul<Output = T>> Triplet<T> {
    /// `out = self · x`
    pub fn mul_vec(&self, x: &[T], out: &mut [T]) {
        out.iter_mut().for_each(|v| *v = T::zero());
        for (i, j, v) in self.entries() {
            out[i] += v * x[j];
        }
    }

    /// `out = selfᵀ · x`
    pub fn mul_transpose_vec(&self, x: &[T], out: &mut [T]) {
        out.iter_mut().for_each(|v| *v = T::zero());
        for (i, j, v) in self.entries() {
            out[j] += v * x[i];
        }
    }
}

impl<T: Copy + Zero + Add<Output = T>> Triplet<T> {
    /// Compressed sparse column copy; duplicate entries are summed.
    pub fn to_csc(&self) -> CsMat<T> {
        self.inner.to_csc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_are_summed() {
        let mut t = Triplet::with_capacity(3, 3, 6);
        t.put(0, 0, 1.0);
        t.put(0, 0, 2.0);
        t.put(2, 1, -1.0);
        t.put(1, 2, 4.0);
        t.put(2, 1, 0.5);
        assert_eq!(t.len(), 5);

        let d = t.to_dense();
        assert_eq!(d[(0, 0)], 3.0);
        assert_eq!(d[(2, 1)], -0.5);
        assert_eq!(d[(1, 2)], 4.0);

        let csc = t.to_csc();
        assert_eq!(csc.nnz(), 3);
        assert_eq!(csc.get(0, 0), Some(&3.0));
        assert_eq!(csc.get(2, 1), Some(&-0.5));

        let mut y = [0.0; 3];
        t.mul_vec(&[1.0, 2.0, 3.0], &mut y);
        assert_eq!(y, [3.0, 12.0, -1.0]);
        t.mul_transpose_vec(&[1.0, 2.0, 3.0], &mut y);
        assert_eq!(y, [3.0, -1.5, 8.0]);
    }

    #[test]
    fn start_clears_entries() {
        let mut t = Triplet::new(2, 2);
        t.put(1, 1, 1.0);
        t.start();
        assert!(t.is_empty());
        assert_eq!((t.nrows(), t.ncols()), (2, 2));
        t.put(0, 1, 5.0);
        assert_eq!(t.to_dense()[(0, 1)], 5.0);
    }
}
