//! Row-partitioned Jacobian assembly.
//!
//! Worker `id` of `sz` owns rows `[id·n/sz, (id+1)·n/sz)` and writes its
//! entries into a private [`Triplet`]. The partial triplets are gathered, in
//! worker order, into one triplet; entries that land on the same position are
//! summed when the result is compressed or densified, so contributions may
//! overlap.
//!
//! With the `parallel` feature the workers run on the rayon thread pool,
//! otherwise one after the other. Either way the caller sees a single call
//! that returns the complete matrix.

use std::ops::Range;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{matrix::Triplet, Float};

/// Rows owned by worker `id` out of `sz`.
pub fn partition(n: usize, id: usize, sz: usize) -> Range<usize> {
    (id * n / sz)..((id + 1) * n / sz)
}

/// Assemble an `n×n` matrix with `workers` contributors.
///
/// `contribute(rows, part)` must only write entries whose row lies in
/// `rows`; `part` starts empty.
pub fn assemble<F>(n: usize, workers: usize, contribute: F) -> Triplet
where
    F: Fn(Range<usize>, &mut Triplet) + Sync,
{
    let workers = workers.max(1);
    let work = |id: usize| {
        let rows = partition(n, id, workers);
        let mut part = Triplet::with_capacity(n, n, 4 * rows.len());
        contribute(rows, &mut part);
        part
    };

    #[cfg(feature = "parallel")]
    let parts: Vec<Triplet<Float>> = (0..workers).into_par_iter().map(work).collect();
    #[cfg(not(feature = "parallel"))]
    let parts: Vec<Triplet<Float>> = (0..workers).map(work).collect();

    let total = parts.iter().map(Triplet::len).sum();
    let mut gathered = Triplet::with_capacity(n, n, total);
    for part in &parts {
        gathered.extend_from(part);
    }
    log::trace!("gathered {total} entries from {workers} workers");
    gathered
}
