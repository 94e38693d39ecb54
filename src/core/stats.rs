//! Counters collected during one integration.

use std::fmt;

/// Evaluation and step counters. Reset at the start of every solve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Right-hand side evaluations, including finite-difference columns.
    pub nfeval: usize,
    /// Jacobian evaluations.
    pub njeval: usize,
    /// Step attempts, including rejected and retried ones.
    pub nsteps: usize,
    /// Accepted steps (adaptive methods only).
    pub naccepted: usize,
    /// Steps rejected by the error estimate after the first accepted step.
    pub nrejected: usize,
    /// Matrix factorizations.
    pub ndecomp: usize,
    /// Linear solves.
    pub nlinsol: usize,
    /// Largest number of Newton iterations used in a single step.
    pub nitmax: usize,
}

impl Stats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn record_iterations(&mut self, iterations: usize) {
        self.nitmax = self.nitmax.max(iterations);
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "nfeval={} njeval={} nsteps={} naccepted={} nrejected={} ndecomp={} nlinsol={} nitmax={}",
            self.nfeval,
            self.njeval,
            self.nsteps,
            self.naccepted,
            self.nrejected,
            self.ndecomp,
            self.nlinsol,
            self.nitmax
        )
    }
}
