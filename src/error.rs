//! Errors reported by configuration, the integrators and the Newton solvers.

use thiserror::Error as ThisError;

use crate::{core::stats::Stats, linsol::LinalgError, Float};

/// Failure kinds.
///
/// Configuration problems are reported before any step is taken; the rest
/// abort a running solve.
#[derive(Debug, Clone, PartialEq, ThisError)]
pub enum Error {
    #[error("unknown option `{name}`; accepted options are: {}", .accepted.join(", "))]
    UnknownOption {
        name: String,
        accepted: &'static [&'static str],
    },
    #[error("invalid value for `{name}`: {reason}")]
    InvalidValue { name: &'static str, reason: String },
    #[error("dimension mismatch in {what}: expected {expected}, got {got}")]
    Dimension {
        what: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("Newton iterations are diverging with theta = {theta:e} (Ldx = {ldx:e}, previous Ldx = {ldx_prev:e})")]
    Divergence {
        theta: Float,
        ldx: Float,
        ldx_prev: Float,
    },
    #[error("Newton iterations did not converge after {iterations} iterations")]
    NoConvergence { iterations: usize },
    #[error("analytic and numerical Jacobians differ by {maxdiff:e} (tolerance {tol:e})")]
    JacobianMismatch { maxdiff: Float, tol: Float },
    #[error("linear system failure: {0}")]
    LinearSystem(#[from] LinalgError),
    #[error("maximum number of steps ({0}) exceeded")]
    StepBudget(usize),
    #[error("step size h = {h:e} became too small at x = {x}")]
    StepTooSmall { x: Float, h: Float },
}

impl Error {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidValue {
            name,
            reason: reason.into(),
        }
    }
}

pub(crate) fn count(name: &'static str, value: Float) -> Result<usize, Error> {
    if value < 1.0 || value.fract() != 0.0 {
        return Err(Error::invalid(name, format!("expected a positive integer, got {value}")));
    }
    Ok(value as usize)
}

pub(crate) fn positive(name: &'static str, value: Float) -> Result<Float, Error> {
    if !(value > 0.0) {
        return Err(Error::invalid(name, format!("must be positive, got {value}")));
    }
    Ok(value)
}

/// A fatal error together with the counters gathered until it happened.
#[derive(Debug, Clone, PartialEq, ThisError)]
#[error("{error} [{stats}]")]
pub struct Failure {
    #[source]
    pub error: Error,
    pub stats: Stats,
}

impl Failure {
    pub fn new(error: Error, stats: Stats) -> Self {
        Self { error, stats }
    }
}

impl From<Error> for Failure {
    fn from(error: Error) -> Self {
        Self::new(error, Stats::default())
    }
}
