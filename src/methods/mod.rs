//! Integration formulas behind one step protocol.
//!
//! Each formula is a [`Driver`]: the orchestrator asks it for a trial step
//! of size `h` from `(x, y)`, and the driver answers with a [`Trial`]. An
//! accepted trial is then committed with [`Driver::accept`], which advances
//! `y`, refreshes the dense-output coefficients and proposes the next step;
//! a rejected one is turned into a smaller step by [`Driver::reject`].
//!
//! | Driver      | Order | Adaptive | Implicit | Dense output      |
//! |-------------|-------|----------|----------|-------------------|
//! | `FwEuler`   | 1     | no       | no       | linear            |
//! | `BwEuler`   | 1     | no       | yes      | linear            |
//! | `MoEuler`   | 2(1)  | yes      | no       | linear            |
//! | `DoPri5`    | 5(4)  | yes      | no       | quartic (`contdp5`) |
//! | `Radau5`    | 5     | yes      | yes      | collocation cubic (`contr5`) |

pub(crate) mod controller;
pub mod dp;
pub mod euler;
pub(crate) mod hinit;
pub mod radau;

use crate::{core::ode::ODE, core::stats::Stats, error::Error, Float};

/// Evaluates `y(xi)` from one step's coefficients `cont`, the step start
/// `xold` and its size `h`.
pub type ContFn = fn(Float, &mut [Float], &[Float], Float, Float);

/// Outcome of a trial step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Trial {
    /// The error estimate is acceptable.
    Accept,
    /// The error estimate is too large; counted as a rejection.
    Reject,
    /// The corrector failed; retry with the given step without counting a
    /// rejection.
    Retry(Float),
}

/// What the orchestrator knows about the attempt being made.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Attempt {
    /// No step has been accepted yet.
    pub first: bool,
    /// The previous attempt was rejected or retried.
    pub reject: bool,
}

pub(crate) trait Driver {
    /// Order used to size the automatic initial step.
    const ORDER: usize;

    /// Prepare for a run from `(x, y)`. `f0` is `f(x, y)` when the
    /// orchestrator already evaluated it.
    fn init<F: ODE>(
        &mut self,
        ode: &F,
        x: Float,
        y: &[Float],
        f0: Option<&[Float]>,
        stats: &mut Stats,
    ) -> Result<(), Error>;

    /// Compute a trial step of size `h` without touching `y`.
    fn step<F: ODE>(
        &mut self,
        ode: &F,
        x: Float,
        y: &[Float],
        h: Float,
        attempt: Attempt,
        stats: &mut Stats,
    ) -> Result<Trial, Error>;

    /// Commit the last trial: advance `y` to `x + h` and return the proposed
    /// next step size. `last` is set for the step that lands on the end
    /// point; `stats.naccepted` already counts this step.
    fn accept<F: ODE>(
        &mut self,
        ode: &F,
        x: Float,
        y: &mut [Float],
        h: Float,
        last: bool,
        stats: &mut Stats,
    ) -> Float;

    /// Step size to retry with after a rejected trial.
    fn reject(&mut self, h: Float, attempt: Attempt) -> Float;

    /// Final say on the next step size once it is known not to reach the end
    /// point.
    fn keep_step(&mut self, _h: Float, hnew: Float) -> Float {
        hnew
    }

    /// Dense-output coefficients of the last accepted step.
    fn cont(&self) -> &[Float];

    fn cont_fn(&self) -> ContFn;
}
