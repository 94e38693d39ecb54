//! User defined callback hooks executed while integrating.

use crate::{core::interpolate::Interpolate, Float};

/// Return flags for [`SolOut`].
///
/// - `Continue`: proceed with integration as normal.
/// - `Interrupt`: stop integration and return control to the caller with
///   [`Status::Interrupted`](crate::core::status::Status).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFlag {
    Continue,
    Interrupt,
}

/// Observer of a running integration.
///
/// Both hooks default to doing nothing, so implementors only write the one
/// they need; `()` is the "no observer" value.
///
/// `solout` is invoked once for the initial point (`istep == 0`,
/// `xold == x`) and after every accepted step, with `istep` the number of
/// accepted steps so far. The `interpolator` evaluates the continuous
/// extension anywhere in `[xold, x]`.
///
/// `dense` is invoked at every requested output point when dense output is
/// enabled in the configuration. It receives the step index, the size `h`
/// of the step that covered the point, the step end `x` with its state `y`,
/// and the output point `xout` with the interpolated `yout`.
///
/// # Example
///
/// ```
/// use odekit::prelude::*;
///
/// struct Printer;
///
/// impl SolOut for Printer {
///     fn dense(&mut self, istep: usize, _h: f64, _x: f64, _y: &[f64], xout: f64, yout: &[f64]) -> ControlFlag {
///         println!("{istep:5} {xout:7.3} {:?}", yout);
///         ControlFlag::Continue
///     }
/// }
/// ```
pub trait SolOut {
    fn solout(
        &mut self,
        _istep: usize,
        _xold: Float,
        _x: Float,
        _y: &[Float],
        _interpolator: &dyn Interpolate,
    ) -> ControlFlag {
        ControlFlag::Continue
    }

    fn dense(
        &mut self,
        _istep: usize,
        _h: Float,
        _x: Float,
        _y: &[Float],
        _xout: Float,
        _yout: &[Float],
    ) -> ControlFlag {
        ControlFlag::Continue
    }
}

impl SolOut for () {}
