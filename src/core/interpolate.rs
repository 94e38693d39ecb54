//! Interpolation trait

use crate::Float;

/// Evaluates the continuous extension of the last accepted step.
pub trait Interpolate {
    /// Interpolate the solution at the given abscissa `xi`.
    fn interpolate(&self, xi: Float, yi: &mut [Float]);
}
