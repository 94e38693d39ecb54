//! User-supplied ODE system.

use crate::{matrix::SystemMatrix, Float};

/// User-supplied ODE system `M·y' = f(x, y)`.
///
/// Implement this trait for your problem to provide the right-hand side
/// function. The integrator repeatedly calls `ode` with the current abscissa
/// `x` and state `y` and expects you to fill `dydx` with the derivative
/// values.
///
/// The Jacobian and the mass matrix are optional. Both receive a
/// [`SystemMatrix`] that has already been cleared and whose storage (dense or
/// sparse triplet) follows the solver configuration; entries written with
/// [`SystemMatrix::put`] are summed, so a sparse Jacobian may be assembled
/// from overlapping contributions. Returning `false` means "not provided":
/// the Jacobian is then approximated by finite differences and the mass
/// matrix is the identity.
///
/// # Example
///
/// ```
/// use odekit::prelude::*;
///
/// struct VanDerPol { eps: f64 }
///
/// impl ODE for VanDerPol {
///     fn ode(&self, _x: f64, y: &[f64], dydx: &mut [f64]) {
///         dydx[0] = y[1];
///         dydx[1] = ((1.0 - y[0] * y[0]) * y[1] - y[0]) / self.eps;
///     }
///
///     fn jac(&self, _x: f64, y: &[f64], jac: &mut SystemMatrix) -> bool {
///         jac.put(0, 1, 1.0);
///         jac.put(1, 0, (-2.0 * y[0] * y[1] - 1.0) / self.eps);
///         jac.put(1, 1, (1.0 - y[0] * y[0]) / self.eps);
///         true
///     }
/// }
/// ```
pub trait ODE {
    /// Right-hand side `f(x, y)`.
    fn ode(&self, x: Float, y: &[Float], dydx: &mut [Float]);

    /// Jacobian `df/dy` at `(x, y)`.
    fn jac(&self, _x: Float, _y: &[Float], _jac: &mut SystemMatrix) -> bool {
        false
    }

    /// Constant mass matrix `M`.
    fn mass(&self, _mass: &mut SystemMatrix) -> bool {
        false
    }
}

impl<T: ODE + ?Sized> ODE for &T {
    fn ode(&self, x: Float, y: &[Float], dydx: &mut [Float]) {
        (**self).ode(x, y, dydx)
    }

    fn jac(&self, x: Float, y: &[Float], jac: &mut SystemMatrix) -> bool {
        (**self).jac(x, y, jac)
    }

    fn mass(&self, mass: &mut SystemMatrix) -> bool {
        (**self).mass(mass)
    }
}
