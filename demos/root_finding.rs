//! # Example: Newton root finding
//!
//! Solve
//!
//! x0^3 + x1 - 1 = 0
//! -x0 + x1^3 + 1 = 0
//!
//! from (0.5, 0.5) with the stand-alone Newton solver, once with an
//! analytic Jacobian and line search, once with a finite-difference
//! Jacobian given by a closure.

use odekit::matrix::{Storage, SystemMatrix};
use odekit::num::{NlSolver, Residual};

struct Cubic;

impl Residual for Cubic {
    fn residual(&self, x: &[f64], fx: &mut [f64]) {
        fx[0] = x[0].powi(3) + x[1] - 1.0;
        fx[1] = -x[0] + x[1].powi(3) + 1.0;
    }

    fn jacobian(&self, x: &[f64], jac: &mut SystemMatrix) -> bool {
        jac.put(0, 0, 3.0 * x[0] * x[0]);
        jac.put(0, 1, 1.0);
        jac.put(1, 0, -1.0);
        jac.put(1, 1, 3.0 * x[1] * x[1]);
        true
    }
}

fn main() -> Result<(), odekit::Error> {
    env_logger::init();

    let mut x = [0.5, 0.5];
    let mut nls = NlSolver::from_options(2, Storage::Dense, &[("linSearch", 1.0), ("atol", 1e-10), ("rtol", 1e-10)])?;
    nls.solve(&Cubic, &mut x)?;
    println!("analytic Jacobian: x = {x:?} after {} iterations", nls.it);

    let cubic = |x: &[f64], fx: &mut [f64]| Cubic.residual(x, fx);
    let mut x = [0.5, 0.5];
    let mut nls = NlSolver::new(2, Storage::Dense);
    nls.solve(&cubic, &mut x)?;
    println!(
        "numerical Jacobian: x = {x:?} after {} iterations ({} F evaluations)",
        nls.it, nls.nfeval
    );
    Ok(())
}
