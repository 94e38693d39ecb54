//! Finite-difference Jacobians and Jacobian checks.

use log::debug;

use crate::{
    core::ode::ODE,
    error::Error,
    matrix::{Storage, SystemMatrix},
    Float,
};

/// Machine epsilon used to size finite-difference perturbations.
pub const MACHEPS: Float = Float::EPSILON;

/// One-sided finite-difference approximation of `df/dx`.
///
/// `f0` must hold `f(x)`. Column `j` is obtained from one extra evaluation at
/// `x + δ·e_j` with `δ = sqrt(eps·max(1e-5, |x_j|))`; `x` is restored on
/// return. Only nonzero differences are written into `jac`, which must have
/// been cleared by the caller. Returns the number of evaluations of `fcn`.
pub fn numerical_jacobian<F>(
    jac: &mut SystemMatrix,
    x: &mut [Float],
    f0: &[Float],
    work: &mut [Float],
    eps: Float,
    mut fcn: F,
) -> usize
where
    F: FnMut(&[Float], &mut [Float]),
{
    let n = x.len();
    for j in 0..n {
        let xj = x[j];
        let delta = (eps * xj.abs().max(1e-5)).sqrt();
        x[j] = xj + delta;
        fcn(x, work);
        for i in 0..n {
            let dfdx = (work[i] - f0[i]) / delta;
            if dfdx != 0.0 {
                jac.put(i, j, dfdx);
            }
        }
        x[j] = xj;
    }
    n
}

/// Compare the Jacobian supplied by `ode` at `(x, y)` with finite
/// differences and return the largest absolute entry difference.
///
/// Fails with [`Error::JacobianMismatch`] when the difference exceeds `tol`,
/// and with [`Error::InvalidValue`] when `ode` does not supply a Jacobian.
pub fn compare_jacobian<F: ODE>(ode: &F, x: Float, y: &[Float], tol: Float) -> Result<Float, Error> {
    let n = y.len();
    let mut analytic = SystemMatrix::new(Storage::Dense, n);
    if !ode.jac(x, y, &mut analytic) {
        return Err(Error::invalid("jacobian", "the system does not provide an analytic Jacobian"));
    }
    let mut f0 = vec![0.0; n];
    let mut work = vec![0.0; n];
    let mut ytmp = y.to_vec();
    ode.ode(x, y, &mut f0);
    let mut numeric = SystemMatrix::new(Storage::Dense, n);
    numerical_jacobian(&mut numeric, &mut ytmp, &f0, &mut work, MACHEPS, |yy, fy| {
        ode.ode(x, yy, fy)
    });
    let maxdiff = analytic.to_dense().max_diff(&numeric.to_dense());
    debug!("Jacobian check at x = {x}: maxdiff = {maxdiff:e} (tol = {tol:e})");
    if maxdiff > tol {
        return Err(Error::JacobianMismatch { maxdiff, tol });
    }
    Ok(maxdiff)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    /// 6-equation system with known Jacobian
    struct Coupled;

    impl ODE for Coupled {
        fn ode(&self, _x: Float, y: &[Float], f: &mut [Float]) {
            f[0] = 2.0 * y[0] - y[1] + y[2].sin() - y[3].cos() - y[5] * y[5] - 1.0;
            f[1] = -y[0] + 2.0 * y[1] + y[3].cos() - y[4].sin() + y[5] * y[5] + 1.0;
            f[2] = y[0] + 3.0 * y[1] + y[3].sin() - y[4].cos() - y[5] * y[5] - 1.0;
            f[3] = 2.0 * y[0] * y[0] + y[1] * y[1] + y[2].cos() + y[3].sin() - y[4].cos();
            f[4] = 4.0 * y[0] * y[0] + y[1] * y[1] - y[2].sin() - y[3].cos() + y[4].sin();
            f[5] = y[0] + y[1] + y[2] + y[3] + y[4] - y[5];
        }

        fn jac(&self, _x: Float, y: &[Float], j: &mut SystemMatrix) -> bool {
            j.put(0, 0, 2.0);
            j.put(0, 1, -1.0);
            j.put(0, 2, y[2].cos());
            j.put(0, 3, y[3].sin());
            j.put(0, 5, -2.0 * y[5]);
            j.put(1, 0, -1.0);
            j.put(1, 1, 2.0);
            j.put(1, 3, -y[3].sin());
            j.put(1, 4, -y[4].cos());
            j.put(1, 5, 2.0 * y[5]);
            j.put(2, 0, 1.0);
            j.put(2, 1, 3.0);
            j.put(2, 3, y[3].cos());
            j.put(2, 4, y[4].sin());
            j.put(2, 5, -2.0 * y[5]);
            j.put(3, 0, 4.0 * y[0]);
            j.put(3, 1, 2.0 * y[1]);
            j.put(3, 2, -y[2].sin());
            j.put(3, 3, y[3].cos());
            j.put(3, 4, y[4].sin());
            j.put(4, 0, 8.0 * y[0]);
            j.put(4, 1, 2.0 * y[1]);
            j.put(4, 2, -y[2].cos());
            j.put(4, 3, y[3].sin());
            j.put(4, 4, y[4].cos());
            for c in 0..5 {
                j.put(5, c, 1.0);
            }
            j.put(5, 5, -1.0);
            true
        }
    }

    #[test]
    fn analytic_matches_finite_differences() {
        let pi = std::f64::consts::PI;
        let y = [5.0, 5.0, pi, pi, pi, 5.0];
        let maxdiff = compare_jacobian(&Coupled, 0.0, &y, 1e-5).unwrap();
        assert!(maxdiff < 1e-5);
    }

    #[test]
    fn wrong_entry_is_detected() {
        struct Wrong;
        impl ODE for Wrong {
            fn ode(&self, _x: Float, y: &[Float], f: &mut [Float]) {
                f[0] = y[0] * y[1];
                f[1] = -y[0];
            }
            fn jac(&self, _x: Float, y: &[Float], j: &mut SystemMatrix) -> bool {
                j.put(0, 0, y[1]);
                j.put(0, 1, y[1]);
                j.put(1, 0, -1.0);
                true
            }
        }
        let err = compare_jacobian(&Wrong, 0.0, &[1.0, 2.0], 1e-6).unwrap_err();
        match err {
            Error::JacobianMismatch { maxdiff, .. } => assert_relative_eq!(maxdiff, 1.0, epsilon = 1e-6),
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn counts_one_evaluation_per_column() {
        let mut jac = SystemMatrix::new(Storage::Sparse, 3);
        let mut x = [1.0, 0.0, -2.0];
        let f0 = [1.0, 0.0, 4.0];
        let mut work = [0.0; 3];
        let mut calls = 0;
        let nev = numerical_jacobian(&mut jac, &mut x, &f0, &mut work, MACHEPS, |x, f| {
            calls += 1;
            f[0] = x[0];
            f[1] = 0.0;
            f[2] = x[2] * x[2];
        });
        assert_eq!((nev, calls), (3, 3));
        assert_eq!(x, [1.0, 0.0, -2.0]);
        let d = jac.to_dense();
        assert_relative_eq!(d[(0, 0)], 1.0, epsilon = 1e-7);
        assert_relative_eq!(d[(2, 2)], -4.0, epsilon = 1e-6);
        assert_eq!(d[(1, 1)], 0.0);
    }
}
