//! Newton solver for nonlinear systems `F(x) = 0`.
//!
//! The same scaled-increment test as the implicit integrators is used
//! (`Ldx < fnewt`), together with an absolute test on `max|F(x)|`. The
//! Jacobian is either supplied by the system or approximated by finite
//! differences; with `cteJac` it is evaluated and factorized once per solve
//! (modified Newton).
//!
//! Options are given by name, and unknown names are rejected:
//!
//! | Name          | Default | Meaning                                   |
//! |---------------|---------|-------------------------------------------|
//! | `cteJac`      | off     | keep the first Jacobian for all iterations|
//! | `linSearch`   | off     | damp each update with a line search       |
//! | `linSchMaxIt` | 20      | maximum line-search trials                |
//! | `maxIt`       | 20      | maximum Newton iterations                 |
//! | `chkConv`     | off     | fail when `Θ = Ldx/Ldx_prev > 0.99`       |
//! | `atol`        | 1e-8    | absolute tolerance of the scaling         |
//! | `rtol`        | 1e-8    | relative tolerance of the scaling         |
//! | `ftol`        | 1e-9    | bound on `max|F(x)|`                      |
//!
//! Flags are on when their value is positive.

use log::{debug, trace};

use crate::{
    core::tolerance::Tolerance,
    error::{count, positive, Error},
    linsol::{DenseLu, LinSol},
    matrix::{Matrix, Storage, SystemMatrix},
    num::{
        jacobian::{numerical_jacobian, MACHEPS},
        linesearch::line_search,
        norm::{max_abs, newton_tolerance, scale_abs},
    },
    Float,
};

/// Option names accepted by [`NlSolver::from_options`].
pub const NLSOLVER_OPTIONS: &[&str] = &[
    "cteJac",
    "linSearch",
    "linSchMaxIt",
    "maxIt",
    "chkConv",
    "atol",
    "rtol",
    "ftol",
];

/// A nonlinear system `F(x) = 0`.
///
/// Any `Fn(&[f64], &mut [f64])` closure is a system without an analytic
/// Jacobian.
pub trait Residual {
    /// Write `F(x)` into `fx`.
    fn residual(&self, x: &[Float], fx: &mut [Float]);

    /// Write `dF/dx` into the cleared `jac`; `false` when not provided.
    fn jacobian(&self, _x: &[Float], _jac: &mut SystemMatrix) -> bool {
        false
    }
}

impl<F> Residual for F
where
    F: Fn(&[Float], &mut [Float]),
{
    fn residual(&self, x: &[Float], fx: &mut [Float]) {
        self(x, fx)
    }
}

/// Newton solver with optional line search. See the module docs for the
/// options.
#[derive(Debug)]
pub struct NlSolver {
    neq: usize,
    cte_jac: bool,
    lin_search: bool,
    lin_sch_max_it: usize,
    max_it: usize,
    chk_conv: bool,
    atol: Float,
    rtol: Float,
    ftol: Float,
    fnewt: Float,

    scal: Vec<Float>,
    fx: Vec<Float>,
    mdx: Vec<Float>,
    x0: Vec<Float>,
    dphidx: Vec<Float>,
    work: Vec<Float>,
    jac: SystemMatrix,
    lis: LinSol<Float>,

    /// Iterations used by the last [`NlSolver::solve`].
    pub it: usize,
    /// Evaluations of `F`, finite-difference columns included.
    pub nfeval: usize,
    /// Jacobian evaluations.
    pub njeval: usize,
}

impl NlSolver {
    /// Solver with default options for `neq` equations.
    pub fn new(neq: usize, storage: Storage) -> Self {
        let mut solver = Self {
            neq,
            cte_jac: false,
            lin_search: false,
            lin_sch_max_it: 20,
            max_it: 20,
            chk_conv: false,
            atol: 1e-8,
            rtol: 1e-8,
            ftol: 1e-9,
            fnewt: 0.0,
            scal: vec![0.0; neq],
            fx: vec![0.0; neq],
            mdx: vec![0.0; neq],
            x0: vec![0.0; neq],
            dphidx: vec![0.0; neq],
            work: vec![0.0; neq],
            jac: SystemMatrix::new(storage, neq),
            lis: LinSol::new(),
            it: 0,
            nfeval: 0,
            njeval: 0,
        };
        solver.fnewt = newton_tolerance(solver.rtol, MACHEPS);
        solver
    }

    /// Solver configured from `(name, value)` pairs.
    pub fn from_options(neq: usize, storage: Storage, options: &[(&str, Float)]) -> Result<Self, Error> {
        let mut s = Self::new(neq, storage);
        for &(name, value) in options {
            match name {
                "cteJac" => s.cte_jac = value > 0.0,
                "linSearch" => s.lin_search = value > 0.0,
                "linSchMaxIt" => s.lin_sch_max_it = count("linSchMaxIt", value)?,
                "maxIt" => s.max_it = count("maxIt", value)?,
                "chkConv" => s.chk_conv = value > 0.0,
                "atol" => s.atol = positive("atol", value)?,
                "rtol" => s.rtol = positive("rtol", value)?,
                "ftol" => s.ftol = positive("ftol", value)?,
                _ => {
                    return Err(Error::UnknownOption {
                        name: name.to_string(),
                        accepted: NLSOLVER_OPTIONS,
                    })
                }
            }
        }
        s.fnewt = newton_tolerance(s.rtol, MACHEPS);
        Ok(s)
    }

    /// Convergence bound on the scaled increment.
    pub fn fnewt(&self) -> Float {
        self.fnewt
    }

    /// Solve `F(x) = 0` starting from `x`, which holds the root on success.
    pub fn solve<R: Residual>(&mut self, sys: &R, x: &mut [Float]) -> Result<(), Error> {
        if x.len() != self.neq {
            return Err(Error::Dimension {
                what: "initial guess",
                expected: self.neq,
                got: x.len(),
            });
        }
        let n = self.neq;
        scale_abs(&mut self.scal, &Tolerance::Scalar(self.atol), &Tolerance::Scalar(self.rtol), x);
        sys.residual(x, &mut self.fx);
        self.nfeval = 1;
        self.njeval = 0;

        let mut ldx_prev: Float = 0.0;
        let mut it = 0;
        let mut converged = false;
        while it < self.max_it {
            self.it = it;
            let fx_max = max_abs(&self.fx);
            if fx_max < self.ftol {
                trace!("it = {it}: converged on max|f| = {fx_max:e}");
                converged = true;
                break;
            }

            // --- Jacobian and factorization ---
            if it == 0 || !self.cte_jac {
                self.jac.start();
                if !sys.jacobian(x, &mut self.jac) {
                    self.nfeval += numerical_jacobian(&mut self.jac, x, &self.fx, &mut self.work, MACHEPS, |xx, ff| {
                        sys.residual(xx, ff)
                    });
                }
                self.njeval += 1;
                self.lis.factorize(&self.jac)?;
            }

            // --- Newton update ---
            self.mdx.copy_from_slice(&self.fx);
            self.lis.solve(&mut self.mdx)?;
            let phi0 = 0.5 * self.fx.iter().map(|f| f * f).sum::<Float>();
            if self.lin_search {
                self.jac.mul_transpose_vec(&self.fx, &mut self.dphidx);
            }
            self.x0.copy_from_slice(x);
            for (xi, di) in x.iter_mut().zip(&self.mdx) {
                *xi -= di;
            }
            let mut ldx = self.increment_norm(x);
            sys.residual(x, &mut self.fx);
            self.nfeval += 1;

            let fx_max = max_abs(&self.fx);
            trace!("it = {it}: Ldx = {ldx:e}, max|f| = {fx_max:e}");
            if fx_max < self.ftol || ldx < self.fnewt {
                converged = true;
                break;
            }

            // --- Line search ---
            if self.lin_search {
                self.nfeval += line_search(
                    x,
                    &mut self.fx,
                    |xx, ff| sys.residual(xx, ff),
                    &self.mdx,
                    &self.x0,
                    &self.dphidx,
                    phi0,
                    self.lin_sch_max_it,
                );
                ldx = self.increment_norm(x);
                if ldx < self.fnewt {
                    converged = true;
                    break;
                }
            }

            if it > 0 && self.chk_conv {
                let theta = ldx / ldx_prev;
                if theta > 0.99 {
                    return Err(Error::Divergence {
                        theta,
                        ldx,
                        ldx_prev,
                    });
                }
            }
            ldx_prev = ldx;
            it += 1;
        }
        self.it = it;
        if !converged {
            return Err(Error::NoConvergence { iterations: it });
        }
        debug!(
            "nonlinear solve of {n} equations converged: it = {}, nfeval = {}, njeval = {}",
            self.it, self.nfeval, self.njeval
        );
        Ok(())
    }

    /// Frobenius condition number of the Jacobian at `x`.
    ///
    /// With `tol = Some(..)` the Jacobian in use (analytic when the system
    /// supplies one) is also compared entry-wise with finite differences and
    /// [`Error::JacobianMismatch`] is returned when they differ by more than
    /// `tol`.
    pub fn check_jacobian<R: Residual>(&mut self, sys: &R, x: &[Float], tol: Option<Float>) -> Result<Float, Error> {
        let n = self.neq;
        let mut xw = x.to_vec();
        sys.residual(x, &mut self.fx);
        self.jac.start();
        if !sys.jacobian(x, &mut self.jac) {
            numerical_jacobian(&mut self.jac, &mut xw, &self.fx, &mut self.work, MACHEPS, |xx, ff| {
                sys.residual(xx, ff)
            });
        }
        let jmat = self.jac.to_dense();

        let mut lu = DenseLu::new(n);
        lu.factorize(&jmat)?;
        let mut inv = Matrix::zeros(n, n);
        let mut col = vec![0.0; n];
        for j in 0..n {
            col.iter_mut().enumerate().for_each(|(i, c)| *c = if i == j { 1.0 } else { 0.0 });
            lu.solve(&mut col)?;
            for (i, &c) in col.iter().enumerate() {
                inv[(i, j)] = c;
            }
        }
        let cond = jmat.norm_frobenius() * inv.norm_frobenius();
        if !cond.is_finite() {
            return Err(Error::invalid("jacobian", format!("condition number is {cond}")));
        }

        if let Some(tol) = tol {
            let mut numeric = SystemMatrix::new(Storage::Dense, n);
            numerical_jacobian(&mut numeric, &mut xw, &self.fx, &mut self.work, MACHEPS, |xx, ff| {
                sys.residual(xx, ff)
            });
            let maxdiff = jmat.max_diff(&numeric.to_dense());
            if maxdiff > tol {
                return Err(Error::JacobianMismatch { maxdiff, tol });
            }
        }
        Ok(cond)
    }

    fn increment_norm(&self, x: &[Float]) -> Float {
        let sum: Float = x
            .iter()
            .zip(&self.x0)
            .zip(&self.scal)
            .map(|((xi, x0i), s)| ((xi - x0i) / s) * ((xi - x0i) / s))
            .sum();
        (sum / self.neq as Float).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{E, PI};

    use approx::assert_abs_diff_eq;

    use super::*;

    struct Cubic;

    impl Residual for Cubic {
        fn residual(&self, x: &[Float], fx: &mut [Float]) {
            fx[0] = x[0].powi(3) + x[1] - 1.0;
            fx[1] = -x[0] + x[1].powi(3) + 1.0;
        }

        fn jacobian(&self, x: &[Float], jac: &mut SystemMatrix) -> bool {
            jac.put(0, 0, 3.0 * x[0] * x[0]);
            jac.put(0, 1, 1.0);
            jac.put(1, 0, -1.0);
            jac.put(1, 1, 3.0 * x[1] * x[1]);
            true
        }
    }

    struct Trig;

    impl Residual for Trig {
        fn residual(&self, x: &[Float], fx: &mut [Float]) {
            fx[0] = 0.5 * (x[0] * x[1]).sin() - 0.25 * x[1] / PI - 0.5 * x[0];
            fx[1] = (1.0 - 0.25 / PI) * ((2.0 * x[0]).exp() - E) + E * x[1] / PI - 2.0 * E * x[0];
        }

        fn jacobian(&self, x: &[Float], jac: &mut SystemMatrix) -> bool {
            jac.put(0, 0, 0.5 * x[1] * (x[0] * x[1]).cos() - 0.5);
            jac.put(0, 1, 0.5 * x[0] * (x[0] * x[1]).cos() - 0.25 / PI);
            jac.put(1, 0, (2.0 - 0.5 / PI) * (2.0 * x[0]).exp() - 2.0 * E);
            jac.put(1, 1, E / PI);
            true
        }
    }

    fn tight() -> Vec<(&'static str, Float)> {
        vec![("atol", 1e-10), ("rtol", 1e-10), ("ftol", 10.0 * MACHEPS), ("linSearch", 1.0)]
    }

    #[test]
    fn cubic_system_with_line_search() {
        let mut fx = [0.0; 2];
        let mut x = [0.5, 0.5];
        let mut nls = NlSolver::from_options(2, Storage::Sparse, &tight()).unwrap();
        nls.solve(&Cubic, &mut x).unwrap();
        Cubic.residual(&x, &mut fx);
        assert_abs_diff_eq!(fx[0], 0.0, epsilon = 1e-15);
        assert_abs_diff_eq!(fx[1], 0.0, epsilon = 1e-15);
        assert_abs_diff_eq!(x[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(x[1], 0.0, epsilon = 1e-12);
        let cond = nls.check_jacobian(&Cubic, &x, Some(1e-5)).unwrap();
        assert!(cond > 1.0);

        // same root with a finite-difference Jacobian
        let closure = |x: &[Float], fx: &mut [Float]| Cubic.residual(x, fx);
        let mut xx = [0.5, 0.5];
        let mut nls = NlSolver::from_options(2, Storage::Dense, &tight()).unwrap();
        nls.solve(&closure, &mut xx).unwrap();
        assert_abs_diff_eq!(xx[0], x[0], epsilon = 1e-10);
        assert_abs_diff_eq!(xx[1], x[1], epsilon = 1e-10);
        assert!(nls.nfeval > nls.njeval * 2);
    }

    #[test]
    fn exponential_system() {
        let f = |x: &[Float], fx: &mut [Float]| {
            fx[0] = 2.0 * x[0] - x[1] - (-x[0]).exp();
            fx[1] = -x[0] + 2.0 * x[1] - (-x[1]).exp();
        };
        let mut x = [5.0, 5.0];
        let mut nls = NlSolver::from_options(2, Storage::Sparse, &tight()).unwrap();
        nls.solve(&f, &mut x).unwrap();
        assert_abs_diff_eq!(x[0], 0.5671432904097838, epsilon = 1e-10);
        assert_abs_diff_eq!(x[1], 0.5671432904097838, epsilon = 1e-10);
    }

    #[test]
    fn trig_system_without_line_search() {
        let opts = [("atol", 1e-6), ("rtol", 1e-3), ("ftol", 10.0 * MACHEPS), ("linSearch", 0.0)];
        let mut fx = [0.0; 2];
        for storage in [Storage::Sparse, Storage::Dense] {
            let mut nls = NlSolver::from_options(2, storage, &opts).unwrap();

            let mut x = [0.4, 3.0];
            nls.solve(&Trig, &mut x).unwrap();
            assert_abs_diff_eq!(x[0], -0.2605992900257, epsilon = 1e-12);
            assert_abs_diff_eq!(x[1], 0.6225308965998, epsilon = 1e-12);

            let mut x = [0.7, 4.0];
            nls.solve(&Trig, &mut x).unwrap();
            assert_abs_diff_eq!(x[0], 0.5, epsilon = 1e-6);
            assert_abs_diff_eq!(x[1], PI, epsilon = 1e-6);

            // converges to a different root
            let mut x = [1.0, 4.0];
            nls.solve(&Trig, &mut x).unwrap();
            Trig.residual(&x, &mut fx);
            assert_abs_diff_eq!(fx[0], 0.0, epsilon = 1e-8);
            assert_abs_diff_eq!(fx[1], 0.0, epsilon = 1e-8);
        }
    }

    #[test]
    fn unknown_option_lists_accepted_names() {
        let err = NlSolver::from_options(2, Storage::Dense, &[("lineSearch", 1.0)]).unwrap_err();
        assert!(matches!(err, Error::UnknownOption { ref name, .. } if name == "lineSearch"));
        assert!(err.to_string().contains("linSearch"));
        assert!(matches!(
            NlSolver::from_options(2, Storage::Dense, &[("maxIt", 0.0)]),
            Err(Error::InvalidValue { name: "maxIt", .. })
        ));
        assert!(matches!(
            NlSolver::from_options(2, Storage::Dense, &[("ftol", -1.0)]),
            Err(Error::InvalidValue { name: "ftol", .. })
        ));
    }

    #[test]
    fn exhaustion_is_fatal() {
        // x^2 + 1 = 0 has no real root
        let f = |x: &[Float], fx: &mut [Float]| fx[0] = x[0] * x[0] + 1.0;
        let mut nls = NlSolver::from_options(1, Storage::Dense, &[("maxIt", 5.0)]).unwrap();
        let mut x = [0.5];
        assert_eq!(nls.solve(&f, &mut x), Err(Error::NoConvergence { iterations: 5 }));
    }

    #[test]
    fn divergence_is_reported() {
        let f = |x: &[Float], fx: &mut [Float]| fx[0] = x[0] * x[0] + 1.0;
        let mut nls = NlSolver::from_options(1, Storage::Dense, &[("chkConv", 1.0)]).unwrap();
        let mut x = [0.5];
        match nls.solve(&f, &mut x) {
            Err(Error::Divergence { theta, ldx, ldx_prev }) => {
                assert!(theta > 0.99);
                assert_abs_diff_eq!(theta, ldx / ldx_prev, epsilon = 1e-12);
            }
            other => panic!("unexpected result {other:?}"),
        }
        assert!(nls.nfeval > 0);
    }
}
