//! Radau5: 3-stage, order-5 Radau IIA implicit Runge–Kutta method.
//!
//! Solves stiff problems `M·y' = f(x, y)` with simplified Newton iterations.
//! The stage system is decoupled by the eigenstructure of the coefficient
//! matrix into one real and one complex `n×n` system, which are factorized
//! once and reused while the step size and Jacobian stay valid:
//!
//! - a new Jacobian is evaluated when the previous step converged slowly
//!   (`θ > theta_max`) or after a failure that happened with an old
//!   Jacobian;
//! - the two matrices are refactorized for every new step size; a
//!   step-size proposal within `[c1h, c2h]·h` is ignored to keep the
//!   factorization.
//!
//! Divergence of the Newton iteration (`θ ≥ 0.99`) is not fatal: the step
//! is retried with half the size, like any other corrector failure.
//!
//! The error estimate uses the embedded formula with one extra solve
//! (and, after a rejection, one extra `f` evaluation) to filter the stiff
//! components. Reference: Hairer & Wanner, Solving ODEs II (Radau IIA).

use log::trace;
use num_complex::Complex64;

use crate::{
    core::{ode::ODE, stats::Stats, tolerance::Tolerance},
    error::Error,
    linsol::LinSol,
    matrix::{Storage, SystemMatrix},
    methods::{Attempt, ContFn, Driver, Trial},
    num::{
        jacobian::numerical_jacobian,
        norm::{newton_tolerance, scale_abs},
    },
    solve::Config,
    Float,
};

/// Radau IIA(5) driver with adaptive steps and dense output.
#[derive(Debug)]
pub(crate) struct Radau5 {
    n: usize,
    atol: Tolerance,
    rtol: Tolerance,
    fnewt: Float,
    uround: Float,
    nit: usize,
    thet: Float,
    safe: Float,
    facr: Float,
    facl: Float,
    quot1: Float,
    quot2: Float,
    pred_ctrl: bool,
    zero_trial: bool,
    cte_jac: bool,
    storage: Storage,

    // --- Matrices and factorizations ---
    jac: SystemMatrix,
    mass: Option<SystemMatrix>,
    e1: SystemMatrix<Float>,
    e2: SystemMatrix<Complex64>,
    lu1: LinSol<Float>,
    lu2: LinSol<Complex64>,

    // --- Work vectors ---
    z1: Vec<Float>,
    z2: Vec<Float>,
    z3: Vec<Float>,
    f1: Vec<Float>,
    f2: Vec<Float>,
    f3: Vec<Float>,
    k1: Vec<Float>,
    k2: Vec<Float>,
    k3: Vec<Float>,
    zc: Vec<Complex64>,
    ytmp: Vec<Float>,
    f0: Vec<Float>,
    scal: Vec<Float>,
    /// `[y_{n+1}, c1, c2, c3]`
    cont: Vec<Float>,

    // --- Iteration state ---
    need_jac: bool,
    caljac: bool,
    have_jac: bool,
    need_lu: bool,
    hold: Float,
    faccon: Float,
    theta: Float,
    err: Float,
    quot: Float,
    hnew: Float,
    hacc: Float,
    erracc: Float,
}

impl Radau5 {
    pub fn new(n: usize, config: &Config) -> Self {
        // tolerances for the order-5 error estimate
        let rtol: Vec<Float> = (0..n).map(|i| 0.1 * config.rtol[i].powf(2.0 / 3.0)).collect();
        let atol: Vec<Float> = (0..n)
            .map(|i| rtol[i] * config.atol[i] / config.rtol[i])
            .collect();
        let rtol_min = rtol.iter().copied().fold(Float::INFINITY, Float::min);
        Self {
            n,
            fnewt: newton_tolerance(rtol_min, config.eps),
            atol: Tolerance::Vector(atol),
            rtol: Tolerance::Vector(rtol),
            uround: config.eps,
            nit: config.nmax_newton,
            thet: config.theta_max,
            safe: config.safety,
            facr: config.mmin,
            facl: config.mmax,
            quot1: config.c1h,
            quot2: config.c2h,
            pred_ctrl: config.pred_ctrl,
            zero_trial: config.zero_trial,
            cte_jac: config.cte_jac,
            storage: config.storage,
            jac: SystemMatrix::new(config.storage, n),
            mass: None,
            e1: SystemMatrix::new(config.storage, n),
            e2: SystemMatrix::new(config.storage, n),
            lu1: LinSol::new(),
            lu2: LinSol::new(),
            z1: vec![0.0; n],
            z2: vec![0.0; n],
            z3: vec![0.0; n],
            f1: vec![0.0; n],
            f2: vec![0.0; n],
            f3: vec![0.0; n],
            k1: vec![0.0; n],
            k2: vec![0.0; n],
            k3: vec![0.0; n],
            zc: vec![Complex64::new(0.0, 0.0); n],
            ytmp: vec![0.0; n],
            f0: vec![0.0; n],
            scal: vec![0.0; n],
            cont: vec![0.0; 4 * n],
            need_jac: true,
            caljac: false,
            have_jac: false,
            need_lu: true,
            hold: 0.0,
            faccon: 1.0,
            theta: config.theta_max,
            err: 0.0,
            quot: 1.0,
            hnew: 0.0,
            hacc: 0.0,
            erracc: 0.0,
        }
    }

    /// Jacobian at `(x, y)` and the factorized matrices `E1 = (u1/h)·M − J`,
    /// `E2 = ((α + iβ)/h)·M − J`, as far as they are out of date.
    fn prepare<F: ODE>(&mut self, ode: &F, x: Float, y: &[Float], h: Float, stats: &mut Stats) -> Result<(), Error> {
        if self.need_jac && !(self.cte_jac && self.have_jac) {
            self.jac.start();
            if !ode.jac(x, y, &mut self.jac) {
                self.ytmp.copy_from_slice(y);
                stats.nfeval += numerical_jacobian(&mut self.jac, &mut self.ytmp, &self.f0, &mut self.k1, self.uround, |yy, ff| {
                    ode.ode(x, yy, ff)
                });
            }
            stats.njeval += 1;
            self.caljac = true;
            self.have_jac = true;
            self.need_lu = true;
        }
        self.need_jac = false;

        if self.need_lu {
            let fac1 = U1 / h;
            let shift = Complex64::new(ALPH / h, BETA / h);
            self.e1.combine(fac1, self.mass.as_ref(), -1.0, &self.jac);
            self.e2.combine(shift, self.mass.as_ref(), -1.0, &self.jac);
            self.lu1.factorize(&self.e1)?;
            self.lu2.factorize(&self.e2)?;
            stats.ndecomp += 1;
            self.need_lu = false;
        }
        Ok(())
    }

    /// Newton starting values: zero, or the collocation polynomial of the
    /// previous step extrapolated to the new stage abscissae.
    fn starting_values(&mut self, h: Float, first: bool) {
        let n = self.n;
        if first || self.zero_trial {
            for v in [&mut self.z1, &mut self.z2, &mut self.z3, &mut self.f1, &mut self.f2, &mut self.f3] {
                v.iter_mut().for_each(|x| *x = 0.0);
            }
            return;
        }
        let c3q = h / self.hold;
        let c1q = C1 * c3q;
        let c2q = C2 * c3q;
        for i in 0..n {
            let ak1 = self.cont[n + i];
            let ak2 = self.cont[2 * n + i];
            let ak3 = self.cont[3 * n + i];
            let z1i = c1q * (ak1 + (c1q - C2M1) * (ak2 + (c1q - C1M1) * ak3));
            let z2i = c2q * (ak1 + (c2q - C2M1) * (ak2 + (c2q - C1M1) * ak3));
            let z3i = c3q * (ak1 + (c3q - C2M1) * (ak2 + (c3q - C1M1) * ak3));
            self.z1[i] = z1i;
            self.z2[i] = z2i;
            self.z3[i] = z3i;
            self.f1[i] = TINV00 * z1i + TINV01 * z2i + TINV02 * z3i;
            self.f2[i] = TINV10 * z1i + TINV11 * z2i + TINV12 * z3i;
            self.f3[i] = TINV20 * z1i + TINV21 * z2i + TINV22 * z3i;
        }
    }

    /// Solve the decoupled linear systems for the Newton increments; the
    /// right-hand sides `T⁻¹·f(stages)` are in `z1..z3` on entry.
    fn solve_stages(&mut self, h: Float) -> Result<(), Error> {
        let fac1 = U1 / h;
        let alphn = ALPH / h;
        let betan = BETA / h;
        match &self.mass {
            Some(m) => {
                m.mul_vec(&self.f1, &mut self.k1);
                m.mul_vec(&self.f2, &mut self.k2);
                m.mul_vec(&self.f3, &mut self.k3);
            }
            None => {
                self.k1.copy_from_slice(&self.f1);
                self.k2.copy_from_slice(&self.f2);
                self.k3.copy_from_slice(&self.f3);
            }
        }
        for i in 0..self.n {
            let s1 = -self.k1[i];
            let s2 = -self.k2[i];
            let s3 = -self.k3[i];
            self.z1[i] += s1 * fac1;
            self.zc[i] = Complex64::new(
                self.z2[i] + s2 * alphn - s3 * betan,
                self.z3[i] + s3 * alphn + s2 * betan,
            );
        }
        self.lu1.solve(&mut self.z1)?;
        self.lu2.solve(&mut self.zc)?;
        for (i, c) in self.zc.iter().enumerate() {
            self.z2[i] = c.re;
            self.z3[i] = c.im;
        }
        Ok(())
    }

    /// Embedded error estimate, filtered through `E1`.
    fn estimate_error<F: ODE>(&mut self, ode: &F, x: Float, y: &[Float], h: Float, attempt: Attempt, stats: &mut Stats) -> Result<Float, Error> {
        let hee1 = DD1 / h;
        let hee2 = DD2 / h;
        let hee3 = DD3 / h;
        for i in 0..self.n {
            self.k1[i] = hee1 * self.z1[i] + hee2 * self.z2[i] + hee3 * self.z3[i];
        }
        // k2 = M·k1
        match &self.mass {
            Some(m) => m.mul_vec(&self.k1, &mut self.k2),
            None => self.k2.copy_from_slice(&self.k1),
        }
        for i in 0..self.n {
            self.k3[i] = self.k2[i] + self.f0[i];
        }
        self.lu1.solve(&mut self.k3)?;
        let mut err = self.scaled_rms(&self.k3);

        if err >= 1.0 && (attempt.first || attempt.reject) {
            for i in 0..self.n {
                self.ytmp[i] = y[i] + self.k3[i];
            }
            ode.ode(x, &self.ytmp, &mut self.k1);
            stats.nfeval += 1;
            for i in 0..self.n {
                self.k3[i] = self.k1[i] + self.k2[i];
            }
            self.lu1.solve(&mut self.k3)?;
            err = self.scaled_rms(&self.k3);
        }
        Ok(err)
    }

    fn scaled_rms(&self, v: &[Float]) -> Float {
        let sum: Float = v.iter().zip(&self.scal).map(|(a, s)| (a / s) * (a / s)).sum();
        (sum / self.n as Float).sqrt().max(1e-10)
    }

    fn retry(&mut self, hnew: Float) -> Trial {
        self.need_jac = !self.caljac;
        self.need_lu = true;
        Trial::Retry(hnew)
    }
}

impl Driver for Radau5 {
    const ORDER: usize = 5;

    fn init<F: ODE>(&mut self, ode: &F, x: Float, y: &[Float], f0: Option<&[Float]>, stats: &mut Stats) -> Result<(), Error> {
        let n = self.n;
        match f0 {
            Some(f0) => self.f0.copy_from_slice(f0),
            None => {
                ode.ode(x, y, &mut self.f0);
                stats.nfeval += 1;
            }
        }
        let mut mass = SystemMatrix::new(self.storage, n);
        self.mass = ode.mass(&mut mass).then_some(mass);
        scale_abs(&mut self.scal, &self.atol, &self.rtol, y);
        self.cont.iter_mut().for_each(|c| *c = 0.0);
        self.cont[..n].copy_from_slice(y);
        self.need_jac = true;
        self.caljac = false;
        self.have_jac = false;
        self.need_lu = true;
        self.faccon = 1.0;
        self.theta = self.thet;
        Ok(())
    }

    fn step<F: ODE>(
        &mut self,
        ode: &F,
        x: Float,
        y: &[Float],
        h: Float,
        attempt: Attempt,
        stats: &mut Stats,
    ) -> Result<Trial, Error> {
        let n = self.n;
        let nit = self.nit;
        self.prepare(ode, x, y, h, stats)?;
        self.starting_values(h, attempt.first);

        // --- Simplified Newton iterations ---
        let xph = x + h;
        let mut newt = 0;
        let mut dynold: Float = 0.0;
        let mut thqold: Float = 0.0;
        self.faccon = self.faccon.max(self.uround).powf(0.8);
        self.theta = self.thet.abs();
        loop {
            if newt >= nit {
                trace!("x = {x}: Newton iterations exhausted, halving h = {h:e}");
                return Ok(self.retry(0.5 * h));
            }
            for i in 0..n {
                self.ytmp[i] = y[i] + self.z1[i];
            }
            ode.ode(x + C1 * h, &self.ytmp, &mut self.k1);
            for i in 0..n {
                self.ytmp[i] = y[i] + self.z2[i];
            }
            ode.ode(x + C2 * h, &self.ytmp, &mut self.k2);
            for i in 0..n {
                self.ytmp[i] = y[i] + self.z3[i];
            }
            ode.ode(xph, &self.ytmp, &mut self.k3);
            stats.nfeval += 3;

            for i in 0..n {
                let (a1, a2, a3) = (self.k1[i], self.k2[i], self.k3[i]);
                self.z1[i] = TINV00 * a1 + TINV01 * a2 + TINV02 * a3;
                self.z2[i] = TINV10 * a1 + TINV11 * a2 + TINV12 * a3;
                self.z3[i] = TINV20 * a1 + TINV21 * a2 + TINV22 * a3;
            }
            self.solve_stages(h)?;
            stats.nlinsol += 1;
            newt += 1;
            stats.record_iterations(newt);

            let mut dyno: Float = 0.0;
            for i in 0..n {
                let s = self.scal[i];
                dyno += (self.z1[i] / s).powi(2) + (self.z2[i] / s).powi(2) + (self.z3[i] / s).powi(2);
            }
            let dyno = (dyno / (3 * n) as Float).sqrt();

            // convergence rate
            if newt > 1 && newt < nit {
                let thq = dyno / dynold;
                self.theta = if newt == 2 { thq } else { (thq * thqold).sqrt() };
                thqold = thq;
                if self.theta < 0.99 {
                    self.faccon = self.theta / (1.0 - self.theta);
                    let left = (nit - 1 - newt) as i32;
                    let dyth = self.faccon * dyno * self.theta.powi(left) / self.fnewt;
                    if dyth >= 1.0 {
                        let qnewt = dyth.clamp(1.0e-4, 20.0);
                        let hhfac = 0.8 * qnewt.powf(-1.0 / (4.0 + left as Float));
                        trace!("x = {x}: slow convergence (theta = {:e}), h *= {hhfac:.3}", self.theta);
                        return Ok(self.retry(hhfac * h));
                    }
                } else {
                    trace!("x = {x}: Newton diverging (theta = {:e}), h halved", self.theta);
                    return Ok(self.retry(0.5 * h));
                }
            }
            dynold = dyno.max(self.uround);

            for i in 0..n {
                let f1i = self.f1[i] + self.z1[i];
                let f2i = self.f2[i] + self.z2[i];
                let f3i = self.f3[i] + self.z3[i];
                self.f1[i] = f1i;
                self.f2[i] = f2i;
                self.f3[i] = f3i;
                self.z1[i] = T00 * f1i + T01 * f2i + T02 * f3i;
                self.z2[i] = T10 * f1i + T11 * f2i + T12 * f3i;
                self.z3[i] = T20 * f1i + f2i;
            }
            if self.faccon * dyno <= self.fnewt {
                break;
            }
        }

        // --- Error estimate and step-size proposal ---
        let err = self.estimate_error(ode, x, y, h, attempt, stats)?;
        let cfac = self.safe * (1 + 2 * nit) as Float;
        let fac = self.safe.min(cfac / (newt + 2 * nit) as Float);
        self.quot = (err.powf(0.25) / fac).clamp(self.facr, self.facl);
        self.hnew = h / self.quot;
        self.err = err;
        trace!("x = {x}, h = {h:e}, err = {err:e}, newt = {newt}");

        Ok(if err < 1.0 { Trial::Accept } else { Trial::Reject })
    }

    fn accept<F: ODE>(&mut self, ode: &F, x: Float, y: &mut [Float], h: Float, last: bool, stats: &mut Stats) -> Float {
        let n = self.n;
        // predictive (Gustafsson) control
        if self.pred_ctrl {
            if stats.naccepted > 1 {
                let facgus = ((self.hacc / h) * (self.err * self.err / self.erracc).powf(0.25) / self.safe)
                    .clamp(self.facr, self.facl);
                self.quot = self.quot.max(facgus);
                self.hnew = h / self.quot;
            }
            self.hacc = h;
            self.erracc = self.err.max(1.0e-2);
        }
        self.hold = h;

        for i in 0..n {
            y[i] += self.z3[i];
            let z1i = self.z1[i];
            let z2i = self.z2[i];
            let c1 = (z2i - self.z3[i]) / C2M1;
            let ak = (z1i - z2i) / C1MC2;
            let acont3 = (ak - z1i / C1) / C2;
            let c2 = (ak - c1) / C1M1;
            self.cont[n + i] = c1;
            self.cont[2 * n + i] = c2;
            self.cont[3 * n + i] = c2 - acont3;
        }
        self.cont[..n].copy_from_slice(y);
        scale_abs(&mut self.scal, &self.atol, &self.rtol, y);

        self.caljac = false;
        self.need_jac = self.theta > self.thet;
        self.need_lu = true;
        if !last {
            ode.ode(x + h, y, &mut self.f0);
            stats.nfeval += 1;
        }
        self.hnew
    }

    fn reject(&mut self, h: Float, attempt: Attempt) -> Float {
        self.need_jac = !self.caljac;
        self.need_lu = true;
        if attempt.first {
            0.1 * h
        } else {
            self.hnew
        }
    }

    fn keep_step(&mut self, h: Float, hnew: Float) -> Float {
        let qt = hnew / h;
        if self.theta <= self.thet && qt >= self.quot1 && qt <= self.quot2 {
            // the current factorization stays valid
            self.need_lu = false;
            h
        } else {
            hnew
        }
    }

    fn cont(&self) -> &[Float] {
        &self.cont
    }

    fn cont_fn(&self) -> ContFn {
        contr5
    }
}

/// Continuous output function for Radau5: the collocation polynomial
/// written around the right end of the step.
pub fn contr5(xi: Float, yi: &mut [Float], cont: &[Float], xold: Float, h: Float) {
    let n = cont.len() / 4;
    let s = (xi - (xold + h)) / h;
    let (c0, rest) = cont.split_at(n);
    let (c1, rest) = rest.split_at(n);
    let (c2, c3) = rest.split_at(n);
    for i in 0..n {
        yi[i] = c0[i] + s * (c1[i] + (s - C2M1) * (c2[i] + (s - C1M1) * c3[i]));
    }
}

// Nodes (abscissae) in [0,1]
const C1: Float = 0.155_051_025_721_682_2;
const C2: Float = 0.644_948_974_278_317_8;
const C1M1: Float = C1 - 1.0;
const C2M1: Float = C2 - 1.0;
const C1MC2: Float = C1 - C2;

// Error estimation and splitting constants
const DD1: Float = -10.048_809_399_827_416;
const DD2: Float = 1.382_142_733_160_749;
const DD3: Float = -0.333_333_333_333_333_3;
const U1: Float = 3.637_834_252_744_496;
const ALPH: Float = 2.681_082_873_627_752_3;
const BETA: Float = 3.050_430_199_247_410_5;

// Transformation matrix T
const T00: Float = 9.123_239_487_089_295E-2;
const T01: Float = -1.412_552_950_209_542E-1;
const T02: Float = -3.002_919_410_514_742_4E-2;
const T10: Float = 2.417_179_327_071_07E-1;
const T11: Float = 2.041_293_522_937_999_4E-1;
const T12: Float = 3.829_421_127_572_619E-1;
const T20: Float = 9.660_481_826_150_93E-1;

// Inverse transformation T^{-1}
const TINV00: Float = 4.325_579_890_063_155;
const TINV01: Float = 3.391_992_518_158_098_4E-1;
const TINV02: Float = 5.417_705_399_358_749E-1;
const TINV10: Float = -4.178_718_591_551_905;
const TINV11: Float = -3.276_828_207_610_623_7E-1;
const TINV12: Float = 4.766_235_545_005_504_4E-1;
const TINV20: Float = -5.028_726_349_457_868E-1;
const TINV21: Float = 2.571_926_949_855_605;
const TINV22: Float = -5.960_392_048_282_249E-1;

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn collocation_polynomial_hits_nodes() {
        // a single component whose stage increments are z1, z2, z3 = c·h·v
        // for the linear motion y(x) = 1 + v·x reproduce y exactly
        let (h, v, y0) = (0.5, 2.0, 1.0);
        let (z1, z2, z3) = (C1 * h * v, C2 * h * v, h * v);
        let c1 = (z2 - z3) / C2M1;
        let ak = (z1 - z2) / C1MC2;
        let acont3 = (ak - z1 / C1) / C2;
        let c2 = (ak - c1) / C1M1;
        let cont = [y0 + z3, c1, c2, c2 - acont3];
        let mut yi = [0.0];
        for s in [0.0, C1, C2, 0.7, 1.0] {
            contr5(s * h, &mut yi, &cont, 0.0, h);
            assert_relative_eq!(yi[0], y0 + v * s * h, epsilon = 1e-13);
        }
    }

    #[test]
    fn transformation_matrices_are_inverse() {
        let t = [[T00, T01, T02], [T10, T11, T12], [T20, 1.0, 0.0]];
        let ti = [
            [TINV00, TINV01, TINV02],
            [TINV10, TINV11, TINV12],
            [TINV20, TINV21, TINV22],
        ];
        for i in 0..3 {
            for j in 0..3 {
                let p: Float = (0..3).map(|k| t[i][k] * ti[k][j]).sum();
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(p, expected, epsilon = 1e-12);
            }
        }
    }
}
