//! Classical test problems with known behaviour, used by the tests and the
//! demos.
//!
//! References: E. Hairer and G. Wanner, "Solving Ordinary Differential
//! Equations II. Stiff and Differential-Algebraic Problems" (HW), and
//! Hairer, Nørsett and Wanner, "Solving ODEs I" for the Arenstorf orbit.

use std::f64::consts::PI;

use crate::{core::ode::ODE, matrix::SystemMatrix, Float};

/// HW VII Eq. (1.1): `y' = λ(y − cos x)` with `λ = −50`, `y(0) = 0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HwEq11;

impl HwEq11 {
    pub const LAMBDA: Float = -50.0;

    pub fn ndim(&self) -> usize {
        1
    }

    pub fn y0(&self) -> Vec<Float> {
        vec![0.0]
    }

    pub fn xf(&self) -> Float {
        1.5
    }

    /// Step that covers `[0, xf]` in 40 fixed steps.
    pub fn dx(&self) -> Float {
        1.875 / 50.0
    }

    /// Analytic solution.
    pub fn solution(&self, x: Float) -> Float {
        let lam = Self::LAMBDA;
        -lam * (x.sin() - lam * x.cos() + lam * (lam * x).exp()) / (lam * lam + 1.0)
    }
}

impl ODE for HwEq11 {
    fn ode(&self, x: Float, y: &[Float], f: &mut [Float]) {
        f[0] = Self::LAMBDA * (y[0] - x.cos());
    }

    fn jac(&self, _x: Float, _y: &[Float], jac: &mut SystemMatrix) -> bool {
        jac.put(0, 0, Self::LAMBDA);
        true
    }
}

/// HW VII Eq. (1.4): Robertson's chemical reaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct Robertson;

impl Robertson {
    pub fn ndim(&self) -> usize {
        3
    }

    pub fn y0(&self) -> Vec<Float> {
        vec![1.0, 0.0, 0.0]
    }

    pub fn xf(&self) -> Float {
        0.3
    }
}

impl ODE for Robertson {
    fn ode(&self, _x: Float, y: &[Float], f: &mut [Float]) {
        f[0] = -0.04 * y[0] + 1.0e4 * y[1] * y[2];
        f[2] = 3.0e7 * y[1] * y[1];
        f[1] = -f[0] - f[2];
    }

    fn jac(&self, _x: Float, y: &[Float], jac: &mut SystemMatrix) -> bool {
        jac.put(0, 0, -0.04);
        jac.put(0, 1, 1.0e4 * y[2]);
        jac.put(0, 2, 1.0e4 * y[1]);
        jac.put(1, 0, 0.04);
        jac.put(1, 1, -1.0e4 * y[2] - 6.0e7 * y[1]);
        jac.put(1, 2, -1.0e4 * y[1]);
        jac.put(2, 1, 6.0e7 * y[1]);
        true
    }
}

/// HW VII Eq. (1.5): Van der Pol's equation in the singular-perturbation
/// form `y0' = y1`, `ε·y1' = (1 − y0²)·y1 − y0`.
#[derive(Debug, Clone, Copy)]
pub struct VanDerPol {
    pub eps: Float,
}

impl VanDerPol {
    pub fn new(eps: Float) -> Self {
        Self { eps }
    }

    pub fn ndim(&self) -> usize {
        2
    }

    pub fn y0(&self) -> Vec<Float> {
        vec![2.0, -0.6]
    }

    pub fn xf(&self) -> Float {
        2.0
    }
}

impl Default for VanDerPol {
    fn default() -> Self {
        Self::new(1.0e-6)
    }
}

impl ODE for VanDerPol {
    fn ode(&self, _x: Float, y: &[Float], f: &mut [Float]) {
        f[0] = y[1];
        f[1] = ((1.0 - y[0] * y[0]) * y[1] - y[0]) / self.eps;
    }

    fn jac(&self, _x: Float, y: &[Float], jac: &mut SystemMatrix) -> bool {
        jac.put(0, 1, 1.0);
        jac.put(1, 0, (-2.0 * y[0] * y[1] - 1.0) / self.eps);
        jac.put(1, 1, (1.0 - y[0] * y[0]) / self.eps);
        true
    }
}

/// HW VII p. 376: transistor amplifier, an index-1 DAE `M·y' = f(x, y)`
/// with a singular banded mass matrix.
#[derive(Debug, Clone, Copy)]
pub struct Amplifier {
    /// Input amplitude.
    pub ue: Float,
    /// Supply voltage.
    pub ub: Float,
    /// Thermal voltage.
    pub uf: Float,
    pub alpha: Float,
    pub beta: Float,
    /// Resistors `r0..r9`.
    pub r: [Float; 10],
    /// Capacitors `c1..c5`.
    pub c: [Float; 5],
}

impl Amplifier {
    pub fn new() -> Self {
        let mut r = [9000.0; 10];
        r[0] = 1000.0;
        Self {
            ue: 0.1,
            ub: 6.0,
            uf: 0.026,
            alpha: 0.99,
            beta: 1.0e-6,
            r,
            c: [1.0e-6, 2.0e-6, 3.0e-6, 4.0e-6, 5.0e-6],
        }
    }

    pub fn ndim(&self) -> usize {
        8
    }

    /// Consistent initial state.
    pub fn y0(&self) -> Vec<Float> {
        let r = &self.r;
        let ub = self.ub;
        vec![
            0.0,
            ub,
            ub / (r[6] / r[5] + 1.0),
            ub / (r[6] / r[5] + 1.0),
            ub,
            ub / (r[2] / r[1] + 1.0),
            ub / (r[2] / r[1] + 1.0),
            0.0,
        ]
    }

    pub fn xf(&self) -> Float {
        0.05
    }
}

impl Default for Amplifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ODE for Amplifier {
    fn ode(&self, x: Float, y: &[Float], f: &mut [Float]) {
        let r = &self.r;
        let uet = self.ue * (2.0 * PI * 100.0 * x).sin();
        let fac1 = self.beta * (((y[3] - y[2]) / self.uf).exp() - 1.0);
        let fac2 = self.beta * (((y[6] - y[5]) / self.uf).exp() - 1.0);
        f[0] = y[0] / r[9];
        f[1] = (y[1] - self.ub) / r[8] + self.alpha * fac1;
        f[2] = y[2] / r[7] - fac1;
        f[3] = y[3] / r[5] + (y[3] - self.ub) / r[6] + (1.0 - self.alpha) * fac1;
        f[4] = (y[4] - self.ub) / r[4] + self.alpha * fac2;
        f[5] = y[5] / r[3] - fac2;
        f[6] = y[6] / r[1] + (y[6] - self.ub) / r[2] + (1.0 - self.alpha) * fac2;
        f[7] = (y[7] - uet) / r[0];
    }

    fn jac(&self, _x: Float, y: &[Float], jac: &mut SystemMatrix) -> bool {
        let r = &self.r;
        let a = self.alpha;
        let g14 = self.beta * ((y[3] - y[2]) / self.uf).exp() / self.uf;
        let g27 = self.beta * ((y[6] - y[5]) / self.uf).exp() / self.uf;
        jac.put(0, 0, 1.0 / r[9]);
        jac.put(1, 1, 1.0 / r[8]);
        jac.put(1, 2, -a * g14);
        jac.put(1, 3, a * g14);
        jac.put(2, 2, 1.0 / r[7] + g14);
        jac.put(2, 3, -g14);
        jac.put(3, 2, -(1.0 - a) * g14);
        jac.put(3, 3, 1.0 / r[5] + 1.0 / r[6] + (1.0 - a) * g14);
        jac.put(4, 4, 1.0 / r[4]);
        jac.put(4, 5, -a * g27);
        jac.put(4, 6, a * g27);
        jac.put(5, 5, 1.0 / r[3] + g27);
        jac.put(5, 6, -g27);
        jac.put(6, 5, -(1.0 - a) * g27);
        jac.put(6, 6, 1.0 / r[1] + 1.0 / r[2] + (1.0 - a) * g27);
        jac.put(7, 7, 1.0 / r[0]);
        true
    }

    fn mass(&self, m: &mut SystemMatrix) -> bool {
        let [c1, c2, c3, c4, c5] = self.c;
        for (i, j, v) in [
            (0, 0, -c5),
            (0, 1, c5),
            (1, 0, c5),
            (1, 1, -c5),
            (2, 2, -c4),
            (3, 3, -c3),
            (3, 4, c3),
            (4, 3, c3),
            (4, 4, -c3),
            (5, 5, -c2),
            (6, 6, -c1),
            (6, 7, c1),
            (7, 6, c1),
            (7, 7, -c1),
        ] {
            m.put(i, j, v);
        }
        true
    }
}

/// Restricted three-body problem: the periodic Arenstorf orbit. Non-stiff;
/// after one period the state returns to `y0`.
#[derive(Debug, Clone, Copy)]
pub struct Arenstorf {
    pub mu: Float,
}

impl Arenstorf {
    pub fn new() -> Self {
        Self { mu: 0.012277471 }
    }

    pub fn ndim(&self) -> usize {
        4
    }

    pub fn y0(&self) -> Vec<Float> {
        vec![0.994, 0.0, 0.0, -2.001_585_106_379_082_5]
    }

    /// One period of the orbit.
    pub fn xf(&self) -> Float {
        17.065_216_560_157_962
    }
}

impl Default for Arenstorf {
    fn default() -> Self {
        Self::new()
    }
}

impl ODE for Arenstorf {
    fn ode(&self, _x: Float, y: &[Float], f: &mut [Float]) {
        let mu = self.mu;
        let mup = 1.0 - mu;
        let d1 = ((y[0] + mu).powi(2) + y[1] * y[1]).powf(1.5);
        let d2 = ((y[0] - mup).powi(2) + y[1] * y[1]).powf(1.5);
        f[0] = y[2];
        f[1] = y[3];
        f[2] = y[0] + 2.0 * y[3] - mup * (y[0] + mu) / d1 - mu * (y[0] - mup) / d2;
        f[3] = y[1] - 2.0 * y[2] - mup * y[1] / d1 - mu * y[1] / d2;
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::num::jacobian::compare_jacobian;

    #[test]
    fn analytic_jacobians_match_finite_differences() {
        compare_jacobian(&HwEq11, 0.3, &[0.5], 1e-6).unwrap();
        compare_jacobian(&Robertson, 0.0, &[0.9, 3.0e-5, 0.1], 1e-2).unwrap();
        compare_jacobian(&VanDerPol::new(1.0), 0.0, &[2.0, -0.6], 1e-5).unwrap();
        let amp = Amplifier::new();
        let mut y = amp.y0();
        y[3] += 0.01;
        y[6] -= 0.02;
        compare_jacobian(&amp, 1e-3, &y, 1e-7).unwrap();
    }

    #[test]
    fn eq11_solution_starts_at_initial_value() {
        let p = HwEq11;
        assert_eq!(p.solution(0.0), 0.0);
        // after the transient, y follows the slow manifold y ≈ cos x
        assert_relative_eq!(p.solution(1.5), 1.5f64.cos(), epsilon = 0.03);
        assert_eq!((p.xf() / p.dx()).round() as usize, 40);
    }

    #[test]
    fn amplifier_mass_is_symmetric() {
        let amp = Amplifier::new();
        let mut m = SystemMatrix::new(crate::matrix::Storage::Dense, 8);
        assert!(amp.mass(&mut m));
        let d = m.to_dense();
        for i in 0..8 {
            for j in 0..8 {
                assert_eq!(d[(i, j)], d[(j, i)]);
            }
        }
    }
}
