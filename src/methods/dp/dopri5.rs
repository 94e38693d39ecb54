//! DOPRI5: Dormand–Prince 5(4) explicit Runge–Kutta pair with FSAL, Lund
//! stabilised step control and a fourth-order continuous extension.
//!
//! Reference
//! - E. Hairer, S. P. Nørsett, and G. Wanner, "Solving Ordinary Differential
//!   Equations I. Nonstiff Problems", 2nd ed., Springer (1993).

use log::trace;

use crate::{
    core::{ode::ODE, stats::Stats, tolerance::Tolerance},
    error::Error,
    methods::{controller::Controller, Attempt, ContFn, Driver, Trial},
    num::norm::scale_max_abs,
    solve::Config,
    Float,
};

#[derive(Debug)]
pub(crate) struct DoPri5 {
    atol: Tolerance,
    rtol: Tolerance,
    controller: Controller,
    k1: Vec<Float>,
    k2: Vec<Float>,
    k3: Vec<Float>,
    k4: Vec<Float>,
    k5: Vec<Float>,
    k6: Vec<Float>,
    k7: Vec<Float>,
    y1: Vec<Float>,
    scal: Vec<Float>,
    /// `[y, y1 − y, bspl, −h·k7 + y1 − y − bspl, d]`
    cont: Vec<Float>,
    /// `k1` holds `f(x, y)` for the current step
    k1_valid: bool,
    facold: Float,
    fac11: Float,
    hnew: Float,
}

impl DoPri5 {
    pub fn new(n: usize, config: &Config) -> Self {
        Self {
            atol: config.atol.clone(),
            rtol: config.rtol.clone(),
            controller: Controller::new(config),
            k1: vec![0.0; n],
            k2: vec![0.0; n],
            k3: vec![0.0; n],
            k4: vec![0.0; n],
            k5: vec![0.0; n],
            k6: vec![0.0; n],
            k7: vec![0.0; n],
            y1: vec![0.0; n],
            scal: vec![0.0; n],
            cont: vec![0.0; 5 * n],
            k1_valid: false,
            facold: 1e-4,
            fac11: 1.0,
            hnew: 0.0,
        }
    }
}

impl Driver for DoPri5 {
    const ORDER: usize = 5;

    fn init<F: ODE>(&mut self, _ode: &F, _x: Float, y: &[Float], _f0: Option<&[Float]>, _stats: &mut Stats) -> Result<(), Error> {
        let n = y.len();
        self.cont.iter_mut().for_each(|c| *c = 0.0);
        self.cont[..n].copy_from_slice(y);
        self.k1_valid = false;
        self.facold = 1e-4;
        Ok(())
    }

    fn step<F: ODE>(
        &mut self,
        ode: &F,
        x: Float,
        y: &[Float],
        h: Float,
        _attempt: Attempt,
        stats: &mut Stats,
    ) -> Result<Trial, Error> {
        let n = y.len();
        if !self.k1_valid {
            ode.ode(x, y, &mut self.k1);
            stats.nfeval += 1;
            self.k1_valid = true;
        }

        // --- Stages ---
        for i in 0..n {
            self.y1[i] = y[i] + h * A21 * self.k1[i];
        }
        ode.ode(x + C2 * h, &self.y1, &mut self.k2);
        for i in 0..n {
            self.y1[i] = y[i] + h * (A31 * self.k1[i] + A32 * self.k2[i]);
        }
        ode.ode(x + C3 * h, &self.y1, &mut self.k3);
        for i in 0..n {
            self.y1[i] = y[i] + h * (A41 * self.k1[i] + A42 * self.k2[i] + A43 * self.k3[i]);
        }
        ode.ode(x + C4 * h, &self.y1, &mut self.k4);
        for i in 0..n {
            self.y1[i] = y[i]
                + h * (A51 * self.k1[i] + A52 * self.k2[i] + A53 * self.k3[i] + A54 * self.k4[i]);
        }
        ode.ode(x + C5 * h, &self.y1, &mut self.k5);
        for i in 0..n {
            self.y1[i] = y[i]
                + h * (A61 * self.k1[i]
                    + A62 * self.k2[i]
                    + A63 * self.k3[i]
                    + A64 * self.k4[i]
                    + A65 * self.k5[i]);
        }
        let xph = x + h;
        ode.ode(xph, &self.y1, &mut self.k6);
        for i in 0..n {
            self.y1[i] = y[i]
                + h * (A71 * self.k1[i]
                    + A73 * self.k3[i]
                    + A74 * self.k4[i]
                    + A75 * self.k5[i]
                    + A76 * self.k6[i]);
        }
        ode.ode(xph, &self.y1, &mut self.k7);
        stats.nfeval += 6;

        // --- Error estimate ---
        scale_max_abs(&mut self.scal, &self.atol, &self.rtol, y, &self.y1);
        let mut err: Float = 0.0;
        for i in 0..n {
            let ei = h
                * (E1 * self.k1[i]
                    + E3 * self.k3[i]
                    + E4 * self.k4[i]
                    + E5 * self.k5[i]
                    + E6 * self.k6[i]
                    + E7 * self.k7[i]);
            err += (ei / self.scal[i]) * (ei / self.scal[i]);
        }
        let err = (err / n as Float).sqrt();

        let (hnew, fac11) = self.controller.lund(h, err, self.facold, 4);
        self.hnew = hnew;
        self.fac11 = fac11;
        trace!("x = {x}, h = {h:e}, err = {err:e}");
        if err <= 1.0 {
            self.facold = err.max(1.0e-4);
            Ok(Trial::Accept)
        } else {
            Ok(Trial::Reject)
        }
    }

    fn accept<F: ODE>(&mut self, _ode: &F, _x: Float, y: &mut [Float], h: Float, _last: bool, _stats: &mut Stats) -> Float {
        let n = y.len();
        for i in 0..n {
            let ydiff = self.y1[i] - y[i];
            let bspl = h * self.k1[i] - ydiff;
            self.cont[i] = y[i];
            self.cont[n + i] = ydiff;
            self.cont[2 * n + i] = bspl;
            self.cont[3 * n + i] = -h * self.k7[i] + ydiff - bspl;
            self.cont[4 * n + i] = h
                * (D1 * self.k1[i]
                    + D3 * self.k3[i]
                    + D4 * self.k4[i]
                    + D5 * self.k5[i]
                    + D6 * self.k6[i]
                    + D7 * self.k7[i]);
        }
        // first same as last
        std::mem::swap(&mut self.k1, &mut self.k7);
        y.copy_from_slice(&self.y1);
        self.hnew
    }

    fn reject(&mut self, h: Float, _attempt: Attempt) -> Float {
        self.controller.after_reject(h, self.fac11)
    }

    fn cont(&self) -> &[Float] {
        &self.cont
    }

    fn cont_fn(&self) -> ContFn {
        contdp5
    }
}

/// Continuous output function for DOPRI5
pub fn contdp5(xi: Float, yi: &mut [Float], cont: &[Float], xold: Float, h: Float) {
    let n = cont.len() / 5;
    let theta = (xi - xold) / h;
    let theta1 = 1.0 - theta;
    for i in 0..n {
        yi[i] = cont[i]
            + theta
                * (cont[n + i]
                    + theta1
                        * (cont[2 * n + i] + theta * (cont[3 * n + i] + theta1 * cont[4 * n + i])));
    }
}

// DOPRI5 Butcher tableau coefficients
const C2: Float = 0.2;
const C3: Float = 0.3;
const C4: Float = 0.8;
const C5: Float = 8.0 / 9.0;

const A21: Float = 0.2;
const A31: Float = 3.0 / 40.0;
const A32: Float = 9.0 / 40.0;
const A41: Float = 44.0 / 45.0;
const A42: Float = -56.0 / 15.0;
const A43: Float = 32.0 / 9.0;
const A51: Float = 19372.0 / 6561.0;
const A52: Float = -25360.0 / 2187.0;
const A53: Float = 64448.0 / 6561.0;
const A54: Float = -212.0 / 729.0;
const A61: Float = 9017.0 / 3168.0;
const A62: Float = -355.0 / 33.0;
const A63: Float = 46732.0 / 5247.0;
const A64: Float = 49.0 / 176.0;
const A65: Float = -5103.0 / 18656.0;
const A71: Float = 35.0 / 384.0;
const A73: Float = 500.0 / 1113.0;
const A74: Float = 125.0 / 192.0;
const A75: Float = -2187.0 / 6784.0;
const A76: Float = 11.0 / 84.0;

const E1: Float = 71.0 / 57600.0;
const E3: Float = -71.0 / 16695.0;
const E4: Float = 71.0 / 1920.0;
const E5: Float = -17253.0 / 339200.0;
const E6: Float = 22.0 / 525.0;
const E7: Float = -1.0 / 40.0;

const D1: Float = -12715105075.0 / 11282082432.0;
const D3: Float = 87487479700.0 / 32700410799.0;
const D4: Float = -10690763975.0 / 1880347072.0;
const D5: Float = 701980252875.0 / 199316789632.0;
const D6: Float = -1453857185.0 / 822651844.0;
const D7: Float = 69997945.0 / 29380423.0;

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn continuous_extension_reproduces_endpoints() {
        // y = [1, 2], y1 = [1.5, 1.0] with arbitrary inner coefficients
        let cont = [1.0, 2.0, 0.5, -1.0, 0.3, 0.1, -0.2, 0.4, 0.7, -0.9];
        let mut yi = [0.0; 2];
        contdp5(0.5, &mut yi, &cont, 0.5, 0.25);
        assert_eq!(yi, [1.0, 2.0]);
        contdp5(0.75, &mut yi, &cont, 0.5, 0.25);
        assert_relative_eq!(yi[0], 1.5);
        assert_relative_eq!(yi[1], 1.0);
    }
}
