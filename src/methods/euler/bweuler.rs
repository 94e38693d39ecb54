use log::trace;

use crate::{
    core::{ode::ODE, stats::Stats, tolerance::Tolerance},
    error::Error,
    linsol::LinSol,
    matrix::{Storage, SystemMatrix},
    methods::{Attempt, ContFn, Driver, Trial},
    num::{
        jacobian::numerical_jacobian,
        norm::{newton_tolerance, rms_scaled, scale_abs},
    },
    solve::Config,
    Float,
};

use super::{contlin, prepare_linear};

/// Backward Euler, `M·(y_next − y) = h·f(x + h, y_next)`, solved by Newton
/// iterations on the residual. Fixed step only, so a corrector failure is
/// fatal.
#[derive(Debug)]
pub(crate) struct BwEuler {
    atol: Tolerance,
    rtol: Tolerance,
    fnewt: Float,
    eps: Float,
    cte_jac: bool,
    nmax_newton: usize,
    storage: Storage,
    jac: SystemMatrix,
    mass: Option<SystemMatrix>,
    iter: SystemMatrix,
    lis: LinSol<Float>,
    y1: Vec<Float>,
    f: Vec<Float>,
    r: Vec<Float>,
    scal: Vec<Float>,
    work: Vec<Float>,
    cont: Vec<Float>,
}

impl BwEuler {
    pub fn new(n: usize, config: &Config) -> Self {
        Self {
            atol: config.atol.clone(),
            rtol: config.rtol.clone(),
            fnewt: newton_tolerance(config.rtol.min(), config.eps),
            eps: config.eps,
            cte_jac: config.cte_jac,
            nmax_newton: config.nmax_newton,
            storage: config.storage,
            jac: SystemMatrix::new(config.storage, n),
            mass: None,
            iter: SystemMatrix::new(config.storage, n),
            lis: LinSol::new(),
            y1: vec![0.0; n],
            f: vec![0.0; n],
            r: vec![0.0; n],
            scal: vec![0.0; n],
            work: vec![0.0; n],
            cont: vec![0.0; 2 * n],
        }
    }
}

impl Driver for BwEuler {
    const ORDER: usize = 1;

    fn init<F: ODE>(&mut self, ode: &F, _x: Float, y: &[Float], _f0: Option<&[Float]>, _stats: &mut Stats) -> Result<(), Error> {
        let mut mass = SystemMatrix::new(self.storage, y.len());
        self.mass = ode.mass(&mut mass).then_some(mass);
        prepare_linear(&mut self.cont, y, y);
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
        let x1 = x + h;
        self.y1.copy_from_slice(y);
        scale_abs(&mut self.scal, &self.atol, &self.rtol, y);

        let mut ldx_prev: Float = 0.0;
        for it in 0..self.nmax_newton {
            stats.record_iterations(it + 1);
            ode.ode(x1, &self.y1, &mut self.f);
            stats.nfeval += 1;

            // r = M·(y1 − y) − h·f(x1, y1)
            for ((w, a), b) in self.work.iter_mut().zip(&self.y1).zip(y) {
                *w = a - b;
            }
            match &self.mass {
                Some(m) => m.mul_vec(&self.work, &mut self.r),
                None => self.r.copy_from_slice(&self.work),
            }
            for (r, f) in self.r.iter_mut().zip(&self.f) {
                *r -= h * f;
            }
            let res = rms_scaled(&self.r, &self.scal);
            trace!("x = {x1}, it = {it}, residual = {res:e}");
            if res <= self.fnewt {
                return Ok(Trial::Accept);
            }

            if it == 0 || !self.cte_jac {
                self.jac.start();
                if !ode.jac(x1, &self.y1, &mut self.jac) {
                    stats.nfeval += numerical_jacobian(&mut self.jac, &mut self.y1, &self.f, &mut self.work, self.eps, |yy, ff| {
                        ode.ode(x1, yy, ff)
                    });
                }
                stats.njeval += 1;
                self.iter.combine(1.0, self.mass.as_ref(), -h, &self.jac);
                self.lis.factorize(&self.iter)?;
                stats.ndecomp += 1;
            }
            self.lis.solve(&mut self.r)?;
            stats.nlinsol += 1;
            for (yi, d) in self.y1.iter_mut().zip(&self.r) {
                *yi -= d;
            }

            let ldx = rms_scaled(&self.r, &self.scal);
            if it > 0 {
                let theta = ldx / ldx_prev;
                if theta > 0.99 {
                    return Err(Error::Divergence { theta, ldx, ldx_prev });
                }
            }
            ldx_prev = ldx;
        }
        Err(Error::NoConvergence {
            iterations: self.nmax_newton,
        })
    }

    fn accept<F: ODE>(&mut self, _ode: &F, _x: Float, y: &mut [Float], h: Float, _last: bool, _stats: &mut Stats) -> Float {
        prepare_linear(&mut self.cont, y, &self.y1);
        y.copy_from_slice(&self.y1);
        h
    }

    fn reject(&mut self, h: Float, _attempt: Attempt) -> Float {
        h
    }

    fn cont(&self) -> &[Float] {
        &self.cont
    }

    fn cont_fn(&self) -> ContFn {
        contlin
    }
}
