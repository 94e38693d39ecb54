use log::trace;

use crate::{
    core::{ode::ODE, stats::Stats, tolerance::Tolerance},
    error::Error,
    methods::{controller::Controller, Attempt, ContFn, Driver, Trial},
    num::norm::scale_max_abs,
    solve::Config,
    Float,
};

use super::{contlin, prepare_linear};

/// Modified (Heun) Euler with the forward Euler predictor as the embedded
/// first-order estimate.
#[derive(Debug)]
pub(crate) struct MoEuler {
    atol: Tolerance,
    rtol: Tolerance,
    controller: Controller,
    k0: Vec<Float>,
    k1: Vec<Float>,
    ypred: Vec<Float>,
    w: Vec<Float>,
    scal: Vec<Float>,
    cont: Vec<Float>,
    hnew: Float,
}

impl MoEuler {
    pub fn new(n: usize, config: &Config) -> Self {
        Self {
            atol: config.atol.clone(),
            rtol: config.rtol.clone(),
            controller: Controller::new(config),
            k0: vec![0.0; n],
            k1: vec![0.0; n],
            ypred: vec![0.0; n],
            w: vec![0.0; n],
            scal: vec![0.0; n],
            cont: vec![0.0; 2 * n],
            hnew: 0.0,
        }
    }
}

impl Driver for MoEuler {
    const ORDER: usize = 2;

    fn init<F: ODE>(&mut self, _ode: &F, _x: Float, y: &[Float], _f0: Option<&[Float]>, _stats: &mut Stats) -> Result<(), Error> {
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
        ode.ode(x, y, &mut self.k0);
        for ((p, yi), k) in self.ypred.iter_mut().zip(y).zip(&self.k0) {
            *p = yi + h * k;
        }
        ode.ode(x + h, &self.ypred, &mut self.k1);
        stats.nfeval += 2;

        for (i, wi) in self.w.iter_mut().enumerate() {
            *wi = y[i] + 0.5 * h * (self.k0[i] + self.k1[i]);
        }
        scale_max_abs(&mut self.scal, &self.atol, &self.rtol, y, &self.w);
        let n = y.len() as Float;
        let sum: Float = self
            .w
            .iter()
            .zip(&self.ypred)
            .zip(&self.scal)
            .map(|((w, p), s)| ((w - p) / s) * ((w - p) / s))
            .sum();
        let err = (sum / n).sqrt().max(1e-10);
        self.hnew = self.controller.propose(h, err, 1);
        trace!("x = {x}, h = {h:e}, err = {err:e}");
        Ok(if err < 1.0 { Trial::Accept } else { Trial::Reject })
    }

    fn accept<F: ODE>(&mut self, _ode: &F, _x: Float, y: &mut [Float], _h: Float, _last: bool, _stats: &mut Stats) -> Float {
        prepare_linear(&mut self.cont, y, &self.w);
        y.copy_from_slice(&self.w);
        self.hnew
    }

    fn reject(&mut self, _h: Float, _attempt: Attempt) -> Float {
        self.hnew
    }

    fn cont(&self) -> &[Float] {
        &self.cont
    }

    fn cont_fn(&self) -> ContFn {
        contlin
    }
}
