use crate::{
    core::{ode::ODE, stats::Stats},
    error::Error,
    methods::{Attempt, ContFn, Driver, Trial},
    Float,
};

use super::{contlin, prepare_linear};

/// Forward Euler, `y_next = y + h·f(x, y)`. Fixed step only.
#[derive(Debug)]
pub(crate) struct FwEuler {
    f: Vec<Float>,
    y1: Vec<Float>,
    cont: Vec<Float>,
}

impl FwEuler {
    pub fn new(n: usize) -> Self {
        Self {
            f: vec![0.0; n],
            y1: vec![0.0; n],
            cont: vec![0.0; 2 * n],
        }
    }
}

impl Driver for FwEuler {
    const ORDER: usize = 1;

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
        ode.ode(x, y, &mut self.f);
        stats.nfeval += 1;
        for ((y1, yi), fi) in self.y1.iter_mut().zip(y).zip(&self.f) {
            *y1 = yi + h * fi;
        }
        Ok(Trial::Accept)
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
