#![allow(dead_code)]

use odekit::prelude::*;

/// Integrate `ode` from `(0, y0)` to `xf`, returning the solver and the
/// final state.
pub fn run<F: ODE>(ode: &F, y0: Vec<f64>, xf: f64, config: Config) -> (Solver, Vec<f64>) {
    let mut y = y0;
    let mut solver = Solver::new(y.len(), config).unwrap();
    let status = solver.solve(ode, &mut y, 0.0, xf).unwrap();
    assert_eq!(status, Status::Success);
    (solver, y)
}

pub fn assert_stats(stats: &Stats, expected: [usize; 8]) {
    let got = [
        stats.nfeval,
        stats.njeval,
        stats.nsteps,
        stats.naccepted,
        stats.nrejected,
        stats.ndecomp,
        stats.nlinsol,
        stats.nitmax,
    ];
    assert_eq!(got, expected, "counters: {stats}");
}

/// `y' = -y`, `y(0) = 1`.
pub struct Decay;

impl ODE for Decay {
    fn ode(&self, _x: f64, y: &[f64], f: &mut [f64]) {
        f[0] = -y[0];
    }
}
