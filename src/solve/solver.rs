//! The step loop shared by every method.

use log::{debug, trace};

use crate::{
    core::{
        interpolate::Interpolate,
        ode::ODE,
        solout::{ControlFlag, SolOut},
        stats::Stats,
        status::Status,
    },
    error::{Error, Failure},
    methods::{
        dp::DoPri5,
        euler::{BwEuler, FwEuler, MoEuler},
        hinit::hinit,
        radau::Radau5,
        Attempt, ContFn, Driver, Trial,
    },
    Float,
};

use super::{
    cont::{ContinuousOutput, DENSE_TOL},
    options::{Config, InitialStep, Method},
    solution::Output,
};

/// Integrates `M·y' = f(x, y)` from `x0` to `xf` with the configured method.
///
/// A solver owns its workspace, counters and output; independent solvers
/// may run on different threads.
///
/// ```
/// use odekit::prelude::*;
/// use odekit::problems::HwEq11;
///
/// let problem = HwEq11;
/// let config = Config::builder().method(Method::Radau5).build();
/// let mut solver = Solver::new(1, config).unwrap();
/// let mut y = problem.y0();
/// let status = solver.solve(&problem, &mut y, 0.0, problem.xf()).unwrap();
/// assert_eq!(status, Status::Success);
/// assert!((y[0] - problem.solution(problem.xf())).abs() < 3e-5);
/// ```
#[derive(Debug, Clone)]
pub struct Solver {
    ndim: usize,
    config: Config,
    stats: Stats,
    output: Output,
}

impl Solver {
    /// Validate `config` for a system of `ndim` equations.
    pub fn new(ndim: usize, config: Config) -> Result<Self, Error> {
        if ndim == 0 {
            return Err(Error::invalid("ndim", "must be positive"));
        }
        config.validate()?;
        for (what, tol) in [("atol", &config.atol), ("rtol", &config.rtol)] {
            if let Some(len) = tol.len() {
                if len != ndim {
                    return Err(Error::Dimension {
                        what,
                        expected: ndim,
                        got: len,
                    });
                }
            }
        }
        Ok(Self {
            ndim,
            config,
            stats: Stats::default(),
            output: Output::default(),
        })
    }

    pub fn ndim(&self) -> usize {
        self.ndim
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Counters of the last solve.
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Recorded output of the last solve.
    pub fn output(&self) -> &Output {
        &self.output
    }

    /// Integrate from `(x0, y)` to `xf`, overwriting `y` with the final
    /// state.
    pub fn solve<F: ODE>(&mut self, ode: &F, y: &mut [Float], x0: Float, xf: Float) -> Result<Status, Failure> {
        self.solve_with(ode, y, x0, xf, &mut ())
    }

    /// Like [`Solver::solve`], reporting progress to `solout`.
    pub fn solve_with<F: ODE, S: SolOut>(
        &mut self,
        ode: &F,
        y: &mut [Float],
        x0: Float,
        xf: Float,
        solout: &mut S,
    ) -> Result<Status, Failure> {
        self.stats.reset();
        self.output = Output::default();
        if y.len() != self.ndim {
            return Err(Error::Dimension {
                what: "y",
                expected: self.ndim,
                got: y.len(),
            }
            .into());
        }
        if !(x0.is_finite() && xf.is_finite() && xf > x0) {
            return Err(Error::invalid("xf", format!("must be greater than x0 = {x0}, got {xf}")).into());
        }

        let n = self.ndim;
        let config = &self.config;
        debug!(
            "{}: n = {n}, x0 = {x0}, xf = {xf}, rtol = {:?}, atol = {:?}, fixed_step = {:?}",
            config.method, config.rtol, config.atol, config.fixed_step
        );
        let mut run = Run {
            config,
            stats: &mut self.stats,
            output: &mut self.output,
            solout,
        };
        let result = match config.method {
            Method::FwEuler => run.integrate(FwEuler::new(n), ode, y, x0, xf),
            Method::BwEuler => run.integrate(BwEuler::new(n, config), ode, y, x0, xf),
            Method::MoEuler => run.integrate(MoEuler::new(n, config), ode, y, x0, xf),
            Method::DoPri5 => run.integrate(DoPri5::new(n, config), ode, y, x0, xf),
            Method::Radau5 => run.integrate(Radau5::new(n, config), ode, y, x0, xf),
        };
        match result {
            Ok(status) => {
                debug!("{}: {status:?} [{}]", config.method, self.stats);
                Ok(status)
            }
            Err(error) => {
                debug!("{}: failed: {error} [{}]", config.method, self.stats);
                Err(Failure::new(error, self.stats))
            }
        }
    }
}

/// Borrowed state of one call to `solve`.
struct Run<'a, S> {
    config: &'a Config,
    stats: &'a mut Stats,
    output: &'a mut Output,
    solout: &'a mut S,
}

impl<S: SolOut> Run<'_, S> {
    fn integrate<D: Driver, F: ODE>(
        &mut self,
        mut driver: D,
        ode: &F,
        y: &mut [Float],
        x0: Float,
        xf: Float,
    ) -> Result<Status, Error> {
        if self.config.dense_output {
            self.output.continuous = Some(ContinuousOutput::new(y.len(), driver.cont_fn()));
        }
        match self.config.fixed_step {
            Some(dx) => self.fixed(&mut driver, ode, y, x0, xf, dx),
            None => self.adaptive(&mut driver, ode, y, x0, xf),
        }
    }

    fn fixed<D: Driver, F: ODE>(
        &mut self,
        driver: &mut D,
        ode: &F,
        y: &mut [Float],
        x0: Float,
        xf: Float,
        dx: Float,
    ) -> Result<Status, Error> {
        let nsteps = (((xf - x0) / dx) - 1e-10).ceil().max(1.0) as usize;
        let h = (xf - x0) / nsteps as Float;
        driver.init(ode, x0, y, None, self.stats)?;
        let mut dense = DenseSampler::new(self.config.dense_dx, x0, y.len());
        if self.initial(driver, &mut dense, x0, y) == ControlFlag::Interrupt {
            return Ok(Status::Interrupted);
        }

        for i in 0..nsteps {
            if self.stats.nsteps >= self.config.nmax_steps {
                return Err(Error::StepBudget(self.config.nmax_steps));
            }
            self.stats.nsteps += 1;
            let x = x0 + i as Float * h;
            let attempt = Attempt {
                first: i == 0,
                reject: false,
            };
            if let Trial::Retry(_) = driver.step(ode, x, y, h, attempt, self.stats)? {
                return Err(Error::NoConvergence {
                    iterations: self.config.nmax_newton,
                });
            }
            let last = i + 1 == nsteps;
            driver.accept(ode, x, y, h, last, self.stats);
            // constant h: let implicit drivers keep their factorization
            driver.keep_step(h, h);
            let xnew = if last { xf } else { x0 + (i + 1) as Float * h };
            trace!("step {}: x = {xnew}, h = {h:e}", self.stats.nsteps);
            let istep = self.stats.nsteps;
            if self.accepted(driver, &mut dense, istep, x, xnew, h, y) == ControlFlag::Interrupt {
                return Ok(Status::Interrupted);
            }
        }
        Ok(Status::Success)
    }

    fn adaptive<D: Driver, F: ODE>(
        &mut self,
        driver: &mut D,
        ode: &F,
        y: &mut [Float],
        x0: Float,
        xf: Float,
    ) -> Result<Status, Error> {
        let config = self.config;
        let n = y.len();
        let mut f0 = vec![0.0; n];
        ode.ode(x0, y, &mut f0);
        self.stats.nfeval += 1;
        driver.init(ode, x0, y, Some(&f0), self.stats)?;

        let hmax = config.hmax.unwrap_or(xf - x0);
        let mut h = match config.h0 {
            InitialStep::Fixed(h0) => h0,
            InitialStep::Auto => {
                let mut f1 = vec![0.0; n];
                let mut y1 = vec![0.0; n];
                self.stats.nfeval += 1;
                hinit(ode, x0, y, &f0, &mut f1, &mut y1, D::ORDER, hmax, &config.atol, &config.rtol)
            }
        };
        h = h.min(hmax);

        let mut dense = DenseSampler::new(config.dense_dx, x0, n);
        if self.initial(driver, &mut dense, x0, y) == ControlFlag::Interrupt {
            return Ok(Status::Interrupted);
        }

        let mut x = x0;
        let mut last = false;
        let mut reject = false;
        if x + h >= xf {
            h = xf - x;
            last = true;
        }

        // --- Step loop ---
        loop {
            if self.stats.nsteps >= config.nmax_steps {
                return Err(Error::StepBudget(config.nmax_steps));
            }
            if 0.1 * h.abs() <= x.abs() * config.eps || h < config.hmin {
                return Err(Error::StepTooSmall { x, h });
            }
            self.stats.nsteps += 1;
            let attempt = Attempt {
                first: self.stats.naccepted == 0,
                reject,
            };
            match driver.step(ode, x, y, h, attempt, self.stats)? {
                Trial::Accept => {
                    self.stats.naccepted += 1;
                    let mut hnew = driver.accept(ode, x, y, h, last, self.stats);
                    let xold = x;
                    x = if last { xf } else { x + h };
                    trace!("accept {}: x = {x}, h = {h:e}", self.stats.naccepted);
                    let istep = self.stats.naccepted;
                    if self.accepted(driver, &mut dense, istep, xold, x, h, y) == ControlFlag::Interrupt {
                        return Ok(Status::Interrupted);
                    }
                    if last {
                        return Ok(Status::Success);
                    }

                    hnew = hnew.min(hmax);
                    if reject {
                        hnew = hnew.min(h);
                    }
                    reject = false;
                    if x + hnew >= xf {
                        h = xf - x;
                        last = true;
                    } else {
                        h = driver.keep_step(h, hnew);
                    }
                }
                Trial::Reject => {
                    if self.stats.naccepted >= 1 {
                        self.stats.nrejected += 1;
                    }
                    let hnew = driver.reject(h, attempt);
                    trace!("reject at x = {x}: h = {h:e} -> {hnew:e}");
                    h = hnew;
                    reject = true;
                    last = false;
                }
                Trial::Retry(hnew) => {
                    trace!("retry at x = {x}: h = {h:e} -> {hnew:e}");
                    h = hnew;
                    reject = true;
                    last = false;
                }
            }
        }
    }

    /// Record and report the initial point.
    fn initial<D: Driver>(&mut self, driver: &D, dense: &mut DenseSampler, x0: Float, y: &[Float]) -> ControlFlag {
        if self.config.save_steps {
            self.output.push_step(x0, y, 0.0);
        }
        let interp = StepInterpolant {
            cont: driver.cont(),
            cont_fn: driver.cont_fn(),
            xold: x0,
            h: 0.0,
        };
        if self.solout.solout(0, x0, x0, y, &interp) == ControlFlag::Interrupt {
            return ControlFlag::Interrupt;
        }
        if dense.dx.is_some() {
            self.output.push_dense(0, x0, y);
            return self.solout.dense(0, 0.0, x0, y, x0, y);
        }
        ControlFlag::Continue
    }

    /// Record and report the step `[xold, x]` that was just accepted.
    #[allow(clippy::too_many_arguments)]
    fn accepted<D: Driver>(
        &mut self,
        driver: &D,
        dense: &mut DenseSampler,
        istep: usize,
        xold: Float,
        x: Float,
        h: Float,
        y: &[Float],
    ) -> ControlFlag {
        if self.config.save_steps {
            self.output.push_step(x, y, h);
        }
        if let Some(c) = self.output.continuous.as_mut() {
            c.push(driver.cont(), xold, x, h);
        }
        let interp = StepInterpolant {
            cont: driver.cont(),
            cont_fn: driver.cont_fn(),
            xold,
            h,
        };
        if self.solout.solout(istep, xold, x, y, &interp) == ControlFlag::Interrupt {
            return ControlFlag::Interrupt;
        }

        let Some(dx) = dense.dx else {
            return ControlFlag::Continue;
        };
        while dense.xout <= x + DENSE_TOL * dx {
            interp.interpolate(dense.xout, &mut dense.yout);
            self.output.push_dense(istep, dense.xout, &dense.yout);
            let flag = self.solout.dense(istep, h, x, y, dense.xout, &dense.yout);
            dense.xout += dx;
            if flag == ControlFlag::Interrupt {
                return ControlFlag::Interrupt;
            }
        }
        ControlFlag::Continue
    }
}

/// Next output point of the live dense sampling.
struct DenseSampler {
    dx: Option<Float>,
    xout: Float,
    yout: Vec<Float>,
}

impl DenseSampler {
    fn new(dx: Option<Float>, x0: Float, n: usize) -> Self {
        Self {
            dx,
            xout: x0 + dx.unwrap_or(0.0),
            yout: vec![0.0; n],
        }
    }
}

/// The continuous extension of one step, handed to [`SolOut::solout`].
struct StepInterpolant<'a> {
    cont: &'a [Float],
    cont_fn: ContFn,
    xold: Float,
    h: Float,
}

impl Interpolate for StepInterpolant<'_> {
    fn interpolate(&self, xi: Float, yi: &mut [Float]) {
        if self.h == 0.0 {
            // initial point: every layout starts with y
            let n = yi.len();
            yi.copy_from_slice(&self.cont[..n]);
        } else {
            (self.cont_fn)(xi, yi, self.cont, self.xold, self.h);
        }
    }
}
