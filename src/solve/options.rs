//! Integration method selection and solver configuration.

use std::fmt;

use bon::Builder;

use crate::{
    core::tolerance::Tolerance,
    error::{count, positive, Error},
    matrix::Storage,
    Float,
};

/// Integration formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Forward (explicit) Euler, fixed step only.
    FwEuler,
    /// Backward (implicit) Euler, fixed step only.
    BwEuler,
    /// Modified Euler (Heun) 2(1) pair, adaptive.
    MoEuler,
    /// Dormand–Prince 5(4) with dense output, adaptive.
    DoPri5,
    /// Radau IIA order 5 for stiff problems, adaptive.
    Radau5,
}

impl Method {
    /// Whether the method can only be used with a fixed step.
    pub fn is_fixed_only(self) -> bool {
        matches!(self, Method::FwEuler | Method::BwEuler)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::FwEuler => "FwEuler",
            Method::BwEuler => "BwEuler",
            Method::MoEuler => "MoEuler",
            Method::DoPri5 => "DoPri5",
            Method::Radau5 => "Radau5",
        };
        f.write_str(name)
    }
}

/// First step size of an adaptive run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InitialStep {
    /// Use this value (capped by `hmax`).
    Fixed(Float),
    /// Estimate from `f(x0, y0)` and one explicit Euler step.
    Auto,
}

impl From<Float> for InitialStep {
    fn from(h: Float) -> Self {
        InitialStep::Fixed(h)
    }
}

/// Solver configuration.
///
/// Built with [`Config::builder`], from named values with
/// [`Config::from_options`], or with [`Config::fixed_step`]. Every field has
/// a default; [`Solver::new`](crate::Solver::new) validates the result.
///
/// ```
/// use odekit::prelude::*;
///
/// let config = Config::builder()
///     .method(Method::Radau5)
///     .rtol(1e-2)
///     .atol([1e-8, 1e-8, 1e-8])
///     .h0(1e-6)
///     .build();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Builder)]
pub struct Config {
    /// Integration formula. Default: DoPri5.
    #[builder(default = Method::DoPri5)]
    pub method: Method,
    /// Absolute tolerance. Default: 1e-4.
    #[builder(default = Tolerance::Scalar(1e-4), into)]
    pub atol: Tolerance,
    /// Relative tolerance, must exceed `10·eps`. Default: 1e-4.
    #[builder(default = Tolerance::Scalar(1e-4), into)]
    pub rtol: Tolerance,
    /// Initial step size. Default: 1e-4.
    #[builder(default = InitialStep::Fixed(1e-4), into)]
    pub h0: InitialStep,
    /// Steps below this size are fatal. Default: 0.
    #[builder(default = 0.0)]
    pub hmin: Float,
    /// Maximum step size. Default: the whole interval.
    pub hmax: Option<Float>,
    /// Safety factor of the step-size proposal. Default: 0.9.
    #[builder(default = 0.9)]
    pub safety: Float,
    /// Smallest step multiplier, `mmin ≤ hnew/h`. Default: 0.125.
    #[builder(default = 0.125)]
    pub mmin: Float,
    /// Largest step multiplier, `hnew/h ≤ mmax`. Default: 5.
    #[builder(default = 5.0)]
    pub mmax: Float,
    /// Lund stabilisation exponent for DoPri5. Default: 0.04.
    #[builder(default = 0.04)]
    pub beta: Float,
    /// Maximum number of step attempts. Default: 1000.
    #[builder(default = 1000)]
    pub nmax_steps: usize,
    /// Maximum Newton iterations per step. Default: 7.
    #[builder(default = 7)]
    pub nmax_newton: usize,
    /// Radau5 reuses the Jacobian while the Newton rate stays below this.
    /// Default: 1e-3.
    #[builder(default = 1e-3)]
    pub theta_max: Float,
    /// Radau5 keeps `h` (and its factorization) when `c1h ≤ hnew/h ≤ c2h`.
    /// Default: 1.
    #[builder(default = 1.0)]
    pub c1h: Float,
    /// See `c1h`. Default: 1.2.
    #[builder(default = 1.2)]
    pub c2h: Float,
    /// Rounding unit. Default: 1e-16.
    #[builder(default = 1e-16)]
    pub eps: Float,
    /// Freeze the first Jacobian for the whole run. Default: off.
    #[builder(default = false)]
    pub cte_jac: bool,
    /// Gustafsson predictive step control in Radau5. Default: on.
    #[builder(default = true)]
    pub pred_ctrl: bool,
    /// Start Radau5's Newton iterations from zero instead of extrapolating
    /// the previous collocation polynomial. Default: off.
    #[builder(default = false)]
    pub zero_trial: bool,
    /// Storage of Jacobian and iteration matrices. Default: dense.
    #[builder(default = Storage::Dense)]
    pub storage: Storage,
    /// Integrate with this constant step, bypassing the controller.
    pub fixed_step: Option<Float>,
    /// Sample the dense output every `dense_dx` and pass the samples to
    /// [`SolOut::dense`](crate::core::solout::SolOut::dense).
    pub dense_dx: Option<Float>,
    /// Keep every step's dense coefficients for queries after the solve.
    #[builder(default = false)]
    pub dense_output: bool,
    /// Record `(x, y, h)` after every accepted step. Default: on.
    #[builder(default = true)]
    pub save_steps: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Option names accepted by [`Config::from_options`].
pub const CONFIG_OPTIONS: &[&str] = &[
    "atol",
    "rtol",
    "h0",
    "hmin",
    "hmax",
    "safety",
    "mmin",
    "mmax",
    "beta",
    "nmax_steps",
    "nmax_newton",
    "theta_max",
    "c1h",
    "c2h",
    "eps",
    "cte_jac",
    "pred_ctrl",
    "zero_trial",
    "fixed_step",
    "dense_dx",
    "dense_output",
    "save_steps",
];

impl Config {
    /// Constant-step configuration.
    pub fn fixed_step(method: Method, h: Float) -> Self {
        Self::builder().method(method).fixed_step(h).build()
    }

    /// Configuration from `(name, value)` pairs on top of the defaults.
    /// Flags are on when their value is positive. Unknown names and invalid
    /// values are errors.
    pub fn from_options(method: Method, options: &[(&str, Float)]) -> Result<Self, Error> {
        let mut c = Self::builder().method(method).build();
        for &(name, value) in options {
            match name {
                "atol" => c.atol = Tolerance::Scalar(positive("atol", value)?),
                "rtol" => c.rtol = Tolerance::Scalar(positive("rtol", value)?),
                "h0" => c.h0 = InitialStep::Fixed(positive("h0", value)?),
                "hmin" => c.hmin = value,
                "hmax" => c.hmax = Some(positive("hmax", value)?),
                "safety" => c.safety = value,
                "mmin" => c.mmin = value,
                "mmax" => c.mmax = value,
                "beta" => c.beta = value,
                "nmax_steps" => c.nmax_steps = count("nmax_steps", value)?,
                "nmax_newton" => c.nmax_newton = count("nmax_newton", value)?,
                "theta_max" => c.theta_max = value,
                "c1h" => c.c1h = value,
                "c2h" => c.c2h = value,
                "eps" => c.eps = value,
                "cte_jac" => c.cte_jac = value > 0.0,
                "pred_ctrl" => c.pred_ctrl = value > 0.0,
                "zero_trial" => c.zero_trial = value > 0.0,
                "fixed_step" => c.fixed_step = Some(positive("fixed_step", value)?),
                "dense_dx" => c.dense_dx = Some(positive("dense_dx", value)?),
                "dense_output" => c.dense_output = value > 0.0,
                "save_steps" => c.save_steps = value > 0.0,
                _ => {
                    return Err(Error::UnknownOption {
                        name: name.to_string(),
                        accepted: CONFIG_OPTIONS,
                    })
                }
            }
        }
        c.validate()?;
        Ok(c)
    }

    /// Check every value; dimension checks happen in `Solver::new`.
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.eps > 0.0 && self.eps < 1.0) {
            return Err(Error::invalid("eps", format!("must be in (0, 1), got {}", self.eps)));
        }
        if let Some(r) = self.rtol.iter().find(|&r| !(r > 10.0 * self.eps)) {
            return Err(Error::invalid("rtol", format!("must exceed 10·eps = {:e}, got {r}", 10.0 * self.eps)));
        }
        if let Some(a) = self.atol.iter().find(|&a| !(a > 0.0)) {
            return Err(Error::invalid("atol", format!("must be positive, got {a}")));
        }
        if let InitialStep::Fixed(h0) = self.h0 {
            positive("h0", h0)?;
        }
        if !(self.hmin >= 0.0) {
            return Err(Error::invalid("hmin", format!("must not be negative, got {}", self.hmin)));
        }
        if let Some(hmax) = self.hmax {
            positive("hmax", hmax)?;
            if hmax < self.hmin {
                return Err(Error::invalid("hmax", format!("{hmax} is below hmin = {}", self.hmin)));
            }
        }
        if !(self.safety > 0.0 && self.safety < 1.0) {
            return Err(Error::invalid("safety", format!("must be in (0, 1), got {}", self.safety)));
        }
        if !(self.mmin > 0.0 && self.mmin <= 1.0) {
            return Err(Error::invalid("mmin", format!("must be in (0, 1], got {}", self.mmin)));
        }
        if !(self.mmax >= 1.0) {
            return Err(Error::invalid("mmax", format!("must be at least 1, got {}", self.mmax)));
        }
        if !(0.0..=0.2).contains(&self.beta) {
            return Err(Error::invalid("beta", format!("must be in [0, 0.2], got {}", self.beta)));
        }
        if self.nmax_steps == 0 {
            return Err(Error::invalid("nmax_steps", "must be positive"));
        }
        if self.nmax_newton == 0 {
            return Err(Error::invalid("nmax_newton", "must be positive"));
        }
        if !(self.theta_max > 0.0 && self.theta_max < 1.0) {
            return Err(Error::invalid("theta_max", format!("must be in (0, 1), got {}", self.theta_max)));
        }
        if !(self.c1h <= 1.0 && self.c1h > 0.0) {
            return Err(Error::invalid("c1h", format!("must be in (0, 1], got {}", self.c1h)));
        }
        if !(self.c2h >= 1.0) {
            return Err(Error::invalid("c2h", format!("must be at least 1, got {}", self.c2h)));
        }
        match self.fixed_step {
            Some(h) => {
                positive("fixed_step", h)?;
            }
            None if self.method.is_fixed_only() => {
                return Err(Error::invalid(
                    "fixed_step",
                    format!("{} has no error estimate and needs a fixed step", self.method),
                ));
            }
            None => {}
        }
        if let Some(dx) = self.dense_dx {
            positive("dense_dx", dx)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let c = Config::default();
        assert_eq!(c.method, Method::DoPri5);
        assert_eq!(c.h0, InitialStep::Fixed(1e-4));
        assert_eq!(c.rtol, Tolerance::Scalar(1e-4));
        assert_eq!(c.nmax_newton, 7);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn unknown_option_is_rejected() {
        let err = Config::from_options(Method::Radau5, &[("rtol", 1e-6), ("NmaxIt", 5.0)]).unwrap_err();
        match err {
            Error::UnknownOption { name, accepted } => {
                assert_eq!(name, "NmaxIt");
                assert!(accepted.contains(&"nmax_newton"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn options_are_applied() {
        let c = Config::from_options(
            Method::Radau5,
            &[("rtol", 1e-2), ("atol", 1e-8), ("h0", 1e-6), ("cte_jac", 1.0), ("nmax_newton", 10.0)],
        )
        .unwrap();
        assert_eq!(c.rtol, Tolerance::Scalar(1e-2));
        assert_eq!(c.h0, InitialStep::Fixed(1e-6));
        assert!(c.cte_jac);
        assert_eq!(c.nmax_newton, 10);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            Config::from_options(Method::DoPri5, &[("nmax_steps", 2.5)]),
            Err(Error::InvalidValue { name: "nmax_steps", .. })
        ));
        assert!(matches!(
            Config::from_options(Method::DoPri5, &[("rtol", 1e-17)]),
            Err(Error::InvalidValue { name: "rtol", .. })
        ));
        let c = Config::builder().atol([1e-6, 0.0]).build();
        assert!(matches!(c.validate(), Err(Error::InvalidValue { name: "atol", .. })));
    }

    #[test]
    fn euler_methods_need_a_fixed_step() {
        let c = Config::builder().method(Method::FwEuler).build();
        assert!(matches!(c.validate(), Err(Error::InvalidValue { name: "fixed_step", .. })));
        assert!(Config::fixed_step(Method::BwEuler, 0.1).validate().is_ok());
    }
}
