//! Convenient prelude: import the most commonly used traits and types.
//!
//! Bring this into scope with:
//!
//! ```rust
//! use odekit::prelude::*;
//! ```

pub use crate::core::{
    interpolate::Interpolate,
    ode::ODE,
    solout::{ControlFlag, SolOut},
    stats::Stats,
    status::Status,
    tolerance::Tolerance,
};
pub use crate::matrix::{Storage, SystemMatrix};
pub use crate::solve::{Config, InitialStep, Method, Output, Solver};
pub use crate::{Error, Failure};
