//! Numerical integration of initial value problems `M·y' = f(x, y)`.
//!
//! Five formulas share one orchestrated step loop:
//!
//! | Method                  | Kind               | Step     |
//! |-------------------------|--------------------|----------|
//! | [`Method::FwEuler`]     | explicit, order 1  | fixed    |
//! | [`Method::BwEuler`]     | implicit, order 1  | fixed    |
//! | [`Method::MoEuler`]     | explicit, 2(1)     | adaptive |
//! | [`Method::DoPri5`]      | explicit, 5(4)     | adaptive |
//! | [`Method::Radau5`]      | implicit, order 5  | adaptive |
//!
//! Implicit methods run a Newton corrector on top of [`linsol::LinSol`], which
//! factorizes dense or sparse (triplet) matrices over real or complex scalars.
//! The [`num`] module also exposes the stand-alone [`num::NlSolver`] root
//! finder and row-partitioned Jacobian assembly.
//!
//! ```no_run
//! use odekit::prelude::*;
//! use odekit::problems::VanDerPol;
//!
//! let problem = VanDerPol::new(1e-6);
//! let config = Config::builder().method(Method::Radau5).build();
//! let mut solver = Solver::new(problem.ndim(), config).unwrap();
//! let mut y = problem.y0();
//! solver.solve(&problem, &mut y, 0.0, 2.0).unwrap();
//! println!("{}", solver.stats());
//! ```

pub mod core;
pub mod linsol;
pub mod matrix;
pub mod methods;
pub mod num;
pub mod prelude;
pub mod problems;
pub mod solve;

mod error;

pub use error::{Error, Failure};
pub use solve::{Config, Method, Solver};

/// Floating point type used throughout the crate.
pub type Float = f64;
