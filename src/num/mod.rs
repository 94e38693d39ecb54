//! Numerical building blocks shared by the integrators: error norms,
//! finite-difference Jacobians, a stand-alone Newton solver with line search,
//! and row-partitioned Jacobian assembly.

pub mod assembly;
pub mod jacobian;
pub mod linesearch;
pub mod nlsolver;
pub mod norm;

pub use assembly::{assemble, partition};
pub use jacobian::{compare_jacobian, numerical_jacobian, MACHEPS};
pub use linesearch::line_search;
pub use nlsolver::{NlSolver, Residual, NLSOLVER_OPTIONS};
