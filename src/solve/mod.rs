//! Configuration, the step loop and its recorded output.

pub mod cont;
pub mod options;
pub mod solution;
mod solver;

pub use cont::ContinuousOutput;
pub use options::{Config, InitialStep, Method, CONFIG_OPTIONS};
pub use solution::Output;
pub use solver::Solver;
