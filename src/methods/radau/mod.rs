//! Implicit Runge–Kutta methods of Radau IIA type.

mod radau5;

pub use radau5::contr5;
pub(crate) use radau5::Radau5;
