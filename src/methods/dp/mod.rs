//! Dormand–Prince explicit Runge–Kutta pairs.

mod dopri5;

pub use dopri5::contdp5;
pub(crate) use dopri5::DoPri5;
