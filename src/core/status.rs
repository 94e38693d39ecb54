//! Status codes for a finished integration

/// How a successful call to `Solver::solve` ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// `x` reached `xf`.
    Success,
    /// An output callback returned [`ControlFlag::Interrupt`](crate::core::solout::ControlFlag).
    Interrupted,
}
