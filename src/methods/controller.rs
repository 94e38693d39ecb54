//! Error-based step-size selection.

use crate::{solve::Config, Float};

/// Step-size law `h_new = h·clamp(safe·err^(−1/(q+1)), mmin, mmax)` and its
/// Lund-stabilised variant.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Controller {
    pub safe: Float,
    pub mmin: Float,
    pub mmax: Float,
    pub beta: Float,
}

impl Controller {
    pub fn new(config: &Config) -> Self {
        Self {
            safe: config.safety,
            mmin: config.mmin,
            mmax: config.mmax,
            beta: config.beta,
        }
    }

    /// Proposal for a method whose error estimate is of order `q`.
    pub fn propose(&self, h: Float, err: Float, q: usize) -> Float {
        let fac = self.safe * err.powf(-1.0 / (q as Float + 1.0));
        h * fac.clamp(self.mmin, self.mmax)
    }

    /// Lund-stabilised proposal for an order-`q` estimate.
    ///
    /// Returns the proposal and `err^(1/(q+1) − 0.75·β)`, which
    /// [`Controller::after_reject`] needs when the trial fails.
    pub fn lund(&self, h: Float, err: Float, facold: Float, q: usize) -> (Float, Float) {
        let expo1 = 1.0 / (q as Float + 1.0) - 0.75 * self.beta;
        let fac11 = err.powf(expo1);
        let fac = (fac11 / facold.powf(self.beta) / self.safe).clamp(1.0 / self.mmax, 1.0 / self.mmin);
        (h / fac, fac11)
    }

    /// Step after a rejected Lund-controlled trial; never grows `h`.
    pub fn after_reject(&self, h: Float, fac11: Float) -> Float {
        h / (1.0 / self.mmin).min(fac11 / self.safe)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn controller() -> Controller {
        Controller {
            safe: 0.9,
            mmin: 0.125,
            mmax: 5.0,
            beta: 0.04,
        }
    }

    #[test]
    fn proposal_is_clamped() {
        let c = controller();
        assert_relative_eq!(c.propose(1.0, 1e-12, 1), 5.0);
        assert_relative_eq!(c.propose(1.0, 1e6, 1), 0.125);
        assert_relative_eq!(c.propose(2.0, 0.81, 1), 2.0, epsilon = 1e-14);
    }

    #[test]
    fn lund_without_history_matches_plain_law() {
        let mut c = controller();
        c.beta = 0.0;
        let (h, fac11) = c.lund(1.0, 0.5, 1e-4, 4);
        assert_relative_eq!(h, c.propose(1.0, 0.5, 4), epsilon = 1e-14);
        assert_relative_eq!(fac11, 0.5_f64.powf(0.2));
    }

    #[test]
    fn rejection_shrinks() {
        let c = controller();
        let (_, fac11) = c.lund(1.0, 3.0, 1e-4, 4);
        let h = c.after_reject(1.0, fac11);
        assert!(h < 1.0 && h >= 0.125);
    }
}
