//! Recorded output of a solve: accepted steps, dense samples and the
//! continuous solution.

use log::warn;

use crate::Float;

use super::cont::ContinuousOutput;

/// Output of the last call to [`Solver::solve`](crate::Solver::solve).
///
/// Step data is recorded when `save_steps` is on, starting with the initial
/// point (stored with `h = 0`). Dense samples are recorded when `dense_dx`
/// is set, and the per-step polynomials when `dense_output` is on.
#[derive(Debug, Clone, Default)]
pub struct Output {
    pub(crate) step_x: Vec<Float>,
    pub(crate) step_y: Vec<Vec<Float>>,
    pub(crate) step_h: Vec<Float>,
    pub(crate) dense_s: Vec<usize>,
    pub(crate) dense_x: Vec<Float>,
    pub(crate) dense_y: Vec<Vec<Float>>,
    pub(crate) continuous: Option<ContinuousOutput>,
}

impl Output {
    pub(crate) fn push_step(&mut self, x: Float, y: &[Float], h: Float) {
        self.step_x.push(x);
        self.step_y.push(y.to_vec());
        self.step_h.push(h);
    }

    pub(crate) fn push_dense(&mut self, istep: usize, x: Float, y: &[Float]) {
        self.dense_s.push(istep);
        self.dense_x.push(x);
        self.dense_y.push(y.to_vec());
    }

    /// Abscissae of the recorded steps.
    pub fn step_x(&self) -> &[Float] {
        &self.step_x
    }

    /// Component `i` at every recorded step.
    pub fn step_y(&self, i: usize) -> Vec<Float> {
        self.step_y.iter().map(|y| y[i]).collect()
    }

    /// Sizes of the recorded steps.
    pub fn step_h(&self) -> &[Float] {
        &self.step_h
    }

    /// Iterate over recorded `(x, y)` pairs.
    pub fn steps(&self) -> impl Iterator<Item = (Float, &[Float])> + '_ {
        self.step_x.iter().copied().zip(self.step_y.iter().map(Vec::as_slice))
    }

    /// Step index of every dense sample.
    pub fn dense_s(&self) -> &[usize] {
        &self.dense_s
    }

    pub fn dense_x(&self) -> &[Float] {
        &self.dense_x
    }

    /// Component `i` at every dense sample.
    pub fn dense_y(&self, i: usize) -> Vec<Float> {
        self.dense_y.iter().map(|y| y[i]).collect()
    }

    /// The continuous solution, when `dense_output` was on.
    pub fn continuous(&self) -> Option<&ContinuousOutput> {
        self.continuous.as_ref()
    }

    /// Evaluate the continuous solution at `x`. `None` when dense output
    /// was off or `x` lies outside the integrated interval.
    pub fn sol(&self, x: Float) -> Option<Vec<Float>> {
        match &self.continuous {
            Some(c) => c.evaluate(x),
            None => {
                warn!("sol({x}) requested but dense output was not stored");
                None
            }
        }
    }

    /// Sample the continuous solution every `dx`; see
    /// [`ContinuousOutput::sample`].
    pub fn sample(&self, dx: Float) -> Vec<(usize, Float, Vec<Float>)> {
        match &self.continuous {
            Some(c) => c.sample(dx),
            None => {
                warn!("sampling skipped: dense output was not stored");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn getters_split_components() {
        let mut out = Output::default();
        out.push_step(0.0, &[1.0, 2.0], 0.0);
        out.push_step(0.1, &[3.0, 4.0], 0.1);
        out.push_dense(0, 0.0, &[1.0, 2.0]);
        assert_eq!(out.step_x(), [0.0, 0.1]);
        assert_eq!(out.step_y(1), [2.0, 4.0]);
        assert_eq!(out.step_h(), [0.0, 0.1]);
        assert_eq!(out.dense_s(), [0]);
        assert_eq!(out.dense_y(0), [1.0]);
        assert_eq!(out.steps().count(), 2);
    }

    #[test]
    fn queries_without_dense_output_are_empty() {
        let out = Output::default();
        assert!(out.sol(0.5).is_none());
        assert!(out.sample(0.1).is_empty());
    }
}
