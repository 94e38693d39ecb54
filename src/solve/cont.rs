//! Continuous output provided by dense output coefficients (cont) from each step.

use crate::{methods::ContFn, Float};

#[derive(Debug, Clone)]
struct Segment {
    cont: Vec<Float>,
    xold: Float,
    h: Float,
    /// accepted step end; equals `xf` exactly on the last step
    x: Float,
}

/// Piecewise dense output over all accepted steps.
///
/// Segment `k` covers step `k + 1`, from `xold_k` over a length `h_k`.
#[derive(Debug, Clone)]
pub struct ContinuousOutput {
    ndim: usize,
    segs: Vec<Segment>,
    cont_fn: ContFn,
}

impl ContinuousOutput {
    pub(crate) fn new(ndim: usize, cont_fn: ContFn) -> Self {
        Self {
            ndim,
            segs: Vec::new(),
            cont_fn,
        }
    }

    pub(crate) fn push(&mut self, cont: &[Float], xold: Float, x: Float, h: Float) {
        if h != 0.0 {
            self.segs.push(Segment {
                cont: cont.to_vec(),
                xold,
                h,
                x,
            });
        }
    }

    /// Number of stored steps.
    pub fn len(&self) -> usize {
        self.segs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segs.is_empty()
    }

    /// Domain covered by the dense output.
    pub fn t_span(&self) -> Option<(Float, Float)> {
        let first = self.segs.first()?;
        let last = self.segs.last()?;
        Some((first.xold, last.x))
    }

    /// Interpolate `y(x)`; `None` outside the covered domain.
    ///
    /// At a step boundary the left step is used, whose polynomial ends on
    /// the accepted state.
    pub fn evaluate(&self, x: Float) -> Option<Vec<Float>> {
        let k = self.find_segment(x)?;
        let mut yi = vec![0.0; self.ndim];
        self.evaluate_in(k, x, &mut yi);
        Some(yi)
    }

    /// Batch-evaluate at many points; `None` for points outside coverage.
    pub fn evaluate_many(&self, xs: &[Float]) -> Vec<Option<Vec<Float>>> {
        xs.iter().map(|&x| self.evaluate(x)).collect()
    }

    /// Walk the steps once, emitting `(step, x_out, y_out)` every `dx`
    /// starting at the first abscissa. The step of the start point is 0.
    pub fn sample(&self, dx: Float) -> Vec<(usize, Float, Vec<Float>)> {
        let mut out = Vec::new();
        let Some(first) = self.segs.first() else {
            return out;
        };
        if !(dx > 0.0) {
            return out;
        }
        let mut y0 = vec![0.0; self.ndim];
        self.evaluate_in(0, first.xold, &mut y0);
        out.push((0, first.xold, y0));

        let mut xout = first.xold + dx;
        for (k, seg) in self.segs.iter().enumerate() {
            while xout <= seg.x + DENSE_TOL * dx {
                let mut yi = vec![0.0; self.ndim];
                self.evaluate_in(k, xout, &mut yi);
                out.push((k + 1, xout, yi));
                xout += dx;
            }
        }
        out
    }

    fn evaluate_in(&self, k: usize, x: Float, yi: &mut [Float]) {
        let seg = &self.segs[k];
        (self.cont_fn)(x, yi, &seg.cont, seg.xold, seg.h);
    }

    fn find_segment(&self, x: Float) -> Option<usize> {
        let (start, end) = self.t_span()?;
        if x < start || x > end {
            return None;
        }
        // first segment whose right end is not left of x
        let k = self.segs.partition_point(|s| s.x < x);
        Some(k.min(self.segs.len() - 1))
    }
}

/// Relative slack (in units of the sampling spacing) for output points
/// that fall on a step end.
pub(crate) const DENSE_TOL: Float = 1e-10;
