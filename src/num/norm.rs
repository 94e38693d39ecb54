//! Scaled error norms shared by the correctors and the step controllers.

use crate::{core::tolerance::Tolerance, Float};

/// `scal[i] = atol[i] + rtol[i]·|y[i]|`
pub fn scale_abs(scal: &mut [Float], atol: &Tolerance, rtol: &Tolerance, y: &[Float]) {
    for (i, (s, yi)) in scal.iter_mut().zip(y).enumerate() {
        *s = atol[i] + rtol[i] * yi.abs();
    }
}

/// `scal[i] = atol[i] + rtol[i]·max(|a[i]|, |b[i]|)`
pub fn scale_max_abs(
    scal: &mut [Float],
    atol: &Tolerance,
    rtol: &Tolerance,
    a: &[Float],
    b: &[Float],
) {
    for (i, s) in scal.iter_mut().enumerate() {
        *s = atol[i] + rtol[i] * a[i].abs().max(b[i].abs());
    }
}

/// Root mean square of `v[i] / scal[i]`.
pub fn rms_scaled(v: &[Float], scal: &[Float]) -> Float {
    let n = v.len();
    if n == 0 {
        return 0.0;
    }
    let sum: Float = v.iter().zip(scal).map(|(vi, si)| (vi / si) * (vi / si)).sum();
    (sum / n as Float).sqrt()
}

/// Largest absolute component.
pub fn max_abs(v: &[Float]) -> Float {
    v.iter().fold(0.0, |acc: Float, x| acc.max(x.abs()))
}

/// Newton tolerance `max(10·ε/rtol, min(0.03, √rtol))`.
pub fn newton_tolerance(rtol: Float, eps: Float) -> Float {
    (10.0 * eps / rtol).max(0.03_f64.min(rtol.sqrt()))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn scaled_rms() {
        let mut scal = [0.0; 2];
        scale_abs(&mut scal, &Tolerance::Scalar(1e-3), &[0.1, 0.2].into(), &[10.0, -5.0]);
        assert_relative_eq!(scal[0], 1.001);
        assert_relative_eq!(scal[1], 1.001);
        let e = rms_scaled(&[1.001, 0.0], &scal);
        assert_relative_eq!(e, (0.5_f64).sqrt(), epsilon = 1e-15);
        assert_eq!(max_abs(&[1.0, -3.0, 2.0]), 3.0);
    }

    #[test]
    fn newton_tolerance_branches() {
        assert_relative_eq!(newton_tolerance(1e-4, 1e-16), 0.01, epsilon = 1e-15);
        assert_eq!(newton_tolerance(1.0, 1e-16), 0.03);
        assert_relative_eq!(newton_tolerance(1e-18, 1e-16), 1000.0);
    }
}
