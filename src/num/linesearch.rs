//! Backtracking line search on `φ(x) = ½·f(x)·f(x)`.
//!
//! Starts from the full Newton step `x0 − mdx` and shrinks it by quadratic,
//! then cubic, interpolation of `φ` until the sufficient-decrease condition
//! `φ(λ) ≤ φ0 + ALF·λ·φ'(0)` holds (Numerical Recipes, `lnsrch`).

use log::trace;

use crate::Float;

const ALF: Float = 1e-4;
const TOLX: Float = 1e-7;

/// Damp the Newton update `x = x0 − λ·mdx`.
///
/// On entry `dphidx0 = Jᵀ·f(x0)` and `phi0 = φ(x0)`; on return `x` and `fx`
/// hold the accepted point and its residual. Returns the number of
/// evaluations of `ffcn`.
pub fn line_search<F>(
    x: &mut [Float],
    fx: &mut [Float],
    mut ffcn: F,
    mdx: &[Float],
    x0: &[Float],
    dphidx0: &[Float],
    phi0: Float,
    max_it: usize,
) -> usize
where
    F: FnMut(&[Float], &mut [Float]),
{
    // slope along the direction p = −mdx
    let slope: Float = -dphidx0.iter().zip(mdx).map(|(g, d)| g * d).sum::<Float>();
    let test = mdx
        .iter()
        .zip(x0)
        .map(|(d, xi)| d.abs() / xi.abs().max(1.0))
        .fold(0.0, Float::max);
    let lambda_min = if test > 0.0 { TOLX / test } else { 0.0 };

    let mut nfeval = 0;
    let mut lambda: Float = 1.0;
    let mut lambda_prev: Float = 0.0;
    let mut phi_prev: Float = 0.0;
    for it in 0..max_it {
        for ((xi, x0i), di) in x.iter_mut().zip(x0).zip(mdx) {
            *xi = x0i - lambda * di;
        }
        ffcn(x, fx);
        nfeval += 1;
        let phi = 0.5 * fx.iter().map(|v| v * v).sum::<Float>();
        trace!("line search it = {it}: lambda = {lambda:e}, phi = {phi:e}");

        if lambda < lambda_min || phi <= phi0 + ALF * lambda * slope {
            break;
        }

        let next = if it == 0 {
            -slope / (2.0 * (phi - phi0 - slope))
        } else {
            let rhs1 = phi - phi0 - lambda * slope;
            let rhs2 = phi_prev - phi0 - lambda_prev * slope;
            let a = (rhs1 / (lambda * lambda) - rhs2 / (lambda_prev * lambda_prev))
                / (lambda - lambda_prev);
            let b = (-lambda_prev * rhs1 / (lambda * lambda)
                + lambda * rhs2 / (lambda_prev * lambda_prev))
                / (lambda - lambda_prev);
            let cubic = if a == 0.0 {
                -slope / (2.0 * b)
            } else {
                let disc = b * b - 3.0 * a * slope;
                if disc < 0.0 {
                    0.5 * lambda
                } else if b <= 0.0 {
                    (-b + disc.sqrt()) / (3.0 * a)
                } else {
                    -slope / (b + disc.sqrt())
                }
            };
            cubic.min(0.5 * lambda)
        };
        lambda_prev = lambda;
        phi_prev = phi;
        lambda = next.max(0.1 * lambda);
    }
    nfeval
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_step_accepted_for_linear_residual() {
        // f(x) = x - 3, Newton step from 0 lands on the root
        let x0 = [0.0];
        let mut fx = [-3.0];
        let phi0 = 4.5;
        let dphidx0 = [-3.0];
        let mdx = [-3.0];
        let mut x = [0.0];
        let nfeval = line_search(&mut x, &mut fx, |x, f| f[0] = x[0] - 3.0, &mdx, &x0, &dphidx0, phi0, 20);
        assert_eq!(nfeval, 1);
        assert_eq!(x, [3.0]);
        assert_eq!(fx, [0.0]);
    }

    #[test]
    fn overshooting_step_is_damped() {
        // f(x) = atan(x): the Newton step from x0 = 2 overshoots to |x| > 2
        let x0 = [2.0_f64];
        let f0 = x0[0].atan();
        let jac = 1.0 / (1.0 + x0[0] * x0[0]);
        let mdx = [f0 / jac];
        let phi0 = 0.5 * f0 * f0;
        let dphidx0 = [jac * f0];
        let mut x = [0.0];
        let mut fx = [0.0];
        let nfeval = line_search(&mut x, &mut fx, |x, f| f[0] = x[0].atan(), &mdx, &x0, &dphidx0, phi0, 20);
        assert!(nfeval > 1);
        assert!(0.5 * fx[0] * fx[0] < phi0);
        assert!(x[0].abs() < x0[0]);
    }
}
