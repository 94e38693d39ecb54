//! Automatic initial step size.

use crate::{core::ode::ODE, core::tolerance::Tolerance, Float};

/// Initial step guess for a method of order `iord` (Hairer–Nørsett–Wanner).
///
/// `f0` must hold `f(x, y)`. One extra evaluation of `f` is made, at an
/// explicit Euler step; `f1` and `y1` are scratch buffers.
#[allow(clippy::too_many_arguments)]
pub(crate) fn hinit<F>(
    ode: &F,
    x: Float,
    y: &[Float],
    f0: &[Float],
    f1: &mut [Float],
    y1: &mut [Float],
    iord: usize,
    hmax: Float,
    atol: &Tolerance,
    rtol: &Tolerance,
) -> Float
where
    F: ODE,
{
    let mut dnf: Float = 0.0;
    let mut dny: Float = 0.0;
    for (i, (fi, yi)) in f0.iter().zip(y).enumerate() {
        let sk = atol[i] + rtol[i] * yi.abs();
        dnf += (fi / sk) * (fi / sk);
        dny += (yi / sk) * (yi / sk);
    }

    let mut h = if dnf <= 1e-10 || dny <= 1e-10 {
        1.0e-6
    } else {
        (dny / dnf).sqrt() * 0.01
    };
    h = h.min(hmax);

    // explicit Euler step
    for ((y1i, yi), fi) in y1.iter_mut().zip(y).zip(f0) {
        *y1i = yi + h * fi;
    }
    ode.ode(x + h, y1, f1);

    // second derivative estimate
    let mut der2: Float = 0.0;
    for (i, yi) in y.iter().enumerate() {
        let sk = atol[i] + rtol[i] * yi.abs();
        let df = (f1[i] - f0[i]) / sk;
        der2 += df * df;
    }
    der2 = der2.sqrt() / h;

    let der12 = der2.max(dnf.sqrt());
    let h1 = if der12 <= 1.0e-15 {
        (1.0e-6 as Float).max(h * 1.0e-3)
    } else {
        (0.01 / der12).powf(1.0 / iord as Float)
    };
    (100.0 * h).min(h1).min(hmax)
}
