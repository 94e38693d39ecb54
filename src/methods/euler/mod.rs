//! Euler-family formulas: forward, backward (implicit) and the adaptive
//! Euler–Heun pair.

mod bweuler;
mod fweuler;
mod moeuler;

pub(crate) use bweuler::BwEuler;
pub(crate) use fweuler::FwEuler;
pub(crate) use moeuler::MoEuler;

use crate::Float;

/// Linear interpolation over one step; `cont = [y_old, y_new − y_old]`.
pub fn contlin(xi: Float, yi: &mut [Float], cont: &[Float], xold: Float, h: Float) {
    let n = cont.len() / 2;
    let theta = (xi - xold) / h;
    let (c0, c1) = cont.split_at(n);
    for ((y, a), b) in yi.iter_mut().zip(c0).zip(c1) {
        *y = a + theta * b;
    }
}

/// Fill `cont` for [`contlin`].
pub(crate) fn prepare_linear(cont: &mut [Float], y_old: &[Float], y_new: &[Float]) {
    let n = y_old.len();
    let (c0, c1) = cont.split_at_mut(n);
    c0.copy_from_slice(y_old);
    for ((c, a), b) in c1.iter_mut().zip(y_old).zip(y_new) {
        *c = b - a;
    }
}
