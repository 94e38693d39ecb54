//! Scalar or per-component tolerances.

use std::ops::Index;

use crate::Float;

/// Tolerance enum to allow scalar or vector tolerances
/// using [`Into`] for easy conversion from `Float`, `[Float; N]`, `&[Float]`
/// or `Vec<Float>`.
#[derive(Clone, Debug, PartialEq)]
pub enum Tolerance {
    Scalar(Float),
    Vector(Vec<Float>),
}

impl Tolerance {
    /// Smallest component.
    pub fn min(&self) -> Float {
        match self {
            Tolerance::Scalar(v) => *v,
            Tolerance::Vector(vs) => vs.iter().copied().fold(Float::INFINITY, Float::min),
        }
    }

    /// Number of components, `None` for a scalar.
    pub fn len(&self) -> Option<usize> {
        match self {
            Tolerance::Scalar(_) => None,
            Tolerance::Vector(vs) => Some(vs.len()),
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = Float> + '_ {
        let (scalar, vector) = match self {
            Tolerance::Scalar(v) => (Some(*v), &[][..]),
            Tolerance::Vector(vs) => (None, vs.as_slice()),
        };
        scalar.into_iter().chain(vector.iter().copied())
    }
}

impl From<Float> for Tolerance {
    fn from(val: Float) -> Self {
        Tolerance::Scalar(val)
    }
}

impl From<&[Float]> for Tolerance {
    fn from(val: &[Float]) -> Self {
        Tolerance::Vector(val.to_vec())
    }
}

impl<const N: usize> From<[Float; N]> for Tolerance {
    fn from(val: [Float; N]) -> Self {
        Tolerance::Vector(val.to_vec())
    }
}

impl From<Vec<Float>> for Tolerance {
    fn from(val: Vec<Float>) -> Self {
        Tolerance::Vector(val)
    }
}

impl Index<usize> for Tolerance {
    type Output = Float;

    fn index(&self, index: usize) -> &Self::Output {
        match self {
            Tolerance::Scalar(v) => v,
            Tolerance::Vector(vs) => &vs[index],
        }
    }
}
