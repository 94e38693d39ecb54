//! Matrix types used for Jacobians, mass matrices and linear systems.

mod base;
mod system;
mod triplet;

pub use base::Matrix;
pub use system::{Storage, SystemMatrix};
pub use triplet::Triplet;
