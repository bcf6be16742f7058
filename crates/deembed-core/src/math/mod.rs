//! Mathematical functions module
//!
//! Polar/complex conversions, closed-form 2x2 matrix helpers and the
//! S/Y/Z two-port transforms built on them.

pub mod conversions;
pub mod matrix_ops;
pub mod transforms;

pub use conversions::*;
pub use matrix_ops::{invert_2x2, Conditioned, SingularMatrix};
pub use transforms::*;
