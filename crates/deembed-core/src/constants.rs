//! Numerical constants for de-embedding
//!
//! Provides standardized tolerance values and defaults shared by the
//! converters, the engine and the file adapters.

/// Number of ports handled by the converters.
pub const NPORTS: usize = 2;

/// Relative singularity threshold for 2x2 inversion.
///
/// A matrix is singular when `|det| <= SINGULAR_RELATIVE_TOL * ||A||_F^2`.
/// The Frobenius term makes the test independent of the matrix scale, so
/// milli-siemens admittances and kilo-ohm impedances are judged alike.
pub const SINGULAR_RELATIVE_TOL: f64 = 1e-13;

/// Default reference impedance in ohms.
pub const DEFAULT_Z0_OHMS: f64 = 50.0;

/// Default condition number above which an inversion is reported.
pub const DEFAULT_CONDITION_WARN_THRESHOLD: f64 = 1e12;

/// Largest accepted condition number warning threshold.
///
/// `cond(A) >= ||A||_F^2 / (2 |det A|)`, so every matrix rejected as
/// singular has a condition number of at least `1 / (2 * SINGULAR_RELATIVE_TOL)`.
/// Below this ceiling, matrices with a condition number between the threshold
/// and the ceiling are always inverted and reported.
pub const MAX_CONDITION_WARN_THRESHOLD: f64 = 0.5 / SINGULAR_RELATIVE_TOL;

/// Default relative tolerance when comparing frequency sweeps.
pub const DEFAULT_FREQUENCY_TOL: f64 = 1e-9;
