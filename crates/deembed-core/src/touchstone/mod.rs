//! Touchstone file I/O module
//!
//! Provides reading and writing of two-port Touchstone (.s2p) files.

pub mod parser;
pub mod writer;

pub use parser::{ParameterType, SParamFormat, Touchstone, TouchstoneError};
