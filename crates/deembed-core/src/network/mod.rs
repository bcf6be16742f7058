//! Network module - two-port electrical network representation
//!
//! Provides the core Network struct, its S/Y/Z parameter views and its
//! file I/O.

mod core;
mod io;
mod params;

pub use core::{Network, NetworkError};
