//! deembed-core: Open/short de-embedding of two-port S-parameters
//!
//! Extracts the intrinsic S-parameters of a device under test from
//! measurements taken through a test fixture, using open and short
//! calibration structures.
//!
//! ## Modules
//!
//! - `frequency` - Frequency sweep representation
//! - `math` - Polar/complex conversions, 2x2 matrix helpers, S/Y/Z transforms
//! - `network` - Two-port network representation
//! - `calibration` - Open/short de-embedding engine and run configuration
//! - `table` - CSV measurement tables (single structure, comparison, merged)
//! - `touchstone` - Two-port Touchstone file I/O
//! - `source` / `sink` - Measurement sources and result sinks

pub mod calibration;
pub mod constants;
pub mod frequency;
pub mod math;
pub mod network;
pub mod sink;
pub mod source;
pub mod table;
pub mod touchstone;

pub use calibration::{deembed, DeembedConfig, DeembedError, DeembedOutcome, OpenShort};
pub use frequency::Frequency;
pub use math::transforms::ReferenceImpedance;
pub use network::Network;
