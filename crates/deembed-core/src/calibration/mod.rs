//! Calibration module - fixture removal
//!
//! Open/short de-embedding of two-port measurements, its run
//! configuration and its error taxonomy.

pub mod config;
pub mod error;
pub mod open_short;

pub use config::{DeembedConfig, SingularityPolicy};
pub use error::{DeembedError, IllConditioned, InversionStage, SingularPoint};
pub use open_short::{deembed, deembed_point, CancelToken, DeembedOutcome, OpenShort, PointResult};
