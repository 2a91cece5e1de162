//! Domain layer for the faultline fault reporter.
//!
//! Holds the fault and webhook models, the error taxonomy, and the port
//! traits (tracker gateway, clock) that adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{FaultError, FaultResult, GatewayError};
