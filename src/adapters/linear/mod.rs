//! Linear issue tracker adapter.
//!
//! - [`LinearClient`]: GraphQL transport
//! - [`LinearGateway`]: the [`TrackerGateway`](crate::domain::ports::TrackerGateway)
//!   implementation used by the fault manager

pub mod client;
pub mod gateway;
pub mod models;

pub use client::{LinearClient, LINEAR_API_URL};
pub use gateway::LinearGateway;
