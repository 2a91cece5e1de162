//! Port trait definitions (Hexagonal Architecture)
//!
//! - TrackerGateway: ticket/comment creation in the issue tracker
//! - Clock: time source, replaceable for deterministic tests

pub mod clock;
pub mod tracker_gateway;

pub use clock::{Clock, ManualClock, SystemClock};
pub use tracker_gateway::TrackerGateway;
