//! Severity to tracker priority mapping.
//!
//! Linear priorities: 0 = none, 1 = urgent, 2 = high, 3 = medium, 4 = low.

use crate::domain::models::Severity;

/// Priority used when no default is configured.
pub const DEFAULT_PRIORITY: u8 = 2;

/// Highest valid Linear priority value.
pub const MAX_PRIORITY: u8 = 4;

/// Map a severity to a tracker priority, falling back to `default` for
/// reports without a recognized severity.
pub const fn priority_for(severity: Option<Severity>, default: u8) -> u8 {
    match severity {
        Some(Severity::Critical) => 1,
        Some(Severity::Error) => 2,
        Some(Severity::Warning) => 3,
        None => default,
    }
}
