//! Fault fingerprinting.
//!
//! A fingerprint is the SHA-256 of the message and the first stack line,
//! joined by an ASCII unit separator. Context, metadata and severity do not
//! participate: the stack head is the identity signal. No salt is mixed in,
//! so fingerprints are stable across restarts.

use sha2::{Digest, Sha256};

use crate::domain::models::{FaultFingerprint, FaultReport};

/// Separator between message and stack head. Control character, so it
/// cannot come from an ordinary message.
const FIELD_SEPARATOR: char = '\u{1f}';

/// Derive the identity of a fault report.
pub fn fingerprint(report: &FaultReport) -> FaultFingerprint {
    let mut hasher = Sha256::new();
    hasher.update(report.message.as_bytes());
    let mut sep = [0u8; 4];
    hasher.update(FIELD_SEPARATOR.encode_utf8(&mut sep).as_bytes());
    hasher.update(report.stack_head().as_bytes());
    FaultFingerprint::from_hex(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Severity;
    use proptest::prelude::*;

    #[test]
    fn test_fingerprint_is_fixed_length_hex() {
        let fp = fingerprint(&FaultReport::new("boom"));
        assert_eq!(fp.as_str().len(), 64);
        assert!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_known_value_is_stable() {
        // sha256("boom\u{1f}")
        let mut hasher = Sha256::new();
        hasher.update(b"boom\x1f");
        let expected = hex::encode(hasher.finalize());
        assert_eq!(fingerprint(&FaultReport::new("boom")).as_str(), expected);
    }

    #[test]
    fn test_only_first_stack_line_matters() {
        let a = FaultReport::new("Duplicate error")
            .with_stack("Error: Duplicate\n  at test.js:1:1");
        let b = FaultReport::new("Duplicate error")
            .with_stack("Error: Duplicate\n  at other.js:9:9\n  at main.js:2:2");
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_different_stack_head_differs() {
        let a = FaultReport::new("x").with_stack("at a.rs:1");
        let b = FaultReport::new("x").with_stack("at b.rs:1");
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_absent_and_empty_stack_collapse() {
        let a = FaultReport::new("x");
        let b = FaultReport::new("x").with_stack("");
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_separator_prevents_boundary_shift() {
        let a = FaultReport::new("ab").with_stack("c");
        let b = FaultReport::new("a").with_stack("bc");
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    proptest! {
        #[test]
        fn prop_ignores_context_metadata_and_severity(
            message in ".{0,40}",
            head in "[^\r\n]{0,40}",
            tail in ".{0,40}",
            key in "[a-z]{1,8}",
            value in any::<i64>(),
        ) {
            let plain = FaultReport::new(message.clone()).with_stack(head.clone());
            let decorated = FaultReport::new(message)
                .with_stack(format!("{head}\n{tail}"))
                .with_severity(Severity::Critical)
                .with_context(key.clone(), value)
                .with_metadata(key, value)
                .with_user_id("user-1");
            prop_assert_eq!(fingerprint(&plain), fingerprint(&decorated));
        }
    }
}
