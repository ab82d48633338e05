//! Backup id generation and sanitization.
//!
//! Format: `YYYYMMDD-HHMMSS-<16 hex chars>`, where the suffix is
//! crypto-random, never derived from a counter or a second timestamp read
//! (two backups created in the same second must not collide).

use chrono::Utc;
use rand::Rng;

use crate::error::BackupError;

/// Generate a new backup id anchored to the current UTC time.
pub fn generate_id() -> String {
    let now = Utc::now();
    let suffix = random_hex_suffix();
    format!("{}-{}", now.format("%Y%m%d-%H%M%S"), suffix)
}

fn random_hex_suffix() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 8] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Reject ids containing path separators, `..`, or any character outside
/// the expected `YYYYMMDD-HHMMSS-<16 hex>` alphabet.
pub fn validate_id(id: &str) -> Result<(), BackupError> {
    let bytes = id.as_bytes();
    let well_formed = bytes.len() == 23
        && bytes[..8].iter().all(u8::is_ascii_digit)
        && bytes[8] == b'-'
        && bytes[9..15].iter().all(u8::is_ascii_digit)
        && bytes[15] == b'-'
        && bytes[16..].iter().all(u8::is_ascii_hexdigit);

    if well_formed && !id.contains("..") && !id.contains('/') && !id.contains('\\') {
        Ok(())
    } else {
        Err(BackupError::InvalidId(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_well_formed_and_unique() {
        let a = generate_id();
        let b = generate_id();
        assert!(validate_id(&a).is_ok());
        assert!(validate_id(&b).is_ok());
        assert_ne!(a, b);
    }

    #[test]
    fn rejects_path_traversal() {
        assert!(validate_id("../../etc/passwd").is_err());
        assert!(validate_id("20240101-120000-deadbeefdeadbeef/../x").is_err());
    }

    #[test]
    fn rejects_malformed_shapes() {
        assert!(validate_id("not-a-backup-id").is_err());
        assert!(validate_id("20240101-120000-shortsuffix").is_err());
    }
}
