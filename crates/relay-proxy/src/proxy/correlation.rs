//! Correlation ID generation for request tracing.
//!
//! IDs only appear in spans and log lines; the relay never adds them to the
//! forwarded request or the relayed response.

use uuid::Uuid;

/// Generate a new correlation ID (UUID v4).
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_uuids() {
        let a = generate_id();
        let b = generate_id();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
    }
}
