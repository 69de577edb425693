//! Inbound message schema validation
//!
//! Centralized shape checks for the two wire payloads. Validation
//! returns a structured list of violations, never an error or a panic,
//! so malformed input from an untrusted local transport stays a plain
//! local branch in the handler.

use shared::message::InboundPayload;

// ── Limits ──────────────────────────────────────────────────────────

/// Component / metric names
pub const MAX_NAME_LEN: usize = 64;

/// Serialized observation values (keeps datagram-sized payloads honest)
pub const MAX_VALUE_LEN: usize = 1024;

/// One failed shape check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Offending field ("n", "v", "on")
    pub field: &'static str,
    pub message: String,
}

impl Violation {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a decoded payload against the expected schema.
///
/// An empty result means the payload may be canonicalized and
/// forwarded.
pub fn validate(payload: &InboundPayload) -> Vec<Violation> {
    let mut violations = Vec::new();

    let name = payload.name();
    if name.trim().is_empty() {
        violations.push(Violation::new("n", "must not be empty"));
    }
    if name.len() > MAX_NAME_LEN {
        violations.push(Violation::new(
            "n",
            format!("is too long ({} chars, max {MAX_NAME_LEN})", name.len()),
        ));
    }

    if let InboundPayload::Reading { v, on, .. } = payload {
        if v.is_null() {
            violations.push(Violation::new("v", "must not be null"));
        }
        match serde_json::to_string(v) {
            Ok(raw) if raw.len() > MAX_VALUE_LEN => {
                violations.push(Violation::new(
                    "v",
                    format!("is too large ({} bytes, max {MAX_VALUE_LEN})", raw.len()),
                ));
            }
            _ => {}
        }
        if let Some(on) = on
            && *on < 0
        {
            violations.push(Violation::new("on", "must be a millisecond timestamp"));
        }
    }

    violations
}

/// Join violations into one log-friendly line
pub fn describe(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_reading_passes() {
        let p = InboundPayload::reading("temp", serde_json::json!(26.7));
        assert!(validate(&p).is_empty());
    }

    #[test]
    fn test_valid_registration_passes() {
        let p = InboundPayload::registration("temp-sensor", true);
        assert!(validate(&p).is_empty());
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let p = InboundPayload::reading("", serde_json::json!(1));
        let violations = validate(&p);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "n");

        // whitespace-only counts as empty too
        let p = InboundPayload::reading("   ", serde_json::json!(1));
        assert!(!validate(&p).is_empty());
    }

    #[test]
    fn test_oversized_name_is_rejected() {
        let p = InboundPayload::reading("x".repeat(MAX_NAME_LEN + 1), serde_json::json!(1));
        assert_eq!(validate(&p)[0].field, "n");
    }

    #[test]
    fn test_null_value_is_rejected() {
        let p = InboundPayload::reading("temp", serde_json::Value::Null);
        assert_eq!(validate(&p)[0].field, "v");
    }

    #[test]
    fn test_negative_timestamp_is_rejected() {
        let p = InboundPayload::Reading {
            n: "temp".into(),
            v: serde_json::json!(1),
            on: Some(-5),
        };
        assert_eq!(validate(&p)[0].field, "on");
    }

    #[test]
    fn test_violations_accumulate() {
        let p = InboundPayload::Reading {
            n: "".into(),
            v: serde_json::Value::Null,
            on: Some(-1),
        };
        let violations = validate(&p);
        assert_eq!(violations.len(), 3);
        assert!(describe(&violations).contains("must not be empty"));
    }
}
