//! Component catalog records
//!
//! The local catalog is a JSON array of [`ComponentRegistration`]
//! records, fully overwritten by the registrar on every mutation.
//! Only the registrar writes this file.

use serde::{Deserialize, Serialize};

/// One registered component of the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRegistration {
    /// Component name (e.g. "temp-sensor")
    pub name: String,
    /// Whether the component belongs to the domain catalog
    pub cataloged: bool,
}

impl ComponentRegistration {
    pub fn new(name: impl Into<String>, cataloged: bool) -> Self {
        Self {
            name: name.into(),
            cataloged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_serde_roundtrip() {
        let records = vec![
            ComponentRegistration::new("temp-sensor", true),
            ComponentRegistration::new("relay", false),
        ];

        let json = serde_json::to_string(&records).unwrap();
        let parsed: Vec<ComponentRegistration> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, records);
    }

    #[test]
    fn test_empty_catalog_is_empty_array() {
        let records: Vec<ComponentRegistration> = Vec::new();
        assert_eq!(serde_json::to_string(&records).unwrap(), "[]");
    }
}
