// ============================================
// File: crates/vpn-directory/src/record.rs
// ============================================
//! # Directory Record
//!
//! One candidate server as listed to the user and stored in the cache.
//!
//! ## Wire Format
//! Field names are fixed for compatibility with existing cache files and
//! front-ends:
//! ```json
//! {"id":"1.2.3.4","name":"Germany (5 Mbps)","ip":"1.2.3.4","load":"Public"}
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - `name` and `address` come from an untrusted feed: display only
//! - Records are immutable, a refresh builds a new `Vec`

use serde::{Deserialize, Serialize};

use vpn_common::ServerId;

/// Quality tag attached to every record built from the public feed.
pub const PUBLIC_QUALITY: &str = "Public";

/// Identifier of the placeholder record returned when no cache is usable.
pub const PLACEHOLDER_ID: &str = "local";

/// Display name of the placeholder record.
pub const PLACEHOLDER_NAME: &str = "No servers found (run fetch-public)";

/// Null address of the placeholder record.
pub const PLACEHOLDER_ADDRESS: &str = "0.0.0.0";

/// Quality of the placeholder record.
pub const PLACEHOLDER_QUALITY: &str = "0%";

/// A single directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRecord {
    id: ServerId,
    name: String,
    #[serde(rename = "ip")]
    address: String,
    #[serde(rename = "load")]
    quality: String,
}

impl DirectoryRecord {
    /// Creates a record from already-validated parts.
    #[must_use]
    pub fn new(
        id: ServerId,
        name: impl Into<String>,
        address: impl Into<String>,
        quality: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            address: address.into(),
            quality: quality.into(),
        }
    }

    /// The record shown when no directory is available.
    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            id: PLACEHOLDER_ID.parse().expect("placeholder id is a valid identifier"),
            name: PLACEHOLDER_NAME.to_string(),
            address: PLACEHOLDER_ADDRESS.to_string(),
            quality: PLACEHOLDER_QUALITY.to_string(),
        }
    }

    /// Returns `true` if this is the built-in placeholder.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.id.as_str() == PLACEHOLDER_ID && self.address == PLACEHOLDER_ADDRESS
    }

    /// Validated identifier.
    #[must_use]
    pub fn id(&self) -> &ServerId {
        &self.id
    }

    /// Display label.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Host or IP address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Load/quality tag (`load` on the wire).
    #[must_use]
    pub fn quality(&self) -> &str {
        &self.quality
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_field_names() {
        let record = DirectoryRecord::new(
            ServerId::parse("1.2.3.4").unwrap(),
            "Germany (5 Mbps)",
            "1.2.3.4",
            PUBLIC_QUALITY,
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "1.2.3.4",
                "name": "Germany (5 Mbps)",
                "ip": "1.2.3.4",
                "load": "Public"
            })
        );
    }

    #[test]
    fn test_placeholder() {
        let record = DirectoryRecord::placeholder();
        assert_eq!(record.id().as_str(), "local");
        assert_eq!(record.address(), "0.0.0.0");
        assert!(record.is_placeholder());
    }

    #[test]
    fn test_rejects_invalid_id_on_deserialize() {
        let raw = r#"{"id":"a;b","name":"x","ip":"1.1.1.1","load":"1%"}"#;
        assert!(serde_json::from_str::<DirectoryRecord>(raw).is_err());
    }

    #[test]
    fn test_reads_reference_list_shape() {
        let raw = r#"[{"id":"de1","name":"Germany - Frankfurt (Free)","ip":"192.168.1.101","load":"12%"}]"#;
        let records: Vec<DirectoryRecord> = serde_json::from_str(raw).unwrap();
        assert_eq!(records[0].name(), "Germany - Frankfurt (Free)");
        assert_eq!(records[0].quality(), "12%");
    }
}
