// ============================================
// File: crates/vpn-common/src/types.rs
// ============================================
//! # Core Type Definitions
//!
//! ## Creation Reason
//! Server identifiers arrive from two untrusted places: the remote
//! directory feed and the command line. `ServerId` is the only way an
//! identifier reaches session control, and it can only be built through
//! the whitelist check below.
//!
//! ## Main Functionality
//! - `is_valid_id`: Identifier whitelist (`[A-Za-z0-9.-]+`)
//! - `ServerId`: Validated identifier newtype
//! - Serde support that re-validates on deserialization
//!
//! ## ⚠️ Important Note for Next Developer
//! - Do not add a constructor that skips `is_valid_id`
//! - The identifier is later used in command/address contexts, widening
//!   the character set widens the injection surface
//!
//! ## Last Modified
//! v0.1.0 - Initial identifier type

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CommonError;

// ============================================
// Validator
// ============================================

/// Returns `true` if `raw` is a non-empty string made only of ASCII
/// letters, digits, `.` and `-`.
///
/// # Example
/// ```
/// use vpn_common::types::is_valid_id;
///
/// assert!(is_valid_id("de1.vpn-host.net"));
/// assert!(!is_valid_id("../etc/passwd"));
/// assert!(!is_valid_id(""));
/// ```
#[must_use]
pub fn is_valid_id(raw: &str) -> bool {
    !raw.is_empty()
        && raw
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'-')
}

// ============================================
// ServerId
// ============================================

/// Validated identifier of a directory entry.
///
/// # Invariants
/// - Non-empty
/// - Only `[A-Za-z0-9.-]`
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServerId(String);

impl ServerId {
    /// Validates `raw` and wraps it.
    ///
    /// # Errors
    /// Returns `CommonError::InvalidInput` if `raw` fails [`is_valid_id`].
    pub fn parse(raw: impl Into<String>) -> Result<Self, CommonError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(CommonError::invalid_input("server_id", "cannot be empty"));
        }
        if !is_valid_id(&raw) {
            return Err(CommonError::invalid_input(
                "server_id",
                format!("{raw:?} contains characters outside [A-Za-z0-9.-]"),
            ));
        }
        Ok(Self(raw))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServerId({})", self.0)
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ServerId {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ServerId {
    type Error = CommonError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ServerId> for String {
    fn from(id: ServerId) -> Self {
        id.0
    }
}

impl AsRef<str> for ServerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    const ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789.-";

    #[test]
    fn test_valid_ids() {
        for id in ["local", "1.2.3.4", "de1", "vpn-42.example.net", "-", ".", "A"] {
            assert!(is_valid_id(id), "{id} should be accepted");
        }
        assert!(is_valid_id(ALLOWED));
    }

    #[test]
    fn test_rejects_empty() {
        assert!(!is_valid_id(""));
        assert!(ServerId::parse("").is_err());
    }

    #[test]
    fn test_rejects_every_disallowed_ascii_char() {
        for b in 0u8..=127 {
            let c = b as char;
            if ALLOWED.contains(c) {
                continue;
            }
            let raw = format!("host{c}1");
            assert!(!is_valid_id(&raw), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn test_rejects_injection_shapes() {
        for raw in [
            "../../etc/passwd",
            "host; rm -rf /",
            "a b",
            "host\n",
            "$(id)",
            "`id`",
            "::1",
            "ünïcode",
            "1.2.3.4/24",
        ] {
            assert!(!is_valid_id(raw), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn test_server_id_parse() {
        let id = ServerId::parse("1.2.3.4").unwrap();
        assert_eq!(id.as_str(), "1.2.3.4");
        assert_eq!(id.to_string(), "1.2.3.4");

        let err = ServerId::parse("bad/id").unwrap_err();
        assert!(matches!(err, CommonError::InvalidInput { .. }));
    }

    #[test]
    fn test_serde_revalidates() {
        let id: ServerId = serde_json::from_str("\"de1\"").unwrap();
        assert_eq!(id.as_str(), "de1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"de1\"");

        assert!(serde_json::from_str::<ServerId>("\"de 1\"").is_err());
    }
}
