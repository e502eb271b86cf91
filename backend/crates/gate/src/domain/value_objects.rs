//! Domain Value Objects
//!
//! Validated immutable input types. Malformed input is rejected here,
//! before any store round trip.

use crate::error::{GateError, GateResult};

const MAX_FINGERPRINT_LEN: usize = 256;
const MAX_SITE_KEY_LEN: usize = 64;
const MAX_CODE_LEN: usize = 16;

/// Opaque client-supplied device identity string
///
/// The gate never derives this itself; it only uses it as the dedup and
/// ownership key for tasks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn parse(s: &str) -> GateResult<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(GateError::Validation("fingerprint must not be empty".into()));
        }
        if trimmed.len() > MAX_FINGERPRINT_LEN {
            return Err(GateError::Validation("fingerprint too long".into()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key a destination site identifies itself with from the widget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteKey(String);

impl SiteKey {
    pub fn parse(s: &str) -> GateResult<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(GateError::Validation("siteKey must not be empty".into()));
        }
        if trimmed.len() > MAX_SITE_KEY_LEN {
            return Err(GateError::Validation("siteKey too long".into()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A submitted verification code, normalized to uppercase
///
/// Stored codes are uppercase; normalizing here makes the comparison
/// case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationCode(String);

impl VerificationCode {
    pub fn parse(s: &str) -> GateResult<Self> {
        let normalized = s.trim().to_uppercase();
        if normalized.is_empty() {
            return Err(GateError::Validation("code must not be empty".into()));
        }
        if normalized.len() > MAX_CODE_LEN {
            return Err(GateError::Validation("code too long".into()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_trims_and_keeps() {
        let fp = Fingerprint::parse("  abc-123  ").unwrap();
        assert_eq!(fp.as_str(), "abc-123");
    }

    #[test]
    fn test_fingerprint_rejects_empty() {
        assert!(Fingerprint::parse("").is_err());
        assert!(Fingerprint::parse("   ").is_err());
    }

    #[test]
    fn test_fingerprint_rejects_oversized() {
        let long = "x".repeat(MAX_FINGERPRINT_LEN + 1);
        assert!(Fingerprint::parse(&long).is_err());
    }

    #[test]
    fn test_site_key_rejects_empty() {
        assert!(SiteKey::parse(" ").is_err());
        assert_eq!(SiteKey::parse("ab12").unwrap().as_str(), "ab12");
    }

    #[test]
    fn test_code_normalizes_uppercase() {
        let code = VerificationCode::parse(" ab3xyz ").unwrap();
        assert_eq!(code.as_str(), "AB3XYZ");
    }

    #[test]
    fn test_code_rejects_empty_and_oversized() {
        assert!(VerificationCode::parse("").is_err());
        assert!(VerificationCode::parse(&"A".repeat(MAX_CODE_LEN + 1)).is_err());
    }
}
