//! # Currency Code Value Object
//!
//! Validated 3-letter uppercase currency code.
//!
//! # Examples
//!
//! ```
//! use fx_rates_engine::domain::value_objects::currency_code::CurrencyCode;
//!
//! let usd = CurrencyCode::new("USD").unwrap();
//! assert_eq!(usd.as_str(), "USD");
//!
//! assert!(CurrencyCode::new("usd").is_err());
//! assert!(CurrencyCode::new("US").is_err());
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 3-letter uppercase currency code such as `USD` or `ZAR`.
///
/// # Invariants
///
/// - Exactly three characters after trimming
/// - All characters are uppercase ASCII letters
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Creates a currency code after validating its shape.
    ///
    /// Leading and trailing whitespace is trimmed before validation.
    ///
    /// # Errors
    ///
    /// - [`DomainError::CurrencyCodeLength`] if not exactly 3 characters
    /// - [`DomainError::CurrencyCodeCase`] if not all uppercase ASCII letters
    pub fn new(code: impl AsRef<str>) -> DomainResult<Self> {
        let trimmed = code.as_ref().trim();

        if trimmed.chars().count() != 3 {
            return Err(DomainError::CurrencyCodeLength {
                code: trimmed.to_string(),
            });
        }

        if !trimmed.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(DomainError::CurrencyCodeCase {
                code: trimmed.to_string(),
            });
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Returns the code as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_code() {
        let code = CurrencyCode::new("ZAR").unwrap();
        assert_eq!(code.as_str(), "ZAR");
        assert_eq!(code.to_string(), "ZAR");
    }

    #[test]
    fn trims_whitespace() {
        let code = CurrencyCode::new(" GBP ").unwrap();
        assert_eq!(code.as_str(), "GBP");
    }

    #[test]
    fn rejects_wrong_length() {
        let err = CurrencyCode::new("US").unwrap_err();
        assert!(matches!(err, DomainError::CurrencyCodeLength { .. }));
        assert!(err.to_string().contains("exactly 3 characters"));

        assert!(CurrencyCode::new("USDC").is_err());
        assert!(CurrencyCode::new("").is_err());
    }

    #[test]
    fn rejects_lowercase() {
        let err = CurrencyCode::new("usd").unwrap_err();
        assert!(matches!(err, DomainError::CurrencyCodeCase { .. }));
        assert!(err.to_string().contains("upper case"));
    }

    #[test]
    fn rejects_non_alphabetic() {
        assert!(CurrencyCode::new("U5D").is_err());
    }

    #[test]
    fn serde_round_trip() {
        let code = CurrencyCode::new("EUR").unwrap();
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "\"EUR\"");
        let back: CurrencyCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, code);
    }

    #[test]
    fn serde_rejects_invalid() {
        let result: Result<CurrencyCode, _> = serde_json::from_str("\"usd\"");
        assert!(result.is_err());
    }
}
