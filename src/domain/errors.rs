//! # Domain Errors
//!
//! Error types for domain-level validation failures.
//!
//! Every variant carries enough context to produce a distinct, checkable
//! message: callers (and the excluded API layer) match on the message text
//! when reporting validation failures to operators.

use thiserror::Error;

/// Error type for domain validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Currency code is not exactly three characters.
    #[error("currency code '{code}' must be exactly 3 characters")]
    CurrencyCodeLength {
        /// The offending code.
        code: String,
    },

    /// Currency code contains lowercase or non-alphabetic characters.
    #[error("currency code '{code}' must be upper case letters")]
    CurrencyCodeCase {
        /// The offending code.
        code: String,
    },

    /// Currency code is well-formed but unknown to the configured pairs.
    #[error("currency '{code}' does not appear in any configured pair")]
    UnknownCurrency {
        /// The offending code.
        code: String,
    },

    /// Markup outside the allowed [0, 1] range.
    #[error("markup percentage must be between 0 and 1, got {value}")]
    MarkupOutOfRange {
        /// The rejected value, rendered as text.
        value: String,
    },

    /// Base and target currency are identical.
    #[error("base and target currency cannot both be '{code}'")]
    SameCurrency {
        /// The duplicated code.
        code: String,
    },

    /// A rate value that must be strictly positive was not.
    #[error("{field} must be strictly positive, got {value}")]
    NonPositiveRate {
        /// Which rate field was rejected.
        field: &'static str,
        /// The rejected value, rendered as text.
        value: String,
    },
}

impl DomainError {
    /// Creates a markup-out-of-range error.
    #[must_use]
    pub fn markup_out_of_range(value: impl ToString) -> Self {
        Self::MarkupOutOfRange {
            value: value.to_string(),
        }
    }

    /// Creates a non-positive-rate error.
    #[must_use]
    pub fn non_positive_rate(field: &'static str, value: impl ToString) -> Self {
        Self::NonPositiveRate {
            field,
            value: value.to_string(),
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
