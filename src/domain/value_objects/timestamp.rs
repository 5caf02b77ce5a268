//! # Timestamp Value Object
//!
//! UTC timestamp wrapper with the small set of operations the engine needs:
//! provider-reported epochs, expiry arithmetic, and ordering.
//!
//! # Examples
//!
//! ```
//! use fx_rates_engine::domain::value_objects::timestamp::Timestamp;
//!
//! let now = Timestamp::now();
//! let expiry = now.add_hours(1);
//! assert!(expiry.is_after(&now));
//! ```

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A UTC timestamp.
///
/// Wraps `chrono::DateTime<Utc>`; always UTC, never naive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from Unix seconds, as reported by providers
    /// that timestamp their quotes with an epoch field.
    #[must_use]
    pub fn from_unix_secs(secs: i64) -> Option<Self> {
        Utc.timestamp_opt(secs, 0).single().map(Self)
    }

    /// Creates a timestamp from Unix milliseconds.
    #[must_use]
    pub fn from_unix_millis(millis: i64) -> Option<Self> {
        Utc.timestamp_millis_opt(millis).single().map(Self)
    }

    /// Returns a timestamp `hours` hours later.
    #[must_use]
    pub fn add_hours(&self, hours: i64) -> Self {
        Self(self.0 + Duration::hours(hours))
    }

    /// Returns a timestamp `secs` seconds later.
    #[must_use]
    pub fn add_secs(&self, secs: i64) -> Self {
        Self(self.0 + Duration::seconds(secs))
    }

    /// Returns true if this timestamp is strictly after `other`.
    #[inline]
    #[must_use]
    pub fn is_after(&self, other: &Self) -> bool {
        self.0 > other.0
    }

    /// Returns true if this timestamp is strictly before `other`.
    #[inline]
    #[must_use]
    pub fn is_before(&self, other: &Self) -> bool {
        self.0 < other.0
    }

    /// Returns the wrapped `DateTime<Utc>`.
    #[inline]
    #[must_use]
    pub fn inner(&self) -> DateTime<Utc> {
        self.0
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn from_unix_secs_round_trips() {
        let ts = Timestamp::from_unix_secs(1_704_067_200).unwrap();
        assert_eq!(ts.inner().timestamp(), 1_704_067_200);
    }

    #[test]
    fn from_unix_millis() {
        let ts = Timestamp::from_unix_millis(1_704_067_200_123).unwrap();
        assert_eq!(ts.inner().timestamp_millis(), 1_704_067_200_123);
    }

    #[test]
    fn add_hours_orders_correctly() {
        let now = Timestamp::now();
        let later = now.add_hours(1);
        assert!(later.is_after(&now));
        assert!(now.is_before(&later));
        assert_eq!(later.inner() - now.inner(), Duration::hours(1));
    }

    #[test]
    fn ordering() {
        let a = Timestamp::from_unix_secs(100).unwrap();
        let b = Timestamp::from_unix_secs(200).unwrap();
        assert!(a < b);
        assert!(!a.is_after(&b));
    }
}
