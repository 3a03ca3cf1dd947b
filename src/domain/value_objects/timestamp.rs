//! # Timestamp Value Object
//!
//! UTC point in time used to tag rate tables and computed records.
//!
//! Besides the usual constructors, [`Timestamp::bucket`] maps a timestamp
//! to the retrieval window within which one FX rate table is shared.
//!
//! # Examples
//!
//! ```
//! use portfolio_derivations::domain::value_objects::timestamp::Timestamp;
//!
//! let ts = Timestamp::from_secs(1_700_000_123).unwrap();
//! assert_eq!(ts.bucket(300), 1_700_000_123 / 300);
//! assert!(ts.add_secs(60).is_after(&ts));
//! ```

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A UTC timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from Unix milliseconds.
    ///
    /// # Returns
    ///
    /// `Some(Timestamp)` if the value is valid, `None` otherwise.
    #[must_use]
    pub fn from_millis(millis: i64) -> Option<Self> {
        Utc.timestamp_millis_opt(millis).single().map(Self)
    }

    /// Creates a timestamp from Unix seconds.
    ///
    /// # Returns
    ///
    /// `Some(Timestamp)` if the value is valid, `None` otherwise.
    #[must_use]
    pub fn from_secs(secs: i64) -> Option<Self> {
        Utc.timestamp_opt(secs, 0).single().map(Self)
    }

    /// Returns the Unix timestamp in seconds.
    #[inline]
    #[must_use]
    pub fn timestamp_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Returns the Unix timestamp in milliseconds.
    #[inline]
    #[must_use]
    pub fn timestamp_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// Index of the `bucket_secs`-wide window containing this timestamp.
    ///
    /// A zero width is treated as one second.
    #[must_use]
    pub fn bucket(&self, bucket_secs: u64) -> i64 {
        let width = i64::try_from(bucket_secs.max(1)).unwrap_or(i64::MAX);
        self.timestamp_secs().div_euclid(width)
    }

    /// Returns a new timestamp `secs` seconds later.
    #[must_use]
    pub fn add_secs(&self, secs: i64) -> Self {
        Self(self.0 + Duration::seconds(secs))
    }

    /// Returns true if this timestamp is before `other`.
    #[inline]
    #[must_use]
    pub fn is_before(&self, other: &Self) -> bool {
        self.0 < other.0
    }

    /// Returns true if this timestamp is after `other`.
    #[inline]
    #[must_use]
    pub fn is_after(&self, other: &Self) -> bool {
        self.0 > other.0
    }

    /// Calendar date in UTC.
    #[inline]
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.0.date_naive()
    }

    /// Returns the timestamp as an RFC 3339 string.
    #[must_use]
    pub fn to_iso8601(&self) -> String {
        self.0.to_rfc3339()
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}
