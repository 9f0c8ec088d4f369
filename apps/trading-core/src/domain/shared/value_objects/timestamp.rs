//! Nanosecond timestamp value object.

use std::fmt;
use std::ops::{Add, AddAssign, Sub};

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::shared::DomainError;

/// Nanoseconds elapsed since the Unix epoch.
///
/// The core timeline: every event, tick, and bar carries one of these, and
/// the engine feeds inputs in non-decreasing `UnixNanos` order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UnixNanos(u64);

/// Nanoseconds per second.
pub const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Nanoseconds per minute.
pub const NANOS_PER_MIN: u64 = 60 * NANOS_PER_SEC;

/// Nanoseconds per hour.
pub const NANOS_PER_HOUR: u64 = 60 * NANOS_PER_MIN;

/// Nanoseconds per day.
pub const NANOS_PER_DAY: u64 = 24 * NANOS_PER_HOUR;

impl UnixNanos {
    /// Create a timestamp from raw nanoseconds.
    #[must_use]
    pub const fn new(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Get the raw nanosecond value.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Convert to a `DateTime<Utc>`.
    ///
    /// # Panics
    ///
    /// Panics if the value exceeds the chrono-representable range (year
    /// 2262), which no live timestamp does.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn to_datetime(&self) -> DateTime<Utc> {
        Utc.timestamp_nanos(self.0 as i64)
    }

    /// Create from a `DateTime<Utc>`.
    ///
    /// # Errors
    ///
    /// Returns error for datetimes before the epoch or beyond the
    /// nanosecond-representable range.
    pub fn from_datetime(dt: DateTime<Utc>) -> Result<Self, DomainError> {
        let nanos = dt
            .timestamp_nanos_opt()
            .ok_or_else(|| DomainError::InvalidValue {
                field: "timestamp".to_string(),
                message: format!("datetime {dt} outside nanosecond range"),
            })?;
        let nanos = u64::try_from(nanos).map_err(|_| DomainError::InvalidValue {
            field: "timestamp".to_string(),
            message: format!("datetime {dt} precedes the Unix epoch"),
        })?;
        Ok(Self(nanos))
    }

    /// Parse from an RFC 3339 string.
    ///
    /// # Errors
    ///
    /// Returns error if the string is not a valid RFC 3339 timestamp.
    pub fn parse_rfc3339(s: &str) -> Result<Self, DomainError> {
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| DomainError::InvalidValue {
            field: "timestamp".to_string(),
            message: e.to_string(),
        })?;
        Self::from_datetime(dt.with_timezone(&Utc))
    }

    /// Format as an RFC 3339 string.
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        self.to_datetime().to_rfc3339()
    }

    /// Nanoseconds elapsed since an earlier timestamp (saturating).
    #[must_use]
    pub const fn duration_since(&self, earlier: Self) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for UnixNanos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for UnixNanos {
    fn from(nanos: u64) -> Self {
        Self(nanos)
    }
}

impl From<UnixNanos> for u64 {
    fn from(ts: UnixNanos) -> Self {
        ts.0
    }
}

impl Add<u64> for UnixNanos {
    type Output = Self;

    fn add(self, rhs: u64) -> Self::Output {
        Self(self.0 + rhs)
    }
}

impl AddAssign<u64> for UnixNanos {
    fn add_assign(&mut self, rhs: u64) {
        self.0 += rhs;
    }
}

impl Sub for UnixNanos {
    type Output = u64;

    fn sub(self, rhs: Self) -> Self::Output {
        self.0.saturating_sub(rhs.0)
    }
}
