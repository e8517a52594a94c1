//! UTC timestamps for session bookkeeping and rate limit windows.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A point in time, serialized as RFC 3339.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Window boundaries are stored as epoch seconds; out-of-range values clamp to now.
    pub fn from_unix_secs(secs: u64) -> Self {
        let secs = i64::try_from(secs).unwrap_or(i64::MAX);
        Self(Utc.timestamp_opt(secs, 0).single().unwrap_or_else(Utc::now))
    }

    /// Epoch seconds, zero for instants before 1970.
    pub fn as_unix_secs(&self) -> u64 {
        u64::try_from(self.0.timestamp()).unwrap_or(0)
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}
