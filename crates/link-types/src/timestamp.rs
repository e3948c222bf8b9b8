use std::fmt;
use std::time::Duration;

use chrono::{offset::Utc, DateTime, TimeZone};
use serde_derive::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A block or packet timestamp with nanosecond precision.
///
/// The protocol represents timestamps as u64 Unix nanoseconds, with 0
/// standing for "not set"; the domain type keeps that case explicit as
/// `None` instead of conflating it with the epoch.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    time: Option<DateTime<Utc>>,
}

impl Timestamp {
    /// Converts a raw u64 nanosecond count into a timestamp, mapping the
    /// protocol's 0 to the unset timestamp.
    ///
    /// The conversion goes through a seconds + subsecond-nanos split
    /// because the underlying library only constructs datetimes from
    /// signed values.
    pub fn from_nanoseconds(nanoseconds: u64) -> Result<Timestamp, ValidationError> {
        if nanoseconds == 0 {
            return Ok(Timestamp { time: None });
        }

        let secs = (nanoseconds / 1_000_000_000) as i64;
        let nanos = (nanoseconds % 1_000_000_000) as u32;

        match Utc.timestamp_opt(secs, nanos) {
            chrono::LocalResult::Single(time) => Ok(Timestamp { time: Some(time) }),
            _ => Err(ValidationError::invalid_timestamp(nanoseconds)),
        }
    }

    /// A timestamp from whole Unix seconds; values beyond the
    /// representable range map to the unset timestamp.
    pub fn from_seconds(seconds: i64) -> Timestamp {
        Timestamp {
            time: Utc.timestamp_opt(seconds, 0).single(),
        }
    }

    pub fn now() -> Timestamp {
        Timestamp {
            time: Some(Utc::now()),
        }
    }

    /// The unset timestamp, protocol value 0.
    pub fn none() -> Timestamp {
        Timestamp { time: None }
    }

    pub fn is_set(&self) -> bool {
        self.time.is_some()
    }

    /// The raw protocol representation: Unix nanoseconds, 0 when unset.
    pub fn as_nanoseconds(&self) -> u64 {
        self.time
            .map_or(0, |t| t.timestamp_nanos_opt().unwrap_or(0) as u64)
    }

    /// The duration elapsed from `earlier` to `self`, or `None` when
    /// either timestamp is unset or `self` precedes `earlier`.
    pub fn duration_since(&self, earlier: &Timestamp) -> Option<Duration> {
        match (self.time, earlier.time) {
            (Some(after), Some(before)) => (after - before).to_std().ok(),
            _ => None,
        }
    }

    /// The timestamp `duration` later than `self`; unset stays unset.
    pub fn add(&self, duration: Duration) -> Timestamp {
        Timestamp {
            time: self
                .time
                .and_then(|t| chrono::Duration::from_std(duration).ok().map(|d| t + d)),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.time {
            Some(time) => write!(f, "{}", time.to_rfc3339()),
            None => write!(f, "Timestamp(unset)"),
        }
    }
}
