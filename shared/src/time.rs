//! Message header: the timestamp + precision pair every wire message carries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Precision of the `time` field carried in a [`Header`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimePrecision {
    #[serde(rename = "ns")]
    Nanoseconds,
    #[serde(rename = "us")]
    Microseconds,
    #[serde(rename = "ms")]
    Milliseconds,
    #[serde(rename = "s")]
    Seconds,
}

impl Default for TimePrecision {
    fn default() -> Self {
        TimePrecision::Nanoseconds
    }
}

impl fmt::Display for TimePrecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimePrecision::Nanoseconds => "ns",
            TimePrecision::Microseconds => "us",
            TimePrecision::Milliseconds => "ms",
            TimePrecision::Seconds => "s",
        };
        write!(f, "{s}")
    }
}

/// Header every envelope-style message carries: the instant it was produced,
/// in the stated precision.
///
/// Field names are capitalized to match the wire format of the orchestrator
/// protocol (`{Header: {Time, TimePrecision}, Body: {...}}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    #[serde(rename = "Time")]
    pub time: i64,
    #[serde(rename = "TimePrecision")]
    pub time_precision: TimePrecision,
}

impl Header {
    /// Build a header capturing the current instant, in nanosecond precision.
    pub fn now() -> Self {
        Self::at(now_nanos(), TimePrecision::Nanoseconds)
    }

    /// Build a header for an explicit instant and precision, mainly useful
    /// for deterministic tests.
    pub fn at(time: i64, time_precision: TimePrecision) -> Self {
        Self { time, time_precision }
    }
}

fn now_nanos() -> i64 {
    chrono::Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_else(|| chrono::Utc::now().timestamp_millis() * 1_000_000)
}
