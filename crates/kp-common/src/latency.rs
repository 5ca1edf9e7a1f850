//! Signed nanosecond latency values.
//!
//! A latency is `received_at - sent_at`. Producer and broker clocks are not
//! synchronized, so the value is signed and never clamped at zero.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write as _;

const NANOS_PER_MICRO: u64 = 1_000;
const NANOS_PER_MILLI: u64 = 1_000_000;
const NANOS_PER_SEC: u64 = 1_000_000_000;
const NANOS_PER_MIN: u64 = 60 * NANOS_PER_SEC;
const NANOS_PER_HOUR: u64 = 60 * NANOS_PER_MIN;

/// A signed duration with nanosecond resolution.
///
/// Serializes as the integer nanosecond count. `Display` renders the compact
/// notation used in reports and tables (`1h2m3.5s`, `250ms`, `1.2µs`, `-40ms`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Latency(i64);

impl Latency {
    pub const ZERO: Latency = Latency(0);

    pub fn from_nanos(nanos: i64) -> Self {
        Latency(nanos)
    }

    pub fn from_millis(millis: i64) -> Self {
        Latency(millis.saturating_mul(NANOS_PER_MILLI as i64))
    }

    /// Latency between two instants, saturating at the `i64` nanosecond range.
    pub fn between(sent_at: DateTime<Utc>, received_at: DateTime<Utc>) -> Self {
        Self::from_time_delta(received_at.signed_duration_since(sent_at))
    }

    pub fn from_time_delta(delta: TimeDelta) -> Self {
        match delta.num_nanoseconds() {
            Some(nanos) => Latency(nanos),
            None if delta < TimeDelta::zero() => Latency(i64::MIN),
            None => Latency(i64::MAX),
        }
    }

    /// Round a floating nanosecond value to the nearest representable latency.
    pub fn from_nanos_f64(nanos: f64) -> Self {
        // `as` saturates out-of-range floats and maps NaN to 0.
        Latency(nanos.round() as i64)
    }

    pub fn as_nanos(self) -> i64 {
        self.0
    }

    pub fn as_nanos_f64(self) -> f64 {
        self.0 as f64
    }

    pub fn as_millis_f64(self) -> f64 {
        self.0 as f64 / NANOS_PER_MILLI as f64
    }

    pub fn to_time_delta(self) -> TimeDelta {
        TimeDelta::nanoseconds(self.0)
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }
}

impl From<TimeDelta> for Latency {
    fn from(delta: TimeDelta) -> Self {
        Self::from_time_delta(delta)
    }
}

impl fmt::Display for Latency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.0.unsigned_abs();
        if magnitude == 0 {
            return f.write_str("0s");
        }

        let mut out = String::with_capacity(24);
        if self.0 < 0 {
            out.push('-');
        }

        if magnitude < NANOS_PER_SEC {
            let (unit, scale) = if magnitude < NANOS_PER_MICRO {
                ("ns", 1)
            } else if magnitude < NANOS_PER_MILLI {
                ("µs", NANOS_PER_MICRO)
            } else {
                ("ms", NANOS_PER_MILLI)
            };
            push_scaled(&mut out, magnitude, scale);
            out.push_str(unit);
            return f.write_str(&out);
        }

        let hours = magnitude / NANOS_PER_HOUR;
        let minutes = (magnitude % NANOS_PER_HOUR) / NANOS_PER_MIN;
        let seconds = magnitude % NANOS_PER_MIN;
        if hours > 0 {
            let _ = write!(out, "{hours}h");
        }
        if hours > 0 || minutes > 0 {
            let _ = write!(out, "{minutes}m");
        }
        push_scaled(&mut out, seconds, NANOS_PER_SEC);
        out.push('s');
        f.write_str(&out)
    }
}

/// Append `value / scale` with the fractional part trimmed of trailing zeros.
fn push_scaled(out: &mut String, value: u64, scale: u64) {
    let whole = value / scale;
    let frac = value % scale;
    let _ = write!(out, "{whole}");
    if frac == 0 {
        return;
    }
    let width = scale.ilog10() as usize;
    let digits = format!("{frac:0width$}");
    out.push('.');
    out.push_str(digits.trim_end_matches('0'));
}
