//! Exact running totals over integer samples.
//!
//! Latency means must be exact, so samples are summed in `i128` rather than
//! accumulated as floats. A sum of `i64` values cannot overflow `i128` before
//! 2^64 samples.

/// Count, sum, and extrema of a stream of `i64` samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunningTotal {
    count: u64,
    sum: i128,
    min: Option<i64>,
    max: Option<i64>,
}

impl RunningTotal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: i64) {
        self.count += 1;
        self.sum += i128::from(value);
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    /// Fold another total into this one.
    pub fn merge(&mut self, other: &RunningTotal) {
        self.count += other.count;
        self.sum += other.sum;
        self.min = match (self.min, other.min) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.max = match (self.max, other.max) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sum(&self) -> i128 {
        self.sum
    }

    pub fn min(&self) -> Option<i64> {
        self.min
    }

    pub fn max(&self) -> Option<i64> {
        self.max
    }

    /// Arithmetic mean rounded half away from zero, or `None` with no samples.
    pub fn mean(&self) -> Option<i64> {
        if self.count == 0 {
            return None;
        }
        let mean = div_round_half_away(self.sum, i128::from(self.count));
        // The mean lies within [min, max], so it always fits.
        Some(mean as i64)
    }
}

/// Integer division rounding half away from zero. `divisor` must be positive.
fn div_round_half_away(dividend: i128, divisor: i128) -> i128 {
    let quotient = dividend / divisor;
    let remainder = dividend % divisor;
    if 2 * remainder.abs() >= divisor {
        quotient + dividend.signum()
    } else {
        quotient
    }
}
