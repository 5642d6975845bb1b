/*!
Miscellaneous utilities for `vixburn`
*/

use chrono::Duration;
use num::{Float, NumCast};
use std::ops::Neg;

/// Convert a `chrono::Duration` to a floating point containing the number of nanoseconds
pub fn to_ns<F: Float>(dur: Duration) -> F {
    NumCast::from(dur.num_nanoseconds().unwrap_or(i64::MAX)).unwrap_or_else(F::max_value)
}

/// Convert a `chrono::Duration` to a floating point containing the number of seconds
pub fn to_s<F: Float>(dur: Duration) -> F {
    let ns_in_sec: F = NumCast::from(1_000_000_000).unwrap_or_else(F::max_value);
    let dur_ns: F = to_ns(dur);
    dur_ns / ns_in_sec
}

/// Clip a value within an absolute value range
#[inline]
pub fn clip<F: Copy + PartialOrd + Neg<Output = F>>(value: F, range: F) -> F {
    if value > range {
        range
    } else if value < -range {
        -range
    } else {
        value
    }
}
