//! Clamped linear mapping between two integer ranges.
//!
//! The same mapping converts angles to duty cycles and duty cycles back to angles. Division
//! truncates toward zero, so `map(90, 0, 180, 500_000, 2_300_000) == 1_400_000` exactly and
//! round trips settle after one quantization step.

use crate::fmt::warn;

/// How [`map_range`] arrived at its value.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MapOutcome {
    /// The input was already inside the input range.
    Exact,
    /// The input was clamped to the nearest end of the input range first.
    Clamped,
    /// `in_min == in_max`; the result is `out_min`.
    DegenerateRange,
}

/// A mapped value together with how it was produced.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Mapped {
    /// The output value.
    pub value: i64,
    /// Whether clamping or a degenerate range affected the output.
    pub outcome: MapOutcome,
}

/// Map `value` from `[in_min, in_max]` onto `[out_min, out_max]` without logging.
///
/// Either range may be given in descending order. The input is clamped to the input range
/// before the linear transform.
///
/// ```rust
/// use servo_envoy::mapping::{MapOutcome, map_range};
///
/// let mapped = map_range(200, 0, 180, 500_000, 2_300_000);
/// assert_eq!(mapped.value, 2_300_000);
/// assert_eq!(mapped.outcome, MapOutcome::Clamped);
/// ```
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    reason = "the mapped value always lies between out_min and out_max"
)]
pub const fn map_range(value: i64, in_min: i64, in_max: i64, out_min: i64, out_max: i64) -> Mapped {
    if in_min == in_max {
        return Mapped {
            value: out_min,
            outcome: MapOutcome::DegenerateRange,
        };
    }

    let (low, high) = if in_min < in_max {
        (in_min, in_max)
    } else {
        (in_max, in_min)
    };
    let (clamped, outcome) = if value < low {
        (low, MapOutcome::Clamped)
    } else if value > high {
        (high, MapOutcome::Clamped)
    } else {
        (value, MapOutcome::Exact)
    };

    // Magnitudes fit u128 even for full-width i64 ranges, and `travel <= span` keeps the
    // quotient within `|out_max - out_min|`.
    let travel = (clamped as i128 - in_min as i128).unsigned_abs();
    let span = (in_max as i128 - in_min as i128).unsigned_abs();
    let out_span = out_max as i128 - out_min as i128;
    let offset = (travel * out_span.unsigned_abs() / span) as i128;
    let offset = if out_span < 0 { -offset } else { offset };

    Mapped {
        value: (out_min as i128 + offset) as i64,
        outcome,
    }
}

/// Map `value` from `[in_min, in_max]` onto `[out_min, out_max]`.
///
/// Logs a warning when the input had to be clamped or the input range is empty; neither is an
/// error. See [`map_range`] for the arithmetic.
#[must_use]
pub fn map(value: i64, in_min: i64, in_max: i64, out_min: i64, out_max: i64) -> i64 {
    let mapped = map_range(value, in_min, in_max, out_min, out_max);
    match mapped.outcome {
        MapOutcome::Exact => {}
        MapOutcome::Clamped => warn!(
            "map: {} outside [{}, {}], clamped to {}",
            value,
            in_min,
            in_max,
            mapped.value
        ),
        MapOutcome::DegenerateRange => warn!(
            "map: empty input range [{}, {}], returning {}",
            in_min,
            in_max,
            out_min
        ),
    }
    mapped.value
}
