use crate::utils::constants::{FIXED_POINT_SCALE, MAX_MEASUREMENT_TENTHS};

/// Relative tolerance used to snap a scaled value onto an integer before taking
/// the ceiling.
const SNAP_TOLERANCE: f64 = 1e-9;

/// Round `value` up to one decimal place, towards positive infinity.
///
/// This is a ceiling, not round-half-even or round-away-from-zero:
///
/// ```
/// use station_stats::utils::round_toward_positive_infinity;
///
/// assert_eq!(round_toward_positive_infinity(12.34), 12.4);
/// assert_eq!(round_toward_positive_infinity(-12.34), -12.3);
/// assert_eq!(round_toward_positive_infinity(12.30), 12.3);
/// ```
///
/// Values that are already a whole number of tenths stay unchanged even when
/// their binary representation scales to slightly above the integer
/// (`1.1 * 10.0 == 11.000000000000002`).
pub fn round_toward_positive_infinity(value: f64) -> f64 {
    let scaled = value * FIXED_POINT_SCALE;
    let nearest = scaled.round();
    let tenths = if (scaled - nearest).abs() <= SNAP_TOLERANCE * nearest.abs().max(1.0) {
        nearest
    } else {
        scaled.ceil()
    };

    // -0.0 + 0.0 == +0.0, so "-0.0" never reaches the report
    tenths / FIXED_POINT_SCALE + 0.0
}

/// Scale a parsed decimal into fixed-point tenths, rounding half away from zero.
/// `None` for non-finite values and magnitudes above [`MAX_MEASUREMENT_TENTHS`].
pub fn to_tenths(value: f64) -> Option<i64> {
    let scaled = (value * FIXED_POINT_SCALE).round();
    if scaled.is_finite() && scaled.abs() <= MAX_MEASUREMENT_TENTHS as f64 {
        Some(scaled as i64)
    } else {
        None
    }
}
