//! Fixed-point rendering that matches JavaScript's `Number.prototype.toFixed`.
//!
//! `{:.N}` already rounds the exact binary value, but breaks exact ties to even; `toFixed` breaks
//! them upward. An exact tie at `N` digits is a value whose product with `2^(N+1)` is an odd
//! integer, so only those need special handling.

/// `value` rendered with `digits` fractional digits, rounding half away from zero.
pub fn to_fixed(value: f64, digits: usize) -> String {
    if value.is_finite() && is_exact_midpoint(value, digits) {
        let scale = 10f64.powi(digits as i32);
        let rounded = (value * scale).round() / scale;
        return format!("{rounded:.digits$}");
    }
    format!("{value:.digits$}")
}

/// [`to_fixed`] parsed back into a float.
pub fn round_to(value: f64, digits: usize) -> f64 {
    to_fixed(value, digits).parse().unwrap_or(value)
}

fn is_exact_midpoint(value: f64, digits: usize) -> bool {
    let shifted = value * 2f64.powi(digits as i32 + 1);
    shifted.fract() == 0.0 && shifted % 2.0 != 0.0
}
