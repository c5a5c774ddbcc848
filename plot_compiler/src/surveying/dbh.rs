//! Diameter at breast height (DBH) from stem circumferences.

use std::f64::consts::PI;

/// Diameter assumed for trees without recorded circumferences.
///
/// This is an approximation: positions of such trees carry a trunk-radius
/// correction based on this value rather than on a measurement.
pub const FALLBACK_DIAMETER: f64 = 15.0;

/// Returns the diameter of a single circle whose area equals the summed
/// cross-section of all stems.
///
/// Returns `None` when no stems are given.
pub fn diameter_from_stems(circumferences: &[f64]) -> Option<f64> {
    if circumferences.is_empty() {
        return None;
    }
    let total_area: f64 = circumferences
        .iter()
        .map(|c| {
            let r = c / (2.0 * PI);
            PI * r * r
        })
        .sum();
    Some(2.0 * (total_area / PI).sqrt())
}

/// Rounds a diameter to one decimal place, as recorded on field sheets.
pub fn round_diameter(diameter: f64) -> f64 {
    (diameter * 10.0).round() / 10.0
}
