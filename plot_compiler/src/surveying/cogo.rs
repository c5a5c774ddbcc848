//! Coordinate geometry (COGO) for polar measurements taken with a laser
//! rangefinder.

use crate::geometry::Point;

/// Converts a compass azimuth in degrees (clockwise from north) into a
/// trigonometric angle in radians.
///
/// `offset` is the plot azimuth when working in the plot-local frame and zero
/// in the north-oriented frame. The angle is normalised to `[-180°, 180°)`
/// before conversion.
pub fn azimuth_to_angle(azimuth: f64, offset: f64) -> f64 {
    let h = (450.0 - azimuth + offset).rem_euclid(360.0);
    if h < 180.0 {
        h.to_radians()
    } else {
        (h - 360.0).to_radians()
    }
}

/// Computes a new point from a starting point, a bearing (radians from the
/// positive X axis) and a distance.
pub fn forward(start: Point, bearing: f64, distance: f64) -> Point {
    Point::new(
        start.x + distance * bearing.cos(),
        start.y + distance * bearing.sin(),
    )
}

/// Distance from the reference to the trunk centre.
///
/// The rangefinder hits the trunk surface, so half the diameter is added.
pub fn rectified_distance(distance: f64, diameter: f64) -> f64 {
    distance + 0.5 * diameter
}

/// Position of a tree measured from `reference` at `distance` and `azimuth`.
///
/// `diameter` must be expressed in the same unit as `distance`.
pub fn polar_offset(
    reference: Point,
    distance: f64,
    azimuth: f64,
    diameter: f64,
    offset: f64,
) -> Point {
    let phi = azimuth_to_angle(azimuth, offset);
    forward(reference, phi, rectified_distance(distance, diameter))
}
