//! Surveying computations used to position trees.

pub mod cogo;
pub use cogo::{azimuth_to_angle, forward, polar_offset, rectified_distance};

pub mod dbh;
pub use dbh::{diameter_from_stems, round_diameter, FALLBACK_DIAMETER};
