//! Plot reference grid.
//!
//! A plot is staked out as an 11×11 grid of reference posts spaced 10 units
//! apart. Each post is labelled by a letter (`A`..`K`) and a number
//! (`0`..`10`). The grid is defined in the plot-local frame, whose axes follow
//! the plot layout, and can be expressed in a north-oriented frame sharing
//! the same origin.

use std::collections::HashSet;

use crate::config::RunConfig;
use crate::geometry::Point;
use crate::resolver::ReferenceMap;

/// Letters labelling one grid axis.
pub const LETTERS: [char; 11] = ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K'];

/// Number of posts along each grid axis.
pub const GRID_SIZE: usize = 11;

/// Distance between neighbouring posts.
pub const GRID_SPACING: f64 = 10.0;

/// Label and axis conventions of a plot grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridLayout {
    /// Letters run along the X axis instead of numbers.
    pub letters_abscissa: bool,
    /// Labels are written number first (`0A`) instead of letter first (`A0`).
    pub number_first_labels: bool,
}

impl GridLayout {
    /// Composes the label of the post at `letter` and `number` indices.
    pub fn label(&self, letter: usize, number: usize) -> String {
        if self.number_first_labels {
            format!("{}{}", number, LETTERS[letter])
        } else {
            format!("{}{}", LETTERS[letter], number)
        }
    }

    /// Maps axis indices `(abscissa, ordinate)` to `(letter, number)` indices.
    fn letter_number(&self, i: usize, j: usize) -> (usize, usize) {
        if self.letters_abscissa {
            (i, j)
        } else {
            (j, i)
        }
    }
}

/// A single reference post.
#[derive(Debug, Clone, PartialEq)]
pub struct GridAnchor {
    pub label: String,
    /// Index into [`LETTERS`].
    pub letter: usize,
    pub number: usize,
    /// Coordinate in the plot-local frame.
    pub local: Point,
    /// Coordinate in the north-oriented frame.
    pub north: Point,
}

/// Reference posts of a plot, expressed in one frame for the whole run.
#[derive(Debug, Clone)]
pub struct GridFrame {
    anchors: Vec<GridAnchor>,
    labels: HashSet<String>,
    layout: GridLayout,
    north_oriented: bool,
}

impl GridFrame {
    /// Builds the grid for a plot whose local X axis is rotated by
    /// `plot_azimuth` degrees from north.
    pub fn new(plot_azimuth: f64, north_oriented: bool, layout: GridLayout) -> Self {
        let theta = (360.0 - plot_azimuth).rem_euclid(360.0).to_radians();
        let mut anchors = Vec::with_capacity(GRID_SIZE * GRID_SIZE);
        for i in 0..GRID_SIZE {
            for j in 0..GRID_SIZE {
                let (letter, number) = layout.letter_number(i, j);
                let local = Point::new(i as f64 * GRID_SPACING, j as f64 * GRID_SPACING);
                anchors.push(GridAnchor {
                    label: layout.label(letter, number),
                    letter,
                    number,
                    local,
                    north: local.rotated(theta),
                });
            }
        }
        let labels = anchors.iter().map(|a| a.label.clone()).collect();
        Self {
            anchors,
            labels,
            layout,
            north_oriented,
        }
    }

    /// Builds the grid described by a run configuration.
    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(config.plot_azimuth, config.north_oriented, config.grid_layout())
    }

    /// All posts, ordered with the ordinate axis varying fastest.
    pub fn anchors(&self) -> &[GridAnchor] {
        &self.anchors
    }

    /// Coordinate of an anchor in the frame selected for this run.
    pub fn position(&self, anchor: &GridAnchor) -> Point {
        if self.north_oriented {
            anchor.north
        } else {
            anchor.local
        }
    }

    /// Returns `true` if `label` names a grid post.
    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    /// Label of the post at the shared origin.
    pub fn origin_label(&self) -> String {
        self.layout.label(0, 0)
    }

    /// Label → coordinate map in the selected frame.
    pub fn reference_map(&self) -> ReferenceMap {
        let mut map = ReferenceMap::new();
        for anchor in &self.anchors {
            map.insert(anchor.label.clone(), self.position(anchor));
        }
        map
    }

    /// Parallel X and Y coordinate lists in the selected frame.
    pub fn coordinates(&self) -> (Vec<f64>, Vec<f64>) {
        self.anchors
            .iter()
            .map(|a| {
                let p = self.position(a);
                (p.x, p.y)
            })
            .unzip()
    }

    /// Posts on the first and last letter line for every number, used to
    /// annotate the two grid extremes.
    pub fn edge_anchors(&self) -> impl Iterator<Item = &GridAnchor> {
        self.anchors
            .iter()
            .filter(|a| a.letter == 0 || a.letter == GRID_SIZE - 1)
    }
}

/// Labels in the order posts are walked in the field: letters in pairs,
/// numbers ascending for the first pair, descending for the next, and so on.
pub fn serpentine_labels(layout: GridLayout) -> Vec<String> {
    let mut labels = Vec::with_capacity(GRID_SIZE * GRID_SIZE);
    for letter in 0..GRID_SIZE {
        let ascending = (letter / 2) % 2 == 0;
        for k in 0..GRID_SIZE {
            let number = if ascending { k } else { GRID_SIZE - 1 - k };
            labels.push(layout.label(letter, number));
        }
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_puts_numbers_on_x() {
        let grid = GridFrame::new(0.0, false, GridLayout::default());
        let map = grid.reference_map();
        assert_eq!(map.get("A0"), Some(Point::new(0.0, 0.0)));
        assert_eq!(map.get("A3"), Some(Point::new(30.0, 0.0)));
        assert_eq!(map.get("C0"), Some(Point::new(0.0, 20.0)));
        assert_eq!(map.get("K10"), Some(Point::new(100.0, 100.0)));
        assert_eq!(map.len(), 121);
    }

    #[test]
    fn letters_abscissa_swaps_axes() {
        let layout = GridLayout {
            letters_abscissa: true,
            number_first_labels: false,
        };
        let map = GridFrame::new(0.0, false, layout).reference_map();
        assert_eq!(map.get("C0"), Some(Point::new(20.0, 0.0)));
        assert_eq!(map.get("A3"), Some(Point::new(0.0, 30.0)));
    }

    #[test]
    fn number_first_labels() {
        let layout = GridLayout {
            letters_abscissa: false,
            number_first_labels: true,
        };
        let grid = GridFrame::new(0.0, false, layout);
        assert!(grid.contains("3B"));
        assert!(!grid.contains("B3"));
        assert_eq!(grid.origin_label(), "0A");
    }

    #[test]
    fn north_frame_rotates_by_plot_azimuth() {
        let grid = GridFrame::new(90.0, true, GridLayout::default());
        // theta = 270 degrees: local (10, 0) lands on (0, -10).
        let p = grid.reference_map().get("A1").unwrap();
        assert!(p.x.abs() < 1e-9);
        assert!((p.y + 10.0).abs() < 1e-9);
    }

    #[test]
    fn coordinates_follow_selected_frame() {
        let grid = GridFrame::new(30.0, false, GridLayout::default());
        let (xs, ys) = grid.coordinates();
        assert_eq!(xs.len(), 121);
        assert_eq!(ys.len(), 121);
        assert!(xs.iter().chain(ys.iter()).all(|v| v.fract() == 0.0));
    }

    #[test]
    fn edge_anchors_cover_both_extremes() {
        let grid = GridFrame::new(0.0, false, GridLayout::default());
        let edges: Vec<_> = grid.edge_anchors().map(|a| a.label.as_str()).collect();
        assert_eq!(edges.len(), 22);
        assert!(edges.contains(&"A10"));
        assert!(edges.contains(&"K0"));
    }

    #[test]
    fn serpentine_walk() {
        let labels = serpentine_labels(GridLayout::default());
        assert_eq!(labels.len(), 121);
        assert_eq!(labels[0], "A0");
        assert_eq!(labels[10], "A10");
        assert_eq!(labels[11], "B0");
        assert_eq!(labels[22], "C10");
        assert_eq!(labels[44], "E0");
    }
}
