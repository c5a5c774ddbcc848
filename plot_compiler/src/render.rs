//! Plot snapshots rendered as SVG scatter charts.
//!
//! The chart is not meant for print. It gives a quick visual check of the
//! positioned trees against the grid posts.

use std::fmt::Write as _;
use std::path::PathBuf;

use crate::error::Result;
use crate::geometry::{bbox, Point};

/// A positioned tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeMarker {
    pub id: String,
    pub point: Point,
    pub diameter: f64,
}

/// A text annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    pub point: Point,
}

/// Everything drawn for one compiled plot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlotScene {
    pub trees: Vec<TreeMarker>,
    /// Grid posts in the frame of the run.
    pub anchors: Vec<Point>,
    /// Grid posts positioned from measurements in relative runs.
    pub measured_anchors: Vec<Point>,
    pub labels: Vec<Label>,
}

impl PlotScene {
    fn extent(&self) -> Option<(f64, f64, f64, f64)> {
        let pts: Vec<Point> = self
            .trees
            .iter()
            .map(|t| t.point)
            .chain(self.anchors.iter().copied())
            .chain(self.measured_anchors.iter().copied())
            .chain(self.labels.iter().map(|l| l.point))
            .collect();
        bbox(&pts)
    }
}

/// Consumer of compiled plot scenes.
pub trait RenderSink {
    fn render(&mut self, scene: &PlotScene) -> Result<()>;
}

/// Writes scenes as SVG files.
#[derive(Debug, Clone)]
pub struct SvgRenderer {
    path: PathBuf,
    /// Pixels per plot unit.
    pub scale: f64,
    pub margin: f64,
}

impl SvgRenderer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            scale: 8.0,
            margin: 40.0,
        }
    }

    /// Renders `scene` into an SVG document.
    pub fn to_svg(&self, scene: &PlotScene) -> String {
        let (min_x, min_y, max_x, max_y) = scene.extent().unwrap_or((0.0, 0.0, 0.0, 0.0));
        let width = (max_x - min_x) * self.scale + 2.0 * self.margin;
        let height = (max_y - min_y) * self.scale + 2.0 * self.margin;
        // SVG grows downwards, plot Y grows upwards.
        let px = |p: Point| {
            (
                (p.x - min_x) * self.scale + self.margin,
                (max_y - p.y) * self.scale + self.margin,
            )
        };

        let mut svg = String::new();
        let _ = writeln!(
            svg,
            "<svg xmlns='http://www.w3.org/2000/svg' width='{width:.0}' height='{height:.0}'>"
        );
        let _ = writeln!(svg, "<rect width='100%' height='100%' fill='white' />");
        for tree in &scene.trees {
            let (x, y) = px(tree.point);
            // Marker area follows the diameter.
            let r = tree.diameter.max(0.0).sqrt().max(1.0);
            let _ = writeln!(
                svg,
                "<circle cx='{x:.2}' cy='{y:.2}' r='{r:.2}' fill='steelblue' \
                 fill-opacity='0.4'><title>{}</title></circle>",
                escape(&tree.id)
            );
        }
        for p in &scene.measured_anchors {
            let (x, y) = px(*p);
            let _ = writeln!(svg, "<circle cx='{x:.2}' cy='{y:.2}' r='4' fill='gold' />");
        }
        for p in &scene.anchors {
            let (x, y) = px(*p);
            let _ = writeln!(svg, "<circle cx='{x:.2}' cy='{y:.2}' r='2.5' fill='red' />");
        }
        for label in &scene.labels {
            let (x, y) = px(label.point);
            let _ = writeln!(
                svg,
                "<text x='{x:.2}' y='{y:.2}' font-size='12' fill='green'>{}</text>",
                escape(&label.text)
            );
        }
        svg.push_str("</svg>\n");
        svg
    }
}

impl RenderSink for SvgRenderer {
    fn render(&mut self, scene: &PlotScene) -> Result<()> {
        std::fs::write(&self.path, self.to_svg(scene))?;
        Ok(())
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\'', "&apos;")
}
