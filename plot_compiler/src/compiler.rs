//! Plot compilation.
//!
//! Streams the records of a plot, derives each tree's diameter from its stem
//! circumferences, positions every measured tree from its reference and
//! writes the augmented rows to a sink.
//!
//! Two positioning modes exist. In absolute runs the reference map holds the
//! staked grid posts and never changes; grid rows of the store carry no tree
//! data and are skipped. In relative runs the map starts with the grid origin
//! only and grows as trees are positioned, so grid posts are themselves
//! positioned from measurements. Relative references resolve against that map
//! alone: a tree can only be measured from the origin or an earlier tree.

use log::{debug, info, warn};

use crate::config::RunConfig;
use crate::error::Result;
use crate::geometry::Point;
use crate::grid::GridFrame;
use crate::io::RowSink;
use crate::record::{format_number, Field, Record, Schema};
use crate::render::{Label, PlotScene, RenderSink, TreeMarker};
use crate::resolver::{FrameParams, ReferenceMap, ResolutionStack, Resolver};
use crate::store::RecordStore;
use crate::surveying::{diameter_from_stems, polar_offset, round_diameter};

/// Offsets of the grid labels drawn beside the first and last letter lines.
const LABEL_OFFSETS: [f64; 2] = [1.5, -4.0];

/// Summary of a compilation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompileReport {
    /// Data rows written, header excluded.
    pub rows_written: usize,
    /// Trees that received coordinates.
    pub positioned: usize,
    /// Grid rows left out of an absolute run.
    pub skipped_anchors: usize,
    /// Records written unchanged because of malformed measurements.
    pub warnings: Vec<String>,
    pub scene: PlotScene,
}

/// Outcome of compiling one record.
struct Compiled {
    record: Record,
    marker: Option<TreeMarker>,
}

/// Compiles plot records according to a [`RunConfig`].
#[derive(Debug, Clone)]
pub struct PlotCompiler {
    config: RunConfig,
    grid: GridFrame,
}

impl PlotCompiler {
    pub fn new(config: RunConfig) -> Self {
        let grid = GridFrame::from_config(&config);
        Self { config, grid }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn grid(&self) -> &GridFrame {
        &self.grid
    }

    fn frame(&self) -> FrameParams {
        FrameParams {
            angle_offset: self.config.angle_offset(),
            diameter_scale: self.config.diameter_scale,
            max_chain_depth: self.config.max_chain_depth,
            follow_store: !self.config.relative,
        }
    }

    /// Compiles every record of `store` into `sink`.
    ///
    /// The header is written first, then one row per record in store order.
    /// Reference failures abort the run. Malformed measurements abort it too
    /// unless the configuration is lenient, in which case the record is
    /// written unchanged and reported in [`CompileReport::warnings`]. When
    /// `render` is given it receives the plot scene after the last row.
    pub fn compile<S, K>(
        &self,
        store: &S,
        sink: &mut K,
        render: Option<&mut dyn RenderSink>,
    ) -> Result<CompileReport>
    where
        S: RecordStore + ?Sized,
        K: RowSink + ?Sized,
    {
        let schema = store.schema();
        let anchors = self.grid.reference_map();
        let mut relative = self
            .config
            .relative
            .then(|| ReferenceMap::with_origin(self.grid.origin_label()));
        let resolver = Resolver::new(store, self.frame());
        let mut report = CompileReport::default();

        info!(
            "compiling plot (azimuth {}, {}, {})",
            self.config.plot_azimuth,
            if self.config.north_oriented { "north-oriented" } else { "plot frame" },
            if self.config.relative { "relative" } else { "absolute" },
        );
        sink.write_row(schema.columns())?;

        for record in store.records()? {
            let id = schema.id(&record).to_string();
            if relative.is_none() && self.grid.contains(&id) {
                report.skipped_anchors += 1;
                continue;
            }
            let known = relative.as_ref().unwrap_or(&anchors);
            let compiled = match self.compile_record(schema, &resolver, record.clone(), known) {
                Ok(compiled) => compiled,
                Err(err) if self.config.lenient && err.is_measurement() => {
                    warn!("record `{id}` written unchanged: {err}");
                    report.warnings.push(err.to_string());
                    Compiled {
                        record,
                        marker: None,
                    }
                }
                Err(err) => return Err(err),
            };
            if let Some(marker) = compiled.marker {
                if let Some(map) = relative.as_mut() {
                    map.insert(id.clone(), marker.point);
                    if self.grid.contains(&id) {
                        report.scene.measured_anchors.push(marker.point);
                    }
                }
                report.positioned += 1;
                report.scene.trees.push(marker);
            }
            sink.write_row(&compiled.record.cells)?;
            report.rows_written += 1;
        }

        self.annotate(&mut report.scene);
        if let Some(render) = render {
            render.render(&report.scene)?;
        }
        info!(
            "compiled {} rows, {} trees positioned, {} grid rows skipped",
            report.rows_written, report.positioned, report.skipped_anchors
        );
        Ok(report)
    }

    /// Derives the diameter and position of one record.
    fn compile_record<S: RecordStore + ?Sized>(
        &self,
        schema: &Schema,
        resolver: &Resolver<'_, S>,
        mut record: Record,
        known: &ReferenceMap,
    ) -> Result<Compiled> {
        let id = schema.id(&record).to_string();

        let stems = schema.circumferences(&record)?;
        let diameter = match diameter_from_stems(&stems) {
            Some(d) => {
                let d = round_diameter(d);
                schema.set(&mut record, Field::Diameter, format_number(d));
                d
            }
            None => {
                debug!(
                    "record `{id}`: no circumference, assuming diameter {}",
                    self.config.fallback_diameter
                );
                self.config.fallback_diameter
            }
        };

        let Some(reference) = schema.reference(&record).map(str::to_string) else {
            return Ok(Compiled {
                record,
                marker: None,
            });
        };
        let measurement = schema.measurement(&record)?;
        let base = resolver.resolve(&reference, known, &mut ResolutionStack::new(id.as_str()))?;
        let point = polar_offset(
            base,
            measurement.distance,
            measurement.azimuth,
            diameter * self.config.diameter_scale,
            self.config.angle_offset(),
        );
        debug!(
            "record `{id}` positioned at ({:.3}, {:.3}) from `{reference}`",
            point.x, point.y
        );
        schema.set(&mut record, Field::X, format_number(point.x));
        schema.set(&mut record, Field::Y, format_number(point.y));
        Ok(Compiled {
            record,
            marker: Some(TreeMarker {
                id,
                point,
                diameter,
            }),
        })
    }

    /// Adds the grid posts and their edge labels to `scene`.
    fn annotate(&self, scene: &mut PlotScene) {
        let (xs, ys) = self.grid.coordinates();
        scene.anchors = xs
            .into_iter()
            .zip(ys)
            .map(|(x, y)| Point::new(x, y))
            .collect();
        for anchor in self.grid.edge_anchors() {
            let offset = if anchor.letter == 0 {
                LABEL_OFFSETS[0]
            } else {
                LABEL_OFFSETS[1]
            };
            scene.labels.push(Label {
                text: anchor.label.clone(),
                point: self.grid.position(anchor).offset(offset, offset),
            });
        }
    }
}
