//! Resolution of reference labels into coordinates.
//!
//! A tree is measured from a reference: a grid post or another tree. When the
//! reference is a tree that has not been positioned yet, its own reference is
//! resolved first, and so on until the chain reaches a known anchor. Chains
//! run over stored records, so they are guarded against cycles and bounded in
//! length.

use std::collections::HashMap;

use log::trace;

use crate::error::{Error, Result};
use crate::geometry::Point;
use crate::record::{Field, Schema};
use crate::store::RecordStore;
use crate::surveying::polar_offset;

/// Known label → coordinate pairs.
///
/// In absolute runs this holds the grid posts and never changes. In relative
/// runs it starts with the grid origin and the compiler inserts every tree it
/// positions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceMap {
    points: HashMap<String, Point>,
}

impl ReferenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// A map holding only `label` at the origin.
    pub fn with_origin(label: impl Into<String>) -> Self {
        let mut map = Self::new();
        map.insert(label, Point::new(0.0, 0.0));
        map
    }

    pub fn insert(&mut self, label: impl Into<String>, point: Point) {
        self.points.insert(label.into(), point);
    }

    pub fn get(&self, label: &str) -> Option<Point> {
        self.points.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Identifiers currently being resolved, outermost first.
#[derive(Debug, Clone, Default)]
pub struct ResolutionStack {
    ids: Vec<String>,
}

impl ResolutionStack {
    /// Starts a resolution on behalf of record `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            ids: vec![id.into()],
        }
    }

    /// Pushes `label`, failing if it is already being resolved or if the
    /// chain would grow past `limit` links.
    fn enter(&mut self, label: &str, limit: usize) -> Result<()> {
        if let Some(start) = self.ids.iter().position(|id| id == label) {
            let mut chain = self.ids[start..].to_vec();
            chain.push(label.to_string());
            return Err(Error::CyclicReference { chain });
        }
        if self.ids.len() > limit {
            return Err(Error::ChainTooDeep {
                label: label.to_string(),
                limit,
            });
        }
        self.ids.push(label.to_string());
        Ok(())
    }

    fn leave(&mut self) {
        self.ids.pop();
    }

    /// Record whose reference is being resolved.
    fn current(&self) -> &str {
        self.ids.last().map(String::as_str).unwrap_or("")
    }

    pub fn depth(&self) -> usize {
        self.ids.len()
    }
}

/// Frame and unit settings shared by every resolution of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameParams {
    /// Azimuth offset, see [`azimuth_to_angle`](crate::surveying::azimuth_to_angle).
    pub angle_offset: f64,
    /// Factor converting recorded diameters into distance units.
    pub diameter_scale: f64,
    pub max_chain_depth: usize,
    /// Follow unknown labels through the record store. When unset, only
    /// labels already in the reference map resolve.
    pub follow_store: bool,
}

/// Resolves reference labels against a set of known anchors, optionally
/// falling back to the record store for trees not positioned yet.
pub struct Resolver<'a, S: RecordStore + ?Sized> {
    store: &'a S,
    frame: FrameParams,
}

impl<'a, S: RecordStore + ?Sized> Resolver<'a, S> {
    pub fn new(store: &'a S, frame: FrameParams) -> Self {
        Self { store, frame }
    }

    /// Coordinate of `label`.
    ///
    /// Labels in `known` resolve directly. Any other label must be the id of
    /// a stored record that has a reference of its own; that reference is
    /// resolved recursively and the record's measurement applied to it. The
    /// chained record's trunk correction uses its recorded diameter, or zero
    /// when none is recorded.
    ///
    /// Without [`FrameParams::follow_store`] no chain is followed: a stored
    /// record missing from `known` fails with
    /// [`Error::UnpositionedReference`].
    pub fn resolve(
        &self,
        label: &str,
        known: &ReferenceMap,
        stack: &mut ResolutionStack,
    ) -> Result<Point> {
        if let Some(point) = known.get(label) {
            return Ok(point);
        }
        let referenced_by = stack.current().to_string();
        if !self.frame.follow_store {
            return Err(match self.store.record(label)? {
                Some(_) => Error::UnpositionedReference {
                    id: label.to_string(),
                },
                None => Error::MissingReference {
                    label: label.to_string(),
                    referenced_by,
                },
            });
        }
        stack.enter(label, self.frame.max_chain_depth)?;
        let point = self.resolve_record(label, referenced_by, known, stack);
        stack.leave();
        point
    }

    fn resolve_record(
        &self,
        label: &str,
        referenced_by: String,
        known: &ReferenceMap,
        stack: &mut ResolutionStack,
    ) -> Result<Point> {
        let schema: &Schema = self.store.schema();
        let record = self.store.record(label)?.ok_or_else(|| Error::MissingReference {
            label: label.to_string(),
            referenced_by,
        })?;
        let reference = schema
            .reference(&record)
            .ok_or_else(|| Error::UnpositionedReference {
                id: label.to_string(),
            })?;
        let measurement = schema.measurement(&record)?;
        let diameter = schema.number(&record, Field::Diameter)?.unwrap_or(0.0);
        trace!("resolving `{label}` through `{reference}` (depth {})", stack.depth());
        let base = self.resolve(reference, known, stack)?;
        Ok(polar_offset(
            base,
            measurement.distance,
            measurement.azimuth,
            diameter * self.frame.diameter_scale,
            self.frame.angle_offset,
        ))
    }
}
