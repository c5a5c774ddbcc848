//! Core library for compiling forest-plot field measurements into tree
//! positions and diameters.

pub mod compiler;
pub mod config;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod io;
pub mod record;
pub mod render;
pub mod resolver;
pub mod store;
pub mod surveying;

pub use compiler::{CompileReport, PlotCompiler};
pub use config::RunConfig;
pub use error::{Error, Result};
