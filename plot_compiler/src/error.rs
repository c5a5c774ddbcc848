//! Error types for plot compilation.

use std::io;
use thiserror::Error;

/// Result type for plot compilation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while reading, resolving or writing plot records.
#[derive(Error, Debug)]
pub enum Error {
    /// A reference names neither a known anchor nor a stored record.
    #[error("reference `{label}` used by `{referenced_by}` is neither an anchor nor a record id")]
    MissingReference { label: String, referenced_by: String },

    /// The referenced record exists but was never positioned itself.
    #[error("record `{id}` is used as a reference but has no reference of its own")]
    UnpositionedReference { id: String },

    /// A reference chain came back to a record already being resolved.
    #[error("cyclic reference chain: {}", chain.join(" -> "))]
    CyclicReference { chain: Vec<String> },

    /// A reference chain is longer than the configured limit.
    #[error("reference chain through `{label}` exceeds {limit} links")]
    ChainTooDeep { label: String, limit: usize },

    /// A measurement field could not be parsed as a number.
    #[error("record `{id}`: malformed {field} value `{value}`")]
    MalformedMeasurement {
        id: String,
        field: &'static str,
        value: String,
    },

    /// A required column is absent from the record source.
    #[error("record source has no `{0}` column")]
    MissingColumn(&'static str),

    /// Invalid identifier range for database generation.
    #[error("invalid id range: {start} > {end}")]
    InvalidIdRange { start: u32, end: u32 },

    /// SQLite access failed.
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// Reading or writing a file failed.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// A configuration file could not be parsed or written.
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

impl Error {
    /// Returns `true` for errors confined to one record's measurements, which
    /// lenient runs may skip.
    pub fn is_measurement(&self) -> bool {
        matches!(self, Error::MalformedMeasurement { .. })
    }
}
