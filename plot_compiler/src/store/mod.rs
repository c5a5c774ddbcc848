//! Record stores holding the trees of a plot.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::error::Result;
use crate::io::read_delimited;
use crate::record::{Record, Schema};

pub mod sqlite;
pub use sqlite::{create_plot_database, SqliteStore, PLOT_TABLE};

/// Read access to the records of the plot being compiled.
///
/// The compiler never writes to a store.
pub trait RecordStore {
    /// Header shared by every record of the store.
    fn schema(&self) -> &Schema;

    /// All records in a stable order.
    fn records(&self) -> Result<Vec<Record>>;

    /// The record with the given id, if any.
    fn record(&self, id: &str) -> Result<Option<Record>>;
}

/// Simple in-memory record store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    schema: Schema,
    records: Vec<Record>,
    index: HashMap<String, usize>,
}

impl MemoryStore {
    /// Creates a store from records laid out according to `schema`.
    ///
    /// When ids repeat, lookups return the first record with that id.
    pub fn new(schema: Schema, records: Vec<Record>) -> Self {
        let mut store = Self {
            schema,
            records: Vec::with_capacity(records.len()),
            index: HashMap::new(),
        };
        for record in records {
            store.push(record);
        }
        store
    }

    /// Builds a store from delimited text whose first line is the header.
    pub fn from_delimited<R: Read>(reader: R, separator: char) -> Result<Self> {
        let mut rows = read_delimited(reader, separator)?.into_iter();
        let header = rows.next().unwrap_or_default();
        let schema = Schema::from_columns(header)?;
        Ok(Self::new(schema, rows.map(Record::new).collect()))
    }

    /// Reads a delimited file from disk.
    pub fn open_delimited(path: impl AsRef<Path>, separator: char) -> Result<Self> {
        Self::from_delimited(std::fs::File::open(path)?, separator)
    }

    /// Copies every record of `store` into memory.
    pub fn snapshot<S: RecordStore + ?Sized>(store: &S) -> Result<Self> {
        Ok(Self::new(store.schema().clone(), store.records()?))
    }

    /// Appends a record.
    pub fn push(&mut self, record: Record) {
        let record = self.schema.conform(record);
        let id = self.schema.id(&record).to_string();
        self.index.entry(id).or_insert(self.records.len());
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordStore for MemoryStore {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn records(&self) -> Result<Vec<Record>> {
        Ok(self.records.clone())
    }

    fn record(&self, id: &str) -> Result<Option<Record>> {
        Ok(self.index.get(id).map(|&i| self.records[i].clone()))
    }
}
