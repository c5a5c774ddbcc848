//! SQLite-backed plot databases.

use std::path::Path;

use log::info;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};

use super::RecordStore;
use crate::error::{Error, Result};
use crate::grid::{serpentine_labels, GridLayout};
use crate::record::{format_number, Field, Record, Schema};

/// Table holding the trees of a plot.
pub const PLOT_TABLE: &str = "ncpippn";

/// Read-only view of a plot table in a SQLite database.
pub struct SqliteStore {
    conn: Connection,
    table: String,
    schema: Schema,
}

impl SqliteStore {
    /// Opens the default plot table of the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_table(path, PLOT_TABLE)
    }

    /// Opens `table` of the database at `path` without write access.
    pub fn open_table(path: impl AsRef<Path>, table: &str) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Self::from_connection(conn, table)
    }

    /// Wraps an open connection.
    pub fn from_connection(conn: Connection, table: &str) -> Result<Self> {
        let columns: Vec<String> = {
            let stmt = conn.prepare(&format!("SELECT * FROM {} LIMIT 0", quote(table)))?;
            stmt.column_names().into_iter().map(String::from).collect()
        };
        let schema = Schema::from_columns(columns)?;
        Ok(Self {
            conn,
            table: table.to_string(),
            schema,
        })
    }

    fn to_record(&self, row: &Row<'_>) -> rusqlite::Result<Record> {
        let count = row.as_ref().column_count();
        let mut cells = Vec::with_capacity(count);
        for i in 0..count {
            cells.push(cell_text(row.get_ref(i)?));
        }
        Ok(self.schema.conform(Record::new(cells)))
    }
}

impl RecordStore for SqliteStore {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn records(&self) -> Result<Vec<Record>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT * FROM {} ORDER BY rowid", quote(&self.table)))?;
        let rows = stmt.query_map([], |row| self.to_record(row))?;
        let mut res = Vec::new();
        for r in rows {
            res.push(r?);
        }
        Ok(res)
    }

    fn record(&self, id: &str) -> Result<Option<Record>> {
        let sql = format!(
            "SELECT * FROM {} WHERE {} = ?1 ORDER BY rowid LIMIT 1",
            quote(&self.table),
            quote(self.schema.column_name(Field::Id)),
        );
        Ok(self
            .conn
            .query_row(&sql, params![id], |row| self.to_record(row))
            .optional()?)
    }
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

fn cell_text(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => format_number(f),
        ValueRef::Text(t) | ValueRef::Blob(t) => String::from_utf8_lossy(t).into_owned(),
    }
}

/// Creates an empty plot database ready for field collection.
///
/// The plot table is recreated and filled with one row per grid post, in the
/// order posts are walked in the field, followed by one row per tree id from
/// `start_id` to `end_id`.
pub fn create_plot_database(path: impl AsRef<Path>, start_id: u32, end_id: u32) -> Result<()> {
    if start_id > end_id {
        return Err(Error::InvalidIdRange {
            start: start_id,
            end: end_id,
        });
    }
    let mut conn = Connection::open(path)?;
    conn.execute_batch(&format!(
        "DROP TABLE IF EXISTS {table};
        CREATE TABLE {table} (
            id TEXT PRIMARY KEY,
            quadrat TEXT,
            strata INTEGER,
            circumferences REAL,
            dbh REAL,
            height REAL,
            reference TEXT,
            hdist REAL,
            azimuth REAL,
            x REAL,
            y REAL
        );",
        table = quote(PLOT_TABLE),
    ))?;
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(&format!("INSERT INTO {} (id) VALUES (?1)", quote(PLOT_TABLE)))?;
        for label in serpentine_labels(GridLayout::default()) {
            stmt.execute(params![label])?;
        }
        for id in start_id..=end_id {
            stmt.execute(params![id.to_string()])?;
        }
    }
    tx.commit()?;
    info!(
        "created plot database with {} trees ({start_id}..={end_id})",
        end_id - start_id + 1
    );
    Ok(())
}
