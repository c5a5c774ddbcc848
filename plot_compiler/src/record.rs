//! Tree records and the columns the compiler reads and writes.
//!
//! Records are rows of text cells aligned with a header. The compiler only
//! touches a handful of named fields; every other column passes through
//! unchanged.

use crate::error::{Error, Result};

/// Fields of a tree record known to the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Id,
    Circumferences,
    Diameter,
    Reference,
    HorizontalDistance,
    Azimuth,
    X,
    Y,
}

impl Field {
    /// Column name used when the field has to be added to a header.
    pub fn column(self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Circumferences => "circumferences",
            Field::Diameter => "dbh",
            Field::Reference => "reference",
            Field::HorizontalDistance => "hdist",
            Field::Azimuth => "azimuth",
            Field::X => "x",
            Field::Y => "y",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            Field::Circumferences => &["circumference"],
            Field::Diameter => &["diameter"],
            Field::HorizontalDistance => &["horizontal_distance"],
            _ => &[],
        }
    }

    fn matches(self, name: &str) -> bool {
        let name = name.trim();
        name.eq_ignore_ascii_case(self.column())
            || self.aliases().iter().any(|a| name.eq_ignore_ascii_case(a))
    }
}

/// A single tree record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    pub cells: Vec<String>,
}

impl Record {
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }
}

impl<S: Into<String>> FromIterator<S> for Record {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

/// Header of a record source with the positions of the known fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    columns: Vec<String>,
    id: usize,
    circumferences: usize,
    diameter: usize,
    reference: usize,
    hdist: usize,
    azimuth: usize,
    x: usize,
    y: usize,
}

impl Schema {
    /// Locates the known fields in `columns`.
    ///
    /// The measurement columns must exist. Missing derived columns (`dbh`,
    /// `x`, `y`) are appended to the header.
    pub fn from_columns<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Result<Self> {
        let mut columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let required = |field: Field| {
            position(&columns, field).ok_or(Error::MissingColumn(field.column()))
        };
        let id = required(Field::Id)?;
        let circumferences = required(Field::Circumferences)?;
        let reference = required(Field::Reference)?;
        let hdist = required(Field::HorizontalDistance)?;
        let azimuth = required(Field::Azimuth)?;
        let diameter = position_or_append(&mut columns, Field::Diameter);
        let x = position_or_append(&mut columns, Field::X);
        let y = position_or_append(&mut columns, Field::Y);
        Ok(Self {
            columns,
            id,
            circumferences,
            diameter,
            reference,
            hdist,
            azimuth,
            x,
            y,
        })
    }

    /// Column layout of databases created by
    /// [`create_plot_database`](crate::store::create_plot_database).
    pub fn standard() -> Self {
        Self {
            columns: STANDARD_COLUMNS.iter().map(|c| c.to_string()).collect(),
            id: 0,
            circumferences: 3,
            diameter: 4,
            reference: 6,
            hdist: 7,
            azimuth: 8,
            x: 9,
            y: 10,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Header name of the column holding `field`.
    pub fn column_name(&self, field: Field) -> &str {
        &self.columns[self.index(field)]
    }

    fn index(&self, field: Field) -> usize {
        match field {
            Field::Id => self.id,
            Field::Circumferences => self.circumferences,
            Field::Diameter => self.diameter,
            Field::Reference => self.reference,
            Field::HorizontalDistance => self.hdist,
            Field::Azimuth => self.azimuth,
            Field::X => self.x,
            Field::Y => self.y,
        }
    }

    /// Trimmed value of `field`, empty when the cell is missing.
    pub fn get<'r>(&self, record: &'r Record, field: Field) -> &'r str {
        record
            .cells
            .get(self.index(field))
            .map(|c| c.trim())
            .unwrap_or("")
    }

    pub fn set(&self, record: &mut Record, field: Field, value: String) {
        let idx = self.index(field);
        if record.cells.len() <= idx {
            record.cells.resize(idx + 1, String::new());
        }
        record.cells[idx] = value;
    }

    /// Pads or truncates `record` to the header width.
    pub fn conform(&self, mut record: Record) -> Record {
        record.cells.resize(self.width(), String::new());
        record
    }

    pub fn id<'r>(&self, record: &'r Record) -> &'r str {
        self.get(record, Field::Id)
    }

    /// Reference label, or `None` when the tree was never positioned.
    pub fn reference<'r>(&self, record: &'r Record) -> Option<&'r str> {
        Some(self.get(record, Field::Reference)).filter(|r| !r.is_empty())
    }

    /// Parses the optional numeric value of `field`.
    pub fn number(&self, record: &Record, field: Field) -> Result<Option<f64>> {
        let raw = self.get(record, field);
        if raw.is_empty() {
            return Ok(None);
        }
        parse_number(raw)
            .map(Some)
            .ok_or_else(|| self.malformed(record, field, raw))
    }

    /// Parses the `;`-separated stem circumferences.
    pub fn circumferences(&self, record: &Record) -> Result<Vec<f64>> {
        let raw = self.get(record, Field::Circumferences);
        if raw.is_empty() {
            return Ok(Vec::new());
        }
        raw.split(';')
            .map(|c| {
                parse_number(c).ok_or_else(|| self.malformed(record, Field::Circumferences, raw))
            })
            .collect()
    }

    /// Distance and azimuth of a positioned record.
    pub fn measurement(&self, record: &Record) -> Result<Measurement> {
        let required = |field: Field| -> Result<f64> {
            self.number(record, field)?
                .ok_or_else(|| self.malformed(record, field, ""))
        };
        Ok(Measurement {
            distance: required(Field::HorizontalDistance)?,
            azimuth: required(Field::Azimuth)?,
        })
    }

    fn malformed(&self, record: &Record, field: Field, raw: &str) -> Error {
        Error::MalformedMeasurement {
            id: self.id(record).to_string(),
            field: field.column(),
            value: raw.to_string(),
        }
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::standard()
    }
}

/// Columns of the plot table.
pub const STANDARD_COLUMNS: [&str; 11] = [
    "id",
    "quadrat",
    "strata",
    "circumferences",
    "dbh",
    "height",
    "reference",
    "hdist",
    "azimuth",
    "x",
    "y",
];

/// Polar measurement from a reference to a tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub distance: f64,
    pub azimuth: f64,
}

fn position(columns: &[String], field: Field) -> Option<usize> {
    columns.iter().position(|c| field.matches(c))
}

fn position_or_append(columns: &mut Vec<String>, field: Field) -> usize {
    match position(columns, field) {
        Some(idx) => idx,
        None => {
            columns.push(field.column().to_string());
            columns.len() - 1
        }
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Formats a derived value the way it is written to output cells.
pub fn format_number(value: f64) -> String {
    format!("{value:?}")
}
