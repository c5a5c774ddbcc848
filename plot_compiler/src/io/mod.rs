//! Delimited text input and output for plot records.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// Destination for compiled rows.
pub trait RowSink {
    fn write_row(&mut self, cells: &[String]) -> io::Result<()>;
}

/// Writes rows as separator-delimited lines.
///
/// Cells containing the separator, a double quote or a line break are quoted,
/// with embedded quotes doubled.
pub struct DelimitedWriter<W: Write> {
    inner: W,
    separator: char,
}

impl<W: Write> DelimitedWriter<W> {
    pub fn new(inner: W, separator: char) -> Self {
        Self { inner, separator }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    fn write_cell(&mut self, cell: &str) -> io::Result<()> {
        let needs_quotes = cell
            .chars()
            .any(|c| c == self.separator || c == '"' || c == '\n' || c == '\r');
        if needs_quotes {
            write!(self.inner, "\"{}\"", cell.replace('"', "\"\""))
        } else {
            write!(self.inner, "{cell}")
        }
    }
}

impl<W: Write> RowSink for DelimitedWriter<W> {
    fn write_row(&mut self, cells: &[String]) -> io::Result<()> {
        for (i, cell) in cells.iter().enumerate() {
            if i > 0 {
                write!(self.inner, "{}", self.separator)?;
            }
            self.write_cell(cell)?;
        }
        writeln!(self.inner)
    }
}

impl RowSink for Vec<Vec<String>> {
    fn write_row(&mut self, cells: &[String]) -> io::Result<()> {
        self.push(cells.to_vec());
        Ok(())
    }
}

/// Splits one delimited line into cells, honouring double-quoted cells.
pub fn split_line(line: &str, separator: char) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if quoted {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    cell.push('"');
                    chars.next();
                } else {
                    quoted = false;
                }
            } else {
                cell.push(c);
            }
        } else if c == '"' && cell.is_empty() {
            quoted = true;
        } else if c == separator {
            cells.push(std::mem::take(&mut cell));
        } else {
            cell.push(c);
        }
    }
    cells.push(cell);
    cells
}

/// Reads all non-empty lines of a delimited source.
pub fn read_delimited<R: Read>(reader: R, separator: char) -> io::Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    for line in BufReader::new(reader).lines() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        rows.push(split_line(line, separator));
    }
    Ok(rows)
}

/// Reads a delimited file from disk.
pub fn read_delimited_file(
    path: impl AsRef<Path>,
    separator: char,
) -> io::Result<Vec<Vec<String>>> {
    read_delimited(File::open(path)?, separator)
}

/// Runs `write` against a temporary file next to `path` and moves it into
/// place only if `write` succeeds, so a failed run leaves no partial output.
///
/// A replaced file keeps its permissions. New files are created readable by
/// everyone, as with a plain `File::create` under the usual umask.
pub fn write_atomically<T, E>(
    path: impl AsRef<Path>,
    write: impl FnOnce(&mut File) -> Result<T, E>,
) -> Result<T, E>
where
    E: From<io::Error>,
{
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    let value = write(tmp.as_file_mut())?;
    tmp.as_file_mut().flush()?;
    match std::fs::metadata(path) {
        Ok(meta) => tmp.as_file().set_permissions(meta.permissions())?,
        Err(_) => set_default_permissions(tmp.as_file())?,
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(value)
}

#[cfg(unix)]
fn set_default_permissions(file: &File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_default_permissions(_file: &File) -> io::Result<()> {
    Ok(())
}
