use anyhow::{anyhow, Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::types::DatabaseRow;

pub const MAGIC: [u8; 4] = *b"CBR0";
pub const VERSION: u8 = 1;

/// On-disk encoding of a feature database.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DbFormat {
    /// `filename,f1,...,fn` text lines.
    Csv,
    /// bincode header followed by bincode rows.
    Binary,
}

impl DbFormat {
    /// `.fdb` files are binary, everything else is CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("fdb") => DbFormat::Binary,
            _ => DbFormat::Csv,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Header {
    pub magic: [u8; 4],
    pub version: u8,
    /// Task that produced the rows, zero for external embeddings.
    pub task: u32,
    pub dim: u32,
}

/// Encode a row as `filename,f1,f2,...,fn` without the line break.
pub fn format_row(row: &DatabaseRow) -> String {
    let mut line = String::with_capacity(row.filename.len() + row.vector.len() * 10);
    line.push_str(&row.filename);
    for v in &row.vector {
        // writing into a String cannot fail
        let _ = write!(line, ",{v}");
    }
    line
}

/// Decode one CSV line.
///
/// Returns `None` for an empty filename, a row without values, or any value
/// that is not a finite float.
pub fn parse_row(line: &str) -> Option<DatabaseRow> {
    let mut tokens = line.trim_end_matches(['\r', '\n']).split(',');
    let filename = tokens.next()?;
    if filename.is_empty() {
        return None;
    }
    let vector = tokens
        .map(|t| t.trim().parse::<f32>().ok().filter(|v| v.is_finite()))
        .collect::<Option<Vec<f32>>>()?;
    if vector.is_empty() {
        return None;
    }
    Some(DatabaseRow::new(filename, vector))
}

/// Rows loaded from a feature database.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureFile {
    pub rows: Vec<DatabaseRow>,
    /// Lines or records that were rejected while reading.
    pub skipped: usize,
}

impl FeatureFile {
    /// Load every valid row, picking the format from the extension.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match DbFormat::from_path(path) {
            DbFormat::Csv => Self::read_csv(path),
            DbFormat::Binary => Self::read_binary(path),
        }
    }

    /// Lines that are not valid UTF-8 count as malformed rows.
    pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
        let mut out = FeatureFile::default();
        for (n, bytes) in BufReader::new(file).split(b'\n').enumerate() {
            let bytes = bytes?;
            let Ok(line) = std::str::from_utf8(&bytes) else {
                debug!("{}:{}: row is not valid UTF-8", path.display(), n + 1);
                out.skipped += 1;
                continue;
            };
            if line.trim().is_empty() {
                continue;
            }
            match parse_row(line) {
                Some(row) => out.rows.push(row),
                None => {
                    debug!("{}:{}: malformed row skipped", path.display(), n + 1);
                    out.skipped += 1;
                }
            }
        }
        Ok(out)
    }

    pub fn read_binary<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
        let mut reader = BufReader::new(file);
        let header: Header = bincode::deserialize_from(&mut reader)?;
        if header.magic != MAGIC {
            return Err(anyhow!("invalid magic"));
        }
        if header.version != VERSION {
            return Err(anyhow!("unsupported version"));
        }
        let mut out = FeatureFile::default();
        loop {
            match bincode::deserialize_from::<_, DatabaseRow>(&mut reader) {
                Ok(row)
                    if row.vector.len() == header.dim as usize
                        && row.vector.iter().all(|v| v.is_finite()) =>
                {
                    out.rows.push(row)
                }
                Ok(row) => {
                    debug!("{}: row {} is malformed", path.display(), row.filename);
                    out.skipped += 1;
                }
                Err(e) => {
                    if let bincode::ErrorKind::Io(ref io_err) = *e {
                        if io_err.kind() == std::io::ErrorKind::UnexpectedEof {
                            break;
                        }
                    }
                    return Err(e.into());
                }
            }
        }
        Ok(out)
    }
}

/// Streams rows into a feature database.
pub struct FeatureWriter {
    path: PathBuf,
    format: DbFormat,
    writer: BufWriter<File>,
}

impl FeatureWriter {
    /// Create (or truncate) the database at `path`.
    ///
    /// `task` and `dim` are only recorded by the binary format.
    pub fn create<P: AsRef<Path>>(path: P, task: u32, dim: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let format = DbFormat::from_path(&path);
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .with_context(|| format!("cannot open output {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        if format == DbFormat::Binary {
            let header = Header {
                magic: MAGIC,
                version: VERSION,
                task,
                dim: dim as u32,
            };
            bincode::serialize_into(&mut writer, &header)?;
        }
        Ok(Self {
            path,
            format,
            writer,
        })
    }

    pub fn append(&mut self, row: &DatabaseRow) -> Result<()> {
        match self.format {
            DbFormat::Csv => writeln!(self.writer, "{}", format_row(row))?,
            DbFormat::Binary => bincode::serialize_into(&mut self.writer, row)?,
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn finish(mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_roundtrip() {
        let row = DatabaseRow::new("pic.0001.jpg", vec![0.1, 255.0, 1e-7, 0.0]);
        let line = format_row(&row);
        assert_eq!(line.split(',').count(), 5);
        assert_eq!(parse_row(&line), Some(row));
    }

    #[test]
    fn rejected_rows() {
        assert_eq!(parse_row(""), None);
        assert_eq!(parse_row("a.jpg"), None);
        assert_eq!(parse_row(",1,2"), None);
        assert_eq!(parse_row("a.jpg,1,x"), None);
        assert_eq!(parse_row("a.jpg,1,"), None);
    }

    #[test]
    fn non_finite_values_are_rejected() {
        assert_eq!(parse_row("x.jpg,nan,1"), None);
        assert_eq!(parse_row("x.jpg,1,inf"), None);
        assert_eq!(parse_row("x.jpg,-inf,1"), None);
        assert_eq!(parse_row("x.jpg,NaN"), None);
    }

    #[test]
    fn crlf_is_tolerated() {
        let row = parse_row("a.png,1.5,2\r").map(|r| r.vector);
        assert_eq!(row, Some(vec![1.5, 2.0]));
    }

    #[test]
    fn format_detection() {
        assert_eq!(DbFormat::from_path(Path::new("db.fdb")), DbFormat::Binary);
        assert_eq!(DbFormat::from_path(Path::new("db.FDB")), DbFormat::Binary);
        assert_eq!(DbFormat::from_path(Path::new("db.csv")), DbFormat::Csv);
        assert_eq!(DbFormat::from_path(Path::new("db")), DbFormat::Csv);
    }
}
