//! Unified decoder entrypoint.
//!
//! Most callers should use [`open_rows`], which opens the decoder for a [`RecordFormat`] over
//! stdin or a file and returns it as a boxed row iterator.
//!
//! - If no format is given, it is inferred from the file extension; stdin defaults to Avro.
//! - Parquet needs random access to the file footer and therefore requires a path.

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{RecordFilterError, RecordFilterResult};
use crate::schema::Schema;
use crate::types::Row;

use super::avro::AvroRowReader;
use super::csv::CsvRowReader;
use super::json::JsonRowReader;
use super::parquet::ParquetRowReader;

/// A boxed lazy row stream, as produced by [`open_rows`].
pub type RowStream = Box<dyn Iterator<Item = RecordFilterResult<Row>>>;

/// Supported record formats (for both decoding and encoding).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    /// Avro object container file.
    Avro,
    /// Newline-delimited JSON objects.
    Ndjson,
    /// Comma-separated values with a header row.
    Csv,
    /// Apache Parquet.
    Parquet,
}

impl RecordFormat {
    /// Parse a record format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "avro" => Some(Self::Avro),
            "json" | "ndjson" | "jsonl" => Some(Self::Ndjson),
            "csv" => Some(Self::Csv),
            "parquet" | "pq" => Some(Self::Parquet),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Avro => "avro",
            Self::Ndjson => "ndjson",
            Self::Csv => "csv",
            Self::Parquet => "parquet",
        }
    }
}

impl fmt::Display for RecordFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RecordFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s).ok_or_else(|| {
            format!("unknown record format '{s}' (expected avro, ndjson, csv or parquet)")
        })
    }
}

/// Where records are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    Path(PathBuf),
}

impl InputSource {
    /// `None` and `-` mean stdin.
    pub fn from_arg(arg: Option<&Path>) -> Self {
        match arg {
            Some(p) if p != Path::new("-") => Self::Path(p.to_path_buf()),
            _ => Self::Stdin,
        }
    }
}

/// Open a lazy row stream.
///
/// Decoder construction errors (unreadable file, missing header columns) are returned here,
/// before any row is read.
pub fn open_rows(
    source: &InputSource,
    format: Option<RecordFormat>,
    schema: &Schema,
) -> RecordFilterResult<RowStream> {
    let format = match (format, source) {
        (Some(f), _) => f,
        (None, InputSource::Path(path)) => infer_format_from_path(path)?,
        (None, InputSource::Stdin) => RecordFormat::Avro,
    };

    let rows: RowStream = match (format, source) {
        (RecordFormat::Avro, InputSource::Stdin) => {
            Box::new(AvroRowReader::new(std::io::stdin().lock(), schema)?)
        }
        (RecordFormat::Avro, InputSource::Path(path)) => {
            Box::new(AvroRowReader::new(BufReader::new(File::open(path)?), schema)?)
        }
        (RecordFormat::Ndjson, InputSource::Stdin) => {
            Box::new(JsonRowReader::new(std::io::stdin().lock(), schema))
        }
        (RecordFormat::Ndjson, InputSource::Path(path)) => {
            Box::new(JsonRowReader::new(BufReader::new(File::open(path)?), schema))
        }
        (RecordFormat::Csv, InputSource::Stdin) => {
            Box::new(CsvRowReader::new(std::io::stdin().lock(), schema)?)
        }
        (RecordFormat::Csv, InputSource::Path(path)) => {
            Box::new(CsvRowReader::new(BufReader::new(File::open(path)?), schema)?)
        }
        (RecordFormat::Parquet, InputSource::Path(path)) => {
            Box::new(ParquetRowReader::open(path, schema)?)
        }
        (RecordFormat::Parquet, InputSource::Stdin) => {
            return Err(RecordFilterError::Decode {
                message: "parquet input must be read from a file path, not stdin".to_string(),
            });
        }
    };
    Ok(rows)
}

/// Infer a record format from a path's extension.
pub fn infer_format_from_path(path: &Path) -> RecordFilterResult<RecordFormat> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| RecordFilterError::Decode {
            message: format!(
                "cannot infer format: path has no extension ({})",
                path.display()
            ),
        })?;

    RecordFormat::from_extension(ext).ok_or_else(|| RecordFilterError::Decode {
        message: format!(
            "cannot infer format from extension '{ext}' for path ({})",
            path.display()
        ),
    })
}
