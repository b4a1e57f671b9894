//! Record encoders.
//!
//! Every encoder implements [`RowSink`]. [`open_sink`] picks one for a [`RecordFormat`] and a
//! destination (stdout or a file); [`write_rows`] drains a filtered row stream into it.
//!
//! The Avro and text encoders (NDJSON, CSV) flush after every record so downstream consumers see
//! rows as soon as they match. The Parquet encoder buffers [`EncodeOptions::block_length`] rows
//! per row group. [`EncodeOptions::codec`] compresses Avro blocks and Parquet pages; text output
//! is never compressed.

pub mod avro;
pub mod csv;
pub mod json;
pub mod parquet;

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ::parquet::basic::{Compression, GzipLevel, ZstdLevel};

use crate::error::RecordFilterResult;
use crate::ingestion::RecordFormat;
use crate::schema::Schema;
use crate::types::Row;

pub use self::avro::AvroRowWriter;
pub use self::csv::CsvRowWriter;
pub use self::json::JsonRowWriter;
pub use self::parquet::ParquetRowWriter;

/// Destination for encoded rows.
pub trait RowSink {
    /// Encode one row.
    fn write_row(&mut self, row: &Row) -> RecordFilterResult<()>;

    /// Flush buffered rows and write any trailer. Must be called for the output to be complete,
    /// including after a failed run.
    fn finish(self: Box<Self>) -> RecordFilterResult<()>;
}

/// Block compression codec for container output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Codec {
    #[default]
    Null,
    Deflate,
    Snappy,
    Zstandard,
    Bzip2,
    Xz,
}

impl Codec {
    pub const ALL: [Codec; 6] = [
        Codec::Null,
        Codec::Deflate,
        Codec::Snappy,
        Codec::Zstandard,
        Codec::Bzip2,
        Codec::Xz,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Codec::Null => "null",
            Codec::Deflate => "deflate",
            Codec::Snappy => "snappy",
            Codec::Zstandard => "zstandard",
            Codec::Bzip2 => "bzip2",
            Codec::Xz => "xz",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    /// Whether the encoders compress with this codec. The others are written uncompressed.
    pub fn is_supported(self) -> bool {
        !matches!(self, Codec::Bzip2 | Codec::Xz)
    }

    /// Map to an Avro container codec. Unsupported codecs fall back to no compression.
    pub fn to_avro_codec(self) -> apache_avro::Codec {
        if !self.is_supported() {
            self.warn_downgrade("avro");
            return apache_avro::Codec::Null;
        }
        apache_avro::Codec::from_str(self.name()).unwrap_or_else(|_| {
            self.warn_downgrade("avro");
            apache_avro::Codec::Null
        })
    }

    /// Map to a Parquet compression. Unsupported codecs fall back to no compression.
    pub fn to_parquet_compression(self) -> Compression {
        match self {
            Codec::Null => Compression::UNCOMPRESSED,
            Codec::Deflate => Compression::GZIP(GzipLevel::default()),
            Codec::Snappy => Compression::SNAPPY,
            Codec::Zstandard => Compression::ZSTD(ZstdLevel::default()),
            Codec::Bzip2 | Codec::Xz => {
                self.warn_downgrade("parquet");
                Compression::UNCOMPRESSED
            }
        }
    }

    fn warn_downgrade(self, encoder: &str) {
        tracing::warn!(
            codec = self.name(),
            encoder,
            "codec not supported by the encoder, writing uncompressed"
        );
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Codec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| {
            format!("unknown codec '{s}' (expected null, deflate, snappy, zstandard, bzip2 or xz)")
        })
    }
}

/// Encoder settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Rows per Parquet row group. Avro blocks hold one row each, since every row is flushed.
    pub block_length: usize,
    pub codec: Codec,
}

impl EncodeOptions {
    pub const BLOCK_LENGTH_DEFAULT: usize = 100;
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            block_length: Self::BLOCK_LENGTH_DEFAULT,
            codec: Codec::Null,
        }
    }
}

/// Where encoded rows are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    Path(PathBuf),
}

impl OutputTarget {
    /// `None` and `-` mean stdout.
    pub fn from_arg(arg: Option<&Path>) -> Self {
        match arg {
            Some(p) if p != Path::new("-") => Self::Path(p.to_path_buf()),
            _ => Self::Stdout,
        }
    }

    fn open(&self) -> RecordFilterResult<Box<dyn Write + Send>> {
        Ok(match self {
            OutputTarget::Stdout => Box::new(BufWriter::new(std::io::stdout())),
            OutputTarget::Path(path) => Box::new(BufWriter::new(File::create(path)?)),
        })
    }
}

/// Open the encoder for `format` over `target`.
///
/// The Avro encoder borrows the schema's Avro form, hence the sink's lifetime.
pub fn open_sink<'a>(
    target: &OutputTarget,
    format: RecordFormat,
    schema: &'a Schema,
    options: &EncodeOptions,
) -> RecordFilterResult<Box<dyn RowSink + 'a>> {
    if matches!(format, RecordFormat::Ndjson | RecordFormat::Csv) && options.codec != Codec::Null {
        tracing::debug!(codec = %options.codec, %format, "codec ignored by text encoder");
    }
    let out = target.open()?;
    Ok(match format {
        RecordFormat::Avro => Box::new(AvroRowWriter::new(out, schema, options)?),
        RecordFormat::Ndjson => Box::new(JsonRowWriter::new(out, schema)),
        RecordFormat::Csv => Box::new(CsvRowWriter::new(out, schema)?),
        RecordFormat::Parquet => Box::new(ParquetRowWriter::new(out, schema, options)?),
    })
}

/// Drain `rows` into `sink`, returning the number of rows written.
///
/// The first error ends the write and is returned. The sink is finished either way, so rows
/// written before the error stay readable; a failure to finish after an error is logged and the
/// original error is returned.
pub fn write_rows<'a, I>(rows: I, mut sink: Box<dyn RowSink + 'a>) -> RecordFilterResult<u64>
where
    I: IntoIterator<Item = RecordFilterResult<Row>>,
{
    let mut written = 0u64;
    match drain(rows, sink.as_mut(), &mut written) {
        Ok(()) => {
            sink.finish()?;
            Ok(written)
        }
        Err(err) => {
            if let Err(finish_err) = sink.finish() {
                tracing::warn!(
                    error = %finish_err,
                    written,
                    "could not finish output after failure"
                );
            }
            Err(err)
        }
    }
}

fn drain<'a, I>(
    rows: I,
    sink: &mut (dyn RowSink + 'a),
    written: &mut u64,
) -> RecordFilterResult<()>
where
    I: IntoIterator<Item = RecordFilterResult<Row>>,
{
    for row in rows {
        sink.write_row(&row?)?;
        *written += 1;
    }
    Ok(())
}
