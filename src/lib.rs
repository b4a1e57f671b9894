//! `record-filter` keeps the records of a stream whose target column equals a configured literal.
//!
//! Records are typed by an Avro schema (`.avsc`). The target column's declared type is resolved
//! once, the literal is parsed into that type, and every row is then compared in that type's
//! domain. Rows stream through lazily: one record is decoded, evaluated and (if it matches)
//! encoded before the next one is read.
//!
//! ## Formats
//!
//! - **Avro** object container files: `.avro` (the default for stdin and stdout; output honors
//!   the codec)
//! - **NDJSON**: `.json`, `.ndjson`, `.jsonl`
//! - **CSV**: `.csv` (header row required)
//! - **Parquet**: `.parquet`, `.pq` (file paths only for input; output honors the block length
//!   and codec)
//!
//! ## Comparison rules
//!
//! - A row whose target field is absent or null does not match.
//! - A row whose target field holds a value of another type fails the run with
//!   [`RecordFilterError::InvalidInput`].
//! - The first error of any kind ends the stream. The output is still finished, so rows already
//!   emitted stay readable.
//!
//! ## Quick example
//!
//! ```no_run
//! use record_filter::execution::FilterPipeline;
//! use record_filter::ingestion::{open_rows, InputSource, RecordFormat};
//! use record_filter::output::{open_sink, EncodeOptions, OutputTarget};
//! use record_filter::schema::Schema;
//! use record_filter::types::RawTargetConfig;
//!
//! # fn main() -> Result<(), record_filter::RecordFilterError> {
//! let schema = Schema::parse(&std::fs::read_to_string("events.avsc")?)?;
//! let target_type = schema.resolve_column("status")?;
//! let filter = RawTargetConfig::new("status", "active").to_filter(target_type)?;
//!
//! let rows = open_rows(&InputSource::Path("events.ndjson".into()), None, &schema)?;
//! let options = EncodeOptions::default();
//! let sink = open_sink(&OutputTarget::Stdout, RecordFormat::Ndjson, &schema, &options)?;
//! let metrics = FilterPipeline::new(filter).run(rows, sink)?;
//! eprintln!("{metrics}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`types`]: primitive types, values, rows and target configuration
//! - [`schema`]: Avro schema parsing and column type resolution
//! - [`processing`]: literal parsing, filter construction and lazy application
//! - [`ingestion`]: Avro / NDJSON / CSV / Parquet decoders
//! - [`output`]: Avro / NDJSON / CSV / Parquet encoders and codecs
//! - [`execution`]: run driver, cancellation, metrics and observers
//! - [`config`] and [`cli`]: environment / flag configuration for the `record-filter` binary
//! - [`error`]: error type used across the crate

pub mod cli;
pub mod config;
pub mod error;
pub mod execution;
pub mod ingestion;
pub mod output;
pub mod processing;
pub mod schema;
pub mod types;

pub use error::{RecordFilterError, RecordFilterResult};
