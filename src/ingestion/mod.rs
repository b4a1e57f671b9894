//! Record decoders.
//!
//! Every decoder is a lazy iterator of `Result<Row>`: a record is read only when the consumer
//! pulls it, and after the first error nothing further is yielded.
//!
//! Most callers should use [`open_rows`] (from [`unified`]). Format-specific decoders are
//! available under:
//! - [`avro`]
//! - [`csv`]
//! - [`json`]
//! - [`parquet`]

pub mod avro;
pub mod csv;
pub mod json;
pub mod parquet;
pub mod unified;

pub use self::avro::AvroRowReader;
pub use self::csv::CsvRowReader;
pub use self::json::JsonRowReader;
pub use self::parquet::ParquetRowReader;
pub use unified::{infer_format_from_path, open_rows, InputSource, RecordFormat, RowStream};
