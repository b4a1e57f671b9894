use thiserror::Error;

/// Convenience result type for filter construction, decoding, filtering and encoding.
pub type RecordFilterResult<T> = Result<T, RecordFilterError>;

/// Error type returned across the crate.
///
/// Every error is terminal for the run that produced it: the first one ends filtering, and rows
/// already handed downstream stay valid.
#[derive(Debug, Error)]
pub enum RecordFilterError {
    /// Unknown primitive type name, or dispatch on [`crate::types::PrimitiveType::Unspecified`].
    #[error("invalid type: '{name}'")]
    InvalidType { name: String },

    /// The schema is unusable, or does not contain the requested column.
    #[error("invalid schema: {message}")]
    InvalidSchema { message: String },

    /// The column exists but its declared shape is not a primitive or a union.
    #[error("invalid field '{column}': {message}")]
    InvalidField { column: String, message: String },

    /// The column is a union without any usable primitive alternative.
    #[error("invalid union for field '{column}': no primitive alternative")]
    InvalidUnion { column: String },

    /// A value (row field, CSV cell or configured literal) does not fit the expected type.
    #[error("invalid input for column '{column}': {message}")]
    InvalidInput { column: String, message: String },

    /// The run was cancelled before it reached end of stream.
    #[error("operation cancelled")]
    Cancelled,

    /// Malformed input detected while decoding records.
    #[error("decode error: {message}")]
    Decode { message: String },

    /// Underlying I/O error (e.g. file not found, broken pipe).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (NDJSON rows or schema text) error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV read/write error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Parquet read/write error.
    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Avro container read/write error, or a row that does not fit the Avro schema.
    #[error("avro error: {0}")]
    Avro(#[source] Box<apache_avro::Error>),
}

impl From<apache_avro::Error> for RecordFilterError {
    fn from(err: apache_avro::Error) -> Self {
        Self::Avro(Box::new(err))
    }
}

impl RecordFilterError {
    pub(crate) fn invalid_input(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            column: column.into(),
            message: message.into(),
        }
    }

    pub(crate) fn invalid_schema(message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            message: message.into(),
        }
    }

    /// Returns `true` if the error is (or wraps) an I/O failure.
    pub fn is_io(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::Csv(err) => matches!(err.kind(), csv::ErrorKind::Io(_)),
            Self::Json(err) => err.is_io(),
            Self::Parquet(err) => error_chain_contains_io(err),
            Self::Avro(err) => error_chain_contains_io(err.as_ref()),
            _ => false,
        }
    }
}

fn error_chain_contains_io(e: &(dyn std::error::Error + 'static)) -> bool {
    let mut cur: Option<&(dyn std::error::Error + 'static)> = Some(e);
    while let Some(err) = cur {
        if err.is::<std::io::Error>() {
            return true;
        }
        cur = err.source();
    }
    false
}
