//! Run configuration.
//!
//! The environment variable names are shared with the command line layer in [`crate::cli`],
//! where every variable also has a long flag.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{RecordFilterError, RecordFilterResult};
use crate::ingestion::{infer_format_from_path, InputSource, RecordFormat};
use crate::output::{EncodeOptions, OutputTarget};
use crate::processing::Filter;
use crate::schema::Schema;
use crate::types::RawTargetConfig;

pub const ENV_TARGET_COL_NAME: &str = "ENV_TARGET_COL_NAME";
pub const ENV_TARGET_VALUE: &str = "ENV_TARGET_VALUE";
pub const ENV_SCHEMA_FILENAME: &str = "ENV_SCHEMA_FILENAME";
pub const ENV_CODEC: &str = "ENV_CODEC";
pub const ENV_BLOCK_LENGTH: &str = "ENV_BLOCK_LENGTH";
pub const ENV_INPUT_FORMAT: &str = "ENV_INPUT_FORMAT";
pub const ENV_OUTPUT_FORMAT: &str = "ENV_OUTPUT_FORMAT";

/// Log filter directive, falls back to `RUST_LOG`.
pub const ENV_LOG: &str = "RECORD_FILTER_LOG";

/// Upper bound on the size of a schema file.
pub const SCHEMA_FILE_SIZE_MAX_DEFAULT: u64 = 1_048_576;

/// A complete, validated run configuration.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    pub target: RawTargetConfig,
    pub schema_path: PathBuf,
    pub input: InputSource,
    pub output: OutputTarget,
    /// Explicit input format; inferred from the input path when `None`.
    pub input_format: Option<RecordFormat>,
    /// Explicit output format; inferred from the output path, then the input format, when `None`.
    pub output_format: Option<RecordFormat>,
    pub encode: EncodeOptions,
}

impl FilterConfig {
    pub fn new(target: RawTargetConfig, schema_path: impl Into<PathBuf>) -> Self {
        Self {
            target,
            schema_path: schema_path.into(),
            input: InputSource::Stdin,
            output: OutputTarget::Stdout,
            input_format: None,
            output_format: None,
            encode: EncodeOptions::default(),
        }
    }

    /// Read and parse the schema file, refusing files over [`SCHEMA_FILE_SIZE_MAX_DEFAULT`].
    pub fn load_schema(&self) -> RecordFilterResult<Schema> {
        let text = read_schema_file(&self.schema_path, SCHEMA_FILE_SIZE_MAX_DEFAULT)?;
        Schema::parse(&text)
    }

    /// Resolve the target column against `schema` and build the filter.
    pub fn resolve_filter(&self, schema: &Schema) -> RecordFilterResult<Filter> {
        let target_type = schema.resolve_column(self.target.column.as_str())?;
        self.target.to_filter(target_type)
    }

    pub fn resolved_input_format(&self) -> RecordFilterResult<RecordFormat> {
        match (self.input_format, &self.input) {
            (Some(f), _) => Ok(f),
            (None, InputSource::Path(path)) => infer_format_from_path(path),
            (None, InputSource::Stdin) => Ok(RecordFormat::Avro),
        }
    }

    pub fn resolved_output_format(&self) -> RecordFilterResult<RecordFormat> {
        match (self.output_format, &self.output) {
            (Some(f), _) => Ok(f),
            (None, OutputTarget::Path(path)) => infer_format_from_path(path),
            (None, OutputTarget::Stdout) => self.resolved_input_format(),
        }
    }
}

/// Read at most `limit` bytes of schema text from `path`.
pub fn read_schema_file(path: &Path, limit: u64) -> RecordFilterResult<String> {
    let file = File::open(path).map_err(|e| {
        RecordFilterError::Io(std::io::Error::new(
            e.kind(),
            format!("{e}: filename={}", path.display()),
        ))
    })?;

    let mut text = String::new();
    file.take(limit + 1).read_to_string(&mut text)?;
    if text.len() as u64 > limit {
        return Err(RecordFilterError::invalid_schema(format!(
            "schema file {} exceeds {limit} bytes",
            path.display()
        )));
    }
    Ok(text)
}
