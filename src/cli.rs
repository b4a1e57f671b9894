//! Command line entrypoint for the `record-filter` binary.
//!
//! Reads records (Avro by default) from stdin (or `--input`), keeps those whose target column equals the configured
//! literal, and writes them to stdout (or `--output`). Logs go to stderr.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use crate::config::{
    FilterConfig, ENV_BLOCK_LENGTH, ENV_CODEC, ENV_INPUT_FORMAT, ENV_LOG, ENV_OUTPUT_FORMAT,
    ENV_SCHEMA_FILENAME, ENV_TARGET_COL_NAME, ENV_TARGET_VALUE,
};
use crate::execution::{CancellationToken, FilterPipeline, TracingObserver};
use crate::ingestion::{open_rows, InputSource, RecordFormat};
use crate::output::{open_sink, Codec, EncodeOptions, OutputTarget};
use crate::types::RawTargetConfig;

#[derive(Debug, Parser)]
#[command(name = "record-filter")]
#[command(version, about = "Keep records whose column equals a literal", long_about = None)]
pub struct Cli {
    /// Column to compare
    #[arg(long, env = ENV_TARGET_COL_NAME)]
    pub column: String,

    /// Literal to compare against, parsed as the column's schema type
    #[arg(long, env = ENV_TARGET_VALUE, allow_hyphen_values = true)]
    pub value: String,

    /// Avro schema (.avsc) describing the records
    #[arg(long, env = ENV_SCHEMA_FILENAME)]
    pub schema: PathBuf,

    /// Avro/Parquet output codec (null, deflate, snappy, zstandard; bzip2 and xz fall back to null)
    #[arg(long, env = ENV_CODEC, default_value = "null")]
    pub codec: Codec,

    /// Rows per output block (parquet row group; avro blocks hold one row)
    #[arg(long, env = ENV_BLOCK_LENGTH, default_value_t = EncodeOptions::BLOCK_LENGTH_DEFAULT, value_parser = parse_block_length)]
    pub block_length: usize,

    /// Input file (`-` or omitted for stdin)
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Output file (`-` or omitted for stdout)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Input format (avro, ndjson, csv, parquet); inferred from the input extension, avro for stdin
    #[arg(long, env = ENV_INPUT_FORMAT)]
    pub input_format: Option<RecordFormat>,

    /// Output format; inferred from the output extension, then the input format, when omitted
    #[arg(long, env = ENV_OUTPUT_FORMAT)]
    pub output_format: Option<RecordFormat>,
}

/// Parse block length from CLI/env string
fn parse_block_length(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("block length must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(format!("Invalid block length '{s}': {e}")),
    }
}

impl From<Cli> for FilterConfig {
    fn from(cli: Cli) -> Self {
        Self {
            target: RawTargetConfig::new(cli.column, cli.value),
            schema_path: cli.schema,
            input: InputSource::from_arg(cli.input.as_deref()),
            output: OutputTarget::from_arg(cli.output.as_deref()),
            input_format: cli.input_format,
            output_format: cli.output_format,
            encode: EncodeOptions {
                block_length: cli.block_length,
                codec: cli.codec,
            },
        }
    }
}

/// Install the global `tracing` subscriber, writing to stderr.
pub fn init_logging() {
    let filter = std::env::var(ENV_LOG)
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .compact()
        .with_env_filter(filter)
        .init();
}

/// Parse arguments, run one filter pass, and log the error (if any) before returning it.
pub fn run(cli: Cli) -> anyhow::Result<()> {
    let config = FilterConfig::from(cli);
    let result = execute(&config);
    if let Err(e) = &result {
        tracing::error!("record-filter failed: {e:#}");
    }
    result
}

fn execute(config: &FilterConfig) -> anyhow::Result<()> {
    let schema = config
        .load_schema()
        .with_context(|| format!("loading schema {}", config.schema_path.display()))?;
    let filter = config
        .resolve_filter(&schema)
        .with_context(|| format!("building filter for column '{}'", config.target.column))?;
    let input_format = config.resolved_input_format()?;
    let output_format = config.resolved_output_format()?;

    tracing::debug!(
        schema = %schema.name,
        %input_format,
        %output_format,
        codec = %config.encode.codec,
        block_length = config.encode.block_length,
        "configuration resolved"
    );

    let rows = open_rows(&config.input, Some(input_format), &schema).context("opening input")?;
    let sink = open_sink(&config.output, output_format, &schema, &config.encode)
        .context("opening output")?;

    let token = CancellationToken::new();
    spawn_signal_listener(token.clone())?;

    FilterPipeline::new(filter)
        .with_cancellation(token)
        .with_observer(Arc::new(TracingObserver))
        .run(rows, sink)?;
    Ok(())
}

/// Cancel `token` on Ctrl+C / SIGTERM. A second signal exits immediately, for runs blocked on
/// input.
fn spawn_signal_listener(token: CancellationToken) -> anyhow::Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building signal runtime")?;

    std::thread::Builder::new()
        .name("record-filter-signals".to_string())
        .spawn(move || {
            rt.block_on(async {
                shutdown_signal().await;
                tracing::warn!("shutdown signal received, cancelling run");
                token.cancel();

                shutdown_signal().await;
                tracing::warn!("second shutdown signal received, exiting");
                std::process::exit(130);
            })
        })
        .context("spawning signal listener")?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl+c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
