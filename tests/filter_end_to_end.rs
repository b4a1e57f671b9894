use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use record_filter::config::FilterConfig;
use record_filter::execution::FilterPipeline;
use record_filter::ingestion::{open_rows, InputSource, RecordFormat};
use record_filter::output::{open_sink, EncodeOptions, OutputTarget};
use record_filter::types::RawTargetConfig;
use record_filter::RecordFilterError;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn tmp_file(name: &str, ext: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("record-filter-{name}-{nanos}.{ext}"))
}

/// Run `column == value` over `input` and return the encoded output text.
fn run_filter(
    column: &str,
    value: &str,
    input: &Path,
    output_format: RecordFormat,
) -> Result<String, RecordFilterError> {
    let out_path = tmp_file("out", output_format.name());
    let mut cfg = FilterConfig::new(RawTargetConfig::new(column, value), fixture("events.avsc"));
    cfg.input = InputSource::Path(input.to_path_buf());
    cfg.output = OutputTarget::Path(out_path.clone());
    cfg.output_format = Some(output_format);

    let schema = cfg.load_schema()?;
    let filter = cfg.resolve_filter(&schema)?;
    let rows = open_rows(&cfg.input, None, &schema)?;
    let sink = open_sink(&cfg.output, output_format, &schema, &EncodeOptions::default())?;
    let result = FilterPipeline::new(filter).run(rows, sink);

    let text = std::fs::read_to_string(&out_path).unwrap_or_default();
    let _ = std::fs::remove_file(&out_path);
    result.map(|_| text)
}

#[test]
fn keeps_only_matching_strings_and_skips_absent_or_null() {
    let out = run_filter(
        "status",
        "active",
        &fixture("events.ndjson"),
        RecordFormat::Ndjson,
    )
    .unwrap();
    assert_eq!(
        out,
        concat!(
            r#"{"id":1,"status":"active","count":5,"score":1.5,"active":true,"ts":1700000000000}"#,
            "\n",
            r#"{"id":5,"status":"active","count":2,"score":0.25,"active":true,"ts":1700000004000,"note":"extra"}"#,
            "\n",
        )
    );
}

#[test]
fn int_column_matches_in_int_domain() {
    let out = run_filter("count", "7", &fixture("events.ndjson"), RecordFormat::Ndjson).unwrap();
    assert_eq!(out.lines().count(), 1);
    assert!(out.starts_with(r#"{"id":4,"#), "{out}");
}

#[test]
fn logical_type_column_compares_as_long() {
    let out = run_filter(
        "ts",
        "1700000002000",
        &fixture("events.ndjson"),
        RecordFormat::Ndjson,
    )
    .unwrap();
    assert_eq!(out, "{\"id\":3,\"active\":true,\"ts\":1700000002000}\n");
}

#[test]
fn boolean_literal_accepts_numeric_spelling() {
    let out = run_filter("active", "1", &fixture("events.ndjson"), RecordFormat::Ndjson).unwrap();
    let ids: Vec<&str> = out
        .lines()
        .map(|l| l.split(',').next().unwrap())
        .collect();
    assert_eq!(ids, vec![r#"{"id":1"#, r#"{"id":3"#, r#"{"id":5"#]);
}

#[test]
fn csv_in_csv_out() {
    let out = run_filter("score", "2", &fixture("events.csv"), RecordFormat::Csv).unwrap();
    assert_eq!(
        out,
        "id,status,count,score,active,ts\n2,inactive,,2,false,1700000001000\n"
    );
}

#[test]
fn csv_in_ndjson_out_keeps_empty_strings_and_nulls_other_empty_cells() {
    let out = run_filter("id", "3", &fixture("events.csv"), RecordFormat::Ndjson).unwrap();
    assert_eq!(
        out,
        "{\"id\":3,\"status\":\"\",\"count\":null,\"score\":null,\"active\":true,\"ts\":1700000002000}\n"
    );
}

#[test]
fn empty_csv_string_cell_matches_empty_literal() {
    let out = run_filter("status", "", &fixture("events.csv"), RecordFormat::Csv).unwrap();
    let ids: Vec<&str> = out
        .lines()
        .skip(1)
        .map(|l| l.split(',').next().unwrap())
        .collect();
    assert_eq!(ids, vec!["3", "4"]);
}

#[test]
fn type_mismatch_fails_with_invalid_input_and_writes_nothing() {
    let input = tmp_file("mismatch", "ndjson");
    std::fs::write(&input, "{\"id\":1,\"count\":\"5\",\"active\":true,\"ts\":0}\n").unwrap();

    let err = run_filter("count", "5", &input, RecordFormat::Ndjson).unwrap_err();
    let _ = std::fs::remove_file(&input);

    match err {
        RecordFilterError::InvalidInput { column, message } => {
            assert_eq!(column, "count");
            assert!(message.contains("found string"), "{message}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn rows_before_a_decode_error_are_kept() {
    let input = tmp_file("broken", "ndjson");
    std::fs::write(
        &input,
        "{\"id\":1,\"status\":\"active\",\"active\":true,\"ts\":0}\n{\"id\":2,\n",
    )
    .unwrap();

    let out_path = tmp_file("broken-out", "ndjson");
    let cfg = FilterConfig::new(RawTargetConfig::new("status", "active"), fixture("events.avsc"));
    let schema = cfg.load_schema().unwrap();
    let filter = cfg.resolve_filter(&schema).unwrap();
    let rows = open_rows(&InputSource::Path(input.clone()), None, &schema).unwrap();
    let sink = open_sink(
        &OutputTarget::Path(out_path.clone()),
        RecordFormat::Ndjson,
        &schema,
        &EncodeOptions::default(),
    )
    .unwrap();

    let err = FilterPipeline::new(filter).run(rows, sink).unwrap_err();
    assert!(matches!(err, RecordFilterError::Json(_)));

    let written = std::fs::read_to_string(&out_path).unwrap();
    assert_eq!(written.lines().count(), 1);
    let _ = std::fs::remove_file(&input);
    let _ = std::fs::remove_file(&out_path);
}

#[test]
fn invalid_configuration_fails_before_reading() {
    let err = run_filter("missing", "x", &fixture("events.ndjson"), RecordFormat::Ndjson)
        .unwrap_err();
    assert!(matches!(err, RecordFilterError::InvalidSchema { .. }));

    let err = run_filter("count", "seven", &fixture("events.ndjson"), RecordFormat::Ndjson)
        .unwrap_err();
    assert!(matches!(err, RecordFilterError::InvalidInput { .. }));

    let err = run_filter("id", "1", &fixture("missing.ndjson"), RecordFormat::Ndjson).unwrap_err();
    assert!(err.is_io());
}
