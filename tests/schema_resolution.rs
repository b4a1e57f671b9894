use std::path::{Path, PathBuf};

use record_filter::config::{read_schema_file, SCHEMA_FILE_SIZE_MAX_DEFAULT};
use record_filter::schema::{resolve_column_type, Schema};
use record_filter::types::PrimitiveType;
use record_filter::RecordFilterError;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load(name: &str) -> String {
    read_schema_file(&fixture(name), SCHEMA_FILE_SIZE_MAX_DEFAULT).unwrap()
}

#[test]
fn events_columns_resolve() {
    let schema = Schema::parse(&load("events.avsc")).unwrap();
    assert_eq!(schema.name, "Event");

    let columns = schema.columns().unwrap();
    let summary: Vec<(&str, PrimitiveType, bool)> = columns
        .iter()
        .map(|c| (c.name.as_str(), c.data_type, c.nullable))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("id", PrimitiveType::Int64, false),
            ("status", PrimitiveType::String, true),
            ("count", PrimitiveType::Int32, true),
            ("score", PrimitiveType::Float64, true),
            ("active", PrimitiveType::Bool, false),
            ("ts", PrimitiveType::Int64, false),
        ]
    );
}

#[test]
fn shapes_map_to_resolution_errors() {
    let text = load("shapes.avsc");

    assert_eq!(resolve_column_type(&text, "name").unwrap(), PrimitiveType::String);
    assert_eq!(
        resolve_column_type(&text, "maybe_long").unwrap(),
        PrimitiveType::Int64
    );

    for column in ["tags", "kind", "attrs"] {
        let err = resolve_column_type(&text, column).unwrap_err();
        assert!(
            matches!(err, RecordFilterError::InvalidField { column: ref c, .. } if c == column),
            "{column}: {err}"
        );
    }

    assert!(matches!(
        resolve_column_type(&text, "nested_union"),
        Err(RecordFilterError::InvalidUnion { .. })
    ));
    assert!(matches!(
        resolve_column_type(&text, "payload"),
        Err(RecordFilterError::InvalidType { .. })
    ));
    // The first primitive alternative wins, even when it is null.
    match resolve_column_type(&text, "null_first") {
        Err(RecordFilterError::InvalidType { name }) => assert_eq!(name, "null"),
        other => panic!("unexpected resolution: {other:?}"),
    }
    assert!(matches!(
        resolve_column_type(&text, "nope"),
        Err(RecordFilterError::InvalidSchema { .. })
    ));

    // A schema with unresolvable fields has no flat column layout.
    assert!(Schema::parse(&text).unwrap().columns().is_err());
}

#[test]
fn non_record_documents_are_invalid_schema() {
    for text in [
        "not json",
        r#""string""#,
        r#"{"type":"array","items":"int"}"#,
        r#"{"type":"enum","name":"K","symbols":["A"]}"#,
        r#"{"type":"record","name":"R"}"#,
    ] {
        assert!(
            matches!(Schema::parse(text), Err(RecordFilterError::InvalidSchema { .. })),
            "{text}"
        );
    }
}

#[test]
fn record_documents_parse() {
    let text = r#"{"type":"record","name":"R","fields":[{"name":"a","type":"int"}]}"#;
    let schema = Schema::parse(text).unwrap();
    assert_eq!(schema.name, "R");
    assert_eq!(schema.resolve_column("a").unwrap(), PrimitiveType::Int32);
}
