use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use record_filter::execution::CancellationToken;
use record_filter::ingestion::JsonRowReader;
use record_filter::processing::resolve;
use record_filter::schema::Schema;
use record_filter::types::{PrimitiveType, RawTargetConfig, Row};

const SCHEMA: &str = r#"{"type":"record","name":"Event","fields":[
    {"name":"id","type":"long"},
    {"name":"status","type":"string"},
    {"name":"count","type":["int","null"]}
]}"#;

fn rows(n: usize) -> Vec<Row> {
    (0..n)
        .map(|i| {
            Row::new()
                .with("id", i as i64)
                .with("status", if i % 3 == 0 { "active" } else { "inactive" })
                .with("count", (i % 10) as i32)
        })
        .collect()
}

fn ndjson(n: usize) -> String {
    (0..n)
        .map(|i| {
            let status = if i % 3 == 0 { "active" } else { "inactive" };
            format!("{{\"id\":{i},\"status\":\"{status}\",\"count\":{}}}\n", i % 10)
        })
        .collect()
}

#[inline(never)]
fn count_matches(filter: &record_filter::processing::Filter, input: &[Row]) -> usize {
    filter
        .apply(&CancellationToken::new(), input.iter().cloned().map(Ok))
        .filter(|r| r.is_ok())
        .count()
}

fn filter_in_memory(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_in_memory");
    let by_status = resolve(
        PrimitiveType::String,
        &RawTargetConfig::new("status", "active"),
    )
    .unwrap();
    let by_count = resolve(PrimitiveType::Int32, &RawTargetConfig::new("count", "7")).unwrap();

    for n in [1_000usize, 10_000] {
        let input = rows(n);
        group.bench_with_input(BenchmarkId::new("string", n), &input, |b, input| {
            b.iter(|| black_box(count_matches(&by_status, input)));
        });
        group.bench_with_input(BenchmarkId::new("int", n), &input, |b, input| {
            b.iter(|| black_box(count_matches(&by_count, input)));
        });
    }
    group.finish();
}

fn filter_ndjson(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_ndjson");
    let schema = Schema::parse(SCHEMA).unwrap();
    let filter = resolve(
        PrimitiveType::String,
        &RawTargetConfig::new("status", "active"),
    )
    .unwrap();

    for n in [1_000usize, 10_000] {
        let text = ndjson(n);
        group.bench_with_input(BenchmarkId::new("decode_and_filter", n), &text, |b, text| {
            b.iter(|| {
                let decoded = JsonRowReader::new(text.as_bytes(), &schema);
                black_box(filter.apply(&CancellationToken::new(), decoded).count())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, filter_in_memory, filter_ndjson);
criterion_main!(benches);
