//! Benchmarks for field extraction and similarity scoring
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use docval::ocr::{compare_fields, extract_text_fields, string_similarity};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

fn ocr_response(fields: usize) -> Value {
    let info: Map<String, Value> = (0..fields)
        .map(|i| {
            (
                format!("field_{}", i),
                json!({"type": "text", "value": format!("Value number {} of the form", i)}),
            )
        })
        .collect();
    json!({ "information": [info], "processing_time": 1.0 })
}

fn bench_similarity(c: &mut Criterion) {
    let mut group = c.benchmark_group("similarity");

    group.bench_function("short_field", |b| {
        b.iter(|| string_similarity(black_box("Jane A. Doe"), black_box("Jane Doe")))
    });

    for len in [100, 500, 2000] {
        let a: String = "lorem ipsum dolor sit amet ".chars().cycle().take(len).collect();
        let b_text: String = "lorem ipsvm dolor sat amet ".chars().cycle().take(len).collect();

        group.throughput(Throughput::Bytes(len as u64));
        group.bench_function(format!("text_{}", len), |b| {
            b.iter(|| string_similarity(black_box(&a), black_box(&b_text)))
        });
    }

    group.finish();
}

fn bench_fields(c: &mut Criterion) {
    let mut group = c.benchmark_group("fields");

    for count in [10, 100] {
        let response = ocr_response(count);
        let user: BTreeMap<String, String> = (0..count)
            .map(|i| (format!("field_{}", i), format!("Value nr {} of the form", i)))
            .collect();

        group.throughput(Throughput::Elements(count as u64));
        group.bench_function(format!("extract_{}", count), |b| {
            b.iter(|| extract_text_fields(black_box(&response)))
        });

        let ocr = extract_text_fields(&response);
        group.bench_function(format!("compare_{}", count), |b| {
            b.iter(|| compare_fields(black_box(&user), black_box(&ocr)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_similarity, bench_fields);
criterion_main!(benches);
