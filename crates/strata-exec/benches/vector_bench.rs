//! Vector and UNNEST benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use strata_common::config::DatabaseConfig;
use strata_common::STANDARD_VECTOR_SIZE;
use strata_exec::connection::Database;
use strata_exec::expression::parsed::{col, func, lit};
use strata_exec::logical::LogicalPlanBuilder;
use strata_exec::types::{LogicalType, Value};
use strata_exec::vector::{SelectionVector, Vector, VectorBuilder};

fn int_list(len: i32) -> Value {
    Value::list((0..len).map(Value::Integer))
}

fn list_vector() -> Vector {
    let list_type = LogicalType::list(LogicalType::Integer);
    let mut builder = VectorBuilder::with_capacity(&list_type, STANDARD_VECTOR_SIZE);
    for i in 0..STANDARD_VECTOR_SIZE {
        if i % 16 == 0 {
            builder.push_null();
        } else {
            builder.push(&int_list(8)).unwrap();
        }
    }
    builder.finish()
}

fn vector_slice_benchmark(c: &mut Criterion) {
    let vector = list_vector();
    let selection: SelectionVector = (0..STANDARD_VECTOR_SIZE).step_by(2).collect();

    c.bench_function("vector_slice_1024", |b| {
        b.iter(|| black_box(vector.slice(&selection).unwrap().len()))
    });
}

fn vector_flatten_benchmark(c: &mut Criterion) {
    let vector = list_vector();
    let selection: SelectionVector = (0..STANDARD_VECTOR_SIZE).rev().collect();
    let sliced = vector.slice(&selection).unwrap();

    c.bench_function("vector_flatten_1024", |b| {
        b.iter(|| black_box(sliced.flatten().unwrap().len()))
    });
}

fn vector_build_benchmark(c: &mut Criterion) {
    c.bench_function("vector_build_lists_1024", |b| b.iter(|| black_box(list_vector().len())));
}

fn unnest_benchmark(c: &mut Criterion) {
    let db = Database::open(DatabaseConfig::default()).unwrap();
    let conn = db.connect();
    let rows = (0..256).map(|i| vec![lit(i), lit(int_list(32))]).collect();
    let plan = LogicalPlanBuilder::values(&["k", "l"], rows)
        .unwrap()
        .select(vec![col("k"), func("unnest", vec![col("l")])])
        .unwrap()
        .build();

    c.bench_function("unnest_256x32", |b| {
        b.iter(|| black_box(conn.query(&plan).row_count()))
    });
}

criterion_group!(
    benches,
    vector_slice_benchmark,
    vector_flatten_benchmark,
    vector_build_benchmark,
    unnest_benchmark,
);
criterion_main!(benches);
