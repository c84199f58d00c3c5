use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use criterion::{Criterion, criterion_group, criterion_main};
use csv_shrink::loader::{LoadOptions, load_table};
use csv_shrink::optimize::{OptimizeOptions, optimize};
use csv_shrink::type_map::derive_type_map;
use tempfile::TempDir;

fn generate_orders(rows: usize) -> (TempDir, PathBuf) {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let csv_path = temp_dir.path().join("orders.csv");
    let mut file = File::create(&csv_path).expect("create csv");
    writeln!(file, "id,quantity,price,status,customer").expect("header");
    for i in 0..rows {
        let status = match i % 3 {
            0 => "shipped",
            1 => "pending",
            _ => "processing",
        };
        let quantity = i % 50;
        let price = (i % 400) as f64 * 0.5;
        writeln!(file, "{i},{quantity},{price},{status},customer-{i}").expect("row");
    }
    (temp_dir, csv_path)
}

fn bench_optimize(c: &mut Criterion) {
    let (_dir, csv_path) = generate_orders(50_000);
    let table = load_table(&csv_path, &LoadOptions::default()).expect("load orders");
    let options = OptimizeOptions::default();
    let types = derive_type_map(&optimize(&table, &options).expect("optimize").table);

    let mut group = c.benchmark_group("optimize");
    group.sample_size(20);
    group.bench_function("optimize_in_memory", |b| {
        b.iter(|| optimize(&table, &options).expect("optimize"));
    });
    group.bench_function("load_inferred", |b| {
        b.iter(|| load_table(&csv_path, &LoadOptions::default()).expect("load"));
    });
    group.bench_function("load_with_type_map", |b| {
        let load_options = LoadOptions {
            types: Some(types.clone()),
            ..LoadOptions::default()
        };
        b.iter(|| load_table(&csv_path, &load_options).expect("load"));
    });
    group.finish();
}

criterion_group!(benches, bench_optimize);
criterion_main!(benches);
