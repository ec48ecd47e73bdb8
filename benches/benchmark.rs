// Performance benchmarks for schema learning, fitting and transformation
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use jsonvec_core::SparseBoolMatrix;
use jsonvec_schema::{JsonVectorizer, SchemaNode};
use rand::prelude::*;
use rand::rngs::StdRng;
use serde_json::{json, Value};

const WORDS: [&str; 8] = ["red", "blue", "green", "shirt", "hat", "coat", "sale", "new"];

fn generate_document(rng: &mut StdRng, id: usize) -> Value {
    let title: Vec<&str> = (0..rng.random_range(1..4))
        .map(|_| WORDS[rng.random_range(0..WORDS.len())])
        .collect();
    let added = format!("2023-{:02}-{:02}T12:00:00Z", rng.random_range(1..13), rng.random_range(1..29));
    let ratings: Vec<u32> = (0..rng.random_range(0..5)).map(|_| rng.random_range(1..6)).collect();
    let price = rng.random_range(1.0f64..500.0);
    let in_stock = rng.random_bool(0.7);

    let mut doc = json!({
        "id": id,
        "title": title.join(" "),
        "price": price,
        "in_stock": in_stock,
        "added": added,
        "ratings": ratings,
    });
    if rng.random_bool(0.3) {
        let seller = WORDS[rng.random_range(0..WORDS.len())];
        doc["seller"] = json!({"name": seller, "verified": rng.random_bool(0.5)});
    }
    doc
}

fn generate_documents(n: usize) -> Vec<Value> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..n).map(|i| generate_document(&mut rng, i)).collect()
}

fn benchmark_extend(c: &mut Criterion) {
    let mut group = c.benchmark_group("extend");

    for size in [100, 1000, 10000].iter() {
        let docs = generate_documents(*size);
        group.bench_with_input(BenchmarkId::new("shared_arrays", size), &docs, |b, docs| {
            b.iter(|| {
                let mut schema = SchemaNode::new(false);
                schema.extend_all(docs).unwrap();
                black_box(schema);
            });
        });
    }

    group.finish();
}

fn benchmark_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("fit");
    let docs = generate_documents(5000);

    group.bench_function("fit_5k", |b| {
        b.iter(|| {
            let mut vectorizer = JsonVectorizer::new(false);
            let n = vectorizer.fit(Some(black_box(docs.as_slice()))).unwrap();
            black_box(n);
        });
    });

    group.finish();
}

fn benchmark_transform(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform");
    let docs = generate_documents(5000);
    let mut vectorizer = JsonVectorizer::new(false);
    vectorizer.fit(Some(&docs)).unwrap();

    group.bench_function("sequential_5k", |b| {
        b.iter(|| {
            let matrix = vectorizer.transform(black_box(docs.as_slice())).unwrap();
            black_box(matrix);
        });
    });

    group.bench_function("parallel_5k", |b| {
        b.iter(|| {
            let matrix = vectorizer.par_transform(black_box(docs.as_slice()), 512).unwrap();
            black_box(matrix);
        });
    });

    group.finish();
}

fn benchmark_sparse_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("sparse_insert");

    group.bench_function("ascending", |b| {
        b.iter(|| {
            let mut matrix = SparseBoolMatrix::new(1000, 1000);
            for row in 0..1000 {
                for col in (0..1000).step_by(10) {
                    matrix.insert(row, col).unwrap();
                }
            }
            black_box(matrix);
        });
    });

    group.bench_function("descending", |b| {
        b.iter(|| {
            let mut matrix = SparseBoolMatrix::new(1000, 1000);
            for row in 0..1000 {
                for col in (0..1000).step_by(10).rev() {
                    matrix.insert(row, col).unwrap();
                }
            }
            black_box(matrix);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_extend,
    benchmark_fit,
    benchmark_transform,
    benchmark_sparse_insert
);
criterion_main!(benches);
