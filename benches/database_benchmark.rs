use criterion::{black_box, criterion_group, criterion_main, Criterion, BenchmarkId};
use tabula::core::config::Config;
use tabula::core::database::Database;
use std::sync::Arc;
use std::thread;
use rand::Rng;

const CREATE_USERS: &str =
    "CREATE TABLE users (id INT PRIMARY KEY, name TEXT NOT NULL, age INT, city TEXT)";

const CITIES: [&str; 5] = ["Portland", "Lisbon", "Osaka", "Nairobi", "Quito"];

/// Helper to build an INSERT with random age and city
fn insert_statement(id: u64) -> String {
    let mut rng = rand::thread_rng();
    format!(
        "INSERT INTO users VALUES ({}, 'user_{}', {}, '{}')",
        id,
        id,
        rng.gen_range(18..90),
        CITIES[rng.gen_range(0..CITIES.len())]
    )
}

/// In-memory database holding `rows` users
fn populated(rows: u64) -> Database {
    let db = Database::in_memory();
    db.query(CREATE_USERS).unwrap();
    for id in 1..=rows {
        db.query(&insert_statement(id)).unwrap();
    }
    db
}

/// Benchmark statement parsing alone
fn bench_parse(c: &mut Criterion) {
    let parser = tabula::query::parser::SqlParser::new();
    let query = "SELECT * FROM users WHERE age > 30 AND city = 'Portland' OR name LIKE 'user_1%' ORDER BY age DESC LIMIT 10";

    c.bench_function("parse_select", |b| {
        b.iter(|| parser.parse(black_box(query)).unwrap());
    });
}

/// Benchmark single record insertion
fn bench_single_insert(c: &mut Criterion) {
    let db = Database::in_memory();
    db.query(CREATE_USERS).unwrap();

    c.bench_function("single_record_insert", |b| {
        let mut id = 1;
        b.iter(|| {
            db.query(&insert_statement(id)).unwrap();
            id += 1;
        });
    });
}

/// Benchmark insertion with the JSON file rewritten after every statement
fn bench_file_backed_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("file_backed_insert");
    group.sample_size(20);

    for existing in [0u64, 100, 1000].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(existing),
            existing,
            |b, &existing| {
                let dir = tempfile::tempdir().unwrap();
                let config = Config::default().with_data_file(dir.path().join("bench.json"));
                let db = Database::open(config).unwrap();
                db.query(CREATE_USERS).unwrap();
                for id in 1..=existing {
                    db.query(&insert_statement(id)).unwrap();
                }

                let mut id = existing + 1;
                b.iter(|| {
                    db.query(&insert_statement(id)).unwrap();
                    id += 1;
                });
            },
        );
    }

    group.finish();
}

/// Benchmark filtered, sorted selects at different table sizes
fn bench_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("select_where_order_limit");

    for rows in [100u64, 1_000, 10_000].iter() {
        let db = populated(*rows);
        group.bench_with_input(BenchmarkId::from_parameter(rows), rows, |b, _| {
            b.iter(|| {
                db.query(black_box(
                    "SELECT * FROM users WHERE age >= 30 AND age < 60 ORDER BY age DESC LIMIT 20",
                ))
                .unwrap()
            });
        });
    }

    group.finish();
}

/// Benchmark UPDATE touching a moving index bucket
fn bench_indexed_update(c: &mut Criterion) {
    let db = populated(1_000);
    db.query("CREATE INDEX ON users(city)").unwrap();

    c.bench_function("indexed_update", |b| {
        let mut rng = rand::thread_rng();
        b.iter(|| {
            let id = rng.gen_range(1..=1_000);
            let city = CITIES[rng.gen_range(0..CITIES.len())];
            db.query(&format!("UPDATE users SET city = '{}' WHERE id = {}", city, id))
                .unwrap();
        });
    });
}

/// Benchmark readers sharing one database across threads
fn bench_concurrent_reads(c: &mut Criterion) {
    let db = Arc::new(populated(1_000));

    c.bench_function("concurrent_reads_4_threads", |b| {
        b.iter(|| {
            let handles: Vec<_> = (0..4)
                .map(|t| {
                    let db = db.clone();
                    thread::spawn(move || {
                        let query = format!("SELECT * FROM users WHERE city = '{}'", CITIES[t]);
                        db.query(&query).unwrap()
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
        });
    });
}

criterion_group!(
    benches,
    bench_parse,
    bench_single_insert,
    bench_file_backed_insert,
    bench_select,
    bench_indexed_update,
    bench_concurrent_reads,
);
criterion_main!(benches);
