use chrono::NaiveDate;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use dock_data::query::selector::{Borough, FilterPredicate};
use dock_data::query::series::{query_series, Granularity};
use dock_data::query::topline::query_topline;
use dock_data::storage::{migrations, schema};
use duckdb::Connection;

/// 200 stations with a row for every day of 2022 and 2023.
fn seeded_connection() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    migrations::run_migrations(&conn).unwrap();
    schema::setup_query_views(&conn, std::path::Path::new("/nonexistent/bench")).unwrap();
    conn.execute_batch(
        "INSERT INTO stations
         SELECT i, 'Station ' || i,
                CASE i % 4 WHEN 0 THEN 'Bronx' WHEN 1 THEN 'Brooklyn'
                           WHEN 2 THEN 'Manhattan' ELSE 'Queens' END,
                100 + i % 12, i % 51
         FROM range(1, 201) s(i);
         INSERT INTO station_days
         SELECT s.i, year(r.d), month(r.d), day(r.d),
                (s.i + dayofyear(r.d)) % 17, (s.i * 3 + dayofyear(r.d)) % 13,
                (s.i + dayofyear(r.d)) % 5, (s.i * 7 + dayofyear(r.d)) % 4
         FROM range(1, 201) s(i),
              range(TIMESTAMP '2022-01-01', TIMESTAMP '2024-01-01', INTERVAL 1 DAY) r(d);",
    )
    .unwrap();
    conn
}

fn bench_series(c: &mut Criterion) {
    let conn = seeded_connection();
    let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();

    let mut group = c.benchmark_group("series");
    let predicates = [
        ("station", FilterPredicate::Station(42)),
        ("borough", FilterPredicate::Borough(Borough::Manhattan)),
        ("community_district", FilterPredicate::CommunityDistrict(105)),
    ];

    for (name, predicate) in predicates {
        for granularity in [Granularity::Daily, Granularity::Monthly] {
            group.bench_with_input(
                BenchmarkId::new(name, granularity.as_str()),
                &predicate,
                |b, predicate| {
                    b.iter(|| query_series(&conn, predicate, start, end, granularity).unwrap());
                },
            );
        }
    }

    group.finish();
}

fn bench_topline(c: &mut Criterion) {
    let conn = seeded_connection();

    let mut group = c.benchmark_group("topline");
    group.bench_function("station", |b| {
        b.iter(|| query_topline(&conn, &FilterPredicate::Station(42)).unwrap());
    });
    group.bench_function("borough", |b| {
        b.iter(|| query_topline(&conn, &FilterPredicate::Borough(Borough::Queens)).unwrap());
    });
    group.finish();
}

criterion_group!(benches, bench_series, bench_topline);
criterion_main!(benches);
