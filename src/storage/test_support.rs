use duckdb::Connection;
use std::path::Path;

/// In-memory database with the schema and plain (table-only) query views.
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    super::migrations::run_migrations(&conn).unwrap();
    super::schema::setup_query_views(&conn, Path::new("/nonexistent/dock-data")).unwrap();
    conn
}

pub fn insert_station(
    conn: &Connection,
    id: i32,
    name: &str,
    borough: &str,
    community_district: Option<i32>,
    council_district: Option<i32>,
) {
    conn.execute(
        "INSERT INTO stations (id, name, borough, community_district, council_district)
         VALUES (?, ?, ?, ?, ?)",
        duckdb::params![id, name, borough, community_district, council_district],
    )
    .unwrap();
}

/// Insert one station-day row split evenly-ish: `acoustic` and `electric`
/// totals are divided into arrivals (floor half) and departures (the rest).
pub fn insert_day(
    conn: &Connection,
    station_id: i32,
    (year, month, day): (i32, u32, u32),
    acoustic: u32,
    electric: u32,
) {
    insert_day_split(
        conn,
        station_id,
        (year, month, day),
        [acoustic / 2, acoustic - acoustic / 2, electric / 2, electric - electric / 2],
    );
}

/// Insert one station-day row with explicit
/// `[acoustic_arrive, acoustic_depart, electric_arrive, electric_depart]`.
pub fn insert_day_split(
    conn: &Connection,
    station_id: i32,
    (year, month, day): (i32, u32, u32),
    counters: [u32; 4],
) {
    conn.execute(
        "INSERT INTO station_days (station_id, year, month, day,
            acoustic_arrive, acoustic_depart, electric_arrive, electric_depart)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        duckdb::params![
            station_id,
            year,
            month,
            day,
            counters[0],
            counters[1],
            counters[2],
            counters[3]
        ],
    )
    .unwrap();
}
