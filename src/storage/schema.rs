use duckdb::Connection;
use std::path::Path;

/// SQL statement to create the stations table.
pub const CREATE_STATIONS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS stations (
    id                  INTEGER PRIMARY KEY,
    name                VARCHAR NOT NULL,
    borough             VARCHAR NOT NULL
                        CHECK (borough IN ('Bronx', 'Brooklyn', 'Manhattan', 'Queens')),
    community_district  INTEGER,
    council_district    INTEGER
)
";

/// SQL statement to create the per-station, per-day aggregate table.
///
/// Month is 1-based. The primary key enforces at most one row per station
/// per calendar day.
pub const CREATE_STATION_DAYS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS station_days (
    station_id       INTEGER NOT NULL,
    year             INTEGER NOT NULL,
    month            INTEGER NOT NULL,
    day              INTEGER NOT NULL,
    acoustic_arrive  INTEGER NOT NULL DEFAULT 0,
    acoustic_depart  INTEGER NOT NULL DEFAULT 0,
    electric_arrive  INTEGER NOT NULL DEFAULT 0,
    electric_depart  INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (station_id, year, month, day)
)
";

/// Subdirectory of the data dir holding Parquet station exports.
pub const STATIONS_EXPORT_DIR: &str = "stations";
/// Subdirectory of the data dir holding Parquet station-day exports.
pub const STATION_DAYS_EXPORT_DIR: &str = "station_days";

const STATION_COLUMNS: &str = "id, name, borough, community_district, council_district";
const STATION_KEY: &str = "id";
const STATION_DAY_COLUMNS: &str = "station_id, year, month, day, \
     acoustic_arrive, acoustic_depart, electric_arrive, electric_depart";
const STATION_DAY_KEY: &str = "station_id, year, month, day";

/// Initialize the database schema.
pub fn init_schema(conn: &Connection) -> Result<(), duckdb::Error> {
    conn.execute_batch(CREATE_STATIONS_TABLE)?;
    conn.execute_batch(CREATE_STATION_DAYS_TABLE)?;
    Ok(())
}

/// Create (or replace) the `stations_all` and `station_days_all` views that
/// every query reads from.
///
/// Each view is the backing table, unioned with any Parquet exports found
/// under `data_dir`, keeping one row per key: a table row shadows an exported
/// row with the same key. Call again after the offline pipeline drops new files.
pub fn setup_query_views(conn: &Connection, data_dir: &Path) -> Result<(), duckdb::Error> {
    let stations = view_sql(
        "stations_all",
        "stations",
        STATION_COLUMNS,
        STATION_KEY,
        &data_dir.join(STATIONS_EXPORT_DIR),
    );
    let station_days = view_sql(
        "station_days_all",
        "station_days",
        STATION_DAY_COLUMNS,
        STATION_DAY_KEY,
        &data_dir.join(STATION_DAYS_EXPORT_DIR),
    );
    conn.execute_batch(&stations)?;
    conn.execute_batch(&station_days)?;
    Ok(())
}

fn view_sql(view: &str, table: &str, columns: &str, key: &str, export_dir: &Path) -> String {
    if contains_parquet(export_dir) {
        // read_parquet does not accept bind parameters; the path comes from config.
        let pattern = export_dir
            .join("**")
            .join("*.parquet")
            .to_string_lossy()
            .replace('\'', "''");
        format!(
            "CREATE OR REPLACE VIEW {view} AS
             SELECT {columns} FROM (
                 SELECT {columns}, 0 AS source_rank FROM {table}
                 UNION ALL
                 SELECT {columns}, 1 AS source_rank
                 FROM read_parquet('{pattern}', union_by_name = true)
             )
             QUALIFY row_number() OVER (PARTITION BY {key} ORDER BY source_rank) = 1"
        )
    } else {
        format!("CREATE OR REPLACE VIEW {view} AS SELECT {columns} FROM {table}")
    }
}

/// Returns `true` if `dir` contains at least one `.parquet` file at any depth.
fn contains_parquet(dir: &Path) -> bool {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return false;
    };
    entries.filter_map(Result::ok).any(|entry| {
        let path = entry.path();
        if path.is_dir() {
            contains_parquet(&path)
        } else {
            path.extension().is_some_and(|ext| ext == "parquet")
        }
    })
}
