use crate::query::selector::Borough;
use duckdb::Connection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A dock location as listed in the station selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub id: i32,
    pub name: String,
    pub borough: Borough,
    pub community_district: Option<i32>,
    pub council_district: Option<i32>,
}

/// Stations keyed by borough. Every borough is present, possibly empty.
pub type StationsByBorough = BTreeMap<Borough, Vec<Station>>;

/// A (borough, district number) grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct District {
    pub borough: Borough,
    pub district: i32,
}

/// Which district column to group by.
#[derive(Debug, Clone, Copy)]
pub enum DistrictKind {
    Community,
    Council,
}

impl DistrictKind {
    const fn column_name(self) -> &'static str {
        match self {
            Self::Community => "community_district",
            Self::Council => "council_district",
        }
    }

    pub const fn cache_tag(self) -> &'static str {
        match self {
            Self::Community => "community-districts",
            Self::Council => "council-districts",
        }
    }
}

/// List all stations grouped by borough, each group sorted by name.
pub fn list_stations(conn: &Connection) -> Result<StationsByBorough, duckdb::Error> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT id, name, borough, community_district, council_district
         FROM stations_all
         ORDER BY name, id",
    )?;

    let mut grouped: StationsByBorough = Borough::ALL.into_iter().map(|b| (b, Vec::new())).collect();
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i32>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<i32>>(3)?,
            row.get::<_, Option<i32>>(4)?,
        ))
    })?;

    for row in rows {
        let (id, name, borough, community_district, council_district) = row?;
        let Ok(borough) = borough.parse::<Borough>() else {
            tracing::warn!(station_id = id, borough = %borough, "Skipping station with unknown borough");
            continue;
        };
        grouped.entry(borough).or_default().push(Station {
            id,
            name,
            borough,
            community_district,
            council_district,
        });
    }

    Ok(grouped)
}

/// List distinct districts of a kind, ordered by borough then number.
pub fn list_districts(conn: &Connection, kind: DistrictKind) -> Result<Vec<District>, duckdb::Error> {
    let col = kind.column_name();

    // Column name comes from a fixed enum.
    let sql = format!(
        "SELECT DISTINCT borough, {col}
         FROM stations_all
         WHERE {col} IS NOT NULL
         ORDER BY borough, {col}"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i32>(1)?))
    })?;

    let mut districts = Vec::new();
    for row in rows {
        let (borough, district) = row?;
        let Ok(borough) = borough.parse::<Borough>() else {
            tracing::warn!(district, borough = %borough, "Skipping district with unknown borough");
            continue;
        };
        districts.push(District { borough, district });
    }
    Ok(districts)
}

/// Community districts that contain at least one station.
pub fn list_community_districts(conn: &Connection) -> Result<Vec<District>, duckdb::Error> {
    list_districts(conn, DistrictKind::Community)
}

/// Council districts that contain at least one station.
pub fn list_council_districts(conn: &Connection) -> Result<Vec<District>, duckdb::Error> {
    list_districts(conn, DistrictKind::Council)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema::{self, STATIONS_EXPORT_DIR};
    use crate::storage::test_support::{insert_station, setup_test_db};

    #[test]
    fn test_list_stations_empty() {
        let conn = setup_test_db();
        let stations = list_stations(&conn).unwrap();
        assert_eq!(stations.len(), 4);
        assert!(stations.values().all(Vec::is_empty));
    }

    #[test]
    fn test_list_stations_grouped_and_sorted() {
        let conn = setup_test_db();
        insert_station(&conn, 3, "W 52 St & 11 Ave", "Manhattan", Some(104), Some(3));
        insert_station(&conn, 1, "Atlantic Ave & Fort Greene Pl", "Brooklyn", Some(302), Some(35));
        insert_station(&conn, 2, "Broadway & E 14 St", "Manhattan", Some(105), Some(2));

        let stations = list_stations(&conn).unwrap();
        let manhattan: Vec<_> = stations[&Borough::Manhattan]
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(manhattan, vec!["Broadway & E 14 St", "W 52 St & 11 Ave"]);
        assert_eq!(stations[&Borough::Brooklyn].len(), 1);
        assert!(stations[&Borough::Queens].is_empty());
    }

    #[test]
    fn test_list_stations_json_keys() {
        let conn = setup_test_db();
        insert_station(&conn, 1, "A", "Bronx", None, None);
        let json = serde_json::to_value(list_stations(&conn).unwrap()).unwrap();
        assert_eq!(json["Bronx"][0]["name"], "A");
        assert!(json["Queens"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_list_districts() {
        let conn = setup_test_db();
        insert_station(&conn, 1, "A", "Queens", Some(402), Some(26));
        insert_station(&conn, 2, "B", "Queens", Some(401), Some(26));
        insert_station(&conn, 3, "C", "Brooklyn", Some(301), None);
        insert_station(&conn, 4, "D", "Brooklyn", Some(301), Some(33));

        let community = list_community_districts(&conn).unwrap();
        assert_eq!(
            community,
            vec![
                District {
                    borough: Borough::Brooklyn,
                    district: 301
                },
                District {
                    borough: Borough::Queens,
                    district: 401
                },
                District {
                    borough: Borough::Queens,
                    district: 402
                },
            ]
        );

        let council = list_council_districts(&conn).unwrap();
        assert_eq!(council.len(), 2);
        assert_eq!(council[0].district, 33);
    }

    #[test]
    fn test_unknown_borough_rows_skipped() {
        let conn = setup_test_db();
        insert_station(&conn, 1, "A", "Queens", Some(401), Some(26));
        // Exports bypass the table's borough check.
        let dir = tempfile::tempdir().unwrap();
        let export_dir = dir.path().join(STATIONS_EXPORT_DIR);
        std::fs::create_dir_all(&export_dir).unwrap();
        conn.execute_batch(&format!(
            "COPY (SELECT 2 AS id, 'B' AS name, 'Staten Island' AS borough,
                          501 AS community_district, 49 AS council_district)
             TO '{}' (FORMAT PARQUET)",
            export_dir.join("stations.parquet").to_string_lossy()
        ))
        .unwrap();
        schema::setup_query_views(&conn, dir.path()).unwrap();

        let community = list_community_districts(&conn).unwrap();
        assert_eq!(
            community,
            vec![District {
                borough: Borough::Queens,
                district: 401
            }]
        );
        assert_eq!(list_council_districts(&conn).unwrap().len(), 1);

        let stations = list_stations(&conn).unwrap();
        assert_eq!(stations.values().map(Vec::len).sum::<usize>(), 1);
    }
}
