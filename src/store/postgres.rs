/// PostgreSQL aggregate store.
///
/// Tables live in one schema (default `weather`):
///   locations, daily_weather, monthly_stats, event_stats
/// with primary keys matching each aggregate's composite key and foreign
/// keys from the three aggregate tables to `locations`.
///
/// Writes use `INSERT ... ON CONFLICT DO UPDATE` so replays converge on the
/// same rows. Each batch of `batch_size` rows runs in its own transaction
/// through one prepared statement.

use std::collections::BTreeMap;

use ::postgres::types::ToSql;
use ::postgres::{Client, Row};
use chrono::NaiveDate;

use super::{DailyDegreeDaySummary, RowCounts, StoreError, WeatherStore, YearMonth};
use crate::model::{DAYS_PER_MONTH_APPROX, DailyAggregate, DegreeDays, EventTypeAggregate, Location, MonthlyAggregate};

pub struct PgStore {
    client: Client,
    schema: String,
    batch_size: usize,
}

/// Schema names are interpolated into SQL, so only plain identifiers pass.
pub fn is_valid_schema_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

impl PgStore {
    pub fn new(client: Client, schema: &str, batch_size: usize) -> Result<Self, StoreError> {
        if !is_valid_schema_name(schema) {
            return Err(StoreError::InvalidSchemaName(schema.to_string()));
        }
        Ok(PgStore {
            client,
            schema: schema.to_string(),
            batch_size: batch_size.max(1),
        })
    }

    pub fn client(&mut self) -> &mut Client {
        &mut self.client
    }

    fn table(&self, name: &str) -> String {
        format!("{}.{}", self.schema, name)
    }

    fn upsert<T: UpsertRow>(&mut self, sql: &str, rows: &[T]) -> Result<usize, StoreError> {
        let mut written = 0;

        for batch in rows.chunks(self.batch_size) {
            let mut tx = self.client.transaction()?;
            let stmt = tx.prepare(sql)?;
            for row in batch {
                written += tx.execute(&stmt, &row.params())? as usize;
            }
            tx.commit()?;
        }

        Ok(written)
    }

    fn query_location(&mut self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<Option<Location>, StoreError> {
        let row = self.client.query_opt(sql, params)?;
        Ok(row.as_ref().map(location_from_row))
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

/// Positional parameters for an upsert statement.
trait UpsertRow {
    fn params(&self) -> Vec<&(dyn ToSql + Sync)>;
}

impl UpsertRow for Location {
    fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        vec![
            &self.location_id,
            &self.zip_code,
            &self.city,
            &self.county,
            &self.state,
            &self.latitude,
            &self.longitude,
            &self.climate_zone,
            &self.event_frequency,
        ]
    }
}

impl UpsertRow for DailyAggregate {
    fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        vec![
            &self.date,
            &self.location_id,
            &self.avg_temp,
            &self.min_temp,
            &self.max_temp,
            &self.precipitation,
            &self.heating_degree_days,
            &self.cooling_degree_days,
            &self.severe_events,
            &self.impact_score,
        ]
    }
}

impl UpsertRow for MonthlyAggregate {
    fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        vec![
            &self.year,
            &self.month,
            &self.location_id,
            &self.avg_temp,
            &self.total_heating_degree_days,
            &self.total_cooling_degree_days,
            &self.precipitation,
            &self.severe_event_days,
            &self.avg_impact_score,
        ]
    }
}

impl UpsertRow for EventTypeAggregate {
    fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        vec![
            &self.location_id,
            &self.event_type,
            &self.count,
            &self.avg_duration_hours,
            &self.avg_severity,
            &self.avg_impact_score,
        ]
    }
}

fn location_from_row(row: &Row) -> Location {
    Location {
        location_id: row.get("location_id"),
        zip_code: row.get("zip_code"),
        city: row.get("city"),
        county: row.get("county"),
        state: row.get("state"),
        latitude: row.get("latitude"),
        longitude: row.get("longitude"),
        climate_zone: row.get("climate_zone"),
        event_frequency: row.get("event_frequency"),
    }
}

fn monthly_from_row(row: &Row) -> MonthlyAggregate {
    MonthlyAggregate {
        year: row.get("year"),
        month: row.get("month"),
        location_id: row.get("location_id"),
        avg_temp: row.get("avg_temp"),
        total_heating_degree_days: row.get("total_heating_degree_days"),
        total_cooling_degree_days: row.get("total_cooling_degree_days"),
        precipitation: row.get("precipitation"),
        severe_event_days: row.get("severe_event_days"),
        avg_impact_score: row.get("avg_impact_score"),
    }
}

fn event_type_from_row(row: &Row) -> EventTypeAggregate {
    EventTypeAggregate {
        location_id: row.get("location_id"),
        event_type: row.get("event_type"),
        count: row.get("count"),
        avg_duration_hours: row.get("avg_duration"),
        avg_severity: row.get("avg_severity"),
        avg_impact_score: row.get("energy_impact_score"),
    }
}

const LOCATION_COLUMNS: &str =
    "location_id, zip_code, city, county, state, latitude, longitude, climate_zone, event_frequency";

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

impl WeatherStore for PgStore {
    fn prepare(&mut self) -> Result<(), StoreError> {
        let s = &self.schema;
        let ddl = format!(
            "CREATE SCHEMA IF NOT EXISTS {s};

             CREATE TABLE IF NOT EXISTS {s}.locations (
                 location_id     TEXT PRIMARY KEY,
                 zip_code        TEXT NOT NULL,
                 city            TEXT,
                 county          TEXT,
                 state           TEXT NOT NULL,
                 latitude        DOUBLE PRECISION,
                 longitude       DOUBLE PRECISION,
                 climate_zone    INTEGER NOT NULL,
                 event_frequency DOUBLE PRECISION NOT NULL
             );

             CREATE TABLE IF NOT EXISTS {s}.daily_weather (
                 date                DATE NOT NULL,
                 location_id         TEXT NOT NULL REFERENCES {s}.locations(location_id),
                 avg_temp            DOUBLE PRECISION,
                 min_temp            DOUBLE PRECISION,
                 max_temp            DOUBLE PRECISION,
                 precipitation       DOUBLE PRECISION NOT NULL,
                 heating_degree_days DOUBLE PRECISION NOT NULL,
                 cooling_degree_days DOUBLE PRECISION NOT NULL,
                 severe_events       BIGINT NOT NULL,
                 impact_score        DOUBLE PRECISION NOT NULL,
                 PRIMARY KEY (date, location_id)
             );

             CREATE TABLE IF NOT EXISTS {s}.monthly_stats (
                 year                      INTEGER NOT NULL,
                 month                     INTEGER NOT NULL,
                 location_id               TEXT NOT NULL REFERENCES {s}.locations(location_id),
                 avg_temp                  DOUBLE PRECISION,
                 total_heating_degree_days DOUBLE PRECISION NOT NULL,
                 total_cooling_degree_days DOUBLE PRECISION NOT NULL,
                 precipitation             DOUBLE PRECISION NOT NULL,
                 severe_event_days         BIGINT NOT NULL,
                 avg_impact_score          DOUBLE PRECISION NOT NULL,
                 PRIMARY KEY (year, month, location_id)
             );

             CREATE TABLE IF NOT EXISTS {s}.event_stats (
                 location_id         TEXT NOT NULL REFERENCES {s}.locations(location_id),
                 event_type          TEXT NOT NULL,
                 count               BIGINT NOT NULL,
                 avg_duration        DOUBLE PRECISION NOT NULL,
                 avg_severity        DOUBLE PRECISION NOT NULL,
                 energy_impact_score DOUBLE PRECISION NOT NULL,
                 PRIMARY KEY (location_id, event_type)
             );"
        );
        self.client.batch_execute(&ddl)?;
        Ok(())
    }

    fn write_locations(&mut self, rows: &[Location]) -> Result<usize, StoreError> {
        let sql = format!(
            "INSERT INTO {} ({LOCATION_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT (location_id) DO UPDATE SET
                 zip_code = EXCLUDED.zip_code,
                 city = EXCLUDED.city,
                 county = EXCLUDED.county,
                 state = EXCLUDED.state,
                 latitude = EXCLUDED.latitude,
                 longitude = EXCLUDED.longitude,
                 climate_zone = EXCLUDED.climate_zone,
                 event_frequency = EXCLUDED.event_frequency",
            self.table("locations")
        );
        self.upsert(&sql, rows)
    }

    fn write_daily(&mut self, rows: &[DailyAggregate]) -> Result<usize, StoreError> {
        let sql = format!(
            "INSERT INTO {}
                 (date, location_id, avg_temp, min_temp, max_temp, precipitation,
                  heating_degree_days, cooling_degree_days, severe_events, impact_score)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             ON CONFLICT (date, location_id) DO UPDATE SET
                 avg_temp = EXCLUDED.avg_temp,
                 min_temp = EXCLUDED.min_temp,
                 max_temp = EXCLUDED.max_temp,
                 precipitation = EXCLUDED.precipitation,
                 heating_degree_days = EXCLUDED.heating_degree_days,
                 cooling_degree_days = EXCLUDED.cooling_degree_days,
                 severe_events = EXCLUDED.severe_events,
                 impact_score = EXCLUDED.impact_score",
            self.table("daily_weather")
        );
        self.upsert(&sql, rows)
    }

    fn write_monthly(&mut self, rows: &[MonthlyAggregate]) -> Result<usize, StoreError> {
        let sql = format!(
            "INSERT INTO {}
                 (year, month, location_id, avg_temp, total_heating_degree_days,
                  total_cooling_degree_days, precipitation, severe_event_days, avg_impact_score)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT (year, month, location_id) DO UPDATE SET
                 avg_temp = EXCLUDED.avg_temp,
                 total_heating_degree_days = EXCLUDED.total_heating_degree_days,
                 total_cooling_degree_days = EXCLUDED.total_cooling_degree_days,
                 precipitation = EXCLUDED.precipitation,
                 severe_event_days = EXCLUDED.severe_event_days,
                 avg_impact_score = EXCLUDED.avg_impact_score",
            self.table("monthly_stats")
        );
        self.upsert(&sql, rows)
    }

    fn write_event_types(&mut self, rows: &[EventTypeAggregate]) -> Result<usize, StoreError> {
        let sql = format!(
            "INSERT INTO {}
                 (location_id, event_type, count, avg_duration, avg_severity, energy_impact_score)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (location_id, event_type) DO UPDATE SET
                 count = EXCLUDED.count,
                 avg_duration = EXCLUDED.avg_duration,
                 avg_severity = EXCLUDED.avg_severity,
                 energy_impact_score = EXCLUDED.energy_impact_score",
            self.table("event_stats")
        );
        self.upsert(&sql, rows)
    }

    fn create_indexes(&mut self) -> Result<(), StoreError> {
        let s = &self.schema;
        let ddl = format!(
            "CREATE INDEX IF NOT EXISTS idx_daily_weather_date ON {s}.daily_weather(date);
             CREATE INDEX IF NOT EXISTS idx_daily_weather_location ON {s}.daily_weather(location_id);
             CREATE INDEX IF NOT EXISTS idx_monthly_stats_year_month ON {s}.monthly_stats(year, month);
             CREATE INDEX IF NOT EXISTS idx_monthly_stats_location ON {s}.monthly_stats(location_id);
             CREATE INDEX IF NOT EXISTS idx_locations_state ON {s}.locations(state);
             CREATE INDEX IF NOT EXISTS idx_locations_zip ON {s}.locations(zip_code);
             CREATE INDEX IF NOT EXISTS idx_event_stats_location ON {s}.event_stats(location_id);
             CREATE INDEX IF NOT EXISTS idx_event_stats_type ON {s}.event_stats(event_type);"
        );
        self.client.batch_execute(&ddl)?;
        Ok(())
    }

    fn location(&mut self, location_id: &str) -> Result<Option<Location>, StoreError> {
        let sql = format!(
            "SELECT {LOCATION_COLUMNS} FROM {} WHERE location_id = $1",
            self.table("locations")
        );
        self.query_location(&sql, &[&location_id])
    }

    fn location_by_zip(&mut self, zip_code: &str, state: Option<&str>) -> Result<Option<Location>, StoreError> {
        let table = self.table("locations");
        match state {
            Some(state) => {
                let sql = format!(
                    "SELECT {LOCATION_COLUMNS} FROM {table}
                     WHERE zip_code = $1 AND state = $2
                     ORDER BY location_id LIMIT 1"
                );
                self.query_location(&sql, &[&zip_code, &state])
            }
            None => {
                let sql = format!(
                    "SELECT {LOCATION_COLUMNS} FROM {table}
                     WHERE zip_code = $1
                     ORDER BY location_id LIMIT 1"
                );
                self.query_location(&sql, &[&zip_code])
            }
        }
    }

    fn first_location_in_state(&mut self, state: &str) -> Result<Option<Location>, StoreError> {
        let sql = format!(
            "SELECT {LOCATION_COLUMNS} FROM {} WHERE state = $1 ORDER BY location_id LIMIT 1",
            self.table("locations")
        );
        self.query_location(&sql, &[&state])
    }

    fn first_location(&mut self) -> Result<Option<Location>, StoreError> {
        let sql = format!(
            "SELECT {LOCATION_COLUMNS} FROM {} ORDER BY location_id LIMIT 1",
            self.table("locations")
        );
        self.query_location(&sql, &[])
    }

    fn daily_degree_days(
        &mut self,
        location_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DailyDegreeDaySummary, StoreError> {
        let sql = format!(
            "SELECT
                 COALESCE(SUM(heating_degree_days), 0) AS total_hdd,
                 COALESCE(SUM(cooling_degree_days), 0) AS total_cdd,
                 COALESCE(AVG(heating_degree_days), 0) AS avg_hdd,
                 COALESCE(AVG(cooling_degree_days), 0) AS avg_cdd,
                 COUNT(*) AS days_count
             FROM {}
             WHERE location_id = $1 AND date BETWEEN $2 AND $3",
            self.table("daily_weather")
        );
        let row = self.client.query_one(&sql, &[&location_id, &start, &end])?;

        Ok(DailyDegreeDaySummary {
            total_hdd: row.get("total_hdd"),
            total_cdd: row.get("total_cdd"),
            avg_hdd: row.get("avg_hdd"),
            avg_cdd: row.get("avg_cdd"),
            days_count: row.get("days_count"),
        })
    }

    fn monthly_daily_rates(
        &mut self,
        location_id: &str,
        from: YearMonth,
        to: YearMonth,
    ) -> Result<Option<DegreeDays>, StoreError> {
        let sql = format!(
            "SELECT
                 AVG(total_heating_degree_days / $6::DOUBLE PRECISION) AS avg_daily_hdd,
                 AVG(total_cooling_degree_days / $6::DOUBLE PRECISION) AS avg_daily_cdd
             FROM {}
             WHERE location_id = $1
               AND (year, month) >= ($2, $3)
               AND (year, month) <= ($4, $5)",
            self.table("monthly_stats")
        );
        let row = self.client.query_one(
            &sql,
            &[&location_id, &from.0, &from.1, &to.0, &to.1, &DAYS_PER_MONTH_APPROX],
        )?;

        let hdd: Option<f64> = row.get("avg_daily_hdd");
        let cdd: Option<f64> = row.get("avg_daily_cdd");
        Ok(match (hdd, cdd) {
            (Some(hdd), Some(cdd)) => Some(DegreeDays { hdd, cdd }),
            _ => None,
        })
    }

    fn monthly_for_year(&mut self, location_id: &str, year: i32) -> Result<Vec<MonthlyAggregate>, StoreError> {
        let sql = format!(
            "SELECT * FROM {} WHERE location_id = $1 AND year = $2 ORDER BY month",
            self.table("monthly_stats")
        );
        let rows = self.client.query(&sql, &[&location_id, &year])?;
        Ok(rows.iter().map(monthly_from_row).collect())
    }

    fn latest_monthly_year(&mut self, location_id: &str) -> Result<Option<i32>, StoreError> {
        let sql = format!(
            "SELECT MAX(year) AS max_year FROM {} WHERE location_id = $1",
            self.table("monthly_stats")
        );
        let row = self.client.query_one(&sql, &[&location_id])?;
        Ok(row.get("max_year"))
    }

    fn monthly_degree_day_means(&mut self, location_id: &str) -> Result<BTreeMap<u32, DegreeDays>, StoreError> {
        let sql = format!(
            "SELECT month,
                    AVG(total_heating_degree_days) AS avg_hdd,
                    AVG(total_cooling_degree_days) AS avg_cdd
             FROM {}
             WHERE location_id = $1
             GROUP BY month
             ORDER BY month",
            self.table("monthly_stats")
        );
        let rows = self.client.query(&sql, &[&location_id])?;

        let mut means = BTreeMap::new();
        for row in rows {
            let month: i32 = row.get("month");
            let hdd: Option<f64> = row.get("avg_hdd");
            let cdd: Option<f64> = row.get("avg_cdd");
            means.insert(
                month as u32,
                DegreeDays {
                    hdd: hdd.unwrap_or(0.0),
                    cdd: cdd.unwrap_or(0.0),
                },
            );
        }
        Ok(means)
    }

    fn event_types(&mut self, location_id: &str) -> Result<Vec<EventTypeAggregate>, StoreError> {
        let sql = format!(
            "SELECT * FROM {} WHERE location_id = $1 ORDER BY count DESC, event_type",
            self.table("event_stats")
        );
        let rows = self.client.query(&sql, &[&location_id])?;
        Ok(rows.iter().map(event_type_from_row).collect())
    }

    fn row_counts(&mut self) -> Result<RowCounts, StoreError> {
        let mut count = |table: &str| -> Result<i64, StoreError> {
            let sql = format!("SELECT COUNT(*) FROM {}.{}", self.schema, table);
            let row = self.client.query_one(&sql, &[])?;
            Ok(row.get(0))
        };

        Ok(RowCounts {
            locations: count("locations")?,
            daily: count("daily_weather")?,
            monthly: count("monthly_stats")?,
            event_types: count("event_stats")?,
        })
    }
}
