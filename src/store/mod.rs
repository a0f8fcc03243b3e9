/// Aggregate store: persistence for locations and the three aggregate
/// tiers, plus the range reads the query layer needs.
///
/// Two implementations share these semantics:
/// - `postgres::PgStore`  — the production store (schema `weather`)
/// - `memory::MemoryStore` — in-process maps, for dry runs and tests
///
/// Writes are idempotent upserts keyed by each entity's composite key;
/// replaying the same rows leaves the store unchanged. Aggregate rows must
/// reference an existing location.

pub mod memory;
pub mod postgres;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{DailyAggregate, DegreeDays, EventTypeAggregate, Location, MonthlyAggregate};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Postgres(#[from] ::postgres::Error),

    #[error("Aggregate row references unknown location '{0}'")]
    UnknownLocation(String),

    #[error("Invalid schema name '{0}'")]
    InvalidSchemaName(String),
}

/// Sums and means over the daily rows of one location and date range.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct DailyDegreeDaySummary {
    pub total_hdd: f64,
    pub total_cdd: f64,
    pub avg_hdd: f64,
    pub avg_cdd: f64,
    pub days_count: i64,
}

/// Row counts per table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RowCounts {
    pub locations: i64,
    pub daily: i64,
    pub monthly: i64,
    pub event_types: i64,
}

/// A (year, month) bound for monthly range reads, inclusive.
pub type YearMonth = (i32, i32);

pub trait WeatherStore {
    // -- write side ---------------------------------------------------------

    /// Creates tables if they do not exist.
    fn prepare(&mut self) -> Result<(), StoreError>;

    fn write_locations(&mut self, rows: &[Location]) -> Result<usize, StoreError>;

    fn write_daily(&mut self, rows: &[DailyAggregate]) -> Result<usize, StoreError>;

    fn write_monthly(&mut self, rows: &[MonthlyAggregate]) -> Result<usize, StoreError>;

    fn write_event_types(&mut self, rows: &[EventTypeAggregate]) -> Result<usize, StoreError>;

    /// Secondary indexes for the range reads below. Safe to call repeatedly.
    fn create_indexes(&mut self) -> Result<(), StoreError>;

    // -- read side ----------------------------------------------------------

    fn location(&mut self, location_id: &str) -> Result<Option<Location>, StoreError>;

    /// First location (by id) with this zip, optionally restricted to a state.
    fn location_by_zip(&mut self, zip_code: &str, state: Option<&str>) -> Result<Option<Location>, StoreError>;

    /// First location (by id) in the state.
    fn first_location_in_state(&mut self, state: &str) -> Result<Option<Location>, StoreError>;

    /// First location (by id) overall.
    fn first_location(&mut self) -> Result<Option<Location>, StoreError>;

    /// Degree-day sums and means over daily rows with `start <= date <= end`.
    fn daily_degree_days(
        &mut self,
        location_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DailyDegreeDaySummary, StoreError>;

    /// Mean daily degree-day rate (`monthly total / 30`) across monthly rows
    /// between two (year, month) bounds inclusive. `None` when no rows match.
    fn monthly_daily_rates(
        &mut self,
        location_id: &str,
        from: YearMonth,
        to: YearMonth,
    ) -> Result<Option<DegreeDays>, StoreError>;

    /// One year of monthly rows, ordered by month.
    fn monthly_for_year(&mut self, location_id: &str, year: i32) -> Result<Vec<MonthlyAggregate>, StoreError>;

    fn latest_monthly_year(&mut self, location_id: &str) -> Result<Option<i32>, StoreError>;

    /// Per calendar month (1-12), the mean monthly HDD and CDD totals across
    /// all years. Months with no rows are absent.
    fn monthly_degree_day_means(&mut self, location_id: &str) -> Result<BTreeMap<u32, DegreeDays>, StoreError>;

    /// Event-type rows ordered by count descending, then type.
    fn event_types(&mut self, location_id: &str) -> Result<Vec<EventTypeAggregate>, StoreError>;

    fn row_counts(&mut self) -> Result<RowCounts, StoreError>;
}

/// True when `(year, month)` lies within `from..=to`.
pub fn year_month_in_range(year: i32, month: i32, from: YearMonth, to: YearMonth) -> bool {
    (year, month) >= from && (year, month) <= to
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_month_range_spans_year_boundary() {
        let from = (2020, 11);
        let to = (2021, 2);
        assert!(year_month_in_range(2020, 11, from, to));
        assert!(year_month_in_range(2020, 12, from, to));
        assert!(year_month_in_range(2021, 1, from, to));
        assert!(year_month_in_range(2021, 2, from, to));
        assert!(!year_month_in_range(2020, 10, from, to));
        assert!(!year_month_in_range(2021, 3, from, to));
        assert!(!year_month_in_range(2019, 12, from, to));
    }
}
