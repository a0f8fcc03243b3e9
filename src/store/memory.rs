/// In-process aggregate store.
///
/// Holds the four tables in ordered maps keyed exactly like their
/// PostgreSQL primary keys, so upserts replace in place and reads come back
/// in key order. Foreign keys are enforced on write.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::{DailyDegreeDaySummary, RowCounts, StoreError, WeatherStore, YearMonth, year_month_in_range};
use crate::aggregate::SampleStats;
use crate::model::{DAYS_PER_MONTH_APPROX, DailyAggregate, DegreeDays, EventTypeAggregate, Location, MonthlyAggregate};

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    locations: BTreeMap<String, Location>,
    daily: BTreeMap<(String, NaiveDate), DailyAggregate>,
    monthly: BTreeMap<(String, i32, i32), MonthlyAggregate>,
    event_types: BTreeMap<(String, String), EventTypeAggregate>,
    indexed: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn indexes_created(&self) -> bool {
        self.indexed
    }

    pub fn all_locations(&self) -> impl Iterator<Item = &Location> {
        self.locations.values()
    }

    pub fn all_daily(&self) -> impl Iterator<Item = &DailyAggregate> {
        self.daily.values()
    }

    pub fn all_monthly(&self) -> impl Iterator<Item = &MonthlyAggregate> {
        self.monthly.values()
    }

    pub fn all_event_types(&self) -> impl Iterator<Item = &EventTypeAggregate> {
        self.event_types.values()
    }

    fn check_location(&self, location_id: &str) -> Result<(), StoreError> {
        if self.locations.contains_key(location_id) {
            Ok(())
        } else {
            Err(StoreError::UnknownLocation(location_id.to_string()))
        }
    }
}

impl WeatherStore for MemoryStore {
    fn prepare(&mut self) -> Result<(), StoreError> {
        Ok(())
    }

    fn write_locations(&mut self, rows: &[Location]) -> Result<usize, StoreError> {
        for row in rows {
            self.locations.insert(row.location_id.clone(), row.clone());
        }
        Ok(rows.len())
    }

    fn write_daily(&mut self, rows: &[DailyAggregate]) -> Result<usize, StoreError> {
        for row in rows {
            self.check_location(&row.location_id)?;
            self.daily.insert((row.location_id.clone(), row.date), row.clone());
        }
        Ok(rows.len())
    }

    fn write_monthly(&mut self, rows: &[MonthlyAggregate]) -> Result<usize, StoreError> {
        for row in rows {
            self.check_location(&row.location_id)?;
            self.monthly
                .insert((row.location_id.clone(), row.year, row.month), row.clone());
        }
        Ok(rows.len())
    }

    fn write_event_types(&mut self, rows: &[EventTypeAggregate]) -> Result<usize, StoreError> {
        for row in rows {
            self.check_location(&row.location_id)?;
            self.event_types
                .insert((row.location_id.clone(), row.event_type.clone()), row.clone());
        }
        Ok(rows.len())
    }

    fn create_indexes(&mut self) -> Result<(), StoreError> {
        self.indexed = true;
        Ok(())
    }

    fn location(&mut self, location_id: &str) -> Result<Option<Location>, StoreError> {
        Ok(self.locations.get(location_id).cloned())
    }

    fn location_by_zip(&mut self, zip_code: &str, state: Option<&str>) -> Result<Option<Location>, StoreError> {
        Ok(self
            .locations
            .values()
            .find(|l| l.zip_code == zip_code && state.is_none_or(|s| l.state == s))
            .cloned())
    }

    fn first_location_in_state(&mut self, state: &str) -> Result<Option<Location>, StoreError> {
        Ok(self.locations.values().find(|l| l.state == state).cloned())
    }

    fn first_location(&mut self) -> Result<Option<Location>, StoreError> {
        Ok(self.locations.values().next().cloned())
    }

    fn daily_degree_days(
        &mut self,
        location_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DailyDegreeDaySummary, StoreError> {
        if end < start {
            return Ok(DailyDegreeDaySummary::default());
        }

        let from = (location_id.to_string(), start);
        let to = (location_id.to_string(), end);
        let mut hdd = SampleStats::default();
        let mut cdd = SampleStats::default();
        for row in self.daily.range(from..=to).map(|(_, row)| row) {
            hdd.add(row.heating_degree_days);
            cdd.add(row.cooling_degree_days);
        }

        let days = hdd.count();
        Ok(DailyDegreeDaySummary {
            total_hdd: hdd.sum(),
            total_cdd: cdd.sum(),
            avg_hdd: hdd.mean().unwrap_or(0.0),
            avg_cdd: cdd.mean().unwrap_or(0.0),
            days_count: days as i64,
        })
    }

    fn monthly_daily_rates(
        &mut self,
        location_id: &str,
        from: YearMonth,
        to: YearMonth,
    ) -> Result<Option<DegreeDays>, StoreError> {
        let mut hdd = SampleStats::default();
        let mut cdd = SampleStats::default();
        for row in self.monthly.values().filter(|m| {
            m.location_id == location_id && year_month_in_range(m.year, m.month, from, to)
        }) {
            hdd.add(row.total_heating_degree_days / DAYS_PER_MONTH_APPROX);
            cdd.add(row.total_cooling_degree_days / DAYS_PER_MONTH_APPROX);
        }

        Ok(match (hdd.mean(), cdd.mean()) {
            (Some(hdd), Some(cdd)) => Some(DegreeDays { hdd, cdd }),
            _ => None,
        })
    }

    fn monthly_for_year(&mut self, location_id: &str, year: i32) -> Result<Vec<MonthlyAggregate>, StoreError> {
        Ok(self
            .monthly
            .values()
            .filter(|m| m.location_id == location_id && m.year == year)
            .cloned()
            .collect())
    }

    fn latest_monthly_year(&mut self, location_id: &str) -> Result<Option<i32>, StoreError> {
        Ok(self
            .monthly
            .values()
            .filter(|m| m.location_id == location_id)
            .map(|m| m.year)
            .max())
    }

    fn monthly_degree_day_means(&mut self, location_id: &str) -> Result<BTreeMap<u32, DegreeDays>, StoreError> {
        let mut by_month: BTreeMap<u32, (SampleStats, SampleStats)> = BTreeMap::new();
        for row in self.monthly.values().filter(|m| m.location_id == location_id) {
            let (hdd, cdd) = by_month.entry(row.month as u32).or_default();
            hdd.add(row.total_heating_degree_days);
            cdd.add(row.total_cooling_degree_days);
        }

        Ok(by_month
            .into_iter()
            .map(|(month, (hdd, cdd))| {
                (
                    month,
                    DegreeDays {
                        hdd: hdd.mean().unwrap_or(0.0),
                        cdd: cdd.mean().unwrap_or(0.0),
                    },
                )
            })
            .collect())
    }

    fn event_types(&mut self, location_id: &str) -> Result<Vec<EventTypeAggregate>, StoreError> {
        let mut rows: Vec<EventTypeAggregate> = self
            .event_types
            .values()
            .filter(|e| e.location_id == location_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.event_type.cmp(&b.event_type)));
        Ok(rows)
    }

    fn row_counts(&mut self) -> Result<RowCounts, StoreError> {
        Ok(RowCounts {
            locations: self.locations.len() as i64,
            daily: self.daily.len() as i64,
            monthly: self.monthly.len() as i64,
            event_types: self.event_types.len() as i64,
        })
    }
}
