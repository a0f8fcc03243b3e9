//! Per (location, year, month) accumulation.
//!
//! Monthly degree-day totals are the monthly mean rate times a fixed 30-day
//! month (`DAYS_PER_MONTH_APPROX`), whatever the real month length.
//! Severe weather is counted as distinct days, not events.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};

use super::{SampleStats, ScoredEvent};
use crate::model::{DAYS_PER_MONTH_APPROX, DegreeDays, MonthlyAggregate};

#[derive(Debug, Clone, Default, PartialEq)]
struct MonthlyAccumulator {
    temperatures: SampleStats,
    precipitation: f64,
    severe_days: BTreeSet<NaiveDate>,
    impacts: SampleStats,
}

impl MonthlyAccumulator {
    fn merge(&mut self, other: &MonthlyAccumulator) {
        self.temperatures.merge(&other.temperatures);
        self.precipitation += other.precipitation;
        self.severe_days.extend(other.severe_days.iter().copied());
        self.impacts.merge(&other.impacts);
    }
}

#[derive(Debug, Clone, Default)]
pub struct MonthlyAggregator {
    months: BTreeMap<(String, i32, u32), MonthlyAccumulator>,
}

impl MonthlyAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, event: &ScoredEvent) {
        let key = (event.location_id.clone(), event.date.year(), event.date.month());
        let acc = self.months.entry(key).or_default();

        if let Some(t) = event.temperature {
            acc.temperatures.add(t);
        }
        if let Some(p) = event.precipitation {
            acc.precipitation += p;
        }
        if event.is_severe() {
            acc.severe_days.insert(event.date);
        }
        acc.impacts.add(event.impact_score);
    }

    pub fn merge(&mut self, other: MonthlyAggregator) {
        for (key, acc) in other.months {
            self.months.entry(key).or_default().merge(&acc);
        }
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    pub fn finish(self) -> Vec<MonthlyAggregate> {
        self.months
            .into_iter()
            .map(|((location_id, year, month), acc)| {
                let avg_temp = acc.temperatures.mean();
                let totals = DegreeDays::from_avg_temp(avg_temp).scaled(DAYS_PER_MONTH_APPROX);
                MonthlyAggregate {
                    year,
                    month: month as i32,
                    location_id,
                    avg_temp,
                    total_heating_degree_days: totals.hdd,
                    total_cooling_degree_days: totals.cdd,
                    precipitation: acc.precipitation,
                    severe_event_days: acc.severe_days.len() as i64,
                    avg_impact_score: acc.impacts.mean().unwrap_or(0.0),
                }
            })
            .collect()
    }
}
