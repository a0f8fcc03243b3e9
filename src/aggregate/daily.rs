//! Per (location, calendar date) accumulation.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::{SampleStats, ScoredEvent};
use crate::model::{DailyAggregate, DegreeDays};

#[derive(Debug, Clone, Default, PartialEq)]
struct DailyAccumulator {
    temperatures: SampleStats,
    precipitation: f64,
    severe_events: i64,
    impacts: SampleStats,
}

impl DailyAccumulator {
    fn merge(&mut self, other: &DailyAccumulator) {
        self.temperatures.merge(&other.temperatures);
        self.precipitation += other.precipitation;
        self.severe_events += other.severe_events;
        self.impacts.merge(&other.impacts);
    }
}

#[derive(Debug, Clone, Default)]
pub struct DailyAggregator {
    days: BTreeMap<(String, NaiveDate), DailyAccumulator>,
}

impl DailyAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, event: &ScoredEvent) {
        let acc = self
            .days
            .entry((event.location_id.clone(), event.date))
            .or_default();

        if let Some(t) = event.temperature {
            acc.temperatures.add(t);
        }
        if let Some(p) = event.precipitation {
            acc.precipitation += p;
        }
        if event.is_severe() {
            acc.severe_events += 1;
        }
        acc.impacts.add(event.impact_score);
    }

    pub fn merge(&mut self, other: DailyAggregator) {
        for (key, acc) in other.days {
            self.days.entry(key).or_default().merge(&acc);
        }
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Final rows, ordered by (location, date). Degree days come from the
    /// day's mean inferred temperature; a day without one gets zero.
    pub fn finish(self) -> Vec<DailyAggregate> {
        self.days
            .into_iter()
            .map(|((location_id, date), acc)| {
                let avg_temp = acc.temperatures.mean();
                let dd = DegreeDays::from_avg_temp(avg_temp);
                DailyAggregate {
                    date,
                    location_id,
                    avg_temp,
                    min_temp: acc.temperatures.min(),
                    max_temp: acc.temperatures.max(),
                    precipitation: acc.precipitation,
                    heating_degree_days: dd.hdd,
                    cooling_degree_days: dd.cdd,
                    severe_events: acc.severe_events,
                    impact_score: acc.impacts.mean().unwrap_or(0.0),
                }
            })
            .collect()
    }
}
