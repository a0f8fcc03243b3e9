//! Per (location, event type) accumulation.

use std::collections::BTreeMap;

use super::{SampleStats, ScoredEvent};
use crate::model::EventTypeAggregate;

#[derive(Debug, Clone, Default, PartialEq)]
struct EventTypeAccumulator {
    count: i64,
    duration_total: f64,
    severities: SampleStats,
    impacts: SampleStats,
}

#[derive(Debug, Clone, Default)]
pub struct EventTypeAggregator {
    types: BTreeMap<(String, String), EventTypeAccumulator>,
}

impl EventTypeAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, event: &ScoredEvent) {
        let key = (event.location_id.clone(), event.event_type.as_str().to_string());
        let acc = self.types.entry(key).or_default();

        acc.count += 1;
        acc.duration_total += event.duration_hours;
        acc.severities.add(event.severity.numeric());
        acc.impacts.add(event.impact_score);
    }

    pub fn merge(&mut self, other: EventTypeAggregator) {
        for (key, acc) in other.types {
            let mine = self.types.entry(key).or_default();
            mine.count += acc.count;
            mine.duration_total += acc.duration_total;
            mine.severities.merge(&acc.severities);
            mine.impacts.merge(&acc.impacts);
        }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn finish(self) -> Vec<EventTypeAggregate> {
        self.types
            .into_iter()
            .map(|((location_id, event_type), acc)| EventTypeAggregate {
                location_id,
                event_type,
                count: acc.count,
                avg_duration_hours: if acc.count > 0 {
                    acc.duration_total / acc.count as f64
                } else {
                    0.0
                },
                avg_severity: acc.severities.mean().unwrap_or(0.0),
                avg_impact_score: acc.impacts.mean().unwrap_or(0.0),
            })
            .collect()
    }
}
