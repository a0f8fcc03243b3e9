/// Streaming aggregation of normalized weather events.
///
/// An `AggregationContext` owns every piece of accumulation state for one
/// ingestion run: the location registry and the daily, monthly and
/// event-type aggregators. Each chunk is normalized, scored, and folded into
/// the context; nothing is written until `finish`.
///
/// Memory grows with the number of distinct (location, date) and
/// (location, year, month) keys, not with input rows. Accumulators keep
/// running statistics (count, sum, min, max) rather than sample lists.
///
/// Two contexts built over disjoint parts of the input can be combined with
/// `merge`.

pub mod daily;
pub mod event_type;
pub mod monthly;

use chrono::NaiveDate;

use crate::analysis::{impact, temperature};
use crate::ingest::normalize::{BatchResult, NormalizedEvent, RawEventRow, RowError, normalize_batch};
use crate::locations::LocationRegistry;
use crate::model::{DailyAggregate, EventType, EventTypeAggregate, Location, MonthlyAggregate, Severity};

use daily::DailyAggregator;
use event_type::EventTypeAggregator;
use monthly::MonthlyAggregator;

// ---------------------------------------------------------------------------
// Running statistics
// ---------------------------------------------------------------------------

/// Count, sum and extremes of a stream of samples.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SampleStats {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
}

impl SampleStats {
    pub fn add(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum += value;
    }

    pub fn merge(&mut self, other: &SampleStats) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = *other;
            return;
        }
        self.count += other.count;
        self.sum += other.sum;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    pub fn min(&self) -> Option<f64> {
        (self.count > 0).then_some(self.min)
    }

    pub fn max(&self) -> Option<f64> {
        (self.count > 0).then_some(self.max)
    }
}

// ---------------------------------------------------------------------------
// Scored event
// ---------------------------------------------------------------------------

/// Everything the three aggregators need from one event.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredEvent {
    pub location_id: String,
    pub date: NaiveDate,
    pub event_type: EventType,
    pub severity: Severity,
    pub duration_hours: f64,
    /// Inferred temperature; only cold and heat events carry one.
    pub temperature: Option<f64>,
    pub precipitation: Option<f64>,
    pub impact_score: f64,
}

impl ScoredEvent {
    pub fn is_severe(&self) -> bool {
        self.event_type.is_severe()
    }
}

impl From<NormalizedEvent> for ScoredEvent {
    fn from(event: NormalizedEvent) -> Self {
        let record = event.record;
        let temperature = temperature::extract_temperature(&record.event_type, &record.severity);
        let impact_score = impact::score(&record.event_type, &record.severity, event.duration_hours);
        ScoredEvent {
            location_id: event.location_id,
            date: record.date(),
            duration_hours: event.duration_hours,
            temperature,
            precipitation: record.precipitation_in,
            impact_score,
            event_type: record.event_type,
            severity: record.severity,
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregation context
// ---------------------------------------------------------------------------

/// Accumulation state for one ingestion run.
#[derive(Debug, Default)]
pub struct AggregationContext {
    locations: LocationRegistry,
    daily: DailyAggregator,
    monthly: MonthlyAggregator,
    event_types: EventTypeAggregator,
    totals: BatchResult,
}

/// Final rows produced by `AggregationContext::finish`, each list ordered by
/// its key.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateSnapshot {
    pub locations: Vec<Location>,
    pub daily: Vec<DailyAggregate>,
    pub monthly: Vec<MonthlyAggregate>,
    pub event_types: Vec<EventTypeAggregate>,
    pub totals: BatchResult,
}

impl AggregationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizes one chunk of raw rows and folds the survivors into the
    /// context. Returns the chunk's own counts; the running totals are
    /// updated as well.
    pub fn ingest_batch<I>(&mut self, rows: I) -> BatchResult
    where
        I: IntoIterator<Item = Result<RawEventRow, RowError>>,
    {
        let (events, result) = normalize_batch(rows, &mut self.locations);
        for event in events {
            self.accumulate(&ScoredEvent::from(event));
        }
        self.totals.merge(&result);
        result
    }

    /// Folds one already-scored event into the three aggregators. The
    /// event's location must already be known to the registry for the
    /// resulting rows to be persistable.
    pub fn accumulate(&mut self, event: &ScoredEvent) {
        self.daily.add(event);
        self.monthly.add(event);
        self.event_types.add(event);
    }

    /// Combines a context built over a disjoint part of the input.
    pub fn merge(&mut self, other: AggregationContext) {
        self.locations.merge(other.locations);
        self.daily.merge(other.daily);
        self.monthly.merge(other.monthly);
        self.event_types.merge(other.event_types);
        self.totals.merge(&other.totals);
    }

    pub fn totals(&self) -> &BatchResult {
        &self.totals
    }

    pub fn locations(&self) -> &LocationRegistry {
        &self.locations
    }

    pub fn location_count(&self) -> usize {
        self.locations.len()
    }

    pub fn daily_count(&self) -> usize {
        self.daily.len()
    }

    pub fn monthly_count(&self) -> usize {
        self.monthly.len()
    }

    pub fn event_type_count(&self) -> usize {
        self.event_types.len()
    }

    pub fn finish(self, nominal_span_years: f64) -> AggregateSnapshot {
        AggregateSnapshot {
            locations: self.locations.finish(nominal_span_years),
            daily: self.daily.finish(),
            monthly: self.monthly.finish(),
            event_types: self.event_types.finish(),
            totals: self.totals,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::ingest::fixtures;
    use crate::ingest::normalize::SkipReason;
    use crate::ingest::reader::EventReader;
    use crate::model::NOMINAL_SPAN_YEARS;

    /// A scored event with zero duration, no temperature or precipitation,
    /// and an impact of 1.0. Tests override fields as needed.
    pub(crate) fn scored(location_id: &str, date: NaiveDate, event_type: EventType, severity: Severity) -> ScoredEvent {
        ScoredEvent {
            location_id: location_id.to_string(),
            date,
            event_type,
            severity,
            duration_hours: 0.0,
            temperature: None,
            precipitation: None,
            impact_score: 1.0,
        }
    }

    fn fixture_context(chunk_size: usize) -> AggregationContext {
        let mut reader = EventReader::new(fixtures::small_events_csv().as_bytes()).unwrap();
        let mut ctx = AggregationContext::new();
        while let Some(chunk) = reader.next_chunk(chunk_size).unwrap() {
            ctx.ingest_batch(chunk);
        }
        ctx
    }

    #[test]
    fn test_sample_stats() {
        let mut s = SampleStats::default();
        assert_eq!(s.mean(), None);
        assert_eq!(s.min(), None);
        for v in [3.0, -1.0, 4.0] {
            s.add(v);
        }
        assert_eq!(s.count(), 3);
        assert_eq!(s.mean(), Some(2.0));
        assert_eq!(s.min(), Some(-1.0));
        assert_eq!(s.max(), Some(4.0));

        let mut empty = SampleStats::default();
        empty.merge(&s);
        assert_eq!(empty, s);
    }

    #[test]
    fn test_scored_event_from_cold_extreme() {
        let csv = format!(
            "{}{}",
            fixtures::header_line(),
            fixtures::event_line("W-1", "Cold", "Extreme", "2021-01-05 06:00:00", "2021-01-05 09:00:00", "", "60601", "IL", "41.88")
        );
        let mut reader = EventReader::new(csv.as_bytes()).unwrap();
        let chunk = reader.next_chunk(10).unwrap().unwrap();
        let mut registry = LocationRegistry::new();
        let (events, _) = normalize_batch(chunk, &mut registry);

        let scored = ScoredEvent::from(events.into_iter().next().unwrap());
        assert_eq!(scored.temperature, Some(10.0));
        assert!((scored.impact_score - 5.0625).abs() < 1e-12);
        assert_eq!(scored.date, NaiveDate::from_ymd_opt(2021, 1, 5).unwrap());
    }

    #[test]
    fn test_fixture_run_counts() {
        let ctx = fixture_context(4);
        let totals = ctx.totals();
        assert_eq!(totals.processed, 7);
        assert_eq!(totals.skipped, 3);
        assert_eq!(totals.skipped_for(SkipReason::NegativeDuration), 1);
        assert_eq!(totals.skipped_for(SkipReason::InvalidTimestamp), 1);
        assert_eq!(totals.skipped_for(SkipReason::MissingField), 1);
        assert_eq!(ctx.location_count(), 3);
        assert_eq!(ctx.daily_count(), 5);
        assert_eq!(ctx.monthly_count(), 3);
    }

    #[test]
    fn test_fixture_run_values() {
        let snapshot = fixture_context(100).finish(NOMINAL_SPAN_YEARS);

        let jan5 = snapshot
            .daily
            .iter()
            .find(|d| d.location_id == "60601_IL" && d.date == NaiveDate::from_ymd_opt(2021, 1, 5).unwrap())
            .unwrap();
        assert_eq!(jan5.avg_temp, Some(10.0));
        assert_eq!(jan5.heating_degree_days, 55.0);
        assert_eq!(jan5.severe_events, 2);
        assert!((jan5.precipitation - 0.45).abs() < 1e-12);

        let chicago_jan = snapshot
            .monthly
            .iter()
            .find(|m| m.location_id == "60601_IL")
            .unwrap();
        assert_eq!(chicago_jan.avg_temp, Some(20.0));
        assert_eq!(chicago_jan.total_heating_degree_days, 1350.0);
        assert_eq!(chicago_jan.severe_event_days, 2);

        let beverly = snapshot
            .locations
            .iter()
            .find(|l| l.location_id == "90210_CA")
            .unwrap();
        assert_eq!(beverly.climate_zone, 3);
        assert!((beverly.event_frequency - 3.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_chunk_size_does_not_change_results() {
        let one = fixture_context(1).finish(NOMINAL_SPAN_YEARS);
        let all = fixture_context(1000).finish(NOMINAL_SPAN_YEARS);
        assert_eq!(one, all);
    }

    #[test]
    fn test_merged_partial_contexts_match_single_pass() {
        let mut reader = EventReader::new(fixtures::small_events_csv().as_bytes()).unwrap();
        let first = reader.next_chunk(5).unwrap().unwrap();
        let second = reader.next_chunk(5).unwrap().unwrap();

        let mut left = AggregationContext::new();
        left.ingest_batch(first);
        let mut right = AggregationContext::new();
        right.ingest_batch(second);
        left.merge(right);

        assert_eq!(
            left.finish(NOMINAL_SPAN_YEARS),
            fixture_context(100).finish(NOMINAL_SPAN_YEARS)
        );
    }
}
