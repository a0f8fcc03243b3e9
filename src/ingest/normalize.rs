//! Record normalization: raw CSV rows → typed `WeatherEventRecord`s.
//!
//! Each raw row is checked for its required fields, its instants are parsed,
//! and its optional numeric fields are validated. Rows that fail are skipped
//! and tallied in a `BatchResult` by reason; nothing here is fatal.
//!
//! Rows whose end instant precedes their start are rejected as
//! `NegativeDuration` rather than scored with a negative duration.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::locations::LocationRegistry;
use crate::model::{EventType, Severity, WeatherEventRecord};

// ---------------------------------------------------------------------------
// Raw row
// ---------------------------------------------------------------------------

/// One row of the weather events file, exactly as read. Every field is
/// optional here; `normalize_row` decides what is required.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawEventRow {
    #[serde(rename = "EventId")]
    pub event_id: Option<String>,
    #[serde(rename = "Type")]
    pub event_type: Option<String>,
    #[serde(rename = "Severity")]
    pub severity: Option<String>,
    #[serde(rename = "StartTime(UTC)")]
    pub start_time: Option<String>,
    #[serde(rename = "EndTime(UTC)")]
    pub end_time: Option<String>,
    #[serde(rename = "Precipitation(in)")]
    pub precipitation: Option<String>,
    #[serde(rename = "TimeZone")]
    pub timezone: Option<String>,
    #[serde(rename = "LocationLat")]
    pub latitude: Option<String>,
    #[serde(rename = "LocationLng")]
    pub longitude: Option<String>,
    #[serde(rename = "City")]
    pub city: Option<String>,
    #[serde(rename = "County")]
    pub county: Option<String>,
    #[serde(rename = "State")]
    pub state: Option<String>,
    #[serde(rename = "ZipCode")]
    pub zip_code: Option<String>,
}

// ---------------------------------------------------------------------------
// Row errors
// ---------------------------------------------------------------------------

/// Category of a skipped row, used as the tally key in `BatchResult`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingField,
    InvalidTimestamp,
    InvalidNumber,
    NegativeDuration,
    MalformedRow,
}

/// Why a single row could not contribute to aggregation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowError {
    #[error("missing required field {0}")]
    MissingField(&'static str),
    #[error("unparseable timestamp in {field}: '{value}'")]
    InvalidTimestamp { field: &'static str, value: String },
    #[error("non-numeric value in {field}: '{value}'")]
    InvalidNumber { field: &'static str, value: String },
    #[error("end time precedes start time ({hours:.2}h)")]
    NegativeDuration { hours: f64 },
    #[error("malformed row: {0}")]
    Malformed(String),
}

impl RowError {
    pub fn reason(&self) -> SkipReason {
        match self {
            RowError::MissingField(_) => SkipReason::MissingField,
            RowError::InvalidTimestamp { .. } => SkipReason::InvalidTimestamp,
            RowError::InvalidNumber { .. } => SkipReason::InvalidNumber,
            RowError::NegativeDuration { .. } => SkipReason::NegativeDuration,
            RowError::Malformed(_) => SkipReason::MalformedRow,
        }
    }
}

// ---------------------------------------------------------------------------
// Batch result
// ---------------------------------------------------------------------------

/// Outcome counts for one batch (or, merged, for a whole run).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub processed: usize,
    pub skipped: usize,
    pub skip_reasons: BTreeMap<SkipReason, usize>,
}

impl BatchResult {
    pub fn record_skip(&mut self, error: &RowError) {
        self.skipped += 1;
        *self.skip_reasons.entry(error.reason()).or_insert(0) += 1;
    }

    pub fn merge(&mut self, other: &BatchResult) {
        self.processed += other.processed;
        self.skipped += other.skipped;
        for (reason, count) in &other.skip_reasons {
            *self.skip_reasons.entry(*reason).or_insert(0) += count;
        }
    }

    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.skip_reasons.get(&reason).copied().unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Normalized event
// ---------------------------------------------------------------------------

/// A validated record bound to its resolved location.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedEvent {
    pub record: WeatherEventRecord,
    pub location_id: String,
    pub duration_hours: f64,
}

// ---------------------------------------------------------------------------
// Field parsing
// ---------------------------------------------------------------------------

/// Returns the trimmed field, treating blank as absent.
fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn required<'a>(field: &'a Option<String>, name: &'static str) -> Result<&'a str, RowError> {
    present(field).ok_or(RowError::MissingField(name))
}

fn optional_string(field: &Option<String>) -> Option<String> {
    present(field).map(str::to_string)
}

fn optional_number(field: &Option<String>, name: &'static str) -> Result<Option<f64>, RowError> {
    match present(field) {
        None => Ok(None),
        Some(raw) => match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(RowError::InvalidNumber {
                field: name,
                value: raw.to_string(),
            }),
        },
    }
}

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parses a UTC instant. Accepts the dataset's `YYYY-MM-DD HH:MM:SS` form,
/// its ISO `T` variant, and RFC 3339 with an explicit offset (converted to
/// UTC).
pub fn parse_instant(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    for format in TIMESTAMP_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_utc())
}

fn instant(field: &Option<String>, name: &'static str) -> Result<NaiveDateTime, RowError> {
    let raw = required(field, name)?;
    parse_instant(raw).ok_or_else(|| RowError::InvalidTimestamp {
        field: name,
        value: raw.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Validates and types a single raw row.
pub fn normalize_row(raw: &RawEventRow) -> Result<WeatherEventRecord, RowError> {
    let event_type = required(&raw.event_type, "Type")?;
    let severity = required(&raw.severity, "Severity")?;
    let zip_code = required(&raw.zip_code, "ZipCode")?;
    let state = required(&raw.state, "State")?;

    let start = instant(&raw.start_time, "StartTime(UTC)")?;
    let end = instant(&raw.end_time, "EndTime(UTC)")?;
    if end < start {
        return Err(RowError::NegativeDuration {
            hours: (end - start).num_seconds() as f64 / 3600.0,
        });
    }

    Ok(WeatherEventRecord {
        event_id: optional_string(&raw.event_id),
        event_type: EventType::parse(event_type),
        severity: Severity::parse(severity),
        start,
        end,
        precipitation_in: optional_number(&raw.precipitation, "Precipitation(in)")?,
        timezone: optional_string(&raw.timezone),
        latitude: optional_number(&raw.latitude, "LocationLat")?,
        longitude: optional_number(&raw.longitude, "LocationLng")?,
        city: optional_string(&raw.city),
        county: optional_string(&raw.county),
        state: state.to_string(),
        zip_code: zip_code.to_string(),
    })
}

/// Normalizes a batch, resolving each surviving record's location.
///
/// Entries that are already `Err` (rows the reader could not decode) are
/// tallied as skips alongside rows that fail validation.
pub fn normalize_batch<I>(
    rows: I,
    registry: &mut LocationRegistry,
) -> (Vec<NormalizedEvent>, BatchResult)
where
    I: IntoIterator<Item = Result<RawEventRow, RowError>>,
{
    let mut events = Vec::new();
    let mut result = BatchResult::default();

    for row in rows {
        let record = match row.and_then(|raw| normalize_row(&raw)) {
            Ok(record) => record,
            Err(e) => {
                log::warn!("Skipping weather event row: {}", e);
                result.record_skip(&e);
                continue;
            }
        };

        let location_id = registry.resolve(&record);
        let duration_hours = record.duration_hours();
        events.push(NormalizedEvent {
            record,
            location_id,
            duration_hours,
        });
        result.processed += 1;
    }

    (events, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn raw() -> RawEventRow {
        RawEventRow {
            event_id: Some("W-1".to_string()),
            event_type: Some("Cold".to_string()),
            severity: Some("Extreme".to_string()),
            start_time: Some("2021-01-05 06:00:00".to_string()),
            end_time: Some("2021-01-05 09:00:00".to_string()),
            precipitation: Some("0.12".to_string()),
            timezone: Some("US/Central".to_string()),
            latitude: Some("41.88".to_string()),
            longitude: Some("-87.63".to_string()),
            city: Some("Chicago".to_string()),
            county: Some("Cook".to_string()),
            state: Some("IL".to_string()),
            zip_code: Some("60601".to_string()),
        }
    }

    #[test]
    fn test_normalize_row_types_every_field() {
        let record = normalize_row(&raw()).expect("row should normalize");
        assert_eq!(record.event_type, EventType::Cold);
        assert_eq!(record.severity, Severity::Extreme);
        assert_eq!(record.precipitation_in, Some(0.12));
        assert_eq!(record.latitude, Some(41.88));
        assert_eq!(record.duration_hours(), 3.0);
        assert_eq!(record.date(), NaiveDate::from_ymd_opt(2021, 1, 5).unwrap());
    }

    #[test]
    fn test_missing_required_fields_are_skipped() {
        for (name, blank) in [
            ("Type", RawEventRow { event_type: None, ..raw() }),
            ("Severity", RawEventRow { severity: Some("  ".to_string()), ..raw() }),
            ("ZipCode", RawEventRow { zip_code: None, ..raw() }),
            ("State", RawEventRow { state: None, ..raw() }),
            ("StartTime(UTC)", RawEventRow { start_time: None, ..raw() }),
            ("EndTime(UTC)", RawEventRow { end_time: Some(String::new()), ..raw() }),
        ] {
            assert_eq!(normalize_row(&blank), Err(RowError::MissingField(name)));
        }
    }

    #[test]
    fn test_optional_fields_may_be_absent() {
        let sparse = RawEventRow {
            event_id: None,
            precipitation: None,
            timezone: None,
            latitude: None,
            longitude: None,
            city: None,
            county: None,
            ..raw()
        };
        let record = normalize_row(&sparse).expect("optional fields are optional");
        assert_eq!(record.precipitation_in, None);
        assert_eq!(record.latitude, None);
    }

    #[test]
    fn test_unparseable_values_are_row_errors() {
        let bad_time = RawEventRow { start_time: Some("yesterday".to_string()), ..raw() };
        assert_eq!(normalize_row(&bad_time).unwrap_err().reason(), SkipReason::InvalidTimestamp);

        let bad_precip = RawEventRow { precipitation: Some("lots".to_string()), ..raw() };
        assert_eq!(normalize_row(&bad_precip).unwrap_err().reason(), SkipReason::InvalidNumber);

        let nan_lat = RawEventRow { latitude: Some("NaN".to_string()), ..raw() };
        assert_eq!(normalize_row(&nan_lat).unwrap_err().reason(), SkipReason::InvalidNumber);
    }

    #[test]
    fn test_end_before_start_is_rejected() {
        let reversed = RawEventRow {
            start_time: Some("2021-01-05 09:00:00".to_string()),
            end_time: Some("2021-01-05 06:00:00".to_string()),
            ..raw()
        };
        assert_eq!(
            normalize_row(&reversed),
            Err(RowError::NegativeDuration { hours: -3.0 })
        );
    }

    #[test]
    fn test_parse_instant_formats() {
        let expected = NaiveDate::from_ymd_opt(2016, 1, 6).unwrap().and_hms_opt(23, 14, 0).unwrap();
        assert_eq!(parse_instant("2016-01-06 23:14:00"), Some(expected));
        assert_eq!(parse_instant("2016-01-06T23:14:00"), Some(expected));
        assert_eq!(parse_instant("2016-01-06T17:14:00-06:00"), Some(expected));
        assert_eq!(parse_instant("2016-01-06 23:14:00.000"), Some(expected));
        assert_eq!(parse_instant("06/01/2016"), None);
    }

    #[test]
    fn test_normalize_batch_counts_processed_and_skipped() {
        let mut registry = LocationRegistry::new();
        let rows = vec![
            Ok(raw()),
            Ok(RawEventRow { zip_code: None, ..raw() }),
            Err(RowError::Malformed("field count".to_string())),
            Ok(RawEventRow { state: Some("WI".to_string()), ..raw() }),
        ];

        let (events, result) = normalize_batch(rows, &mut registry);

        assert_eq!(events.len(), 2);
        assert_eq!(result.processed, 2);
        assert_eq!(result.skipped, 2);
        assert_eq!(result.skipped_for(SkipReason::MissingField), 1);
        assert_eq!(result.skipped_for(SkipReason::MalformedRow), 1);
        assert_eq!(events[0].location_id, "60601_IL");
        assert_eq!(events[1].location_id, "60601_WI");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_batch_result_merge() {
        let mut total = BatchResult::default();
        let mut a = BatchResult { processed: 3, ..Default::default() };
        a.record_skip(&RowError::MissingField("Type"));
        let mut b = BatchResult { processed: 1, ..Default::default() };
        b.record_skip(&RowError::MissingField("State"));
        b.record_skip(&RowError::NegativeDuration { hours: -1.0 });

        total.merge(&a);
        total.merge(&b);
        assert_eq!(total.processed, 4);
        assert_eq!(total.skipped, 3);
        assert_eq!(total.skipped_for(SkipReason::MissingField), 2);
        assert_eq!(total.skipped_for(SkipReason::NegativeDuration), 1);
    }
}
