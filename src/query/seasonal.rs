//! Seasonal adjustment factors and weather-normalized consumption.
//!
//! A month's factor is its combined (HDD + CDD) mean divided by the mean of
//! all twelve months, clamped to `[FACTOR_MIN, FACTOR_MAX]`. Months without
//! stored data use a northern-hemisphere placeholder.

use std::collections::BTreeMap;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use super::{QueryError, parse_date};
use crate::model::DegreeDays;
use crate::store::WeatherStore;

pub const FACTOR_MIN: f64 = 0.6;
pub const FACTOR_MAX: f64 = 1.8;

/// Placeholder monthly HDD/CDD for a month with no stored rows.
pub fn seasonal_placeholder(month: u32) -> DegreeDays {
    let (hdd, cdd) = match month {
        12 | 1 | 2 => (20.0, 0.0),
        6..=8 => (0.0, 20.0),
        _ => (10.0, 5.0),
    };
    DegreeDays { hdd, cdd }
}

/// Factors for months 1-12 from per-month degree-day means.
pub fn adjustment_factors_from_means(means: &BTreeMap<u32, DegreeDays>) -> BTreeMap<u32, f64> {
    let combined: BTreeMap<u32, f64> = (1..=12)
        .map(|month| {
            let dd = means
                .get(&month)
                .copied()
                .unwrap_or_else(|| seasonal_placeholder(month));
            (month, dd.combined())
        })
        .collect();

    let average = combined.values().sum::<f64>() / 12.0;

    combined
        .into_iter()
        .map(|(month, value)| {
            let factor = if average > 0.0 { value / average } else { 1.0 };
            (month, factor.clamp(FACTOR_MIN, FACTOR_MAX))
        })
        .collect()
}

pub fn get_seasonal_adjustment_factors<S>(store: &mut S, location_id: &str) -> Result<BTreeMap<u32, f64>, QueryError>
where
    S: WeatherStore + ?Sized,
{
    let means = store.monthly_degree_day_means(location_id)?;
    log::debug!(
        "Adjustment factors for {}: {} of 12 months from stored data",
        location_id,
        means.len()
    );
    Ok(adjustment_factors_from_means(&means))
}

/// One point of an external consumption series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionPoint {
    pub date: String,
    pub value: f64,
}

/// A consumption point with its month's factor applied. Points whose date
/// does not parse pass through with `error` set and no factor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedPoint {
    pub date: String,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather_factor: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn normalize_series(series: &[ConsumptionPoint], factors: &BTreeMap<u32, f64>) -> Vec<NormalizedPoint> {
    series
        .iter()
        .map(|point| match parse_date(&point.date) {
            Some(date) => {
                let factor = factors.get(&date.month()).copied().unwrap_or(1.0);
                NormalizedPoint {
                    date: point.date.clone(),
                    value: point.value,
                    weather_factor: Some(factor),
                    normalized_value: Some(point.value / factor),
                    error: None,
                }
            }
            None => {
                log::warn!("Cannot normalize consumption point with date '{}'", point.date);
                NormalizedPoint {
                    date: point.date.clone(),
                    value: point.value,
                    weather_factor: None,
                    normalized_value: None,
                    error: Some(format!("invalid date '{}', expected YYYY-MM-DD", point.date)),
                }
            }
        })
        .collect()
}

pub fn calculate_weather_normalized_consumption<S>(
    store: &mut S,
    series: &[ConsumptionPoint],
    location_id: &str,
) -> Result<Vec<NormalizedPoint>, QueryError>
where
    S: WeatherStore + ?Sized,
{
    let factors = get_seasonal_adjustment_factors(store, location_id)?;
    Ok(normalize_series(series, &factors))
}
