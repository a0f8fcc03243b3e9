//! Degree-day estimation over an arbitrary date range.
//!
//! Four tiers, tried strictly in order: the data tiers in `TIER_ORDER`, then
//! the generic rates. The first that produces an answer wins and tiers are
//! never blended:
//!
//! | tier             | needs                              | `is_estimated` | `estimation_method` |
//! |------------------|------------------------------------|----------------|---------------------|
//! | `Exact`          | daily rows in range                | false          | —                   |
//! | `MonthlyAverage` | monthly rows overlapping the range | true           | `monthly_average`   |
//! | `ClimateZone`    | a known location                   | true           | `climate_zone`      |
//! | `Generic`        | nothing                            | true           | `generic`           |
//!
//! Each tier is split into a store read and a pure function over what was
//! read, so the tier logic is testable without a store.

use serde::{Deserialize, Serialize};

use super::{DateRange, QueryError};
use crate::model::{DegreeDays, Location};
use crate::store::{DailyDegreeDaySummary, StoreError, WeatherStore};

/// Daily rates used when nothing is known about the location.
pub const GENERIC_DAILY_RATES: DegreeDays = DegreeDays { hdd: 5.0, cdd: 3.0 };

/// Typical daily HDD/CDD for each climate zone (1 = hot … 5 = cold).
pub fn climate_zone_daily_rates(zone: i32) -> Option<DegreeDays> {
    let (hdd, cdd) = match zone {
        1 => (0.5, 8.0),
        2 => (2.0, 5.0),
        3 => (5.0, 3.0),
        4 => (8.0, 1.0),
        5 => (12.0, 0.5),
        _ => return None,
    };
    Some(DegreeDays { hdd, cdd })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimationMethod {
    /// Labels the second-tier result, scaled from stored monthly totals.
    MonthlyAverage,
    ClimateZone,
    Generic,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DegreeDayEstimate {
    pub total_hdd: f64,
    pub total_cdd: f64,
    pub avg_hdd: f64,
    pub avg_cdd: f64,
    pub days_count: i64,
    pub is_estimated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimation_method: Option<EstimationMethod>,
}

impl DegreeDayEstimate {
    /// An estimate from constant daily rates over `days`.
    fn from_rates(rates: DegreeDays, days: i64, method: EstimationMethod) -> Self {
        let total = rates.scaled(days as f64);
        DegreeDayEstimate {
            total_hdd: total.hdd,
            total_cdd: total.cdd,
            avg_hdd: rates.hdd,
            avg_cdd: rates.cdd,
            days_count: days,
            is_estimated: true,
            estimation_method: Some(method),
        }
    }
}

// ---------------------------------------------------------------------------
// Pure tier functions
// ---------------------------------------------------------------------------

pub fn exact_tier(summary: &DailyDegreeDaySummary) -> Option<DegreeDayEstimate> {
    (summary.days_count > 0).then(|| DegreeDayEstimate {
        total_hdd: summary.total_hdd,
        total_cdd: summary.total_cdd,
        avg_hdd: summary.avg_hdd,
        avg_cdd: summary.avg_cdd,
        days_count: summary.days_count,
        is_estimated: false,
        estimation_method: None,
    })
}

pub fn monthly_average_tier(daily_rates: Option<DegreeDays>, days: i64) -> Option<DegreeDayEstimate> {
    daily_rates.map(|rates| DegreeDayEstimate::from_rates(rates, days, EstimationMethod::MonthlyAverage))
}

pub fn climate_zone_tier(location: Option<&Location>, days: i64) -> Option<DegreeDayEstimate> {
    let rates = climate_zone_daily_rates(location?.climate_zone)?;
    Some(DegreeDayEstimate::from_rates(rates, days, EstimationMethod::ClimateZone))
}

pub fn generic_tier(days: i64) -> DegreeDayEstimate {
    DegreeDayEstimate::from_rates(GENERIC_DAILY_RATES, days, EstimationMethod::Generic)
}

// ---------------------------------------------------------------------------
// Tier chain
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimationTier {
    Exact,
    MonthlyAverage,
    ClimateZone,
}

/// Tiers that need stored data. `generic_tier` answers when none of them can.
pub const TIER_ORDER: [EstimationTier; 3] = [
    EstimationTier::Exact,
    EstimationTier::MonthlyAverage,
    EstimationTier::ClimateZone,
];

impl EstimationTier {
    /// Reads this tier's inputs and applies its estimate.
    pub fn attempt<S>(
        self,
        store: &mut S,
        location_id: &str,
        range: &DateRange,
    ) -> Result<Option<DegreeDayEstimate>, StoreError>
    where
        S: WeatherStore + ?Sized,
    {
        let days = range.days();
        Ok(match self {
            EstimationTier::Exact => {
                let summary = store.daily_degree_days(location_id, range.start, range.end)?;
                exact_tier(&summary)
            }
            EstimationTier::MonthlyAverage => {
                let rates = store.monthly_daily_rates(location_id, range.first_month(), range.last_month())?;
                monthly_average_tier(rates, days)
            }
            EstimationTier::ClimateZone => {
                let location = store.location(location_id)?;
                climate_zone_tier(location.as_ref(), days)
            }
        })
    }
}

/// Degree days for `location_id` over `range`, from the most accurate tier
/// with data.
pub fn get_degree_days<S>(
    store: &mut S,
    location_id: &str,
    range: &DateRange,
) -> Result<DegreeDayEstimate, QueryError>
where
    S: WeatherStore + ?Sized,
{
    for tier in TIER_ORDER {
        if let Some(estimate) = tier.attempt(store, location_id, range)? {
            log::debug!("Degree days for {} answered by {:?} tier", location_id, tier);
            return Ok(estimate);
        }
        log::debug!("Degree days for {}: {:?} tier has no data", location_id, tier);
    }
    log::debug!("Degree days for {} answered by generic rates", location_id);
    Ok(generic_tier(range.days()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(zone: i32) -> Location {
        Location {
            location_id: "90210_CA".to_string(),
            zip_code: "90210".to_string(),
            city: None,
            county: None,
            state: "CA".to_string(),
            latitude: None,
            longitude: None,
            climate_zone: zone,
            event_frequency: 0.0,
        }
    }

    #[test]
    fn test_exact_tier_needs_rows() {
        assert_eq!(exact_tier(&DailyDegreeDaySummary::default()), None);

        let summary = DailyDegreeDaySummary {
            total_hdd: 0.0,
            total_cdd: 45.0,
            avg_hdd: 0.0,
            avg_cdd: 15.0,
            days_count: 3,
        };
        let est = exact_tier(&summary).unwrap();
        assert!(!est.is_estimated);
        assert_eq!(est.estimation_method, None);
        assert_eq!(est.total_cdd, 45.0);
    }

    #[test]
    fn test_monthly_tier_scales_rate_by_range_length() {
        let est = monthly_average_tier(Some(DegreeDays { hdd: 1.5, cdd: 15.0 }), 10).unwrap();
        assert_eq!(est.total_hdd, 15.0);
        assert_eq!(est.total_cdd, 150.0);
        assert_eq!(est.avg_cdd, 15.0);
        assert_eq!(est.days_count, 10);
        assert!(est.is_estimated);
        assert_eq!(est.estimation_method, Some(EstimationMethod::MonthlyAverage));
        assert_eq!(monthly_average_tier(None, 10), None);
    }

    #[test]
    fn test_climate_zone_table() {
        for (zone, hdd, cdd) in [(1, 0.5, 8.0), (2, 2.0, 5.0), (3, 5.0, 3.0), (4, 8.0, 1.0), (5, 12.0, 0.5)] {
            let est = climate_zone_tier(Some(&location(zone)), 31).unwrap();
            assert_eq!(est.avg_hdd, hdd);
            assert_eq!(est.avg_cdd, cdd);
            assert_eq!(est.total_hdd, hdd * 31.0);
            assert_eq!(est.estimation_method, Some(EstimationMethod::ClimateZone));
        }
        assert_eq!(climate_zone_tier(None, 31), None);
        assert_eq!(climate_zone_tier(Some(&location(9)), 31), None);
    }

    #[test]
    fn test_generic_tier() {
        let est = generic_tier(30);
        assert_eq!(est.total_hdd, 150.0);
        assert_eq!(est.total_cdd, 90.0);
        assert_eq!(est.estimation_method, Some(EstimationMethod::Generic));
    }

    #[test]
    fn test_tier_order() {
        assert_eq!(
            TIER_ORDER,
            [
                EstimationTier::Exact,
                EstimationTier::MonthlyAverage,
                EstimationTier::ClimateZone,
            ]
        );
    }

    #[test]
    fn test_estimation_method_serializes_snake_case() {
        let json = serde_json::to_value(generic_tier(1)).unwrap();
        assert_eq!(json["estimation_method"], "generic");
        let exact = serde_json::to_value(exact_tier(&DailyDegreeDaySummary { days_count: 1, ..Default::default() })).unwrap();
        assert!(exact.get("estimation_method").is_none());
    }
}
