//! HVAC energy estimate from degree days.
//!
//! ```text
//! heating kWh = HDD × sqft × 1.5 BTU / 3412 / efficiency
//! cooling kWh = CDD × sqft × 2.0 BTU / 3412 / efficiency
//! ```
//!
//! Savings compare the current system against one 0.2 more efficient,
//! capped at 0.95.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::estimator::{DegreeDayEstimate, get_degree_days};
use super::{DateRange, QueryError};
use crate::store::WeatherStore;

pub const HEATING_BTU_PER_SQFT_DD: f64 = 1.5;
pub const COOLING_BTU_PER_SQFT_DD: f64 = 2.0;
pub const BTU_PER_KWH: f64 = 3412.0;
pub const PRICE_PER_KWH: f64 = 0.14;
pub const DEFAULT_EFFICIENCY: f64 = 0.8;
pub const DEFAULT_SQUARE_FOOTAGE: f64 = 2000.0;
pub const MAX_EFFICIENCY: f64 = 0.95;
pub const EFFICIENCY_UPGRADE: f64 = 0.2;
/// Upgrade cost assumed for the ROI ratio.
pub const UPGRADE_COST_PER_SQFT: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HvacParameters {
    pub efficiency: f64,
    pub square_footage: f64,
}

impl Default for HvacParameters {
    fn default() -> Self {
        HvacParameters {
            efficiency: DEFAULT_EFFICIENCY,
            square_footage: DEFAULT_SQUARE_FOOTAGE,
        }
    }
}

impl HvacParameters {
    /// Efficiency used in the calculation; non-positive input falls back to
    /// the default.
    pub fn effective_efficiency(&self) -> f64 {
        if self.efficiency > 0.0 {
            self.efficiency
        } else {
            DEFAULT_EFFICIENCY
        }
    }

    /// Efficiency after an upgrade, capped at `MAX_EFFICIENCY`. A system
    /// already above the cap compares against the cap, so its savings go
    /// negative.
    pub fn improved_efficiency(&self) -> f64 {
        (self.effective_efficiency() + EFFICIENCY_UPGRADE).min(MAX_EFFICIENCY)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HvacImpact {
    pub degree_days: DegreeDayEstimate,
    pub period: DateRange,
    pub system_efficiency: f64,
    pub square_footage: f64,
    pub heating_energy_kwh: f64,
    pub cooling_energy_kwh: f64,
    pub total_energy_kwh: f64,
    pub estimated_annual_cost: f64,
    pub potential_kwh_savings: f64,
    pub potential_annual_savings: f64,
    pub efficiency_upgrade_roi: f64,
}

fn energy_kwh(degree_days: f64, btu_per_sqft: f64, sqft: f64, efficiency: f64) -> f64 {
    degree_days * sqft * btu_per_sqft / BTU_PER_KWH / efficiency
}

pub fn hvac_impact_from_degree_days(
    degree_days: DegreeDayEstimate,
    params: HvacParameters,
    period: DateRange,
) -> HvacImpact {
    let sqft = params.square_footage;
    let current = params.effective_efficiency();
    let improved = params.improved_efficiency();

    let heating = energy_kwh(degree_days.total_hdd, HEATING_BTU_PER_SQFT_DD, sqft, current);
    let cooling = energy_kwh(degree_days.total_cdd, COOLING_BTU_PER_SQFT_DD, sqft, current);
    let total = heating + cooling;

    let improved_total = energy_kwh(degree_days.total_hdd, HEATING_BTU_PER_SQFT_DD, sqft, improved)
        + energy_kwh(degree_days.total_cdd, COOLING_BTU_PER_SQFT_DD, sqft, improved);
    let kwh_savings = total - improved_total;
    let dollar_savings = kwh_savings * PRICE_PER_KWH;

    let upgrade_cost = sqft * UPGRADE_COST_PER_SQFT;
    let roi = if upgrade_cost > 0.0 {
        dollar_savings / upgrade_cost
    } else {
        0.0
    };

    HvacImpact {
        degree_days,
        period,
        system_efficiency: current,
        square_footage: sqft,
        heating_energy_kwh: heating,
        cooling_energy_kwh: cooling,
        total_energy_kwh: total,
        estimated_annual_cost: total * PRICE_PER_KWH,
        potential_kwh_savings: kwh_savings,
        potential_annual_savings: dollar_savings,
        efficiency_upgrade_roi: roi,
    }
}

/// HVAC estimate for `location_id`. Without a period, covers the trailing
/// year ending today.
pub fn get_weather_impact_for_hvac<S>(
    store: &mut S,
    location_id: &str,
    params: HvacParameters,
    period: Option<DateRange>,
) -> Result<HvacImpact, QueryError>
where
    S: WeatherStore + ?Sized,
{
    let period = period.unwrap_or_else(|| DateRange::trailing_year(Utc::now().date_naive()));
    let degree_days = get_degree_days(store, location_id, &period)?;
    Ok(hvac_impact_from_degree_days(degree_days, params, period))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::estimator::generic_tier;
    use chrono::NaiveDate;

    fn period() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2021, 12, 31).unwrap(),
        )
        .unwrap()
    }

    fn degree_days(hdd: f64, cdd: f64) -> DegreeDayEstimate {
        DegreeDayEstimate {
            total_hdd: hdd,
            total_cdd: cdd,
            ..generic_tier(365)
        }
    }

    #[test]
    fn test_energy_conversion() {
        let params = HvacParameters {
            efficiency: 1.0,
            square_footage: 3412.0,
        };
        let impact = hvac_impact_from_degree_days(degree_days(100.0, 50.0), params, period());
        assert!((impact.heating_energy_kwh - 150.0).abs() < 1e-9);
        assert!((impact.cooling_energy_kwh - 100.0).abs() < 1e-9);
        assert!((impact.total_energy_kwh - 250.0).abs() < 1e-9);
        assert!((impact.estimated_annual_cost - 35.0).abs() < 1e-9);
    }

    #[test]
    fn test_savings_and_roi() {
        let params = HvacParameters {
            efficiency: 0.5,
            square_footage: 3412.0,
        };
        // Current: 100 HDD → 100 * 3412 * 1.5 / 3412 / 0.5 = 300 kWh
        // Improved (0.7): 150 / 0.7 kWh
        let impact = hvac_impact_from_degree_days(degree_days(100.0, 0.0), params, period());
        let expected_savings = 300.0 - 150.0 / 0.7;
        assert!((impact.potential_kwh_savings - expected_savings).abs() < 1e-9);
        assert!((impact.potential_annual_savings - expected_savings * 0.14).abs() < 1e-9);
        assert!((impact.efficiency_upgrade_roi - expected_savings * 0.14 / (3412.0 * 1.5)).abs() < 1e-12);
    }

    #[test]
    fn test_efficiency_fallbacks() {
        let zero = HvacParameters {
            efficiency: 0.0,
            square_footage: 2000.0,
        };
        assert_eq!(zero.effective_efficiency(), DEFAULT_EFFICIENCY);

        let high = HvacParameters {
            efficiency: 0.9,
            square_footage: 2000.0,
        };
        assert_eq!(high.improved_efficiency(), MAX_EFFICIENCY);
    }

    #[test]
    fn test_efficiency_above_cap_reports_negative_savings() {
        let above_cap = HvacParameters {
            efficiency: 0.98,
            square_footage: 2000.0,
        };
        assert_eq!(above_cap.improved_efficiency(), MAX_EFFICIENCY);

        let impact = hvac_impact_from_degree_days(degree_days(100.0, 100.0), above_cap, period());
        assert!(impact.potential_kwh_savings < 0.0);
        assert!(impact.potential_annual_savings < 0.0);
        assert!(impact.efficiency_upgrade_roi < 0.0);
    }

    #[test]
    fn test_zero_square_footage_has_zero_roi() {
        let params = HvacParameters {
            efficiency: 0.8,
            square_footage: 0.0,
        };
        let impact = hvac_impact_from_degree_days(degree_days(100.0, 100.0), params, period());
        assert_eq!(impact.total_energy_kwh, 0.0);
        assert_eq!(impact.efficiency_upgrade_roi, 0.0);
    }
}
