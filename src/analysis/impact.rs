//! Energy impact scoring for weather events.
//!
//! `score` maps (event type, severity, duration) onto a 0-10 scale:
//!
//! ```text
//! score = base(type) × multiplier(severity) × (0.5 + 0.5 × min(hours, 24) / 24)
//! ```
//!
//! capped at 10.0. Durations past a day add nothing further.

use crate::model::{EventType, Severity};

/// Upper bound of the impact scale.
pub const MAX_IMPACT: f64 = 10.0;

/// Duration (hours) beyond which impact stops growing.
const DURATION_CAP_HOURS: f64 = 24.0;

/// Base impact of an event type before severity and duration.
pub fn base_impact(event_type: &EventType) -> f64 {
    match event_type {
        EventType::Cold => 9.0,
        EventType::Heat => 8.5,
        EventType::Snow => 7.0,
        EventType::Thunderstorm => 6.0,
        EventType::Rain => 4.0,
        EventType::Fog => 2.0,
        EventType::Hail => 5.0,
        EventType::Wind => 3.0,
        EventType::Hurricane => 10.0,
        EventType::Tornado => 10.0,
        EventType::Precipitation => 3.5,
        EventType::Cloudy => 1.0,
        EventType::Other(_) => 1.0,
    }
}

pub fn severity_multiplier(severity: &Severity) -> f64 {
    match severity {
        Severity::Extreme => 1.0,
        Severity::Severe => 0.8,
        Severity::Heavy => 0.9,
        Severity::Moderate => 0.6,
        Severity::Light => 0.3,
        Severity::Unknown | Severity::Other(_) => 0.5,
    }
}

/// Impact score for one event. Negative durations never reach here; the
/// normalizer rejects them.
pub fn score(event_type: &EventType, severity: &Severity, duration_hours: f64) -> f64 {
    let duration_factor = duration_hours.min(DURATION_CAP_HOURS) / DURATION_CAP_HOURS;
    let raw = base_impact(event_type) * severity_multiplier(severity) * (0.5 + 0.5 * duration_factor);
    raw.min(MAX_IMPACT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cold_extreme_three_hours() {
        let s = score(&EventType::Cold, &Severity::Extreme, 3.0);
        assert!((s - 5.0625).abs() < 1e-12, "got {}", s);
    }

    #[test]
    fn test_unknown_type_and_severity_defaults() {
        // 1.0 × 0.5 × (0.5 + 0.5 × 12/24) = 0.375
        let s = score(&EventType::parse("Dust"), &Severity::parse("Biblical"), 12.0);
        assert!((s - 0.375).abs() < 1e-12, "got {}", s);
    }

    #[test]
    fn test_score_within_bounds_for_every_table_entry() {
        let types = [
            "Cold", "Heat", "Snow", "Thunderstorm", "Rain", "Fog", "Hail", "Wind",
            "Hurricane", "Tornado", "Precipitation", "Cloudy", "Other",
        ];
        let severities = ["Extreme", "Severe", "Heavy", "Moderate", "Light", "UNK", "?"];
        for t in types {
            for sev in severities {
                for hours in [0.0, 0.5, 6.0, 24.0, 240.0] {
                    let s = score(&EventType::parse(t), &Severity::parse(sev), hours);
                    assert!((0.0..=MAX_IMPACT).contains(&s), "{} {} {}h -> {}", t, sev, hours, s);
                }
            }
        }
    }

    #[test]
    fn test_monotonic_up_to_a_day_then_flat() {
        let mut previous = 0.0;
        for tenth in 0..=240 {
            let hours = tenth as f64 / 10.0;
            let s = score(&EventType::Snow, &Severity::Severe, hours);
            assert!(s >= previous, "score decreased at {}h", hours);
            previous = s;
        }
        let at_day = score(&EventType::Snow, &Severity::Severe, 24.0);
        assert_eq!(score(&EventType::Snow, &Severity::Severe, 36.0), at_day);
        assert_eq!(score(&EventType::Snow, &Severity::Severe, 1000.0), at_day);
    }

    #[test]
    fn test_hurricane_full_day_hits_cap() {
        assert_eq!(score(&EventType::Hurricane, &Severity::Extreme, 48.0), MAX_IMPACT);
    }
}
