//! Temperature inference from event type and severity.
//!
//! The event dataset carries no thermometer readings. Only cold and heat
//! events imply a temperature, via a fixed severity step table; every other
//! event type yields no temperature signal.

use crate::model::{EventType, Severity};

/// Inferred temperature (°F) for an event, or `None` when the event type
/// carries no temperature signal.
pub fn extract_temperature(event_type: &EventType, severity: &Severity) -> Option<f64> {
    match event_type {
        EventType::Cold => Some(match severity {
            Severity::Extreme => 10.0,
            Severity::Severe => 20.0,
            Severity::Moderate => 30.0,
            _ => 40.0,
        }),
        EventType::Heat => Some(match severity {
            Severity::Extreme => 105.0,
            Severity::Severe => 100.0,
            Severity::Moderate => 95.0,
            _ => 90.0,
        }),
        _ => None,
    }
}
