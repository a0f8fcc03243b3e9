/// Per-event scoring used by the aggregators.
///
/// Submodules:
/// - `temperature` — temperature inferred from cold/heat events
/// - `impact`      — 0-10 energy impact score

pub mod impact;
pub mod temperature;
