//! Input schema validation.
//!
//! The weather events file must expose every column in `REQUIRED_COLUMNS`
//! (case-sensitive). A missing column is fatal and is reported before any
//! row is read.

use thiserror::Error;

/// Column names the input file must contain.
pub const REQUIRED_COLUMNS: [&str; 13] = [
    "EventId",
    "Type",
    "Severity",
    "StartTime(UTC)",
    "EndTime(UTC)",
    "Precipitation(in)",
    "TimeZone",
    "LocationLat",
    "LocationLng",
    "City",
    "County",
    "State",
    "ZipCode",
];

/// Raised when the input header lacks one or more required columns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Missing required columns: {}", .missing.join(", "))]
pub struct SchemaError {
    pub missing: Vec<String>,
}

/// Checks a header row against `REQUIRED_COLUMNS`.
pub fn validate_headers<'a, I>(headers: I) -> Result<(), SchemaError>
where
    I: IntoIterator<Item = &'a str>,
{
    let present: Vec<&str> = headers.into_iter().map(str::trim).collect();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|required| !present.contains(required))
        .map(|c| c.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(SchemaError { missing })
    }
}
