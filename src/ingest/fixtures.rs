/// Test fixtures: small weather-event CSV payloads.
///
/// The column order matches the full source dataset:
///   EventId, Type, Severity, StartTime(UTC), EndTime(UTC), Precipitation(in),
///   TimeZone, LocationLat, LocationLng, City, County, State, ZipCode
///
/// `small_events_csv` covers three locations plus one row of each common
/// failure (negative duration, bad timestamp, missing zip). Expected values:
///
///   60601_IL  2021-01-05  Cold/Extreme 3h + Snow/Heavy 12h → avg 10°F, HDD 55
///   60601_IL  2021-01-06  Cold/Moderate 4h                 → avg 30°F, HDD 35
///   90210_CA  2021-07-01  Heat/Severe 6h                   → avg 100°F, CDD 35
///   90210_CA  2021-07-02  Rain + Fog                       → no temperature
///   33101_FL  2021-07-15  Thunderstorm/Severe 2h           → no temperature

pub(crate) const SMALL_EVENTS_ROWS: usize = 10;

pub(crate) fn small_events_csv() -> &'static str {
    "EventId,Type,Severity,StartTime(UTC),EndTime(UTC),Precipitation(in),TimeZone,LocationLat,LocationLng,City,County,State,ZipCode
W-1,Cold,Extreme,2021-01-05 06:00:00,2021-01-05 09:00:00,0.00,US/Central,41.88,-87.63,Chicago,Cook,IL,60601
W-2,Snow,Heavy,2021-01-05 10:00:00,2021-01-05 22:00:00,0.45,US/Central,41.88,-87.63,Chicago,Cook,IL,60601
W-3,Cold,Moderate,2021-01-06 03:00:00,2021-01-06 07:00:00,,US/Central,41.88,-87.63,Chicago,Cook,IL,60601
W-4,Heat,Severe,2021-07-01 14:00:00,2021-07-01 20:00:00,,US/Pacific,34.09,-118.41,Beverly Hills,Los Angeles,CA,90210
W-5,Rain,Light,2021-07-02 08:00:00,2021-07-02 09:30:00,0.10,US/Pacific,34.09,-118.41,Beverly Hills,Los Angeles,CA,90210
W-6,Fog,Moderate,2021-07-02 05:00:00,2021-07-02 07:00:00,,US/Pacific,34.09,-118.41,Beverly Hills,Los Angeles,CA,90210
W-7,Rain,UNK,2021-08-10 12:00:00,2021-08-10 11:00:00,0.30,US/Pacific,34.09,-118.41,Beverly Hills,Los Angeles,CA,90210
W-8,Thunderstorm,Severe,2021-07-15 18:00:00,2021-07-15 20:00:00,0.80,US/Eastern,25.77,-80.19,Miami,Miami-Dade,FL,33101
W-9,Rain,Moderate,not-a-date,2021-07-16 01:00:00,0.20,US/Eastern,25.77,-80.19,Miami,Miami-Dade,FL,33101
W-10,Rain,Light,2021-07-16 08:00:00,2021-07-16 09:00:00,0.05,US/Eastern,25.77,-80.19,Miami,Miami-Dade,FL,
"
}

pub(crate) fn header_line() -> &'static str {
    "EventId,Type,Severity,StartTime(UTC),EndTime(UTC),Precipitation(in),TimeZone,LocationLat,LocationLng,City,County,State,ZipCode\n"
}

/// One CSV line with placeholder timezone, longitude, city and county.
#[allow(clippy::too_many_arguments)]
pub(crate) fn event_line(
    id: &str,
    event_type: &str,
    severity: &str,
    start: &str,
    end: &str,
    precipitation: &str,
    zip: &str,
    state: &str,
    latitude: &str,
) -> String {
    format!(
        "{},{},{},{},{},{},US/Central,{},-90.0,Testville,Test,{},{}\n",
        id, event_type, severity, start, end, precipitation, latitude, state, zip
    )
}
