/// HTTP endpoint for the weather query API
///
/// Thin JSON surface over `query`, for dashboards and external analysis
/// tools. Routing is a pure function of (method, url, body) so it can be
/// exercised against any `WeatherStore` without a socket.
///
/// Endpoints:
/// - GET  /health
/// - GET  /locations/nearest?zip=&state=
/// - GET  /degree-days/{location_id}?start=&end=
/// - GET  /profile/{location_id}?year=
/// - GET  /adjustment-factors/{location_id}
/// - GET  /hvac-impact/{location_id}?efficiency=&sqft=&start=&end=
/// - POST /normalize/{location_id}   body: [{"date": "YYYY-MM-DD", "value": n}, …]

use std::collections::HashMap;
use std::io::Read;

use serde_json::{Value, json};
use thiserror::Error;

use crate::query::{
    self, ConsumptionPoint, DateRange, HvacParameters, QueryError, parse_date,
};
use crate::store::WeatherStore;

const AVAILABLE_ENDPOINTS: [&str; 7] = [
    "GET /health",
    "GET /locations/nearest?zip=&state=",
    "GET /degree-days/{location_id}?start=&end=",
    "GET /profile/{location_id}?year=",
    "GET /adjustment-factors/{location_id}",
    "GET /hvac-impact/{location_id}?efficiency=&sqft=&start=&end=",
    "POST /normalize/{location_id}",
];

#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),
}

impl EndpointError {
    pub fn status_code(&self) -> u16 {
        match self {
            EndpointError::BadRequest(_) | EndpointError::Json(_) => 400,
            EndpointError::Query(QueryError::InvalidRange { .. }) => 400,
            EndpointError::NotFound(_) => 404,
            EndpointError::Query(QueryError::Store(_)) => 500,
        }
    }
}

// ---------------------------------------------------------------------------
// Request parsing
// ---------------------------------------------------------------------------

/// Splits `url` into its path and percent-decoded query parameters.
pub fn parse_url(url: &str) -> Result<(&str, HashMap<String, String>), EndpointError> {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));
    let mut params = HashMap::new();

    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let value = urlencoding::decode(value)
            .map_err(|_| EndpointError::BadRequest(format!("Query parameter '{}' is not valid UTF-8", key)))?;
        params.insert(key.to_string(), value.into_owned());
    }

    Ok((path, params))
}

/// The location id following `prefix`, percent-decoded.
fn path_id(path: &str, prefix: &str) -> Result<String, EndpointError> {
    let raw = path.trim_start_matches(prefix).trim_end_matches('/');
    if raw.is_empty() || raw.contains('/') {
        return Err(EndpointError::NotFound(format!("No route for {}", path)));
    }
    urlencoding::decode(raw)
        .map(|id| id.into_owned())
        .map_err(|_| EndpointError::BadRequest("Location id is not valid UTF-8".to_string()))
}

fn date_param(params: &HashMap<String, String>, key: &str) -> Result<Option<chrono::NaiveDate>, EndpointError> {
    match params.get(key) {
        None => Ok(None),
        Some(raw) => parse_date(raw)
            .map(Some)
            .ok_or_else(|| EndpointError::BadRequest(format!("'{}' must be YYYY-MM-DD, got '{}'", key, raw))),
    }
}

fn number_param<T: std::str::FromStr>(params: &HashMap<String, String>, key: &str) -> Result<Option<T>, EndpointError> {
    match params.get(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| EndpointError::BadRequest(format!("'{}' must be a number, got '{}'", key, raw))),
    }
}

/// `start`/`end` parameters as a range. Both or neither must be given.
fn range_params(params: &HashMap<String, String>) -> Result<Option<DateRange>, EndpointError> {
    match (date_param(params, "start")?, date_param(params, "end")?) {
        (Some(start), Some(end)) => Ok(Some(DateRange::new(start, end)?)),
        (None, None) => Ok(None),
        _ => Err(EndpointError::BadRequest("'start' and 'end' must be given together".to_string())),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn handle_health() -> Value {
    json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    })
}

fn handle_nearest<S: WeatherStore + ?Sized>(
    store: &mut S,
    params: &HashMap<String, String>,
) -> Result<Value, EndpointError> {
    let zip = params
        .get("zip")
        .ok_or_else(|| EndpointError::BadRequest("'zip' is required".to_string()))?;
    let location = query::find_nearest_location(store, zip, params.get("state").map(String::as_str))?
        .ok_or_else(|| EndpointError::NotFound("No locations stored".to_string()))?;
    Ok(serde_json::to_value(location)?)
}

fn handle_degree_days<S: WeatherStore + ?Sized>(
    store: &mut S,
    location_id: &str,
    params: &HashMap<String, String>,
) -> Result<Value, EndpointError> {
    let range = range_params(params)?
        .ok_or_else(|| EndpointError::BadRequest("'start' and 'end' are required".to_string()))?;
    let estimate = query::get_degree_days(store, location_id, &range)?;
    Ok(json!({
        "location_id": location_id,
        "degree_days": estimate,
        "time_period": range,
    }))
}

fn handle_profile<S: WeatherStore + ?Sized>(
    store: &mut S,
    location_id: &str,
    params: &HashMap<String, String>,
) -> Result<Value, EndpointError> {
    let year = number_param::<i32>(params, "year")?;
    let profile = query::get_weather_profile(store, location_id, year)?
        .ok_or_else(|| EndpointError::NotFound(format!("Location {} not found", location_id)))?;
    Ok(serde_json::to_value(profile)?)
}

fn handle_adjustment_factors<S: WeatherStore + ?Sized>(
    store: &mut S,
    location_id: &str,
) -> Result<Value, EndpointError> {
    let factors = query::get_seasonal_adjustment_factors(store, location_id)?;
    Ok(json!({
        "location_id": location_id,
        "adjustment_factors": factors,
    }))
}

fn handle_hvac_impact<S: WeatherStore + ?Sized>(
    store: &mut S,
    location_id: &str,
    params: &HashMap<String, String>,
) -> Result<Value, EndpointError> {
    let defaults = HvacParameters::default();
    let hvac = HvacParameters {
        efficiency: number_param(params, "efficiency")?.unwrap_or(defaults.efficiency),
        square_footage: number_param(params, "sqft")?.unwrap_or(defaults.square_footage),
    };
    let impact = query::get_weather_impact_for_hvac(store, location_id, hvac, range_params(params)?)?;
    Ok(json!({
        "location_id": location_id,
        "hvac_impact": impact,
    }))
}

fn handle_normalize<S: WeatherStore + ?Sized>(
    store: &mut S,
    location_id: &str,
    body: &str,
) -> Result<Value, EndpointError> {
    let series: Vec<ConsumptionPoint> = serde_json::from_str(body)?;
    let normalized = query::calculate_weather_normalized_consumption(store, &series, location_id)?;
    Ok(serde_json::to_value(normalized)?)
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

fn dispatch<S: WeatherStore + ?Sized>(
    store: &mut S,
    method: &tiny_http::Method,
    url: &str,
    body: &str,
) -> Result<Value, EndpointError> {
    use tiny_http::Method;

    let (path, params) = parse_url(url)?;

    match method {
        Method::Get if path == "/health" => Ok(handle_health()),
        Method::Get if path == "/locations/nearest" => handle_nearest(store, &params),
        Method::Get if path.starts_with("/degree-days/") => {
            handle_degree_days(store, &path_id(path, "/degree-days/")?, &params)
        }
        Method::Get if path.starts_with("/profile/") => {
            handle_profile(store, &path_id(path, "/profile/")?, &params)
        }
        Method::Get if path.starts_with("/adjustment-factors/") => {
            handle_adjustment_factors(store, &path_id(path, "/adjustment-factors/")?)
        }
        Method::Get if path.starts_with("/hvac-impact/") => {
            handle_hvac_impact(store, &path_id(path, "/hvac-impact/")?, &params)
        }
        Method::Post if path.starts_with("/normalize/") => {
            handle_normalize(store, &path_id(path, "/normalize/")?, body)
        }
        _ => Err(EndpointError::NotFound(format!("No route for {} {}", method, path))),
    }
}

/// Routes one request. Returns the status code and JSON body.
pub fn route<S: WeatherStore + ?Sized>(
    store: &mut S,
    method: &tiny_http::Method,
    url: &str,
    body: &str,
) -> (u16, Value) {
    match dispatch(store, method, url, body) {
        Ok(value) => (200, value),
        Err(e) => {
            let status = e.status_code();
            if status >= 500 {
                log::error!("{} {} failed: {}", method, url, e);
            }
            let mut payload = json!({ "error": e.to_string() });
            if status == 404 {
                payload["available_endpoints"] = json!(AVAILABLE_ENDPOINTS);
            }
            (status, payload)
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP Server
// ---------------------------------------------------------------------------

/// Serves requests on `0.0.0.0:port` until the process exits.
pub fn start_endpoint_server<S: WeatherStore>(port: u16, mut store: S) -> Result<(), String> {
    let server = tiny_http::Server::http(format!("0.0.0.0:{}", port))
        .map_err(|e| format!("Failed to start HTTP server: {}", e))?;

    println!("📡 HTTP endpoint listening on http://0.0.0.0:{}", port);
    for endpoint in AVAILABLE_ENDPOINTS {
        println!("   {}", endpoint);
    }
    println!();

    for mut request in server.incoming_requests() {
        let mut body = String::new();
        let read = request.as_reader().read_to_string(&mut body);
        let (status, payload) = match read {
            Ok(_) => route(&mut store, request.method(), request.url(), &body),
            Err(e) => (400, json!({ "error": format!("Unreadable request body: {}", e) })),
        };
        log::debug!("{} {} -> {}", request.method(), request.url(), status);

        if let Err(e) = request.respond(create_response(status, &payload)) {
            log::warn!("Failed to send response: {}", e);
        }
    }

    Ok(())
}

/// Create HTTP response with JSON body
fn create_response(status_code: u16, json: &Value) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let body = serde_json::to_string_pretty(json).unwrap_or_else(|_| "{}".to_string());
    let mut response = tiny_http::Response::from_data(body.into_bytes())
        .with_status_code(tiny_http::StatusCode::from(status_code));
    if let Ok(header) = tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
        response = response.with_header(header);
    }
    response
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
