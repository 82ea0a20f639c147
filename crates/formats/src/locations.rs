//! Recommendation result rows to marker locations.

use scene::location::{DisplayFields, Location, LocationId};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::LocationError;

pub const DEFAULT_IMAGE_URL: &str = "https://s3-us-west-2.amazonaws.com/obstri/defaultim.jpg";

const METERS_TO_MILES: f64 = 0.000621371;

/// Numeric row fields carried into `DisplayFields::extra`, with the factor
/// applied on the way.
const EXTRA_FIELDS: &[(&str, &str, f64)] = &[
    ("wc_slots", "slots", 1.0),
    ("entrants_count_avg", "fieldSize", 1.0),
    ("run_score", "runScore", 1.0),
    ("bike_score", "bikeScore", 1.0),
    ("bike_sinusoity", "bikeSinusoity", 1.0),
    ("attractivity_score", "attractiveness", 1.0),
    ("distance_to_nearest_airport", "airport", METERS_TO_MILES * 1000.0),
    (
        "distance_to_nearest_airport_international",
        "airportInternational",
        METERS_TO_MILES * 1000.0,
    ),
    ("n_hotels", "hotels", 1.0),
    ("n_restaurants", "food", 1.0),
    ("n_entertainment", "entertainment", 1.0),
];

/// Parses a results payload: either a bare array of rows or `{"data": [...]}`.
pub fn parse_results_json(payload: &str) -> Result<Vec<Value>, LocationError> {
    let value: Value = serde_json::from_str(payload).map_err(|e| LocationError {
        index: 0,
        reason: format!("JSON parse error: {e}"),
    })?;
    match value {
        Value::Array(rows) => Ok(rows),
        Value::Object(mut obj) => match obj.remove("data") {
            Some(Value::Array(rows)) => Ok(rows),
            _ => Err(LocationError {
                index: 0,
                reason: "expected an array of rows or an object with a data array".to_string(),
            }),
        },
        _ => Err(LocationError {
            index: 0,
            reason: "expected an array of rows".to_string(),
        }),
    }
}

/// Parses a marker list payload (an array of `Location` objects, or
/// `{"data": [...]}`).
///
/// Only a payload that is not a list at all is an error. Entries that do not
/// deserialize are logged and left out; their neighbours still load.
pub fn parse_locations_json(payload: &str) -> Result<Vec<Location>, LocationError> {
    let entries = parse_results_json(payload)?;
    Ok(entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<Location>(entry) {
            Ok(loc) => Some(loc),
            Err(e) => {
                let e = LocationError {
                    index,
                    reason: e.to_string(),
                };
                warn!(error = %e, "location skipped");
                None
            }
        })
        .collect())
}

/// Converts result rows into locations.
///
/// The first row is the queried race and becomes the target. The list is
/// reversed so the target is drawn last, on top. Rows that cannot be converted
/// are logged and skipped.
pub fn locations_from_rows(rows: &[Value], selected: Option<&LocationId>) -> Vec<Location> {
    let mut out: Vec<Location> = rows
        .iter()
        .enumerate()
        .filter_map(|(index, row)| match location_from_row(index, row, index == 0) {
            Ok(mut loc) => {
                loc.is_selected = selected == Some(&loc.id);
                Some(loc)
            }
            Err(e) => {
                warn!(error = %e, "result row skipped");
                None
            }
        })
        .collect();
    out.reverse();
    out
}

pub fn location_from_row(index: usize, row: &Value, is_target: bool) -> Result<Location, LocationError> {
    let err = |reason: &str| LocationError {
        index,
        reason: reason.to_string(),
    };
    let obj = row.as_object().ok_or_else(|| err("row must be an object"))?;

    let id = match obj.get("race") {
        Some(Value::String(s)) => LocationId::new(s.clone()),
        Some(Value::Number(n)) => match n.as_u64() {
            Some(v) => LocationId::from(v),
            None => LocationId::new(n.to_string()),
        },
        _ => return Err(err("missing race id")),
    };
    let lon = number(obj, "lon").ok_or_else(|| err("missing lon"))?;
    let lat = number(obj, "lat").ok_or_else(|| err("missing lat"))?;

    let mut extra = std::collections::BTreeMap::new();
    for (key, name, factor) in EXTRA_FIELDS {
        if let Some(v) = number(obj, key) {
            extra.insert((*name).to_string(), v * factor);
        }
    }

    Ok(Location {
        id,
        name: text(obj, "racename").unwrap_or_default(),
        lon: Some(lon),
        lat: Some(lat),
        is_target,
        is_selected: false,
        display: DisplayFields {
            city: text(obj, "city"),
            date: text(obj, "date"),
            image_url: Some(
                text(obj, "image_url")
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| DEFAULT_IMAGE_URL.to_string()),
            ),
            url: text(obj, "imlink"),
            country_code: text(obj, "country_code"),
            extra,
        },
    })
}

fn number(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    let v = match obj.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    v.filter(|v| v.is_finite())
}

fn text(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
