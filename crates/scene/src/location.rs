use std::collections::{BTreeMap, HashSet};
use std::fmt;

use foundation::math::LonLat;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

/// Stable identity of a location. Numeric and string ids from JSON both map
/// to the same textual form (`1` and `"1"` are the same location).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocationId(String);

impl LocationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LocationId {
    fn from(v: &str) -> Self {
        Self(v.to_string())
    }
}

impl From<String> for LocationId {
    fn from(v: String) -> Self {
        Self(v)
    }
}

impl From<u64> for LocationId {
    fn from(v: u64) -> Self {
        Self(v.to_string())
    }
}

impl Serialize for LocationId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for LocationId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawId::deserialize(deserializer)? {
            RawId::Unsigned(v) => Self::from(v),
            RawId::Signed(v) => Self(v.to_string()),
            // Integral floats (`1.0`) collapse onto the integer form.
            RawId::Float(v) if v.fract() == 0.0 && v.abs() < 9.0e15 => Self((v as i64).to_string()),
            RawId::Float(v) => Self(v.to_string()),
            RawId::Text(v) => Self(v),
        })
    }
}

/// Free-form fields shown by the tooltip and info panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DisplayFields {
    pub city: Option<String>,
    pub date: Option<String>,
    pub image_url: Option<String>,
    pub url: Option<String>,
    pub country_code: Option<String>,
    /// Extra numeric attributes carried through untouched.
    pub extra: BTreeMap<String, f64>,
}

/// One marker datum. Coordinates are optional so malformed rows can be carried
/// up to the point where they are filtered out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: LocationId,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "longitude")]
    pub lon: Option<f64>,
    #[serde(default, alias = "latitude")]
    pub lat: Option<f64>,
    #[serde(default)]
    pub is_target: bool,
    #[serde(default)]
    pub is_selected: bool,
    #[serde(default, alias = "displayFields")]
    pub display: DisplayFields,
}

impl Location {
    pub fn new(id: impl Into<LocationId>, name: impl Into<String>, lon: f64, lat: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            lon: Some(lon),
            lat: Some(lat),
            is_target: false,
            is_selected: false,
            display: DisplayFields::default(),
        }
    }

    pub fn with_target(mut self, is_target: bool) -> Self {
        self.is_target = is_target;
        self
    }

    /// Valid geographic position, or `None` for missing/out-of-range coordinates.
    pub fn coordinates(&self) -> Option<LonLat> {
        let p = LonLat::new(self.lon?, self.lat?);
        p.is_valid().then_some(p)
    }
}

/// Filters a delivered list down to drawable locations.
///
/// - entries without valid coordinates are dropped
/// - duplicate ids keep their first occurrence
/// - at most one entry keeps `is_target`
///
/// Every dropped or corrected entry is logged; nothing is returned as an error.
pub fn prepare_locations(locations: Vec<Location>) -> Vec<Location> {
    let mut seen = HashSet::new();
    let mut target_seen = false;
    let mut out = Vec::with_capacity(locations.len());

    for mut loc in locations {
        if loc.coordinates().is_none() {
            warn!(id = %loc.id, lon = ?loc.lon, lat = ?loc.lat, "location without valid coordinates skipped");
            continue;
        }
        if !seen.insert(loc.id.clone()) {
            warn!(id = %loc.id, "duplicate location id skipped");
            continue;
        }
        if loc.is_target {
            if target_seen {
                warn!(id = %loc.id, "more than one target location; flag cleared");
                loc.is_target = false;
            }
            target_seen = true;
        }
        out.push(loc);
    }
    out
}
