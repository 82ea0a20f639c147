use std::fmt;

/// Why land geometry could not be produced.
///
/// `Clone` so a failed load can be handed to every waiter of a shared future.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryError {
    Json(String),
    NotGeoJson(String),
    UnsupportedGeometry(String),
    InvalidCoordinates(String),
    MissingObject(String),
    InvalidArc { index: i64, arcs: usize },
    Fetch(String),
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::Json(e) => write!(f, "JSON parse error: {e}"),
            GeometryError::NotGeoJson(ty) => write!(f, "not a GeoJSON or TopoJSON document: {ty}"),
            GeometryError::UnsupportedGeometry(ty) => write!(f, "unsupported geometry type: {ty}"),
            GeometryError::InvalidCoordinates(reason) => write!(f, "invalid coordinates: {reason}"),
            GeometryError::MissingObject(name) => write!(f, "topology has no object named {name:?}"),
            GeometryError::InvalidArc { index, arcs } => {
                write!(f, "arc index {index} out of range (topology has {arcs} arcs)")
            }
            GeometryError::Fetch(e) => write!(f, "geometry fetch failed: {e}"),
        }
    }
}

impl std::error::Error for GeometryError {}

/// A recommendation row that could not become a location.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationError {
    pub index: usize,
    pub reason: String,
}

impl fmt::Display for LocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid location row {}: {}", self.index, self.reason)
    }
}

impl std::error::Error for LocationError {}
