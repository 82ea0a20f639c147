use foundation::math::LonLat;
use scene::geometry::{LandGeometry, Polygon, Ring};
use serde_json::Value;
use tracing::debug;

use crate::error::GeometryError;
use crate::topojson;

/// Parses a land payload, accepting either a TopoJSON topology (the named
/// `object` is extracted) or any GeoJSON object.
pub fn parse_land_json(payload: &str, object: &str) -> Result<LandGeometry, GeometryError> {
    let value: Value =
        serde_json::from_str(payload).map_err(|e| GeometryError::Json(e.to_string()))?;
    land_from_value(&value, object)
}

pub fn land_from_value(value: &Value, object: &str) -> Result<LandGeometry, GeometryError> {
    match value.get("type").and_then(Value::as_str) {
        Some("Topology") => topojson::land_from_topology(value, object),
        _ => land_from_geojson(value),
    }
}

/// Collects every polygonal geometry of a GeoJSON object. Points and lines are
/// skipped; they have no area to fill.
pub fn land_from_geojson(value: &Value) -> Result<LandGeometry, GeometryError> {
    let mut polygons = Vec::new();
    collect_geojson(value, &mut polygons)?;
    Ok(LandGeometry::new(polygons))
}

fn collect_geojson(value: &Value, out: &mut Vec<Polygon>) -> Result<(), GeometryError> {
    let obj = value
        .as_object()
        .ok_or_else(|| GeometryError::NotGeoJson("expected an object".to_string()))?;
    let ty = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| GeometryError::NotGeoJson("missing type".to_string()))?;

    match ty {
        "FeatureCollection" => {
            let features = obj
                .get("features")
                .and_then(Value::as_array)
                .ok_or_else(|| GeometryError::NotGeoJson("FeatureCollection without features".to_string()))?;
            for feature in features {
                collect_geojson(feature, out)?;
            }
        }
        "Feature" => match obj.get("geometry") {
            Some(Value::Null) | None => {}
            Some(geometry) => collect_geojson(geometry, out)?,
        },
        "GeometryCollection" => {
            let geometries = obj
                .get("geometries")
                .and_then(Value::as_array)
                .ok_or_else(|| GeometryError::NotGeoJson("GeometryCollection without geometries".to_string()))?;
            for geometry in geometries {
                collect_geojson(geometry, out)?;
            }
        }
        "Polygon" => out.push(parse_polygon(coordinates(obj)?)?),
        "MultiPolygon" => {
            let polys = coordinates(obj)?
                .as_array()
                .ok_or_else(|| invalid("MultiPolygon coordinates must be an array of polygons"))?;
            for poly in polys {
                out.push(parse_polygon(poly)?);
            }
        }
        "Point" | "MultiPoint" | "LineString" | "MultiLineString" => {
            debug!(geometry = ty, "non-polygonal geometry ignored");
        }
        other => return Err(GeometryError::UnsupportedGeometry(other.to_string())),
    }
    Ok(())
}

fn coordinates(obj: &serde_json::Map<String, Value>) -> Result<&Value, GeometryError> {
    obj.get("coordinates")
        .ok_or_else(|| invalid("geometry missing coordinates"))
}

fn invalid(reason: &str) -> GeometryError {
    GeometryError::InvalidCoordinates(reason.to_string())
}

fn parse_polygon(coords: &Value) -> Result<Polygon, GeometryError> {
    let rings = coords
        .as_array()
        .ok_or_else(|| invalid("Polygon coordinates must be an array of rings"))?;
    rings.iter().map(parse_ring).collect()
}

fn parse_ring(coords: &Value) -> Result<Ring, GeometryError> {
    let points = coords
        .as_array()
        .ok_or_else(|| invalid("ring must be an array of positions"))?;
    points.iter().map(parse_position).collect()
}

pub(crate) fn parse_position(value: &Value) -> Result<LonLat, GeometryError> {
    let arr = value
        .as_array()
        .ok_or_else(|| invalid("position must be an array"))?;
    match arr.as_slice() {
        [lon, lat, ..] => {
            let lon = lon.as_f64().ok_or_else(|| invalid("lon must be a number"))?;
            let lat = lat.as_f64().ok_or_else(|| invalid("lat must be a number"))?;
            Ok(LonLat::new(lon, lat))
        }
        _ => Err(invalid("position must have [lon, lat]")),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_land_json;
    use crate::error::GeometryError;
    use foundation::math::LonLat;

    #[test]
    fn feature_collection_with_mixed_geometry() {
        let payload = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {}, "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0,0],[10,0],[10,10],[0,0]]]}},
                {"type": "Feature", "properties": {}, "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [[[[20,0],[30,0],[30,10],[20,0]]], [[[40,0],[50,0],[50,10],[40,0]]]]}},
                {"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": [1, 2]}},
                {"type": "Feature", "properties": {}, "geometry": null}
            ]
        }"#;
        let land = parse_land_json(payload, "land").unwrap();
        assert_eq!(land.polygons().len(), 3);
        assert_eq!(land.polygons()[1][0][1], LonLat::new(30.0, 0.0));
    }

    #[test]
    fn bare_geometry_is_accepted() {
        let land = parse_land_json(r#"{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}"#, "land").unwrap();
        assert_eq!(land.ring_count(), 1);
        assert_eq!(land.vertex_count(), 4);
    }

    #[test]
    fn errors_are_reported() {
        assert!(matches!(parse_land_json("{", "land"), Err(GeometryError::Json(_))));
        assert!(matches!(
            parse_land_json(r#"{"type":"Sphere"}"#, "land"),
            Err(GeometryError::UnsupportedGeometry(t)) if t == "Sphere"
        ));
        assert!(matches!(
            parse_land_json(r#"{"type":"Polygon","coordinates":[[[0]]]}"#, "land"),
            Err(GeometryError::InvalidCoordinates(_))
        ));
    }
}
