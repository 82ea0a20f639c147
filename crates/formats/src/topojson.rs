//! TopoJSON decoding, enough for world-atlas style land topologies.
//!
//! Arcs may be quantized (`transform` present, delta-encoded integer
//! positions) or plain. A negative arc index `i` refers to arc `!i` reversed.

use foundation::math::LonLat;
use scene::geometry::{LandGeometry, Polygon, Ring};
use serde_json::Value;
use tracing::debug;

use crate::error::GeometryError;

#[derive(Debug, Clone)]
struct Topology {
    arcs: Vec<Vec<LonLat>>,
}

pub fn land_from_topology(value: &Value, object: &str) -> Result<LandGeometry, GeometryError> {
    let topology = Topology::decode(value)?;
    let geometry = value
        .get("objects")
        .and_then(|o| o.get(object))
        .ok_or_else(|| GeometryError::MissingObject(object.to_string()))?;
    let mut polygons = Vec::new();
    topology.collect(geometry, &mut polygons)?;
    Ok(LandGeometry::new(polygons))
}

impl Topology {
    fn decode(value: &Value) -> Result<Self, GeometryError> {
        let transform = match value.get("transform") {
            Some(t) => Some(Transform::parse(t)?),
            None => None,
        };
        let raw_arcs = value
            .get("arcs")
            .and_then(Value::as_array)
            .ok_or_else(|| invalid("topology without arcs"))?;

        let mut arcs = Vec::with_capacity(raw_arcs.len());
        for raw in raw_arcs {
            let positions = raw
                .as_array()
                .ok_or_else(|| invalid("arc must be an array of positions"))?;
            let mut arc = Vec::with_capacity(positions.len());
            let (mut x, mut y) = (0.0, 0.0);
            for p in positions {
                let [px, py] = pair(p)?;
                let point = match &transform {
                    Some(t) => {
                        x += px;
                        y += py;
                        t.apply(x, y)
                    }
                    None => LonLat::new(px, py),
                };
                arc.push(point);
            }
            arcs.push(arc);
        }
        Ok(Self { arcs })
    }

    fn collect(&self, geometry: &Value, out: &mut Vec<Polygon>) -> Result<(), GeometryError> {
        // Null geometries (`"type": null`) carry no shape.
        let Some(ty) = geometry.get("type").and_then(Value::as_str) else {
            return Ok(());
        };
        match ty {
            "GeometryCollection" => {
                let geometries = geometry
                    .get("geometries")
                    .and_then(Value::as_array)
                    .ok_or_else(|| invalid("GeometryCollection without geometries"))?;
                for g in geometries {
                    self.collect(g, out)?;
                }
            }
            "Polygon" => out.push(self.polygon(arcs_of(geometry)?)?),
            "MultiPolygon" => {
                let polys = arcs_of(geometry)?
                    .as_array()
                    .ok_or_else(|| invalid("MultiPolygon arcs must be an array"))?;
                for poly in polys {
                    out.push(self.polygon(poly)?);
                }
            }
            "Point" | "MultiPoint" | "LineString" | "MultiLineString" => {
                debug!(geometry = ty, "non-polygonal topology geometry ignored");
            }
            other => return Err(GeometryError::UnsupportedGeometry(other.to_string())),
        }
        Ok(())
    }

    fn polygon(&self, rings: &Value) -> Result<Polygon, GeometryError> {
        let rings = rings
            .as_array()
            .ok_or_else(|| invalid("polygon arcs must be an array of rings"))?;
        rings.iter().map(|r| self.ring(r)).collect()
    }

    /// Stitches a ring's arcs; shared endpoints appear once.
    fn ring(&self, indices: &Value) -> Result<Ring, GeometryError> {
        let indices = indices
            .as_array()
            .ok_or_else(|| invalid("ring must be an array of arc indices"))?;
        let mut points: Ring = Vec::new();
        for index in indices {
            let index = index
                .as_i64()
                .ok_or_else(|| invalid("arc index must be an integer"))?;
            let (arc, reversed) = if index >= 0 {
                (usize::try_from(index).ok(), false)
            } else {
                (usize::try_from(!index).ok(), true)
            };
            let arc = arc
                .and_then(|i| self.arcs.get(i))
                .ok_or(GeometryError::InvalidArc {
                    index,
                    arcs: self.arcs.len(),
                })?;
            points.pop();
            if reversed {
                points.extend(arc.iter().rev());
            } else {
                points.extend(arc.iter());
            }
        }
        Ok(points)
    }
}

#[derive(Debug, Clone, Copy)]
struct Transform {
    scale: [f64; 2],
    translate: [f64; 2],
}

impl Transform {
    fn parse(value: &Value) -> Result<Self, GeometryError> {
        let scale = value
            .get("scale")
            .ok_or_else(|| invalid("transform without scale"))
            .and_then(pair)?;
        let translate = value
            .get("translate")
            .ok_or_else(|| invalid("transform without translate"))
            .and_then(pair)?;
        Ok(Self { scale, translate })
    }

    fn apply(&self, x: f64, y: f64) -> LonLat {
        LonLat::new(
            x * self.scale[0] + self.translate[0],
            y * self.scale[1] + self.translate[1],
        )
    }
}

fn arcs_of(geometry: &Value) -> Result<&Value, GeometryError> {
    geometry
        .get("arcs")
        .ok_or_else(|| invalid("geometry missing arcs"))
}

fn pair(value: &Value) -> Result<[f64; 2], GeometryError> {
    match value.as_array().map(Vec::as_slice) {
        Some([a, b, ..]) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => Ok([a, b]),
            _ => Err(invalid("expected a pair of numbers")),
        },
        _ => Err(invalid("expected a pair of numbers")),
    }
}

fn invalid(reason: &str) -> GeometryError {
    GeometryError::InvalidCoordinates(reason.to_string())
}
