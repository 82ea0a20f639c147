use foundation::math::LonLat;

/// A closed ring of positions; the closing duplicate may or may not be present.
pub type Ring = Vec<LonLat>;

/// First ring is the exterior, the rest are holes.
pub type Polygon = Vec<Ring>;

/// Immutable landmass dataset, loaded once and shared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandGeometry {
    polygons: Vec<Polygon>,
}

impl LandGeometry {
    pub fn new(polygons: Vec<Polygon>) -> Self {
        Self { polygons }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    pub fn ring_count(&self) -> usize {
        self.polygons.iter().map(Vec::len).sum()
    }

    pub fn vertex_count(&self) -> usize {
        self.polygons
            .iter()
            .flat_map(|p| p.iter())
            .map(Vec::len)
            .sum()
    }
}
