use std::collections::{HashMap, HashSet};

use foundation::math::Orthographic;
use scene::location::{Location, LocationId, prepare_locations};
use scene::picking::ScreenMarker;
use surface::{ShapeId, VectorSurface};
use tracing::debug;

use crate::geo_path::GeoPath;
use crate::symbology::{MARKER_CLASS, SELECTION_CLASS, TARGET_CLASS};

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct MarkerDiff {
    pub entered: usize,
    pub updated: usize,
    pub exited: usize,
}

/// One retained shape per location, keyed by location id.
///
/// Occluded markers keep their shape with an empty path; whether a marker is
/// visible is a question for the projection, not for this layer.
#[derive(Debug, Clone)]
pub struct MarkerLayer {
    radius: f64,
    resample_deg: f64,
    locations: Vec<Location>,
    shapes: HashMap<LocationId, ShapeId>,
    by_shape: HashMap<ShapeId, usize>,
    stacking: Vec<ShapeId>,
    hovered: Option<ShapeId>,
}

impl MarkerLayer {
    pub fn new(radius: f64) -> Self {
        Self {
            radius,
            resample_deg: crate::geo_path::DEFAULT_RESAMPLE_DEG,
            locations: Vec::new(),
            shapes: HashMap::new(),
            by_shape: HashMap::new(),
            stacking: Vec::new(),
            hovered: None,
        }
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn shape_for(&self, id: &LocationId) -> Option<ShapeId> {
        self.shapes.get(id).copied()
    }

    pub fn location_for_shape(&self, shape: ShapeId) -> Option<&Location> {
        self.by_shape.get(&shape).and_then(|&i| self.locations.get(i))
    }

    /// Replaces the dataset and reconciles shapes against the previous key set.
    pub fn update_locations<V: VectorSurface>(
        &mut self,
        locations: Vec<Location>,
        projection: &Orthographic,
        vector: &mut V,
    ) -> MarkerDiff {
        let locations = prepare_locations(locations);
        let keep: HashSet<&LocationId> = locations.iter().map(|l| &l.id).collect();
        let mut diff = MarkerDiff::default();

        let stale: Vec<LocationId> = self
            .shapes
            .keys()
            .filter(|id| !keep.contains(id))
            .cloned()
            .collect();
        for id in stale {
            if let Some(shape) = self.shapes.remove(&id) {
                vector.remove_shape(shape);
                self.stacking.retain(|s| *s != shape);
                if self.hovered == Some(shape) {
                    self.hovered = None;
                }
                diff.exited += 1;
            }
        }

        let geo = GeoPath::new(projection, self.resample_deg);
        let mut desired = Vec::with_capacity(locations.len());
        self.by_shape.clear();
        for (index, loc) in locations.iter().enumerate() {
            let shape = match self.shapes.get(&loc.id) {
                Some(&shape) => {
                    diff.updated += 1;
                    shape
                }
                None => {
                    let shape = vector.create_shape(loc.id.as_str());
                    vector.set_shape_class(shape, MARKER_CLASS, true);
                    vector.bind_pointer_events(shape);
                    self.shapes.insert(loc.id.clone(), shape);
                    self.stacking.push(shape);
                    diff.entered += 1;
                    shape
                }
            };
            self.by_shape.insert(shape, index);
            desired.push(shape);

            let d = loc
                .coordinates()
                .map(|p| geo.point(p, self.radius).to_svg_d())
                .unwrap_or_default();
            vector.set_shape_path(shape, &d);
            vector.set_shape_class(shape, TARGET_CLASS, loc.is_target);
            vector.set_shape_class(
                shape,
                SELECTION_CLASS,
                loc.is_selected || self.hovered == Some(shape),
            );
        }

        // Later entries paint on top.
        if self.stacking != desired {
            for shape in &desired {
                vector.raise_shape(*shape);
            }
            self.stacking = desired;
        }

        self.locations = locations;
        debug!(
            entered = diff.entered,
            updated = diff.updated,
            exited = diff.exited,
            "markers reconciled"
        );
        diff
    }

    /// Refreshes every marker path after the rotation or scale changed.
    pub fn redraw<V: VectorSurface>(&self, projection: &Orthographic, vector: &mut V) {
        let geo = GeoPath::new(projection, self.resample_deg);
        for loc in &self.locations {
            let Some(&shape) = self.shapes.get(&loc.id) else {
                continue;
            };
            let d = loc
                .coordinates()
                .map(|p| geo.point(p, self.radius).to_svg_d())
                .unwrap_or_default();
            vector.set_shape_path(shape, &d);
        }
    }

    /// Toggles the hover highlight. Returns the location under `shape`.
    pub fn set_hovered<V: VectorSurface>(
        &mut self,
        shape: Option<ShapeId>,
        vector: &mut V,
    ) -> Option<&Location> {
        if let Some(prev) = self.hovered.take() {
            let selected = self.location_for_shape(prev).is_some_and(|l| l.is_selected);
            vector.set_shape_class(prev, SELECTION_CLASS, selected);
        }
        let shape = shape.filter(|s| self.by_shape.contains_key(s))?;
        vector.set_shape_class(shape, SELECTION_CLASS, true);
        self.hovered = Some(shape);
        self.location_for_shape(shape)
    }

    pub fn hovered(&self) -> Option<ShapeId> {
        self.hovered
    }

    /// Screen positions for hit-testing, in stacking order.
    pub fn screen_markers(&self, projection: &Orthographic) -> Vec<ScreenMarker> {
        self.locations
            .iter()
            .enumerate()
            .map(|(index, loc)| ScreenMarker {
                index,
                position: loc.coordinates().and_then(|p| projection.project(p)),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{MarkerDiff, MarkerLayer};
    use crate::symbology::{SELECTION_CLASS, TARGET_CLASS};
    use foundation::math::{LonLat, Orthographic, Rotation, ScaleTranslate, Vec2};
    use pretty_assertions::assert_eq;
    use scene::location::{Location, LocationId};
    use surface::RecordingScene;

    fn projection() -> Orthographic {
        let mut p = Orthographic::new();
        p.set_scale_translate(ScaleTranslate {
            scale: 180.0,
            translate: Vec2::new(250.0, 200.0),
        });
        p.set_rotation(Rotation::facing(LonLat::new(0.0, 45.0), 0.0));
        p
    }

    fn loc(id: u64, lon: f64, lat: f64) -> Location {
        Location::new(id, format!("race {id}"), lon, lat)
    }

    #[test]
    fn enter_update_exit_keeps_identity() {
        let proj = projection();
        let mut scene = RecordingScene::new();
        let mut layer = MarkerLayer::new(4.5);

        let diff = layer.update_locations(vec![loc(1, 2.35, 48.85), loc(2, -0.13, 51.51)], &proj, &mut scene);
        assert_eq!(diff, MarkerDiff { entered: 2, updated: 0, exited: 0 });
        let kept = layer.shape_for(&LocationId::from(2)).unwrap();

        let diff = layer.update_locations(vec![loc(2, -0.13, 51.51), loc(3, 13.4, 52.5)], &proj, &mut scene);
        assert_eq!(diff, MarkerDiff { entered: 1, updated: 1, exited: 1 });
        assert_eq!(layer.shape_for(&LocationId::from(2)), Some(kept));
        assert_eq!(scene.shape_count(), 2);
        assert_eq!(scene.created_count(), 3);
        assert_eq!(scene.shape(kept).unwrap().bindings, 1);
    }

    #[test]
    fn occluded_marker_keeps_an_empty_shape() {
        let proj = projection();
        let mut scene = RecordingScene::new();
        let mut layer = MarkerLayer::new(4.5);
        layer.update_locations(vec![loc(1, 180.0, -45.0), loc(2, 0.0, 45.0)], &proj, &mut scene);

        let hidden = layer.shape_for(&LocationId::from(1)).unwrap();
        let shown = layer.shape_for(&LocationId::from(2)).unwrap();
        assert_eq!(scene.shape(hidden).unwrap().d, "");
        assert!(scene.shape(shown).unwrap().d.starts_with('M'));
        assert_eq!(scene.shape_count(), 2);
    }

    #[test]
    fn malformed_locations_are_excluded() {
        let proj = projection();
        let mut scene = RecordingScene::new();
        let mut layer = MarkerLayer::new(4.5);
        let mut bad = loc(9, 0.0, 0.0);
        bad.lon = None;
        layer.update_locations(vec![bad, loc(1, 0.0, 45.0)], &proj, &mut scene);
        assert_eq!(layer.len(), 1);
        assert_eq!(scene.shape_count(), 1);
    }

    #[test]
    fn classes_follow_flags_and_hover() {
        let proj = projection();
        let mut scene = RecordingScene::new();
        let mut layer = MarkerLayer::new(4.5);
        layer.update_locations(
            vec![loc(1, 2.35, 48.85).with_target(true), loc(2, -0.13, 51.51)],
            &proj,
            &mut scene,
        );
        let target = layer.shape_for(&LocationId::from(1)).unwrap();
        let other = layer.shape_for(&LocationId::from(2)).unwrap();
        assert!(scene.shape(target).unwrap().has_class(TARGET_CLASS));
        assert!(!scene.shape(other).unwrap().has_class(TARGET_CLASS));

        let hovered = layer.set_hovered(Some(other), &mut scene).map(|l| l.id.clone());
        assert_eq!(hovered, Some(LocationId::from(2)));
        assert!(scene.shape(other).unwrap().has_class(SELECTION_CLASS));

        // A refresh keeps the hover highlight.
        layer.update_locations(
            vec![loc(1, 2.35, 48.85).with_target(true), loc(2, -0.13, 51.51)],
            &proj,
            &mut scene,
        );
        assert!(scene.shape(other).unwrap().has_class(SELECTION_CLASS));

        layer.set_hovered(None, &mut scene);
        assert!(!scene.shape(other).unwrap().has_class(SELECTION_CLASS));
    }

    #[test]
    fn stacking_follows_list_order() {
        let proj = projection();
        let mut scene = RecordingScene::new();
        let mut layer = MarkerLayer::new(4.5);
        layer.update_locations(vec![loc(1, 0.0, 45.0), loc(2, 1.0, 45.0)], &proj, &mut scene);
        layer.update_locations(vec![loc(2, 1.0, 45.0), loc(1, 0.0, 45.0)], &proj, &mut scene);
        let keys: Vec<&str> = scene.shapes_in_order().map(|(_, s)| s.key.as_str()).collect();
        assert_eq!(keys, vec!["2", "1"]);
    }
}
