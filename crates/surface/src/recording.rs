//! Headless surfaces that record every call, for tests and offline export.

use std::collections::{BTreeMap, BTreeSet};

use crate::paint::{Fill, Stroke, Transform2D};
use crate::path::Path;
use crate::raster::RasterSurface;
use crate::vector::{ShapeId, VectorSurface};

#[derive(Debug, Clone, PartialEq)]
pub enum RasterOp {
    Clear,
    Fill { path: Path, fill: Fill },
    Stroke { path: Path, stroke: Stroke },
}

#[derive(Debug, Clone)]
pub struct RecordingRaster {
    backing: (u32, u32),
    css: (f64, f64),
    transform: Transform2D,
    ops: Vec<RasterOp>,
}

impl Default for RecordingRaster {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingRaster {
    pub fn new() -> Self {
        Self {
            backing: (0, 0),
            css: (0.0, 0.0),
            transform: Transform2D::IDENTITY,
            ops: Vec::new(),
        }
    }

    pub fn backing_size(&self) -> (u32, u32) {
        self.backing
    }

    pub fn css_size(&self) -> (f64, f64) {
        self.css
    }

    pub fn transform(&self) -> Transform2D {
        self.transform
    }

    /// Every recorded op, including earlier frames.
    pub fn ops(&self) -> &[RasterOp] {
        &self.ops
    }

    /// Ops since the most recent clear: what is currently on screen.
    pub fn current_frame(&self) -> &[RasterOp] {
        let start = self
            .ops
            .iter()
            .rposition(|op| matches!(op, RasterOp::Clear))
            .map_or(0, |i| i + 1);
        &self.ops[start..]
    }

    pub fn clear_count(&self) -> usize {
        self.ops.iter().filter(|op| matches!(op, RasterOp::Clear)).count()
    }
}

impl RasterSurface for RecordingRaster {
    fn resize(&mut self, backing: (u32, u32), css: (f64, f64)) {
        self.backing = backing;
        self.css = css;
        // Resizing a canvas resets its transform.
        self.transform = Transform2D::IDENTITY;
    }

    fn set_transform(&mut self, transform: Transform2D) {
        self.transform = transform;
    }

    fn clear(&mut self) {
        self.ops.push(RasterOp::Clear);
    }

    fn fill_path(&mut self, path: &Path, fill: &Fill) {
        self.ops.push(RasterOp::Fill {
            path: path.clone(),
            fill: fill.clone(),
        });
    }

    fn stroke_path(&mut self, path: &Path, stroke: &Stroke) {
        self.ops.push(RasterOp::Stroke {
            path: path.clone(),
            stroke: stroke.clone(),
        });
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordedShape {
    pub key: String,
    pub d: String,
    pub classes: BTreeSet<String>,
    /// How many times pointer events were bound.
    pub bindings: u32,
}

impl RecordedShape {
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }
}

/// Retained scene graph stand-in.
#[derive(Debug, Clone, Default)]
pub struct RecordingScene {
    backing: (u32, u32),
    css: (f64, f64),
    next_id: u64,
    shapes: BTreeMap<ShapeId, RecordedShape>,
    order: Vec<ShapeId>,
    created: u64,
    removed: u64,
}

impl RecordingScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn backing_size(&self) -> (u32, u32) {
        self.backing
    }

    pub fn css_size(&self) -> (f64, f64) {
        self.css
    }

    pub fn shape(&self, id: ShapeId) -> Option<&RecordedShape> {
        self.shapes.get(&id)
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// Shapes bottom to top.
    pub fn shapes_in_order(&self) -> impl Iterator<Item = (ShapeId, &RecordedShape)> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.shapes.get(id).map(|s| (*id, s)))
    }

    pub fn find_by_key(&self, key: &str) -> Option<ShapeId> {
        self.shapes
            .iter()
            .find(|(_, s)| s.key == key)
            .map(|(id, _)| *id)
    }

    pub fn created_count(&self) -> u64 {
        self.created
    }

    pub fn removed_count(&self) -> u64 {
        self.removed
    }
}

impl VectorSurface for RecordingScene {
    fn resize(&mut self, backing: (u32, u32), css: (f64, f64)) {
        self.backing = backing;
        self.css = css;
    }

    fn create_shape(&mut self, key: &str) -> ShapeId {
        let id = ShapeId(self.next_id);
        self.next_id += 1;
        self.created += 1;
        self.shapes.insert(
            id,
            RecordedShape {
                key: key.to_string(),
                ..RecordedShape::default()
            },
        );
        self.order.push(id);
        id
    }

    fn set_shape_path(&mut self, shape: ShapeId, d: &str) {
        if let Some(s) = self.shapes.get_mut(&shape) {
            s.d = d.to_string();
        }
    }

    fn set_shape_class(&mut self, shape: ShapeId, class: &str, on: bool) {
        if let Some(s) = self.shapes.get_mut(&shape) {
            if on {
                s.classes.insert(class.to_string());
            } else {
                s.classes.remove(class);
            }
        }
    }

    fn bind_pointer_events(&mut self, shape: ShapeId) {
        if let Some(s) = self.shapes.get_mut(&shape) {
            s.bindings += 1;
        }
    }

    fn raise_shape(&mut self, shape: ShapeId) {
        if let Some(pos) = self.order.iter().position(|id| *id == shape) {
            self.order.remove(pos);
            self.order.push(shape);
        }
    }

    fn remove_shape(&mut self, shape: ShapeId) {
        if self.shapes.remove(&shape).is_some() {
            self.removed += 1;
            self.order.retain(|id| *id != shape);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{RasterOp, RecordingRaster, RecordingScene};
    use crate::paint::Fill;
    use crate::path::Path;
    use crate::raster::RasterSurface;
    use crate::vector::VectorSurface;
    use foundation::math::Vec2;

    #[test]
    fn current_frame_starts_after_last_clear() {
        let mut r = RecordingRaster::new();
        let p = Path::circle(Vec2::new(0.0, 0.0), 1.0);
        r.clear();
        r.fill_path(&p, &Fill::new("#000"));
        r.clear();
        r.fill_path(&p, &Fill::new("#fff"));
        assert_eq!(r.clear_count(), 2);
        assert!(matches!(r.current_frame(), [RasterOp::Fill { fill, .. }] if fill.color == "#fff"));
    }

    #[test]
    fn scene_tracks_classes_order_and_removal() {
        let mut s = RecordingScene::new();
        let a = s.create_shape("a");
        let b = s.create_shape("b");
        s.set_shape_class(a, "isTarget", true);
        s.raise_shape(a);
        let keys: Vec<&str> = s.shapes_in_order().map(|(_, sh)| sh.key.as_str()).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert!(s.shape(a).is_some_and(|sh| sh.has_class("isTarget")));

        s.remove_shape(b);
        s.remove_shape(b);
        assert_eq!(s.shape_count(), 1);
        assert_eq!(s.removed_count(), 1);
        assert_eq!(s.find_by_key("a"), Some(a));
    }
}
