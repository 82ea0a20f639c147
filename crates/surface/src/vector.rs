use std::fmt;

/// Identity of a retained shape on a [`VectorSurface`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(pub u64);

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shape-{}", self.0)
    }
}

/// Retained-mode drawing target (an SVG element in the browser).
///
/// Shapes live until removed. Pointer enter/leave on a bound shape is routed by
/// the host back into the globe with the shape's id.
pub trait VectorSurface {
    fn resize(&mut self, backing: (u32, u32), css: (f64, f64));

    /// Creates an empty shape tagged with the datum `key`.
    fn create_shape(&mut self, key: &str) -> ShapeId;

    /// Sets SVG path data; an empty string renders nothing.
    fn set_shape_path(&mut self, shape: ShapeId, d: &str);

    fn set_shape_class(&mut self, shape: ShapeId, class: &str, on: bool);

    /// Starts routing pointer enter/leave for `shape`. Called once per shape.
    fn bind_pointer_events(&mut self, shape: ShapeId);

    /// Moves the shape to the top of the stacking order.
    fn raise_shape(&mut self, shape: ShapeId);

    fn remove_shape(&mut self, shape: ShapeId);
}
