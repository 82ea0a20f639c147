/// Solid fill in any CSS color syntax.
#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub color: String,
}

impl Fill {
    pub fn new(color: impl Into<String>) -> Self {
        Self {
            color: color.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub color: String,
    /// Line width in CSS pixels.
    pub width: f64,
}

impl Stroke {
    pub fn new(color: impl Into<String>, width: f64) -> Self {
        Self {
            color: color.into(),
            width,
        }
    }
}

/// 2D affine transform `[a, b, c, d, e, f]`, canvas `setTransform` order.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform2D(pub [f64; 6]);

impl Transform2D {
    pub const IDENTITY: Self = Self([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    pub fn scale(s: f64) -> Self {
        Self([s, 0.0, 0.0, s, 0.0, 0.0])
    }
}
