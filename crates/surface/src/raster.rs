use crate::paint::{Fill, Stroke, Transform2D};
use crate::path::Path;

/// Immediate-mode drawing target (a 2D canvas in the browser).
///
/// Fills use the even-odd rule. Drawing coordinates are CSS pixels once the
/// device pixel transform is set.
pub trait RasterSurface {
    /// Sets the backing store to `backing` device pixels and the presented size
    /// to `css` CSS pixels.
    fn resize(&mut self, backing: (u32, u32), css: (f64, f64));

    /// Replaces the current transform (never multiplies it).
    fn set_transform(&mut self, transform: Transform2D);

    /// Clears the whole surface.
    fn clear(&mut self);

    fn fill_path(&mut self, path: &Path, fill: &Fill);

    fn stroke_path(&mut self, path: &Path, stroke: &Stroke);
}
