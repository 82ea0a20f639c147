use foundation::viewport::Viewport;
use tracing::debug;

use crate::paint::Transform2D;
use crate::raster::RasterSurface;
use crate::vector::VectorSurface;

/// Owns the co-registered raster (below) and vector (above) surfaces.
///
/// Both surfaces share one origin and one CSS coordinate space; the device
/// pixel ratio is absorbed by the raster transform.
#[derive(Debug)]
pub struct SurfaceManager<R, V> {
    raster: R,
    vector: V,
    viewport: Option<Viewport>,
}

impl<R: RasterSurface, V: VectorSurface> SurfaceManager<R, V> {
    pub fn new(raster: R, vector: V) -> Self {
        Self {
            raster,
            vector,
            viewport: None,
        }
    }

    /// Applies `viewport` to both surfaces. Idempotent: the raster transform is
    /// reset to `scale(dpr)` each time, never accumulated.
    pub fn resize(&mut self, viewport: Viewport) {
        let backing = viewport.backing_size();
        let css = viewport.css_size();
        self.raster.resize(backing, css);
        self.raster
            .set_transform(Transform2D::scale(viewport.pixel_ratio()));
        self.vector.resize(backing, css);
        debug!(?backing, ?css, "surfaces resized");
        self.viewport = Some(viewport);
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    pub fn raster(&self) -> &R {
        &self.raster
    }

    pub fn raster_mut(&mut self) -> &mut R {
        &mut self.raster
    }

    pub fn vector(&self) -> &V {
        &self.vector
    }

    pub fn vector_mut(&mut self) -> &mut V {
        &mut self.vector
    }

    /// Both surfaces at once, for passes that touch raster and vector together.
    pub fn split_mut(&mut self) -> (&mut R, &mut V) {
        (&mut self.raster, &mut self.vector)
    }
}
