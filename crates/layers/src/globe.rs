use foundation::math::{LonLat, ProjectionEngine};
use scene::geometry::LandGeometry;
use surface::{Path, RasterSurface};
use tracing::trace;

use crate::geo_path::GeoPath;
use crate::graticule::Graticule;
use crate::symbology::GlobeStyle;

/// One raster pass of a globe redraw.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DrawPass {
    SphereFill,
    BackLand,
    BackGraticule,
    FrontGraticule,
    FrontLand,
    SphereOutline,
}

/// Passes in paint order. The far hemisphere goes down before the near one so
/// flat compositing reads as occlusion.
pub const DRAW_ORDER: [DrawPass; 6] = [
    DrawPass::SphereFill,
    DrawPass::BackLand,
    DrawPass::BackGraticule,
    DrawPass::FrontGraticule,
    DrawPass::FrontLand,
    DrawPass::SphereOutline,
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderStats {
    pub passes: Vec<DrawPass>,
    pub fills: usize,
    pub strokes: usize,
}

/// Draws sphere, graticule and land onto a raster surface.
#[derive(Debug, Clone)]
pub struct GlobeRenderer {
    style: GlobeStyle,
    graticule: Vec<Vec<LonLat>>,
    resample_deg: f64,
}

impl GlobeRenderer {
    pub fn new(style: GlobeStyle, graticule: &Graticule, resample_deg: f64) -> Self {
        Self {
            style,
            graticule: graticule.lines(),
            resample_deg,
        }
    }

    pub fn style(&self) -> &GlobeStyle {
        &self.style
    }

    /// Clears the surface and runs every pass of [`DRAW_ORDER`].
    pub fn render<R: RasterSurface>(
        &self,
        engine: &ProjectionEngine,
        land: &LandGeometry,
        raster: &mut R,
    ) -> RenderStats {
        let front = GeoPath::new(engine.front(), self.resample_deg);
        let back = GeoPath::new(engine.back(), self.resample_deg);
        let mut stats = RenderStats::default();

        raster.clear();
        for pass in DRAW_ORDER {
            self.draw_pass(pass, &front, &back, land, raster, &mut stats);
            stats.passes.push(pass);
        }
        trace!(fills = stats.fills, strokes = stats.strokes, "globe rendered");
        stats
    }

    fn draw_pass<R: RasterSurface>(
        &self,
        pass: DrawPass,
        front: &GeoPath<'_>,
        back: &GeoPath<'_>,
        land: &LandGeometry,
        raster: &mut R,
        stats: &mut RenderStats,
    ) {
        let style = &self.style;
        match pass {
            DrawPass::SphereFill => {
                fill(raster, &front.sphere(), &style.sphere_fill(), stats);
            }
            DrawPass::BackLand => {
                fill(raster, &back.land(land), &style.back_land_fill(), stats);
            }
            DrawPass::BackGraticule => {
                let path = back.lines(&self.graticule);
                stroke(raster, &path, &style.back_graticule.to_stroke(), stats);
            }
            DrawPass::FrontGraticule => {
                let path = front.lines(&self.graticule);
                stroke(raster, &path, &style.front_graticule.to_stroke(), stats);
            }
            DrawPass::FrontLand => {
                let path = front.land(land);
                stroke(raster, &path, &style.front_land_stroke.to_stroke(), stats);
                fill(raster, &path, &style.front_land_fill(), stats);
            }
            DrawPass::SphereOutline => {
                stroke(raster, &front.sphere(), &style.outline.to_stroke(), stats);
            }
        }
    }
}

fn fill<R: RasterSurface>(raster: &mut R, path: &Path, paint: &surface::Fill, stats: &mut RenderStats) {
    if path.is_empty() {
        return;
    }
    raster.fill_path(path, paint);
    stats.fills += 1;
}

fn stroke<R: RasterSurface>(
    raster: &mut R,
    path: &Path,
    paint: &surface::Stroke,
    stats: &mut RenderStats,
) {
    if path.is_empty() {
        return;
    }
    raster.stroke_path(path, paint);
    stats.strokes += 1;
}

#[cfg(test)]
mod tests {
    use super::{DRAW_ORDER, GlobeRenderer};
    use crate::graticule::Graticule;
    use crate::symbology::GlobeStyle;
    use foundation::math::{LonLat, ProjectionEngine, Rotation};
    use foundation::viewport::Viewport;
    use pretty_assertions::assert_eq;
    use scene::geometry::LandGeometry;
    use surface::{RasterOp, RecordingRaster};

    fn engine() -> ProjectionEngine {
        let mut e = ProjectionEngine::new(0.9);
        e.fit(&Viewport::new(500.0, 400.0, 1.0));
        e.set_rotation(Rotation::new(-10.0, -30.0, 0.0));
        e
    }

    fn square(lon: f64, lat: f64) -> Vec<LonLat> {
        vec![
            LonLat::new(lon - 5.0, lat - 5.0),
            LonLat::new(lon + 5.0, lat - 5.0),
            LonLat::new(lon + 5.0, lat + 5.0),
            LonLat::new(lon - 5.0, lat + 5.0),
        ]
    }

    fn colors(ops: &[RasterOp]) -> Vec<String> {
        ops.iter()
            .filter_map(|op| match op {
                RasterOp::Fill { fill, .. } => Some(format!("fill {}", fill.color)),
                RasterOp::Stroke { stroke, .. } => Some(format!("stroke {}", stroke.color)),
                RasterOp::Clear => None,
            })
            .collect()
    }

    #[test]
    fn passes_run_in_order_after_a_clear() {
        // One landmass near the view centre, one on the far side.
        let land = LandGeometry::new(vec![vec![square(10.0, 30.0)], vec![square(-170.0, -30.0)]]);
        let renderer = GlobeRenderer::new(GlobeStyle::default(), &Graticule::default(), 2.0);
        let mut raster = RecordingRaster::new();
        let stats = renderer.render(&engine(), &land, &mut raster);

        assert_eq!(stats.passes, DRAW_ORDER.to_vec());
        assert!(matches!(raster.ops().first(), Some(RasterOp::Clear)));
        assert_eq!(
            colors(raster.current_frame()),
            vec![
                "fill #fcfcfc",
                "fill #d0ddfa",
                "stroke #97b3f6",
                "stroke #1046c6",
                "stroke #1046c6",
                "fill #5c88ee",
                "stroke #1046c6",
            ]
        );
    }

    #[test]
    fn empty_land_skips_land_passes() {
        let renderer = GlobeRenderer::new(GlobeStyle::default(), &Graticule::default(), 2.0);
        let mut raster = RecordingRaster::new();
        let stats = renderer.render(&engine(), &LandGeometry::empty(), &mut raster);
        assert_eq!(stats.fills, 1);
        assert_eq!(stats.strokes, 3);
        assert_eq!(
            colors(raster.current_frame()),
            vec!["fill #fcfcfc", "stroke #97b3f6", "stroke #1046c6", "stroke #1046c6"]
        );
    }

    #[test]
    fn every_redraw_clears_first() {
        let renderer = GlobeRenderer::new(GlobeStyle::default(), &Graticule::default(), 2.0);
        let mut raster = RecordingRaster::new();
        let e = engine();
        renderer.render(&e, &LandGeometry::empty(), &mut raster);
        renderer.render(&e, &LandGeometry::empty(), &mut raster);
        assert_eq!(raster.clear_count(), 2);
        assert_eq!(raster.current_frame().len(), 4);
    }
}
