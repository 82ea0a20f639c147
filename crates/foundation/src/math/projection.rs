//! Orthographic projection with a mirrored companion for the far hemisphere.
//!
//! The front projection shows the hemisphere facing the viewer. The back
//! projection uses the negated-longitude raw transform and the rotation
//! `(lambda + 180, -phi, -gamma)`, which places every point of the far
//! hemisphere exactly where an unclipped orthographic view would put it.
//! Painting the back first and the front on top fakes a translucent globe with
//! plain 2D compositing.

use super::{LonLat, Rotation, RotationMatrix, Vec2, Vec3, cartesian_to_lonlat};
use crate::bounds::Aabb2;
use crate::viewport::Viewport;

/// Smallest viewport dimension used when fitting, in CSS pixels.
pub const MIN_FIT_DIMENSION: f64 = 1.0;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScaleTranslate {
    pub scale: f64,
    pub translate: Vec2,
}

/// Fits `bounds` (projected units) into the viewport, leaving `1 - fill_ratio`
/// as margin along the constraining axis.
pub fn compute_scale_and_translate(
    viewport: &Viewport,
    bounds: Aabb2,
    fill_ratio: f64,
) -> ScaleTranslate {
    let width = clamp_dimension(viewport.width);
    let height = clamp_dimension(viewport.height);
    let bw = bounds.width().abs().max(f64::EPSILON);
    let bh = bounds.height().abs().max(f64::EPSILON);

    let scale = fill_ratio / (bw / width).max(bh / height);
    let translate = Vec2::new(
        (width - scale * (bounds.max[0] + bounds.min[0])) / 2.0,
        (height - scale * (bounds.max[1] + bounds.min[1])) / 2.0,
    );
    ScaleTranslate { scale, translate }
}

fn clamp_dimension(v: f64) -> f64 {
    if v.is_finite() {
        v.max(MIN_FIT_DIMENSION)
    } else {
        MIN_FIT_DIMENSION
    }
}

/// A rotated, scaled orthographic projection clipped at the horizon.
///
/// View-frame vectors have the depth towards the viewer in `x`; a point is on
/// the visible side when its depth is positive.
#[derive(Debug, Clone)]
pub struct Orthographic {
    rotation: Rotation,
    matrix: RotationMatrix,
    mirrored: bool,
    scale: f64,
    translate: Vec2,
}

impl Orthographic {
    pub fn new() -> Self {
        Self::with_mirror(false)
    }

    /// Projection drawing the far hemisphere as seen through the globe.
    pub fn mirrored() -> Self {
        Self::with_mirror(true)
    }

    fn with_mirror(mirrored: bool) -> Self {
        Self {
            rotation: Rotation::default(),
            matrix: RotationMatrix::IDENTITY,
            mirrored,
            scale: 1.0,
            translate: Vec2::ZERO,
        }
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Rotation) {
        self.rotation = rotation;
        self.matrix = rotation.matrix();
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn translate(&self) -> Vec2 {
        self.translate
    }

    pub fn set_scale_translate(&mut self, st: ScaleTranslate) {
        self.scale = st.scale;
        self.translate = st.translate;
    }

    /// Rotates a geographic unit vector into the view frame.
    pub fn view_vector(&self, v: Vec3) -> Vec3 {
        let r = self.matrix.apply(v);
        if self.mirrored {
            Vec3::new(r.x, -r.y, r.z)
        } else {
            r
        }
    }

    /// Screen position of a view-frame vector, ignoring its depth.
    pub fn view_to_screen(&self, view: Vec3) -> Vec2 {
        Vec2::new(
            self.translate.x + self.scale * view.y,
            self.translate.y - self.scale * view.z,
        )
    }

    /// Screen position of `p`, or `None` when it lies on the occluded side.
    pub fn project(&self, p: LonLat) -> Option<Vec2> {
        let view = self.view_vector(p.to_cartesian());
        if view.x > 0.0 {
            Some(self.view_to_screen(view))
        } else {
            None
        }
    }

    pub fn project_unclipped(&self, p: LonLat) -> Vec2 {
        self.view_to_screen(self.view_vector(p.to_cartesian()))
    }

    pub fn is_visible(&self, p: LonLat) -> bool {
        self.view_vector(p.to_cartesian()).x > 0.0
    }

    /// Geographic point under a screen position, `None` outside the disk.
    pub fn invert(&self, screen: Vec2) -> Option<LonLat> {
        let (x, y) = self.screen_to_raw(screen)?;
        let rho2 = x * x + y * y;
        if rho2 > 1.0 {
            return None;
        }
        Some(self.raw_to_lonlat(x, y, (1.0 - rho2).sqrt()))
    }

    /// Like [`Orthographic::invert`], but positions outside the disk are pulled
    /// radially onto the rim.
    pub fn invert_clamped(&self, screen: Vec2) -> Option<LonLat> {
        let (x, y) = self.screen_to_raw(screen)?;
        let rho = x.hypot(y);
        if rho <= 1.0 {
            return Some(self.raw_to_lonlat(x, y, (1.0 - rho * rho).sqrt()));
        }
        Some(self.raw_to_lonlat(x / rho, y / rho, 0.0))
    }

    fn screen_to_raw(&self, screen: Vec2) -> Option<(f64, f64)> {
        if !(self.scale.is_finite() && self.scale > 0.0) || !screen.is_finite() {
            return None;
        }
        Some((
            (screen.x - self.translate.x) / self.scale,
            (self.translate.y - screen.y) / self.scale,
        ))
    }

    fn raw_to_lonlat(&self, x: f64, y: f64, depth: f64) -> LonLat {
        let view = if self.mirrored {
            Vec3::new(depth, -x, y)
        } else {
            Vec3::new(depth, x, y)
        };
        cartesian_to_lonlat(self.matrix.apply_inverse(view))
    }

    /// Screen point on the horizon circle at `angle` (radians, counterclockwise
    /// from the positive x axis, y up).
    pub fn rim_point(&self, angle: f64) -> Vec2 {
        self.view_to_screen(Vec3::new(0.0, angle.cos(), angle.sin()))
    }
}

impl Default for Orthographic {
    fn default() -> Self {
        Self::new()
    }
}

/// Front projection plus its mechanically derived back projection.
///
/// Scale and translate are only changed by [`ProjectionEngine::fit`]; the back
/// projection's rotation is only changed by [`ProjectionEngine::set_rotation`].
#[derive(Debug, Clone)]
pub struct ProjectionEngine {
    front: Orthographic,
    back: Orthographic,
    bounds: Aabb2,
    fill_ratio: f64,
}

impl ProjectionEngine {
    pub fn new(fill_ratio: f64) -> Self {
        Self {
            front: Orthographic::new(),
            back: Orthographic::mirrored(),
            bounds: Aabb2::unit_sphere(),
            fill_ratio,
        }
    }

    pub fn fill_ratio(&self) -> f64 {
        self.fill_ratio
    }

    /// Recomputes scale and translate from the current viewport.
    pub fn fit(&mut self, viewport: &Viewport) -> ScaleTranslate {
        let st = compute_scale_and_translate(viewport, self.bounds, self.fill_ratio);
        self.front.set_scale_translate(st);
        self.back.set_scale_translate(st);
        st
    }

    pub fn set_rotation(&mut self, rotation: Rotation) {
        self.front.set_rotation(rotation);
        self.back.set_rotation(rotation.back());
    }

    pub fn rotation(&self) -> Rotation {
        self.front.rotation()
    }

    pub fn back_rotation(&self) -> Rotation {
        self.back.rotation()
    }

    pub fn scale_translate(&self) -> ScaleTranslate {
        ScaleTranslate {
            scale: self.front.scale(),
            translate: self.front.translate(),
        }
    }

    pub fn front(&self) -> &Orthographic {
        &self.front
    }

    pub fn back(&self) -> &Orthographic {
        &self.back
    }

    /// Screen position of a point on the visible hemisphere.
    pub fn project(&self, p: LonLat) -> Option<Vec2> {
        self.front.project(p)
    }

    pub fn invert(&self, screen: Vec2) -> Option<LonLat> {
        self.front.invert(screen)
    }
}

/// The point hidden directly behind `p` along the line of sight under `rotation`.
pub fn line_of_sight_twin(rotation: Rotation, p: LonLat) -> LonLat {
    let m = rotation.matrix();
    let view = m.apply(p.to_cartesian());
    cartesian_to_lonlat(m.apply_inverse(Vec3::new(-view.x, view.y, view.z)))
}

#[cfg(test)]
mod tests {
    use super::{ProjectionEngine, compute_scale_and_translate, line_of_sight_twin};
    use crate::bounds::Aabb2;
    use crate::math::{LonLat, Rotation, Vec2};
    use crate::viewport::Viewport;

    fn assert_vec2_close(a: Vec2, b: Vec2, eps: f64) {
        let d = a.distance(b);
        assert!(d <= eps, "expected {a:?} ~= {b:?} (diff {d})");
    }

    #[test]
    fn fit_centres_unit_sphere() {
        for (w, h) in [(800.0, 600.0), (1.0, 1000.0), (333.3, 333.3), (5000.0, 2.0)] {
            let st = compute_scale_and_translate(
                &Viewport::new(w, h, 1.0),
                Aabb2::unit_sphere(),
                0.9,
            );
            assert!(st.scale > 0.0 && st.scale.is_finite());
            assert_eq!(st.translate, Vec2::new(w / 2.0, h / 2.0));
            let expected = 0.9 * f64::min(w, h) / 2.0;
            assert!((st.scale - expected).abs() < 1e-9 * expected);
        }
    }

    #[test]
    fn degenerate_viewport_is_clamped() {
        for vp in [
            Viewport::new(0.0, 0.0, 1.0),
            Viewport::new(-10.0, 300.0, 1.0),
            Viewport::new(f64::NAN, f64::INFINITY, 1.0),
        ] {
            let st = compute_scale_and_translate(&vp, Aabb2::unit_sphere(), 1.0);
            assert!(st.scale.is_finite() && st.scale > 0.0);
            assert!(st.translate.is_finite());
        }
    }

    #[test]
    fn resize_round_trip_is_exact() {
        let mut engine = ProjectionEngine::new(0.9);
        let a = engine.fit(&Viewport::new(800.0, 600.0, 2.0));
        engine.fit(&Viewport::new(400.0, 300.0, 2.0));
        let b = engine.fit(&Viewport::new(800.0, 600.0, 2.0));
        assert_eq!(a.scale.to_bits(), b.scale.to_bits());
        assert_eq!(a.translate.x.to_bits(), b.translate.x.to_bits());
        assert_eq!(a.translate.y.to_bits(), b.translate.y.to_bits());
    }

    #[test]
    fn occluded_points_do_not_project() {
        let mut engine = ProjectionEngine::new(1.0);
        engine.fit(&Viewport::new(200.0, 200.0, 1.0));
        engine.set_rotation(Rotation::facing(LonLat::new(0.0, 0.0), 0.0));
        assert_eq!(engine.project(LonLat::new(0.0, 0.0)), Some(Vec2::new(100.0, 100.0)));
        assert_eq!(engine.project(LonLat::new(180.0, 0.0)), None);
        let east = engine.project(LonLat::new(90.0 - 1e-6, 0.0)).expect("visible");
        assert!((east.x - 200.0).abs() < 1e-6);
    }

    #[test]
    fn back_rotation_is_derived_on_every_set() {
        let mut engine = ProjectionEngine::new(0.9);
        for r in [Rotation::new(-10.0, -30.0, 0.0), Rotation::new(95.0, 12.0, -7.0)] {
            engine.set_rotation(r);
            assert_eq!(engine.back_rotation(), r.back());
        }
    }

    #[test]
    fn back_projection_matches_line_of_sight() {
        let mut engine = ProjectionEngine::new(0.9);
        engine.fit(&Viewport::new(640.0, 480.0, 1.0));
        let rotations = [
            Rotation::new(-10.0, -30.0, 0.0),
            Rotation::new(123.0, 45.0, 17.0),
            Rotation::new(-200.0, -80.0, -95.0),
        ];
        let points = [
            LonLat::new(2.35, 48.85),
            LonLat::new(-0.13, 51.51),
            LonLat::new(151.2, -33.9),
            LonLat::new(-70.0, 10.0),
        ];
        for r in rotations {
            engine.set_rotation(r);
            for p in points {
                let (front, hidden) = if engine.front().is_visible(p) {
                    (p, line_of_sight_twin(r, p))
                } else {
                    (line_of_sight_twin(r, p), p)
                };
                let a = engine.front().project(front).expect("front visible");
                let b = engine.back().project(hidden).expect("back visible");
                assert_vec2_close(a, b, 1e-9);
                // The back projection lands where the unclipped front view does.
                assert_vec2_close(
                    engine.back().project(hidden).expect("back visible"),
                    engine.front().project_unclipped(hidden),
                    1e-9,
                );
            }
        }
    }

    #[test]
    fn invert_recovers_projected_point() {
        let mut engine = ProjectionEngine::new(0.9);
        engine.fit(&Viewport::new(500.0, 400.0, 1.0));
        engine.set_rotation(Rotation::new(-10.0, -30.0, 0.0));
        let p = LonLat::new(2.35, 48.85);
        let screen = engine.project(p).expect("visible");
        let back = engine.invert(screen).expect("inside disk");
        assert!((back.lon - p.lon).abs() < 1e-9);
        assert!((back.lat - p.lat).abs() < 1e-9);
        assert_eq!(engine.invert(Vec2::new(-1000.0, -1000.0)), None);
        assert!(engine.front().invert_clamped(Vec2::new(-1000.0, -1000.0)).is_some());
    }
}
