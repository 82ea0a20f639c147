//! Turns spherical geometry into screen paths for one orthographic view.
//!
//! Everything happens in the view frame (`x` is depth). Edges are resampled
//! along great circles, then clipped at the horizon `x = 0`:
//! - lines are split into visible runs
//! - polygon rings are closed along the rim where they go out of view
//!
//! A ring's interior is taken to be its smaller side, independent of winding.
//! Fills use the even-odd rule, so a ring whose interior contains the hidden
//! back centre is complemented by adding the full rim circle.

use std::f64::consts::{PI, TAU};

use foundation::math::{LonLat, Orthographic, Vec2, Vec3, densify_arc};
use scene::geometry::{LandGeometry, Ring};
use surface::Path;

/// Maximum great-circle edge length before resampling, in degrees.
pub const DEFAULT_RESAMPLE_DEG: f64 = 2.0;

const RIM_STEP_RAD: f64 = 2.0 * PI / 180.0;
const DEGENERATE: f64 = 1e-12;

pub struct GeoPath<'a> {
    projection: &'a Orthographic,
    max_step_rad: f64,
}

impl<'a> GeoPath<'a> {
    pub fn new(projection: &'a Orthographic, resample_deg: f64) -> Self {
        let resample_deg = if resample_deg.is_finite() && resample_deg > 0.0 {
            resample_deg
        } else {
            DEFAULT_RESAMPLE_DEG
        };
        Self {
            projection,
            max_step_rad: resample_deg.to_radians(),
        }
    }

    /// Outline of the whole globe.
    pub fn sphere(&self) -> Path {
        Path::circle(self.projection.translate(), self.projection.scale())
    }

    /// Point marker; empty when the point is occluded.
    pub fn point(&self, p: LonLat, radius: f64) -> Path {
        match self.projection.project(p) {
            Some(center) => Path::circle(center, radius),
            None => Path::new(),
        }
    }

    pub fn land(&self, land: &LandGeometry) -> Path {
        let mut out = Path::new();
        for polygon in land.polygons() {
            for ring in polygon {
                self.ring(ring, &mut out);
            }
        }
        out
    }

    pub fn lines(&self, lines: &[Vec<LonLat>]) -> Path {
        let mut out = Path::new();
        for line in lines {
            self.line(line, &mut out);
        }
        out
    }

    /// Appends the visible runs of an open polyline.
    pub fn line(&self, line: &[LonLat], out: &mut Path) {
        let views = self.view_vectors(line);
        let Some(&first) = views.first() else {
            return;
        };
        let mut dense = vec![first];
        for w in views.windows(2) {
            densify_arc(w[0], w[1], self.max_step_rad, &mut dense);
        }

        let mut run: Vec<Vec2> = Vec::new();
        if is_front(first) {
            run.push(self.screen(first));
        }
        for w in dense.windows(2) {
            let (a, b) = (w[0], w[1]);
            match (is_front(a), is_front(b)) {
                (true, true) => run.push(self.screen(b)),
                (true, false) => {
                    run.push(self.rim(horizon_angle(a, b)));
                    out.push_polyline(&run, false);
                    run.clear();
                }
                (false, true) => {
                    run.push(self.rim(horizon_angle(b, a)));
                    run.push(self.screen(b));
                }
                (false, false) => {}
            }
        }
        out.push_polyline(&run, false);
    }

    /// Appends the visible part of a ring's interior as closed subpaths.
    pub fn ring(&self, ring: &Ring, out: &mut Path) {
        let mut verts = self.view_vectors(ring);
        verts.dedup_by(|b, a| same_point(*a, *b));
        while verts.len() >= 2 && same_point(verts[0], verts[verts.len() - 1]) {
            verts.pop();
        }
        if verts.len() < 3 {
            return;
        }

        let contains_back = area_about_front(&verts).abs() > TAU;

        let n = verts.len();
        let mut dense = vec![verts[0]];
        for i in 0..n {
            densify_arc(verts[i], verts[(i + 1) % n], self.max_step_rad, &mut dense);
        }
        dense.pop();

        let Some(start) = dense.iter().position(|v| is_front(*v)) else {
            // Fully occluded: the ring only ever touches the rim.
            if (rim_winding(&dense).rem_euclid(2) == 1) != contains_back {
                out.push_circle(self.projection.translate(), self.projection.scale());
            }
            return;
        };

        let m = dense.len();
        let mut pts = vec![self.screen(dense[start])];
        let mut rim_last: Option<f64> = None;
        for k in 0..m {
            let a = dense[(start + k) % m];
            let b = dense[(start + k + 1) % m];
            match (is_front(a), is_front(b)) {
                (true, true) => pts.push(self.screen(b)),
                (true, false) => {
                    let theta = horizon_angle(a, b);
                    pts.push(self.rim(theta));
                    rim_last = Some(theta);
                    if let Some(theta_b) = rim_angle(b) {
                        self.arc_to(&mut pts, &mut rim_last, theta_b);
                    }
                }
                (false, false) => {
                    if let Some(theta_b) = rim_angle(b) {
                        self.arc_to(&mut pts, &mut rim_last, theta_b);
                    }
                }
                (false, true) => {
                    let theta = horizon_angle(b, a);
                    self.arc_to(&mut pts, &mut rim_last, theta);
                    pts.push(self.screen(b));
                    rim_last = None;
                }
            }
        }
        // The walk ends back on the start vertex.
        pts.pop();
        out.push_polyline(&pts, true);

        if contains_back {
            out.push_circle(self.projection.translate(), self.projection.scale());
        }
    }

    fn view_vectors(&self, points: &[LonLat]) -> Vec<Vec3> {
        points
            .iter()
            .filter(|p| p.lon.is_finite() && p.lat.is_finite())
            .map(|p| self.projection.view_vector(p.to_cartesian()))
            .collect()
    }

    fn screen(&self, view: Vec3) -> Vec2 {
        self.projection.view_to_screen(view)
    }

    fn rim(&self, theta: f64) -> Vec2 {
        self.projection.rim_point(theta)
    }

    /// Follows the rim from the last rim angle to `theta` the short way round.
    fn arc_to(&self, pts: &mut Vec<Vec2>, rim_last: &mut Option<f64>, theta: f64) {
        if let Some(prev) = *rim_last {
            let delta = wrap_pi(theta - prev);
            let steps = (delta.abs() / RIM_STEP_RAD).ceil().max(1.0) as usize;
            for i in 1..steps {
                pts.push(self.rim(prev + delta * i as f64 / steps as f64));
            }
        }
        pts.push(self.rim(theta));
        *rim_last = Some(theta);
    }
}

fn is_front(v: Vec3) -> bool {
    v.x > 0.0
}

fn same_point(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < 1e-12
}

/// Rim angle of the horizon crossing on the edge from `visible` to `hidden`.
fn horizon_angle(visible: Vec3, hidden: Vec3) -> f64 {
    let t = visible.x / (visible.x - hidden.x);
    let p = visible + (hidden - visible).scale(t);
    p.z.atan2(p.y)
}

/// Angle of a hidden point pulled radially onto the rim; `None` at the back centre.
fn rim_angle(v: Vec3) -> Option<f64> {
    if v.y.hypot(v.z) < DEGENERATE {
        None
    } else {
        Some(v.z.atan2(v.y))
    }
}

fn wrap_pi(a: f64) -> f64 {
    let w = (a + PI).rem_euclid(TAU) - PI;
    if w.is_finite() { w } else { 0.0 }
}

/// Sum of signed spherical triangle areas fanned from the front centre.
///
/// The magnitude is the area of the side of the ring that does not contain
/// the back centre.
fn area_about_front(points: &[Vec3]) -> f64 {
    let f = Vec3::new(1.0, 0.0, 0.0);
    let n = points.len();
    (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            let num = f.dot(a.cross(b));
            let den = 1.0 + f.dot(a) + f.dot(b) + a.dot(b);
            2.0 * num.atan2(den)
        })
        .sum()
}

/// How many times a ring turns around the view axis.
fn rim_winding(points: &[Vec3]) -> i64 {
    let angles: Vec<f64> = points.iter().filter_map(|v| rim_angle(*v)).collect();
    let n = angles.len();
    if n < 2 {
        return 0;
    }
    let total: f64 = (0..n).map(|i| wrap_pi(angles[(i + 1) % n] - angles[i])).sum();
    (total / TAU).round() as i64
}

#[cfg(test)]
mod tests {
    use super::GeoPath;
    use foundation::math::{LonLat, Orthographic, Rotation, ScaleTranslate, Vec2};
    use surface::{Path, PathCommand};

    fn projection(center: LonLat, mirrored: bool) -> Orthographic {
        let mut p = if mirrored {
            Orthographic::mirrored()
        } else {
            Orthographic::new()
        };
        p.set_scale_translate(ScaleTranslate {
            scale: 100.0,
            translate: Vec2::new(200.0, 150.0),
        });
        let r = Rotation::facing(center, 0.0);
        p.set_rotation(if mirrored { r.back() } else { r });
        p
    }

    fn square(lon: f64, lat: f64, half: f64) -> Vec<LonLat> {
        vec![
            LonLat::new(lon - half, lat - half),
            LonLat::new(lon + half, lat - half),
            LonLat::new(lon + half, lat + half),
            LonLat::new(lon - half, lat + half),
            LonLat::new(lon - half, lat - half),
        ]
    }

    fn parallel(lat: f64) -> Vec<LonLat> {
        (0..=72).map(|i| LonLat::new(-180.0 + i as f64 * 5.0, lat)).collect()
    }

    fn circles(path: &Path) -> usize {
        path.commands()
            .iter()
            .filter(|c| matches!(c, PathCommand::Circle { .. }))
            .count()
    }

    fn points(path: &Path) -> Vec<Vec2> {
        path.commands()
            .iter()
            .filter_map(|c| match c {
                PathCommand::MoveTo(p) | PathCommand::LineTo(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    fn assert_inside_disk(path: &Path) {
        for p in points(path) {
            let r = p.distance(Vec2::new(200.0, 150.0));
            assert!(r <= 100.0 + 1e-6, "{p:?} outside the disk ({r})");
        }
    }

    #[test]
    fn visible_ring_is_projected_as_is() {
        let proj = projection(LonLat::new(0.0, 0.0), false);
        let mut out = Path::new();
        GeoPath::new(&proj, 2.0).ring(&square(0.0, 0.0, 10.0), &mut out);
        assert_eq!(out.subpath_count(), 1);
        assert_eq!(circles(&out), 0);
        assert!(matches!(out.commands().last(), Some(PathCommand::ClosePath)));
        assert_inside_disk(&out);
    }

    #[test]
    fn hidden_small_ring_draws_nothing() {
        let geo_proj = projection(LonLat::new(180.0, 0.0), false);
        let path = GeoPath::new(&geo_proj, 2.0);
        let mut out = Path::new();
        // Centred on the back.
        path.ring(&square(0.0, 0.0, 10.0), &mut out);
        // Off to the side of the back.
        path.ring(&square(-30.0, 20.0, 5.0), &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn straddling_ring_is_closed_along_rim() {
        let proj = projection(LonLat::new(85.0, 0.0), false);
        let mut out = Path::new();
        GeoPath::new(&proj, 2.0).ring(&square(0.0, 0.0, 10.0), &mut out);
        assert_eq!(out.subpath_count(), 1);
        assert_eq!(circles(&out), 0);
        assert_inside_disk(&out);
        let on_rim = points(&out)
            .iter()
            .filter(|p| (p.distance(Vec2::new(200.0, 150.0)) - 100.0).abs() < 1e-6)
            .count();
        assert!(on_rim >= 2);
    }

    #[test]
    fn ring_enclosing_back_centre_adds_rim() {
        // The smaller side of the 10N parallel is the cap north of it, which
        // holds the back centre when looking up from 60S.
        let proj = projection(LonLat::new(0.0, -60.0), false);
        let mut out = Path::new();
        GeoPath::new(&proj, 2.0).ring(&parallel(10.0), &mut out);
        assert_eq!(circles(&out), 1);
        assert_eq!(out.subpath_count(), 2);
        assert_inside_disk(&out);
    }

    #[test]
    fn southern_cap_is_clipped_without_rim() {
        let proj = projection(LonLat::new(0.0, 0.0), false);
        let mut out = Path::new();
        GeoPath::new(&proj, 2.0).ring(&parallel(-60.0), &mut out);
        assert_eq!(circles(&out), 0);
        assert_eq!(out.subpath_count(), 1);
        assert_inside_disk(&out);
    }

    #[test]
    fn back_projection_draws_the_far_side() {
        let front = projection(LonLat::new(0.0, 0.0), false);
        let back = projection(LonLat::new(0.0, 0.0), true);
        let far = square(180.0, 0.0, 10.0);

        let mut f = Path::new();
        GeoPath::new(&front, 2.0).ring(&far, &mut f);
        let mut b = Path::new();
        GeoPath::new(&back, 2.0).ring(&far, &mut b);

        assert!(f.is_empty());
        assert_eq!(b.subpath_count(), 1);
        assert_inside_disk(&b);
    }

    #[test]
    fn lines_split_at_horizon() {
        let proj = projection(LonLat::new(0.0, 0.0), false);
        let equator = parallel(0.0);
        let out = GeoPath::new(&proj, 2.0).lines(&[equator]);
        // From -180 to 180 only the front half (-90..90) is visible.
        assert_eq!(out.subpath_count(), 1);
        assert_inside_disk(&out);
        let pts = points(&out);
        assert!((pts[0].x - 100.0).abs() < 1e-6);
        assert!((pts[pts.len() - 1].x - 300.0).abs() < 1e-6);
    }

    #[test]
    fn occluded_point_has_empty_path() {
        let proj = projection(LonLat::new(0.0, 0.0), false);
        let path = GeoPath::new(&proj, 2.0);
        assert!(path.point(LonLat::new(180.0, 0.0), 4.5).is_empty());
        assert_eq!(path.point(LonLat::new(0.0, 0.0), 4.5), Path::circle(Vec2::new(200.0, 150.0), 4.5));
    }
}
