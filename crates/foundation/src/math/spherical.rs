use super::Vec3;

/// Geographic coordinates in degrees on the unit sphere.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// `true` when both components are finite and inside the geographic domain.
    pub fn is_valid(self) -> bool {
        self.lon.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lon)
            && (-90.0..=90.0).contains(&self.lat)
    }

    pub fn antipode(self) -> Self {
        Self::new(wrap_lon(self.lon + 180.0), -self.lat)
    }

    pub fn to_cartesian(self) -> Vec3 {
        lonlat_to_cartesian(self)
    }
}

/// Wraps a longitude into `[-180, 180)`.
pub fn wrap_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// d3 convention: x towards (0°, 0°), y towards (90°E, 0°), z towards the north pole.
pub fn lonlat_to_cartesian(p: LonLat) -> Vec3 {
    let lon = p.lon.to_radians();
    let lat = p.lat.to_radians();
    let cos_lat = lat.cos();
    Vec3::new(cos_lat * lon.cos(), cos_lat * lon.sin(), lat.sin())
}

pub fn cartesian_to_lonlat(v: Vec3) -> LonLat {
    let lat = v.z.clamp(-1.0, 1.0).asin();
    let lon = v.y.atan2(v.x);
    LonLat::new(lon.to_degrees(), lat.to_degrees())
}

/// Angle between two unit vectors, in radians.
pub fn angle_between(a: Vec3, b: Vec3) -> f64 {
    a.cross(b).length().atan2(a.dot(b))
}

/// Great-circle interpolation between two unit vectors.
pub fn slerp(a: Vec3, b: Vec3, t: f64) -> Vec3 {
    let omega = angle_between(a, b);
    if omega < 1e-12 {
        return a;
    }
    let s = omega.sin();
    if s.abs() < 1e-12 {
        // Antipodal endpoints: the arc is undefined, fall back to the chord.
        return (a.scale(1.0 - t) + b.scale(t)).normalized().unwrap_or(a);
    }
    let wa = ((1.0 - t) * omega).sin() / s;
    let wb = (t * omega).sin() / s;
    a.scale(wa) + b.scale(wb)
}

/// Appends the great-circle arc from `a` to `b` (excluding `a`, including `b`)
/// with no step longer than `max_step_rad`.
pub fn densify_arc(a: Vec3, b: Vec3, max_step_rad: f64, out: &mut Vec<Vec3>) {
    let omega = angle_between(a, b);
    let steps = if max_step_rad > 0.0 {
        (omega / max_step_rad).ceil().max(1.0) as usize
    } else {
        1
    };
    for i in 1..steps {
        out.push(slerp(a, b, i as f64 / steps as f64));
    }
    out.push(b);
}

#[cfg(test)]
mod tests {
    use super::{
        LonLat, angle_between, cartesian_to_lonlat, densify_arc, lonlat_to_cartesian, wrap_lon,
    };
    use crate::math::Vec3;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn cartesian_axes_follow_d3_convention() {
        let v = lonlat_to_cartesian(LonLat::new(90.0, 0.0));
        assert_close(v.x, 0.0, 1e-12);
        assert_close(v.y, 1.0, 1e-12);
        let n = lonlat_to_cartesian(LonLat::new(0.0, 90.0));
        assert_close(n.z, 1.0, 1e-12);
    }

    #[test]
    fn round_trip_lonlat_cartesian() {
        let p = LonLat::new(-0.13, 51.51);
        let rt = cartesian_to_lonlat(lonlat_to_cartesian(p));
        assert_close(rt.lon, p.lon, 1e-9);
        assert_close(rt.lat, p.lat, 1e-9);
    }

    #[test]
    fn antipode_flips_hemisphere() {
        let a = LonLat::new(2.35, 48.85).antipode();
        assert_close(a.lon, -177.65, 1e-9);
        assert_close(a.lat, -48.85, 1e-12);
        assert_eq!(wrap_lon(540.0), -180.0);
    }

    #[test]
    fn densify_respects_step() {
        let a = Vec3::new(1.0, 0.0, 0.0);
        let b = Vec3::new(0.0, 1.0, 0.0);
        let mut out = vec![a];
        densify_arc(a, b, 10f64.to_radians(), &mut out);
        assert!(out.len() >= 10 && out.len() <= 11);
        for w in out.windows(2) {
            assert!(angle_between(w[0], w[1]) <= 10f64.to_radians() + 1e-12);
        }
        assert_eq!(*out.last().unwrap(), b);
    }

    #[test]
    fn validity_rejects_out_of_range() {
        assert!(LonLat::new(180.0, -90.0).is_valid());
        assert!(!LonLat::new(f64::NAN, 0.0).is_valid());
        assert!(!LonLat::new(0.0, 91.0).is_valid());
    }
}
