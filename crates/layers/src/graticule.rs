use foundation::math::LonLat;
use serde::Deserialize;

const EPSILON: f64 = 1e-6;

/// Latitude/longitude grid, matching the classic 10° graticule layout:
/// - major meridians every `major_step` degrees from pole to pole
/// - the equator
/// - minor meridians and parallels every `step` degrees, within +-`minor_extent`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Graticule {
    pub step: f64,
    pub major_step: f64,
    pub minor_extent: f64,
    /// Sampling interval along each line, in degrees.
    pub precision: f64,
}

impl Default for Graticule {
    fn default() -> Self {
        Self {
            step: 10.0,
            major_step: 90.0,
            minor_extent: 80.0,
            precision: 2.5,
        }
    }
}

impl Graticule {
    pub fn lines(&self) -> Vec<Vec<LonLat>> {
        let step = positive_or(self.step, 10.0);
        let major = positive_or(self.major_step, 90.0);
        let precision = positive_or(self.precision, 2.5);
        let extent = self.minor_extent.clamp(0.0, 90.0);
        let mut out = Vec::new();

        for lon in stepped(-180.0, 180.0, major) {
            out.push(meridian(lon, -90.0 + EPSILON, 90.0 - EPSILON, precision));
        }
        out.push(parallel(0.0, precision));
        for lon in stepped(-180.0, 180.0, step) {
            if !on_multiple(lon, major) {
                out.push(meridian(lon, -extent, extent, precision));
            }
        }
        for lat in stepped_inclusive(-extent, extent, step) {
            if lat.abs() > EPSILON {
                out.push(parallel(lat, precision));
            }
        }
        out
    }
}

fn positive_or(v: f64, fallback: f64) -> f64 {
    if v.is_finite() && v > 0.0 { v } else { fallback }
}

fn on_multiple(v: f64, m: f64) -> bool {
    let r = v.rem_euclid(m);
    r < EPSILON || m - r < EPSILON
}

/// Multiples of `step` in `[start, end)`.
fn stepped(start: f64, end: f64, step: f64) -> Vec<f64> {
    let first = (start / step).ceil() as i64;
    (first..)
        .map(|i| i as f64 * step)
        .take_while(|v| *v < end - EPSILON)
        .collect()
}

/// Multiples of `step` in `[start, end]`.
fn stepped_inclusive(start: f64, end: f64, step: f64) -> Vec<f64> {
    let first = ((start - EPSILON) / step).ceil() as i64;
    (first..)
        .map(|i| i as f64 * step)
        .take_while(|v| *v <= end + EPSILON)
        .collect()
}

fn samples(from: f64, to: f64, precision: f64) -> Vec<f64> {
    let mut out: Vec<f64> = (0..)
        .map(|i| from + i as f64 * precision)
        .take_while(|v| *v < to - EPSILON)
        .collect();
    out.push(to);
    out
}

fn meridian(lon: f64, lat0: f64, lat1: f64, precision: f64) -> Vec<LonLat> {
    samples(lat0, lat1, precision)
        .into_iter()
        .map(|lat| LonLat::new(lon, lat))
        .collect()
}

fn parallel(lat: f64, precision: f64) -> Vec<LonLat> {
    samples(-180.0, 180.0, precision)
        .into_iter()
        .map(|lon| LonLat::new(lon, lat))
        .collect()
}
