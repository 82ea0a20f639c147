//! Unit quaternions ("versors") over the d3 rotation convention.
//!
//! Dragging a globe is done in versor space: the rotation that carries the
//! grabbed point onto the pointer is composed with the start orientation, then
//! converted back into a `(lambda, phi, gamma)` triple. This avoids gimbal lock
//! and keeps the grabbed point under the pointer anywhere on the sphere.

use super::{Rotation, Vec3};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Versor {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Default for Versor {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Versor {
    pub const IDENTITY: Self = Self {
        w: 1.0,
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn from_rotation(r: Rotation) -> Self {
        let (sl, cl) = (r.lambda().to_radians() * 0.5).sin_cos();
        let (sp, cp) = (r.phi().to_radians() * 0.5).sin_cos();
        let (sg, cg) = (r.gamma().to_radians() * 0.5).sin_cos();
        Self {
            w: cl * cp * cg + sl * sp * sg,
            x: sl * cp * cg - cl * sp * sg,
            y: cl * sp * cg + sl * cp * sg,
            z: cl * cp * sg - sl * sp * cg,
        }
    }

    pub fn to_rotation(self) -> Rotation {
        let Self { w, x, y, z } = self;
        let lambda = (2.0 * (w * x + y * z)).atan2(1.0 - 2.0 * (x * x + y * y));
        let phi = (2.0 * (w * y - z * x)).clamp(-1.0, 1.0).asin();
        let gamma = (2.0 * (w * z + x * y)).atan2(1.0 - 2.0 * (y * y + z * z));
        Rotation::new(lambda.to_degrees(), phi.to_degrees(), gamma.to_degrees())
    }

    /// Versor rotating unit vector `v0` onto unit vector `v1`.
    pub fn delta(v0: Vec3, v1: Vec3) -> Self {
        let axis = v0.cross(v1);
        let l = axis.length();
        if l < 1e-15 {
            return Self::IDENTITY;
        }
        let t = v0.dot(v1).clamp(-1.0, 1.0).acos() * 0.5;
        let s = t.sin();
        Self {
            w: t.cos(),
            x: axis.z / l * s,
            y: -axis.y / l * s,
            z: axis.x / l * s,
        }
    }

    /// Hamilton product `self * other`.
    pub fn mul(self, other: Self) -> Self {
        let (a, b) = (self, other);
        Self {
            w: a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
            x: a.x * b.w + a.w * b.x + a.y * b.z - a.z * b.y,
            y: a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
            z: a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
        }
    }

    pub fn conjugate(self) -> Self {
        Self {
            w: self.w,
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }

    pub fn normalized(self) -> Self {
        let n = (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt();
        if n > 1e-12 {
            Self {
                w: self.w / n,
                x: self.x / n,
                y: self.y / n,
                z: self.z / n,
            }
        } else {
            Self::IDENTITY
        }
    }

    /// Rotation angle in radians, in `[0, pi]` (shortest arc).
    pub fn angle(self) -> f64 {
        2.0 * self.w.abs().clamp(0.0, 1.0).acos()
    }

    /// Unit rotation axis in versor component space, `None` for the identity.
    pub fn axis(self) -> Option<[f64; 3]> {
        // Take the shortest arc so the axis and angle agree.
        let q = if self.w < 0.0 {
            Self {
                w: -self.w,
                x: -self.x,
                y: -self.y,
                z: -self.z,
            }
        } else {
            self
        };
        let s = (q.x * q.x + q.y * q.y + q.z * q.z).sqrt();
        if s < 1e-15 {
            return None;
        }
        Some([q.x / s, q.y / s, q.z / s])
    }

    pub fn from_axis_angle(axis: [f64; 3], angle_rad: f64) -> Self {
        let (s, c) = (angle_rad * 0.5).sin_cos();
        Self {
            w: c,
            x: axis[0] * s,
            y: axis[1] * s,
            z: axis[2] * s,
        }
    }
}
