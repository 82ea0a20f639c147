use super::{LonLat, Vec3};

/// Three-axis spherical rotation in degrees, d3 convention.
///
/// `lambda` spins the globe around the polar axis, `phi` tilts it towards the
/// viewer and `gamma` rolls it around the viewing axis. A point `(lon, lat)`
/// faces the viewer under `Rotation::new(-lon, -lat, 0.0)`.
///
/// `lambda` is always stored modulo 360, in `[0, 360)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rotation {
    lambda: f64,
    phi: f64,
    gamma: f64,
}

impl Default for Rotation {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

impl Rotation {
    pub fn new(lambda: f64, phi: f64, gamma: f64) -> Self {
        Self {
            lambda: normalize_degrees(lambda),
            phi,
            gamma,
        }
    }

    pub fn from_array(r: [f64; 3]) -> Self {
        Self::new(r[0], r[1], r[2])
    }

    /// Rotation that brings `target` to the centre of the visible hemisphere,
    /// keeping the given roll.
    pub fn facing(target: LonLat, gamma: f64) -> Self {
        Self::new(-target.lon, -target.lat, gamma)
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn phi(&self) -> f64 {
        self.phi
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.lambda, self.phi, self.gamma]
    }

    /// Rotation of the mirrored projection that paints the far hemisphere.
    pub fn back(self) -> Self {
        Self::new(self.lambda + 180.0, -self.phi, -self.gamma)
    }

    pub fn with_lambda_offset(self, delta_deg: f64) -> Self {
        Self::new(self.lambda + delta_deg, self.phi, self.gamma)
    }

    pub fn is_finite(&self) -> bool {
        self.lambda.is_finite() && self.phi.is_finite() && self.gamma.is_finite()
    }

    pub fn matrix(&self) -> RotationMatrix {
        RotationMatrix::from_rotation(*self)
    }
}

fn normalize_degrees(v: f64) -> f64 {
    let r = v.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if r >= 360.0 { 0.0 } else { r }
}

/// Orthonormal 3x3 matrix form of a [`Rotation`], row-major.
///
/// Applied to geographic cartesian vectors it yields view-frame vectors whose
/// `x` component is the depth towards the viewer.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RotationMatrix {
    m: [[f64; 3]; 3],
}

impl RotationMatrix {
    pub const IDENTITY: Self = Self {
        m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    pub fn from_rotation(r: Rotation) -> Self {
        let (sl, cl) = r.lambda.to_radians().sin_cos();
        let (sp, cp) = r.phi.to_radians().sin_cos();
        let (sg, cg) = r.gamma.to_radians().sin_cos();

        // Longitude shift, then tilt about y, then roll about x.
        let lambda = [[cl, -sl, 0.0], [sl, cl, 0.0], [0.0, 0.0, 1.0]];
        let phi = [[cp, 0.0, -sp], [0.0, 1.0, 0.0], [sp, 0.0, cp]];
        let gamma = [[1.0, 0.0, 0.0], [0.0, cg, -sg], [0.0, sg, cg]];

        Self {
            m: mat3_mul(gamma, mat3_mul(phi, lambda)),
        }
    }

    pub fn apply(&self, v: Vec3) -> Vec3 {
        let m = &self.m;
        Vec3::new(
            m[0][0] * v.x + m[0][1] * v.y + m[0][2] * v.z,
            m[1][0] * v.x + m[1][1] * v.y + m[1][2] * v.z,
            m[2][0] * v.x + m[2][1] * v.y + m[2][2] * v.z,
        )
    }

    /// Applies the inverse rotation (the transpose).
    pub fn apply_inverse(&self, v: Vec3) -> Vec3 {
        let m = &self.m;
        Vec3::new(
            m[0][0] * v.x + m[1][0] * v.y + m[2][0] * v.z,
            m[0][1] * v.x + m[1][1] * v.y + m[2][1] * v.z,
            m[0][2] * v.x + m[1][2] * v.y + m[2][2] * v.z,
        )
    }
}

fn mat3_mul(a: [[f64; 3]; 3], b: [[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let mut c = [[0.0; 3]; 3];
    for (row, c_row) in c.iter_mut().enumerate() {
        for (col, cell) in c_row.iter_mut().enumerate() {
            *cell = a[row][0] * b[0][col] + a[row][1] * b[1][col] + a[row][2] * b[2][col];
        }
    }
    c
}
