//! Rotation math shared by the camera, the cube builder and the placement ray.
//!
//! Angles are stored in degrees. The rotation matrix is kept row-major because the
//! camera reads its basis vectors straight out of the rows: row 0 is `right`,
//! row 1 is `up` and the negated row 2 is `forward`. The matrix is orthonormal,
//! so reading rows is the same as applying the inverse rotation to the world axes.

use glam::DVec3;

/// Yaw/pitch/roll angles in degrees.
///
/// Yaw turns around the global Y axis, pitch around the local X axis and roll
/// around the local Z axis.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Orientation {
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl Orientation {
    pub const IDENTITY: Orientation = Orientation::new(0.0, 0.0, 0.0);

    pub const fn new(yaw: f64, pitch: f64, roll: f64) -> Self {
        Self { yaw, pitch, roll }
    }

    /// Unpack an orientation stored in a vector as `(pitch, yaw, roll)`.
    ///
    /// This is the layout cube orientations use: each component names the axis
    /// the rotation happens around.
    pub fn from_packed(v: DVec3) -> Self {
        Self::new(v.y, v.x, v.z)
    }

    /// Build the rotation matrix for these angles.
    pub fn matrix(&self) -> RotationMatrix {
        RotationMatrix::from_angles(self.yaw, self.pitch, self.roll)
    }
}

/// A 3x3 row-major rotation matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotationMatrix {
    rows: [DVec3; 3],
}

impl Default for RotationMatrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl RotationMatrix {
    pub const IDENTITY: RotationMatrix = RotationMatrix {
        rows: [DVec3::X, DVec3::Y, DVec3::Z],
    };

    /// Build a Tait-Bryan (Y-X-Z) rotation from yaw, pitch and roll in degrees.
    ///
    /// Roll is applied first around Z, then pitch around X, then yaw around Y.
    pub fn from_angles(yaw_deg: f64, pitch_deg: f64, roll_deg: f64) -> Self {
        let (sy, cy) = yaw_deg.to_radians().sin_cos();
        let (sp, cp) = pitch_deg.to_radians().sin_cos();
        let (sr, cr) = roll_deg.to_radians().sin_cos();

        Self {
            rows: [
                DVec3::new(cy * cr + sy * sp * sr, sr * cp, -sy * cr + cy * sp * sr),
                DVec3::new(-cy * sr + sy * sp * cr, cr * cp, sr * sy + cy * sp * cr),
                DVec3::new(sy * cp, -sp, cy * cp),
            ],
        }
    }

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    /// Multiply a column vector by this matrix.
    #[inline]
    pub fn apply(&self, v: DVec3) -> DVec3 {
        DVec3::new(self.rows[0].dot(v), self.rows[1].dot(v), self.rows[2].dot(v))
    }

    /// Row `i` of the matrix. Panics if `i > 2`.
    #[inline]
    pub fn row(&self, i: usize) -> DVec3 {
        self.rows[i]
    }

    /// World-space right vector (row 0).
    pub fn right(&self) -> DVec3 {
        self.rows[0]
    }

    /// World-space up vector (row 1).
    pub fn up(&self) -> DVec3 {
        self.rows[1]
    }

    /// World-space forward vector (negated row 2, `-Z` at rest).
    pub fn forward(&self) -> DVec3 {
        -self.rows[2]
    }

    /// The direction that projects onto the centre of the screen (row 2).
    ///
    /// Camera-space `+Z` is in front of the camera, so this is the opposite of
    /// [`forward`](Self::forward).
    pub fn view_direction(&self) -> DVec3 {
        self.rows[2]
    }
}
