use glam::{DVec2, DVec3};

use crate::math::{Orientation, RotationMatrix};

/// A pinhole camera that projects world points onto the screen.
///
/// Screen coordinates use a y-up convention with the origin in the bottom-left
/// corner of the viewport. The rotation matrix is cached and only rebuilt when
/// the orientation actually changes.
#[derive(Clone, Debug)]
pub struct Camera {
    pub position: DVec3,
    /// Focal length in pixels.
    pub fov: f64,
    pub viewport_width: f64,
    pub viewport_height: f64,
    /// Points farther than this from the camera are not drawn.
    pub render_distance: f64,
    orientation: Orientation,
    rotation: RotationMatrix,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: DVec3::new(0.0, 20.0, -50.0),
            fov: 400.0,
            viewport_width: 900.0,
            viewport_height: 600.0,
            render_distance: 500.0,
            orientation: Orientation::IDENTITY,
            rotation: RotationMatrix::IDENTITY,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, position: DVec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_fov(mut self, fov: f64) -> Self {
        self.fov = fov;
        self
    }

    pub fn with_viewport(mut self, width: f64, height: f64) -> Self {
        self.set_viewport(width, height);
        self
    }

    pub fn with_render_distance(mut self, distance: f64) -> Self {
        self.render_distance = distance;
        self
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.set_orientation(orientation);
        self
    }

    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport_width = width;
        self.viewport_height = height;
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Update the orientation, rebuilding the cached matrix only if it changed.
    ///
    /// Returns `true` when the matrix was rebuilt.
    pub fn set_orientation(&mut self, orientation: Orientation) -> bool {
        if orientation == self.orientation {
            return false;
        }
        self.orientation = orientation;
        self.rotation = orientation.matrix();
        true
    }

    pub fn rotation(&self) -> &RotationMatrix {
        &self.rotation
    }

    /// World-space forward basis vector (`-Z` at rest).
    pub fn forward(&self) -> DVec3 {
        self.rotation.forward()
    }

    pub fn right(&self) -> DVec3 {
        self.rotation.right()
    }

    pub fn up(&self) -> DVec3 {
        self.rotation.up()
    }

    /// The world direction that lands in the middle of the screen.
    pub fn view_direction(&self) -> DVec3 {
        self.rotation.view_direction()
    }

    pub fn distance_to(&self, point: DVec3) -> f64 {
        self.position.distance(point)
    }

    /// Transform a world point into camera space.
    #[inline]
    pub fn to_camera_space(&self, point: DVec3) -> DVec3 {
        self.rotation.apply(point - self.position)
    }

    /// Project a world point onto the screen.
    ///
    /// Returns `None` when the point is at or behind the camera plane, or
    /// strictly farther than the render distance.
    pub fn project(&self, point: DVec3) -> Option<DVec2> {
        let cam = self.to_camera_space(point);
        if cam.z <= 0.0 || cam.length() > self.render_distance {
            return None;
        }

        Some(DVec2::new(
            self.fov * (cam.x / cam.z) + self.viewport_width / 2.0,
            self.fov * (cam.y / cam.z) + self.viewport_height / 2.0,
        ))
    }
}
