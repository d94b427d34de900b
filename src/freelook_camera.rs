//! A first-person fly camera controller.
//!
//! [`FreelookCamera`] turns a per-frame [`FlyInput`] snapshot into camera
//! orientation and position changes. There is no collision: the camera flies
//! through blocks and the floor.
//!
//! # Controls
//!
//! - **Mouse**: look around (pitch is limited to +/-85 degrees)
//! - **W/S**: move along the view direction
//! - **A/D**: strafe
//! - **Space / Left Ctrl**: move along the camera's up vector
//!
//! # Example
//!
//! ```ignore
//! let mut controller = FreelookCamera::new();
//!
//! // In frame loop:
//! controller.update(&FlyInput::from_input(&input), dt, &mut sandbox.camera);
//! ```

use glam::{DVec2, DVec3};
use winit::keyboard::KeyCode;

use crate::camera::Camera;
use crate::input::Input;
use crate::math::Orientation;

/// One frame of camera controls.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FlyInput {
    /// Mouse movement in pixels, y up.
    pub look: DVec2,
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl FlyInput {
    /// Read the movement keys and mouse motion from the input state.
    pub fn from_input(input: &Input) -> Self {
        let delta = input.mouse_delta();
        Self {
            look: DVec2::new(delta.x, -delta.y),
            forward: input.key_down(KeyCode::KeyW),
            backward: input.key_down(KeyCode::KeyS),
            left: input.key_down(KeyCode::KeyA),
            right: input.key_down(KeyCode::KeyD),
            up: input.key_down(KeyCode::Space),
            down: input.key_down(KeyCode::ControlLeft),
        }
    }

    /// The same controls with mouse look discarded.
    pub fn without_look(self) -> Self {
        Self {
            look: DVec2::ZERO,
            ..self
        }
    }
}

/// First-person camera controller. Angles are in degrees.
#[derive(Clone, Debug)]
pub struct FreelookCamera {
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
    /// Degrees of rotation per pixel of mouse movement.
    pub sensitivity: f64,
    /// Movement speed in units per second.
    pub speed: f64,
    /// Pitch is clamped to `-pitch_limit..=pitch_limit`.
    pub pitch_limit: f64,
}

impl Default for FreelookCamera {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            roll: 0.0,
            sensitivity: 0.2,
            speed: 20.0,
            pitch_limit: 85.0,
        }
    }
}

impl FreelookCamera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sensitivity(mut self, sensitivity: f64) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    pub fn speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn pitch_limit(mut self, degrees: f64) -> Self {
        self.pitch_limit = degrees.abs();
        self
    }

    pub fn orientation(&self) -> Orientation {
        Orientation::new(self.yaw, self.pitch, self.roll)
    }

    /// Apply one frame of controls to the camera.
    pub fn update(&mut self, input: &FlyInput, dt: f64, camera: &mut Camera) {
        self.yaw += input.look.x * self.sensitivity;
        self.pitch -= input.look.y * self.sensitivity;
        self.pitch = self.pitch.clamp(-self.pitch_limit, self.pitch_limit);

        camera.set_orientation(self.orientation());

        let ahead = camera.view_direction();
        let right = camera.right();
        let up = camera.up();

        let mut velocity = DVec3::ZERO;
        if input.forward {
            velocity += ahead;
        }
        if input.backward {
            velocity -= ahead;
        }
        if input.right {
            velocity += right;
        }
        if input.left {
            velocity -= right;
        }
        if input.up {
            velocity += up;
        }
        if input.down {
            velocity -= up;
        }

        if velocity.length_squared() > 0.0 {
            camera.position += velocity.normalize() * self.speed * dt;
        }
    }
}
