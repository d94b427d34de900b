use std::collections::HashSet;

use glam::DVec2;
use winit::event::{DeviceEvent, ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Tracks keyboard and mouse state for the current frame.
///
/// Mouse look uses raw device motion, which keeps arriving while the cursor is
/// captured and hidden. Deltas are in window pixels with y pointing down.
#[derive(Debug, Default)]
pub struct Input {
    keys_down: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
    mouse_buttons_down: HashSet<MouseButton>,
    mouse_buttons_pressed: HashSet<MouseButton>,
    mouse_position: DVec2,
    mouse_delta: DVec2,
    scroll_delta: f64,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call at the end of each frame to reset per-frame state.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.mouse_buttons_pressed.clear();
        self.mouse_delta = DVec2::ZERO;
        self.scroll_delta = 0.0;
    }

    /// Process a window event and update input state.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => {
                            if self.keys_down.insert(key) {
                                self.keys_pressed.insert(key);
                            }
                        }
                        ElementState::Released => {
                            self.keys_down.remove(&key);
                        }
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => match state {
                ElementState::Pressed => {
                    if self.mouse_buttons_down.insert(*button) {
                        self.mouse_buttons_pressed.insert(*button);
                    }
                }
                ElementState::Released => {
                    self.mouse_buttons_down.remove(button);
                }
            },
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse_position = DVec2::new(position.x, position.y);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.scroll_delta += match delta {
                    MouseScrollDelta::LineDelta(_, y) => f64::from(*y),
                    MouseScrollDelta::PixelDelta(pos) => pos.y / 120.0,
                };
            }
            WindowEvent::Focused(false) => {
                // Releases that happen while unfocused never reach us.
                self.keys_down.clear();
                self.mouse_buttons_down.clear();
            }
            _ => {}
        }
    }

    /// Process a raw device event (mouse motion).
    pub fn handle_device_event(&mut self, event: &DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            self.mouse_delta += DVec2::new(*dx, *dy);
        }
    }

    /// Returns true if the key is currently held down.
    pub fn key_down(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    /// Returns true if the key was pressed this frame.
    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Returns true if the mouse button is currently held down.
    pub fn mouse_down(&self, button: MouseButton) -> bool {
        self.mouse_buttons_down.contains(&button)
    }

    /// Returns true if the mouse button was pressed this frame.
    pub fn mouse_pressed(&self, button: MouseButton) -> bool {
        self.mouse_buttons_pressed.contains(&button)
    }

    /// Current cursor position in window coordinates.
    pub fn mouse_position(&self) -> DVec2 {
        self.mouse_position
    }

    /// Raw mouse movement this frame (y down).
    pub fn mouse_delta(&self) -> DVec2 {
        self.mouse_delta
    }

    /// Scroll wheel delta this frame, in lines.
    pub fn scroll_delta(&self) -> f64 {
        self.scroll_delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::event::DeviceId;

    fn mouse(state: ElementState) -> WindowEvent {
        WindowEvent::MouseInput {
            // SAFETY: only used as an opaque tag in tests.
            device_id: unsafe { DeviceId::dummy() },
            state,
            button: MouseButton::Left,
        }
    }

    #[test]
    fn raw_motion_accumulates_until_frame_end() {
        let mut input = Input::new();
        input.handle_device_event(&DeviceEvent::MouseMotion { delta: (3.0, -2.0) });
        input.handle_device_event(&DeviceEvent::MouseMotion { delta: (1.0, 1.0) });
        assert_eq!(input.mouse_delta(), DVec2::new(4.0, -1.0));

        input.begin_frame();
        assert_eq!(input.mouse_delta(), DVec2::ZERO);
    }

    #[test]
    fn press_is_a_rising_edge() {
        let mut input = Input::new();
        input.handle_event(&mouse(ElementState::Pressed));
        assert!(input.mouse_pressed(MouseButton::Left));
        assert!(input.mouse_down(MouseButton::Left));

        input.begin_frame();
        // Still held, but not newly pressed.
        input.handle_event(&mouse(ElementState::Pressed));
        assert!(!input.mouse_pressed(MouseButton::Left));
        assert!(input.mouse_down(MouseButton::Left));

        input.handle_event(&mouse(ElementState::Released));
        assert!(!input.mouse_down(MouseButton::Left));
    }

    #[test]
    fn focus_loss_releases_held_buttons() {
        let mut input = Input::new();
        input.handle_event(&mouse(ElementState::Pressed));
        input.handle_event(&WindowEvent::Focused(false));
        assert!(!input.mouse_down(MouseButton::Left));
    }
}
