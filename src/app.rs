use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, DeviceId, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::KeyCode;
use winit::window::{CursorGrabMode, Window, WindowAttributes, WindowId};

use crate::assets::{self, FontAtlas};
use crate::clock::FrameClock;
use crate::color::Color;
use crate::draw2d::Draw2d;
use crate::freelook_camera::{FlyInput, FreelookCamera};
use crate::gpu::GpuContext;
use crate::input::Input;
use crate::sandbox::{Sandbox, SandboxConfig};

const CROSSHAIR_RADIUS: f32 = 2.0;
const HUD_MARGIN: f32 = 10.0;

/// Window and frame-loop settings.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Frame rate cap; `0` leaves pacing to vsync alone.
    pub target_fps: u32,
    /// HUD font file. Falls back to `FLAT_BUILDER_FONT`, then system fonts.
    pub font: Option<PathBuf>,
    pub font_size: f32,
    pub sandbox: SandboxConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Flat Builder 3D".to_string(),
            width: 900,
            height: 600,
            target_fps: 60,
            font: None,
            font_size: 14.0,
            sandbox: SandboxConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn target_fps(mut self, fps: u32) -> Self {
        self.target_fps = fps;
        self
    }

    pub fn font(mut self, path: impl Into<PathBuf>) -> Self {
        self.font = Some(path.into());
        self
    }

    pub fn sandbox(mut self, sandbox: SandboxConfig) -> Self {
        self.sandbox = sandbox;
        self
    }
}

/// Open the window and run the sandbox until it is closed.
///
/// Setup failures (window, GPU, floor geometry) end the event loop and are
/// returned from here.
pub fn run(config: AppConfig) -> anyhow::Result<()> {
    log::info!(
        "starting \"{}\" at {}x{}, {} fps cap",
        config.title,
        config.width,
        config.height,
        config.target_fps
    );

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = FlatBuilderApp {
        state: AppState::Pending(config),
        error: None,
    };
    event_loop
        .run_app(&mut app)
        .context("event loop terminated abnormally")?;

    match app.error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Number-row keys in palette order: 1..9 select slots 0..8, 0 selects slot 9.
pub const PALETTE_KEYS: [KeyCode; 10] = [
    KeyCode::Digit1,
    KeyCode::Digit2,
    KeyCode::Digit3,
    KeyCode::Digit4,
    KeyCode::Digit5,
    KeyCode::Digit6,
    KeyCode::Digit7,
    KeyCode::Digit8,
    KeyCode::Digit9,
    KeyCode::Digit0,
];

pub fn palette_key(key: KeyCode) -> Option<usize> {
    PALETTE_KEYS.iter().position(|&k| k == key)
}

pub fn hud_text(selected: usize, placed: usize) -> String {
    format!("Selected: {selected}\nPlaced: {placed}")
}

/// What the cursor and the left button do this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClickActions {
    pub release: bool,
    pub grab: bool,
    pub place: bool,
}

/// Escape releases the cursor. A click while released only re-grabs it; a
/// click while grabbed places a block.
pub fn click_actions(grabbed: bool, escape: bool, click: bool) -> ClickActions {
    let release = grabbed && escape;
    let still_grabbed = grabbed && !release;
    ClickActions {
        release,
        grab: click && !still_grabbed,
        place: click && still_grabbed,
    }
}

enum AppState {
    Pending(AppConfig),
    Running(Box<Running>),
    Finished,
}

struct FlatBuilderApp {
    state: AppState,
    error: Option<anyhow::Error>,
}

struct Running {
    window: Arc<Window>,
    gpu: GpuContext,
    draw_2d: Draw2d,
    sandbox: Sandbox,
    controller: FreelookCamera,
    input: Input,
    clock: FrameClock,
    grabbed: bool,
    title: String,
    shown_hud: String,
}

impl Running {
    fn new(event_loop: &ActiveEventLoop, config: AppConfig) -> anyhow::Result<Self> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));
        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .context("failed to create window")?,
        );

        let gpu = GpuContext::new(window.clone())?;
        let mut draw_2d = Draw2d::new(&gpu);

        let env_font = std::env::var_os(assets::FONT_ENV_VAR).map(PathBuf::from);
        let candidates = assets::font_candidates(config.font.as_deref(), env_font);
        match FontAtlas::load_first(&gpu, &candidates, config.font_size) {
            Some(atlas) => draw_2d.set_font(&gpu, atlas),
            None => log::warn!(
                "no HUD font found (set {}); showing the HUD in the window title",
                assets::FONT_ENV_VAR
            ),
        }

        let mut sandbox = Sandbox::new(config.sandbox).context("failed to build the floor")?;
        sandbox
            .camera
            .set_viewport(f64::from(gpu.width()), f64::from(gpu.height()));

        let mut running = Self {
            window,
            gpu,
            draw_2d,
            sandbox,
            controller: FreelookCamera::new(),
            input: Input::new(),
            clock: FrameClock::new(config.target_fps),
            grabbed: false,
            title: config.title,
            shown_hud: String::new(),
        };
        running.set_grab(true);
        Ok(running)
    }

    fn set_grab(&mut self, grab: bool) {
        if grab {
            let result = self
                .window
                .set_cursor_grab(CursorGrabMode::Confined)
                .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Locked));
            if let Err(e) = result {
                log::warn!("cursor grab unavailable: {e}");
            }
        } else if let Err(e) = self.window.set_cursor_grab(CursorGrabMode::None) {
            log::warn!("failed to release cursor: {e}");
        }
        self.window.set_cursor_visible(!grab);
        self.grabbed = grab;
        log::debug!("cursor {}", if grab { "grabbed" } else { "released" });
    }

    fn frame(&mut self) {
        let dt = self.clock.tick();

        let actions = click_actions(
            self.grabbed,
            self.input.key_pressed(KeyCode::Escape),
            self.input.mouse_pressed(MouseButton::Left),
        );
        if actions.release {
            self.set_grab(false);
        }
        if actions.grab {
            self.set_grab(true);
        }

        let fly = FlyInput::from_input(&self.input);
        let fly = if self.grabbed { fly } else { fly.without_look() };
        self.controller.update(&fly, dt, &mut self.sandbox.camera);

        for (slot, &key) in PALETTE_KEYS.iter().enumerate() {
            if self.input.key_pressed(key) {
                self.sandbox.select_color(slot);
            }
        }
        let scroll = self.input.scroll_delta();
        if scroll != 0.0 {
            self.sandbox.cycle_color(if scroll < 0.0 { 1 } else { -1 });
        }

        if actions.place {
            self.sandbox.place_from_camera();
        }

        self.draw_2d.begin_frame(self.gpu.height());
        let preview = self.sandbox.preview(Color::WHITE);
        self.sandbox
            .scene()
            .render(&self.sandbox.camera, &preview, &mut self.draw_2d);

        let center = [
            self.gpu.width() as f32 * 0.5,
            self.gpu.height() as f32 * 0.5,
        ];
        self.draw_2d.circle(center, CROSSHAIR_RADIUS, Color::WHITE);

        let hud = hud_text(self.sandbox.selected_index(), self.sandbox.placed_count());
        if self.draw_2d.has_font() {
            self.draw_2d.text(HUD_MARGIN, HUD_MARGIN, &hud, Color::WHITE);
        } else if hud != self.shown_hud {
            self.window
                .set_title(&format!("{} | {}", self.title, hud.replace('\n', " | ")));
            self.shown_hud = hud;
        }

        self.present();
        self.input.begin_frame();
    }

    fn present(&mut self) {
        self.draw_2d.prepare(&self.gpu);

        let output = match self.gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("surface lost, reconfiguring");
                self.gpu.reconfigure();
                return;
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::debug!("surface timeout, skipping frame");
                return;
            }
            Err(e) => {
                log::warn!("failed to acquire frame: {e}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Frame Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.draw_2d.render(&mut render_pass);
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}

impl ApplicationHandler for FlatBuilderApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let AppState::Pending(config) = std::mem::replace(&mut self.state, AppState::Finished)
        else {
            return;
        };

        match Running::new(event_loop, config) {
            Ok(running) => {
                running.window.request_redraw();
                self.state = AppState::Running(Box::new(running));
            }
            Err(e) => {
                log::error!("startup failed: {e:#}");
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        if let AppState::Running(running) = &mut self.state
            && running.grabbed
        {
            running.input.handle_device_event(&event);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let AppState::Running(running) = &mut self.state else {
            return;
        };

        running.input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("placed {} blocks", running.sandbox.placed_count());
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                running.gpu.resize(size.width, size.height);
                if size.width > 0 && size.height > 0 {
                    running
                        .sandbox
                        .camera
                        .set_viewport(f64::from(size.width), f64::from(size.height));
                }
            }
            WindowEvent::Focused(false) if running.grabbed => {
                running.set_grab(false);
            }
            WindowEvent::RedrawRequested => {
                running.frame();
                running.window.request_redraw();
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_row_selects_palette_slots() {
        assert_eq!(palette_key(KeyCode::Digit1), Some(0));
        assert_eq!(palette_key(KeyCode::Digit9), Some(8));
        assert_eq!(palette_key(KeyCode::Digit0), Some(9));
        assert_eq!(palette_key(KeyCode::KeyQ), None);

        for (slot, &key) in PALETTE_KEYS.iter().enumerate() {
            assert_eq!(palette_key(key), Some(slot));
        }
    }

    #[test]
    fn hud_lists_selection_and_count() {
        assert_eq!(hud_text(3, 12), "Selected: 3\nPlaced: 12");
    }

    #[test]
    fn click_while_grabbed_places() {
        let actions = click_actions(true, false, true);
        assert_eq!(
            actions,
            ClickActions {
                place: true,
                ..Default::default()
            }
        );
    }

    #[test]
    fn regrab_click_is_consumed() {
        let actions = click_actions(false, false, true);
        assert!(actions.grab);
        assert!(!actions.place);
    }

    #[test]
    fn escape_releases_only_when_grabbed() {
        assert!(click_actions(true, true, false).release);
        assert_eq!(click_actions(false, true, false), ClickActions::default());
    }

    #[test]
    fn escape_and_click_in_one_frame_regrab() {
        let actions = click_actions(true, true, true);
        assert!(actions.release && actions.grab);
        assert!(!actions.place);
    }

    #[test]
    fn default_config_matches_the_window() {
        let config = AppConfig::default();
        assert_eq!(config.title, "Flat Builder 3D");
        assert_eq!((config.width, config.height), (900, 600));
        assert_eq!(config.target_fps, 60);
        assert_eq!(config.sandbox.viewport, (900.0, 600.0));
    }
}
