//! # Flat Builder
//!
//! **A voxel placement sandbox drawn with a software 3D projector.**
//!
//! The world is a flat floor of grid slabs. You fly around it and click to drop
//! cubes onto the ground or onto the faces of cubes already placed. There is no
//! depth buffer: every face is projected on the CPU and painted far-to-near,
//! then the resulting 2D triangles are handed to wgpu for display.
//!
//! ## Quick Start
//!
//! ```no_run
//! use flat_builder::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     env_logger::init();
//!     run(AppConfig::new().title("My Builder").size(1280, 720))
//! }
//! ```
//!
//! ## Without a window
//!
//! The core is plain data, so it can be driven headless:
//!
//! ```
//! use flat_builder::{DVec3, Sandbox, SandboxConfig};
//!
//! let mut sandbox = Sandbox::new(SandboxConfig::default()).unwrap();
//! let cell = sandbox.place_block(DVec3::new(0.0, 20.0, -50.0), DVec3::NEG_Y);
//! assert_eq!(cell, Some(DVec3::new(0.0, 0.0, -50.0)));
//! ```
//!
//! ## Controls
//!
//! - **Mouse**: look around (cursor is captured; Escape releases it, click to recapture)
//! - **W/A/S/D, Space, Left Ctrl**: fly
//! - **Left click**: place a block
//! - **1-9, 0 / mouse wheel**: choose the block color

mod app;
mod assets;
mod camera;
mod clock;
mod color;
mod draw2d;
mod freelook_camera;
mod geometry;
mod gpu;
mod input;
mod math;
mod placement;
mod sandbox;
mod scene;

pub use app::{AppConfig, ClickActions, PALETTE_KEYS, click_actions, hud_text, palette_key, run};
pub use assets::{
    AtlasLayout, FONT_ENV_VAR, FontAtlas, FontError, GlyphInfo, font_candidates, pack_rows,
};
pub use camera::Camera;
pub use clock::FrameClock;
pub use color::{BLOCK_PALETTE, Color};
pub use draw2d::{Draw2d, Vertex2d};
pub use freelook_camera::{FlyInput, FreelookCamera};
pub use geometry::{CubeBuilder, GeometryError, Primitive, RenderItem, build_cube};
pub use gpu::GpuContext;
pub use input::Input;
pub use math::{Orientation, RotationMatrix};
pub use placement::{BaseplateRule, BlockSet, PlacementCaster, Ray, attachment_offset, snap_to_grid};
pub use sandbox::{Sandbox, SandboxConfig};
pub use scene::{DrawCommand, DrawSurface, LINE_WIDTH, POINT_RADIUS, Scene};

// Re-export glam math types for convenience
pub use glam::{DVec2, DVec3, I64Vec3};

// Re-export commonly used winit types for convenience
pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;
