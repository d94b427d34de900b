//! The world state: camera, scene, placed blocks and the selected color.
//!
//! A [`Sandbox`] owns everything the frame loop mutates. The floor is built once
//! in [`Sandbox::new`]; placed blocks are appended to the scene as they are
//! created and stay there for the rest of the run.

use glam::DVec3;

use crate::camera::Camera;
use crate::color::{BLOCK_PALETTE, Color};
use crate::geometry::{CubeBuilder, GeometryError, RenderItem};
use crate::placement::{BaseplateRule, BlockSet, PlacementCaster, Ray};
use crate::scene::Scene;

/// World and camera settings.
#[derive(Clone, Debug)]
pub struct SandboxConfig {
    /// Edge length of one block.
    pub grid_size: f64,
    /// The floor spans `-floor_extent..=floor_extent` on X and Z.
    pub floor_extent: i32,
    /// Thickness of each floor slab.
    pub floor_height: f64,
    pub floor_color: Color,
    pub palette: Vec<Color>,
    pub camera_position: DVec3,
    /// Focal length in pixels.
    pub fov: f64,
    pub viewport: (f64, f64),
    pub render_distance: f64,
    /// How far the placement ray reaches.
    pub reach: f64,
    pub baseplate: BaseplateRule,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            grid_size: 5.0,
            floor_extent: 50,
            floor_height: 1.0,
            floor_color: Color::GRAY,
            palette: BLOCK_PALETTE.to_vec(),
            camera_position: DVec3::new(0.0, 20.0, -50.0),
            fov: 400.0,
            viewport: (900.0, 600.0),
            render_distance: 500.0,
            reach: 50.0,
            baseplate: BaseplateRule::Ground,
        }
    }
}

impl SandboxConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grid_size(mut self, grid_size: f64) -> Self {
        self.grid_size = grid_size;
        self
    }

    pub fn floor_extent(mut self, extent: i32) -> Self {
        self.floor_extent = extent;
        self
    }

    pub fn palette(mut self, palette: impl Into<Vec<Color>>) -> Self {
        self.palette = palette.into();
        self
    }

    pub fn camera_position(mut self, position: DVec3) -> Self {
        self.camera_position = position;
        self
    }

    pub fn viewport(mut self, width: f64, height: f64) -> Self {
        self.viewport = (width, height);
        self
    }

    pub fn render_distance(mut self, distance: f64) -> Self {
        self.render_distance = distance;
        self
    }

    pub fn reach(mut self, reach: f64) -> Self {
        self.reach = reach;
        self
    }

    pub fn baseplate(mut self, rule: BaseplateRule) -> Self {
        self.baseplate = rule;
        self
    }

    /// Grid coordinates of every floor slab, row by row.
    ///
    /// Slabs start at `-floor_extent` and repeat every `grid_size` up to and
    /// including `floor_extent`.
    fn floor_cells(&self) -> impl Iterator<Item = DVec3> + '_ {
        let extent = f64::from(self.floor_extent);
        let grid = self.grid_size;
        let steps = (2.0 * extent / grid).floor() as i64;
        let coord = move |i: i64| -extent + i as f64 * grid;
        (0..=steps).flat_map(move |i| {
            (0..=steps).map(move |j| DVec3::new(coord(i), 0.0, coord(j)))
        })
    }
}

/// The voxel sandbox state driven by the frame loop.
#[derive(Clone, Debug)]
pub struct Sandbox {
    pub camera: Camera,
    scene: Scene,
    blocks: BlockSet,
    caster: PlacementCaster,
    palette: Vec<Color>,
    selected: usize,
    grid_size: f64,
}

impl Sandbox {
    /// Build the sandbox and its static floor.
    pub fn new(config: SandboxConfig) -> Result<Self, GeometryError> {
        if config.palette.is_empty() {
            return Err(GeometryError::NoColors);
        }
        if !(config.grid_size.is_finite() && config.grid_size > 0.0) {
            return Err(GeometryError::InvalidSize(config.grid_size));
        }

        let mut scene = Scene::new();
        let floor_colors = [config.floor_color];
        for cell in config.floor_cells() {
            scene.extend(
                CubeBuilder::new(&floor_colors)
                    .at(cell)
                    .size(config.grid_size, config.floor_height, config.grid_size)
                    .build()?,
            );
        }
        log::info!(
            "built floor: {} primitives over +/-{} units",
            scene.len(),
            config.floor_extent
        );

        let camera = Camera::new()
            .at(config.camera_position)
            .with_fov(config.fov)
            .with_viewport(config.viewport.0, config.viewport.1)
            .with_render_distance(config.render_distance);

        let caster = PlacementCaster::new(config.grid_size)
            .max_distance(config.reach)
            .baseplate(config.baseplate);

        Ok(Self {
            camera,
            scene,
            blocks: BlockSet::new(config.grid_size),
            caster,
            palette: config.palette,
            selected: 0,
            grid_size: config.grid_size,
        })
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn blocks(&self) -> &BlockSet {
        &self.blocks
    }

    pub fn placed_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn palette(&self) -> &[Color] {
        &self.palette
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_color(&self) -> Color {
        self.palette[self.selected]
    }

    /// Select a palette entry. Out-of-range indices are ignored.
    pub fn select_color(&mut self, index: usize) -> bool {
        if index >= self.palette.len() {
            return false;
        }
        self.selected = index;
        true
    }

    /// Move the selection by `delta`, wrapping around the palette.
    pub fn cycle_color(&mut self, delta: i32) {
        let len = self.palette.len() as i64;
        self.selected = (self.selected as i64 + delta as i64).rem_euclid(len) as usize;
    }

    /// The free cell a placement along this ray would fill.
    pub fn placement_target(&self, origin: DVec3, direction: DVec3) -> Option<DVec3> {
        self.caster.target(&Ray::new(origin, direction), &self.blocks)
    }

    /// Place a block where the ray lands. Returns the new cell, or `None` if the
    /// ray found nothing or the cell is already taken.
    pub fn place_block(&mut self, origin: DVec3, direction: DVec3) -> Option<DVec3> {
        let Some(cell) = self.caster.cast(&Ray::new(origin, direction), &self.blocks) else {
            log::trace!("placement ray from {origin} found no cell");
            return None;
        };

        if !self.blocks.insert(cell) {
            log::trace!("cell {cell} is already occupied");
            return None;
        }

        let color = [self.selected_color()];
        let faces = CubeBuilder::new(&color)
            .at(cell)
            .size(self.grid_size, self.grid_size, self.grid_size)
            .build();
        match faces {
            Ok(faces) => self.scene.extend(faces),
            Err(e) => log::error!("failed to build block at {cell}: {e}"),
        }

        log::debug!("placed block #{} at {cell}", self.blocks.len());
        Some(cell)
    }

    /// Place a block along the camera's view direction.
    pub fn place_from_camera(&mut self) -> Option<DVec3> {
        self.place_block(self.camera.position, self.camera.view_direction())
    }

    /// Wireframe outline of the cell the camera is aiming at, if any.
    pub fn preview(&self, color: Color) -> Vec<RenderItem> {
        let Some(cell) = self.placement_target(self.camera.position, self.camera.view_direction())
        else {
            return Vec::new();
        };
        CubeBuilder::new(&[color])
            .at(cell)
            .size(self.grid_size, self.grid_size, self.grid_size)
            .wireframe()
            .build()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Orientation;

    fn small() -> Sandbox {
        Sandbox::new(SandboxConfig::new().floor_extent(10)).unwrap()
    }

    #[test]
    fn default_floor_is_a_grid_of_slabs() {
        let sandbox = Sandbox::new(SandboxConfig::default()).unwrap();
        // 21 x 21 slabs, six faces each.
        assert_eq!(sandbox.scene().len(), 21 * 21 * 6);
        assert_eq!(sandbox.placed_count(), 0);
        assert!(
            sandbox
                .scene()
                .items()
                .iter()
                .all(|item| item.color() == Color::GRAY)
        );
    }

    #[test]
    fn empty_palette_is_rejected() {
        let err = Sandbox::new(SandboxConfig::new().palette(Vec::new())).unwrap_err();
        assert_eq!(err, GeometryError::NoColors);
    }

    #[test]
    fn fractional_grid_tiles_without_overlap() {
        let config = SandboxConfig::new().grid_size(2.5).floor_extent(10);
        let sandbox = Sandbox::new(config).unwrap();
        // -10..=10 every 2.5 gives 9 slabs per row.
        assert_eq!(sandbox.scene().len(), 9 * 9 * 6);

        let origins: Vec<DVec3> = sandbox
            .scene()
            .items()
            .iter()
            .step_by(6)
            .map(|slab| slab.points()[0])
            .collect();
        assert_eq!(origins[0], DVec3::new(-10.0, 0.0, -10.0));
        assert_eq!(origins[1], DVec3::new(-10.0, 0.0, -7.5));
        assert_eq!(origins[9], DVec3::new(-7.5, 0.0, -10.0));
        assert_eq!(origins[80], DVec3::new(10.0, 0.0, 10.0));
    }

    #[test]
    fn non_positive_grid_is_rejected() {
        for grid in [0.0, -5.0, f64::NAN] {
            let err = Sandbox::new(SandboxConfig::new().grid_size(grid)).unwrap_err();
            assert!(matches!(err, GeometryError::InvalidSize(_)));
        }
    }

    #[test]
    fn placing_adds_a_cube_in_the_selected_color() {
        let mut sandbox = small();
        let floor = sandbox.scene().len();
        sandbox.select_color(2);

        let cell = sandbox
            .place_block(DVec3::new(0.0, 20.0, -50.0), DVec3::NEG_Y)
            .unwrap();

        assert_eq!(cell, DVec3::new(0.0, 0.0, -50.0));
        assert_eq!(sandbox.placed_count(), 1);
        assert_eq!(sandbox.scene().len(), floor + 6);
        let block_faces = &sandbox.scene().items()[floor..];
        assert!(block_faces.iter().all(|item| item.color() == Color::BLUE));
    }

    #[test]
    fn duplicate_placement_is_a_no_op() {
        let mut sandbox = small();
        let origin = DVec3::new(4.0, 20.0, -49.0);

        // The first click lands on the ground; the second hits that block near
        // its +X face and attaches beside it.
        assert_eq!(
            sandbox.place_block(origin, DVec3::NEG_Y),
            Some(DVec3::new(0.0, 0.0, -50.0))
        );
        assert_eq!(
            sandbox.place_block(origin, DVec3::NEG_Y),
            Some(DVec3::new(5.0, 0.0, -50.0))
        );
        let scene_len = sandbox.scene().len();

        // Now the attachment cell is taken, so further clicks change nothing.
        for _ in 0..2 {
            assert_eq!(sandbox.place_block(origin, DVec3::NEG_Y), None);
            assert_eq!(sandbox.placed_count(), 2);
            assert_eq!(sandbox.scene().len(), scene_len);
        }
    }

    #[test]
    fn legacy_rule_rejects_the_occupied_camera_cell() {
        let config = SandboxConfig::new()
            .floor_extent(10)
            .baseplate(BaseplateRule::Legacy);
        let mut sandbox = Sandbox::new(config).unwrap();
        let origin = DVec3::new(0.0, 23.0, -50.0);

        assert_eq!(
            sandbox.place_block(origin, DVec3::NEG_Y),
            Some(DVec3::new(0.0, 20.0, -50.0))
        );
        assert_eq!(sandbox.placement_target(origin, DVec3::NEG_Y), None);
        assert_eq!(sandbox.place_block(origin, DVec3::NEG_Y), None);
        assert_eq!(sandbox.placed_count(), 1);
    }

    #[test]
    fn repeated_clicks_stack_upwards() {
        let mut sandbox = small();
        let origin = DVec3::new(1.0, 20.0, -49.0);

        let first = sandbox.place_block(origin, DVec3::NEG_Y).unwrap();
        let second = sandbox.place_block(origin, DVec3::NEG_Y).unwrap();

        assert_eq!(first, DVec3::new(0.0, 0.0, -50.0));
        assert_eq!(second, DVec3::new(0.0, 5.0, -50.0));
    }

    #[test]
    fn missed_ray_places_nothing() {
        let mut sandbox = small();
        assert_eq!(sandbox.place_block(DVec3::new(0.0, 20.0, 0.0), DVec3::Y), None);
        assert_eq!(sandbox.placed_count(), 0);
    }

    #[test]
    fn camera_placement_uses_view_direction() {
        let mut sandbox = small();
        sandbox.camera.position = DVec3::new(1.0, 20.0, -49.0);
        sandbox.camera.set_orientation(Orientation::new(0.0, 90.0, 0.0));

        let preview = sandbox.preview(Color::WHITE);
        assert_eq!(preview.len(), 12);

        let cell = sandbox.place_from_camera().unwrap();
        assert_eq!(cell, DVec3::new(0.0, 0.0, -50.0));
    }

    #[test]
    fn color_selection_wraps() {
        let mut sandbox = small();
        assert!(!sandbox.select_color(10));
        assert_eq!(sandbox.selected_index(), 0);

        sandbox.cycle_color(-1);
        assert_eq!(sandbox.selected_index(), 9);
        assert_eq!(sandbox.selected_color(), Color::WHITE);

        sandbox.cycle_color(3);
        assert_eq!(sandbox.selected_index(), 2);
    }
}
