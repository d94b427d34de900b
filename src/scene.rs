//! The painter's-algorithm draw pass.
//!
//! There is no depth buffer. Every frame each [`RenderItem`] is projected, items
//! with any point off-screen (behind the camera or past the render distance) are
//! dropped whole, and the rest are sorted far-to-near so nearer faces paint over
//! farther ones. The sorted list is handed to a [`DrawSurface`].

use glam::DVec2;

use crate::camera::Camera;
use crate::color::Color;
use crate::geometry::{Primitive, RenderItem};

/// Radius of the marker drawn for single-point items, in pixels.
pub const POINT_RADIUS: f32 = 1.0;
/// Width of line items, in pixels.
pub const LINE_WIDTH: f32 = 2.0;

/// Something that can rasterize the projected primitives.
///
/// Coordinates are screen pixels with the origin at the bottom-left and y up,
/// as produced by [`Camera::project`].
pub trait DrawSurface {
    fn point(&mut self, at: DVec2, color: Color);
    fn line(&mut self, from: DVec2, to: DVec2, color: Color);
    fn polygon(&mut self, points: &[DVec2], color: Color);
}

/// One projected item, ready to draw.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawCommand {
    /// Negated mean distance from the camera; farther items sort first.
    pub depth: f64,
    pub points: Vec<DVec2>,
    pub color: Color,
}

impl DrawCommand {
    pub fn kind(&self) -> Primitive {
        Primitive::from_point_count(self.points.len()).unwrap_or(Primitive::Point)
    }

    pub fn draw(&self, surface: &mut dyn DrawSurface) {
        match self.points.as_slice() {
            [] => {}
            [p] => surface.point(*p, self.color),
            [a, b] => surface.line(*a, *b, self.color),
            points => surface.polygon(points, self.color),
        }
    }
}

/// Project an item, or `None` if any of its points fails to project.
fn project_item(camera: &Camera, item: &RenderItem) -> Option<DrawCommand> {
    let points = item
        .points()
        .iter()
        .map(|&p| camera.project(p))
        .collect::<Option<Vec<_>>>()?;

    let total: f64 = item.points().iter().map(|&p| camera.distance_to(p)).sum();
    let depth = -total / item.points().len() as f64;

    Some(DrawCommand {
        depth,
        points,
        color: item.color(),
    })
}

/// The list of everything drawn in the world.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    items: Vec<RenderItem>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: RenderItem) {
        self.items.push(item);
    }

    pub fn extend(&mut self, items: impl IntoIterator<Item = RenderItem>) {
        self.items.extend(items);
    }

    pub fn items(&self) -> &[RenderItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Project and depth-sort the scene plus any per-frame overlay items.
    ///
    /// The sort is stable, so items at equal depth keep insertion order with
    /// overlay items after scene items.
    pub fn draw_list(&self, camera: &Camera, overlay: &[RenderItem]) -> Vec<DrawCommand> {
        let mut commands: Vec<DrawCommand> = self
            .items
            .iter()
            .chain(overlay)
            .filter_map(|item| project_item(camera, item))
            .collect();

        commands.sort_by(|a, b| a.depth.total_cmp(&b.depth));
        commands
    }

    /// Draw the scene back-to-front onto `surface`. Returns the number of items drawn.
    pub fn render(
        &self,
        camera: &Camera,
        overlay: &[RenderItem],
        surface: &mut dyn DrawSurface,
    ) -> usize {
        let commands = self.draw_list(camera, overlay);
        for command in &commands {
            command.draw(surface);
        }
        commands.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    #[derive(Debug, PartialEq)]
    enum Drawn {
        Point(Color),
        Line(Color),
        Polygon(usize, Color),
    }

    #[derive(Default)]
    struct Recorder(Vec<Drawn>);

    impl DrawSurface for Recorder {
        fn point(&mut self, _at: DVec2, color: Color) {
            self.0.push(Drawn::Point(color));
        }

        fn line(&mut self, _from: DVec2, _to: DVec2, color: Color) {
            self.0.push(Drawn::Line(color));
        }

        fn polygon(&mut self, points: &[DVec2], color: Color) {
            self.0.push(Drawn::Polygon(points.len(), color));
        }
    }

    fn camera() -> Camera {
        Camera::new().at(DVec3::ZERO)
    }

    fn quad_at(z: f64, color: Color) -> RenderItem {
        RenderItem::new(
            vec![
                DVec3::new(-1.0, -1.0, z),
                DVec3::new(1.0, -1.0, z),
                DVec3::new(1.0, 1.0, z),
                DVec3::new(-1.0, 1.0, z),
            ],
            color,
        )
        .unwrap()
    }

    #[test]
    fn draws_far_to_near() {
        let mut scene = Scene::new();
        scene.push(RenderItem::point(DVec3::new(0.0, 0.0, 10.0), Color::RED));
        scene.push(RenderItem::point(DVec3::new(0.0, 0.0, 30.0), Color::BLUE));
        scene.push(RenderItem::point(DVec3::new(0.0, 0.0, 20.0), Color::GREEN));

        let mut surface = Recorder::default();
        scene.render(&camera(), &[], &mut surface);

        assert_eq!(
            surface.0,
            vec![
                Drawn::Point(Color::BLUE),
                Drawn::Point(Color::GREEN),
                Drawn::Point(Color::RED),
            ]
        );
    }

    #[test]
    fn depth_is_negated_mean_distance() {
        let mut scene = Scene::new();
        scene.push(RenderItem::line(
            DVec3::new(0.0, 0.0, 10.0),
            DVec3::new(0.0, 0.0, 20.0),
            Color::WHITE,
        ));
        let commands = scene.draw_list(&camera(), &[]);
        assert_eq!(commands.len(), 1);
        assert!((commands[0].depth + 15.0).abs() < 1e-12);
    }

    #[test]
    fn item_with_hidden_point_is_dropped() {
        let mut scene = Scene::new();
        scene.push(RenderItem::line(
            DVec3::new(0.0, 0.0, 10.0),
            DVec3::new(0.0, 0.0, -10.0),
            Color::WHITE,
        ));
        scene.push(RenderItem::point(DVec3::new(0.0, 0.0, 600.0), Color::WHITE));
        scene.push(quad_at(5.0, Color::RED));

        let commands = scene.draw_list(&camera(), &[]);
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].color, Color::RED);
    }

    #[test]
    fn equal_depth_keeps_insertion_order() {
        let mut scene = Scene::new();
        scene.push(quad_at(10.0, Color::RED));
        scene.push(quad_at(10.0, Color::GREEN));
        let overlay = [quad_at(10.0, Color::BLUE)];

        let colors: Vec<Color> = scene
            .draw_list(&camera(), &overlay)
            .into_iter()
            .map(|c| c.color)
            .collect();
        assert_eq!(colors, vec![Color::RED, Color::GREEN, Color::BLUE]);
    }

    #[test]
    fn dispatches_on_point_count() {
        let mut scene = Scene::new();
        scene.push(quad_at(30.0, Color::RED));
        scene.push(RenderItem::line(
            DVec3::new(0.0, 0.0, 20.0),
            DVec3::new(1.0, 0.0, 20.0),
            Color::GREEN,
        ));
        scene.push(RenderItem::point(DVec3::new(0.0, 0.0, 10.0), Color::BLUE));

        let mut surface = Recorder::default();
        let drawn = scene.render(&camera(), &[], &mut surface);

        assert_eq!(drawn, 3);
        assert_eq!(
            surface.0,
            vec![
                Drawn::Polygon(4, Color::RED),
                Drawn::Line(Color::GREEN),
                Drawn::Point(Color::BLUE),
            ]
        );
    }

    #[test]
    fn overlay_is_sorted_with_scene() {
        let mut scene = Scene::new();
        scene.push(quad_at(10.0, Color::RED));
        let overlay = [quad_at(40.0, Color::WHITE)];

        let commands = scene.draw_list(&camera(), &overlay);
        assert_eq!(commands[0].color, Color::WHITE);
        assert_eq!(commands[1].color, Color::RED);
        assert_eq!(scene.len(), 1);
    }
}
