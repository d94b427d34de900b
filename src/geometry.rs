//! Renderable primitives and the oriented-box builder.
//!
//! Everything the scene draws is a [`RenderItem`]: one or more world-space points
//! sharing a color. The number of points decides how the item is drawn (see
//! [`Primitive`]). Boxes are produced by [`CubeBuilder`], either as six filled
//! quads or as twelve edge lines.
//!
//! # Example
//!
//! ```
//! use flat_builder::{Color, CubeBuilder, DVec3};
//!
//! let faces = CubeBuilder::new(&[Color::RED])
//!     .at(DVec3::new(5.0, 0.0, 5.0))
//!     .size(5.0, 5.0, 5.0)
//!     .build()
//!     .unwrap();
//! assert_eq!(faces.len(), 6);
//! ```

use glam::DVec3;

use crate::color::Color;
use crate::math::Orientation;

/// Errors raised while constructing render geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// A cube was requested without any face colors.
    NoColors,
    /// A render item was given an empty point list.
    EmptyPrimitive,
    /// A grid or box dimension that is not a positive finite number.
    InvalidSize(f64),
}

impl std::fmt::Display for GeometryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryError::NoColors => write!(f, "cube needs at least one color"),
            GeometryError::EmptyPrimitive => write!(f, "render item needs at least one point"),
            GeometryError::InvalidSize(size) => write!(f, "size must be positive, got {size}"),
        }
    }
}

impl std::error::Error for GeometryError {}

/// How a render item is drawn, derived from its point count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Primitive {
    /// A single point, drawn as a small marker.
    Point,
    /// Two points, drawn as a line segment.
    Line,
    /// Three or more points, drawn as a closed filled polygon.
    Polygon,
}

impl Primitive {
    pub fn from_point_count(count: usize) -> Option<Self> {
        match count {
            0 => None,
            1 => Some(Primitive::Point),
            2 => Some(Primitive::Line),
            _ => Some(Primitive::Polygon),
        }
    }
}

/// A colored sequence of world-space points.
///
/// Items are immutable once built; the scene owns them for the rest of the run.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderItem {
    points: Vec<DVec3>,
    color: Color,
}

impl RenderItem {
    pub fn new(points: Vec<DVec3>, color: Color) -> Result<Self, GeometryError> {
        if points.is_empty() {
            return Err(GeometryError::EmptyPrimitive);
        }
        Ok(Self { points, color })
    }

    pub fn point(at: DVec3, color: Color) -> Self {
        Self {
            points: vec![at],
            color,
        }
    }

    pub fn line(from: DVec3, to: DVec3, color: Color) -> Self {
        Self {
            points: vec![from, to],
            color,
        }
    }

    pub fn points(&self) -> &[DVec3] {
        &self.points
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn kind(&self) -> Primitive {
        // Construction guarantees at least one point.
        Primitive::from_point_count(self.points.len()).unwrap_or(Primitive::Point)
    }
}

/// Vertex indices of each cube face, in color order.
#[rustfmt::skip]
const FACES: [[usize; 4]; 6] = [
    [0, 1, 4, 2], // z = 0
    [0, 1, 5, 3], // y = 0
    [0, 2, 6, 3], // x = 0
    [4, 7, 6, 2], // y = ly
    [5, 7, 6, 3], // z = lz
    [4, 7, 5, 1], // x = lx
];

/// Vertex index pairs of the twelve cube edges.
#[rustfmt::skip]
const EDGES: [[usize; 2]; 12] = [
    [0, 1], [0, 2], [0, 3], [1, 4],
    [1, 5], [2, 4], [2, 6], [3, 5],
    [3, 6], [4, 7], [5, 7], [6, 7],
];

/// Fluent builder for box geometry.
///
/// The box has one corner at its local origin and extends along +X, +Y and +Z.
/// Corners are rotated by the orientation before being moved to the position.
#[derive(Clone, Debug)]
pub struct CubeBuilder<'a> {
    colors: &'a [Color],
    position: DVec3,
    orientation: Orientation,
    size: DVec3,
    filled: bool,
}

impl<'a> CubeBuilder<'a> {
    /// Start a unit cube at the origin with the given face colors.
    ///
    /// Fewer than six colors broadcasts the first one to every face.
    pub fn new(colors: &'a [Color]) -> Self {
        Self {
            colors,
            position: DVec3::ZERO,
            orientation: Orientation::IDENTITY,
            size: DVec3::ONE,
            filled: true,
        }
    }

    pub fn at(mut self, position: DVec3) -> Self {
        self.position = position;
        self
    }

    pub fn oriented(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn size(mut self, lx: f64, ly: f64, lz: f64) -> Self {
        self.size = DVec3::new(lx, ly, lz);
        self
    }

    /// Emit filled faces (`true`) or edge lines (`false`).
    pub fn filled(mut self, filled: bool) -> Self {
        self.filled = filled;
        self
    }

    pub fn wireframe(self) -> Self {
        self.filled(false)
    }

    /// The eight world-space corners of the box.
    pub fn corners(&self) -> [DVec3; 8] {
        let DVec3 { x: lx, y: ly, z: lz } = self.size;
        let rotation = self.orientation.matrix();
        [
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(lx, 0.0, 0.0),
            DVec3::new(0.0, ly, 0.0),
            DVec3::new(0.0, 0.0, lz),
            DVec3::new(lx, ly, 0.0),
            DVec3::new(lx, 0.0, lz),
            DVec3::new(0.0, ly, lz),
            DVec3::new(lx, ly, lz),
        ]
        .map(|v| rotation.apply(v) + self.position)
    }

    pub fn build(self) -> Result<Vec<RenderItem>, GeometryError> {
        let first = *self.colors.first().ok_or(GeometryError::NoColors)?;
        let colors: [Color; 6] = if self.colors.len() < 6 {
            [first; 6]
        } else {
            std::array::from_fn(|i| self.colors[i])
        };

        let verts = self.corners();

        let items = if self.filled {
            FACES
                .iter()
                .zip(colors)
                .map(|(face, color)| RenderItem {
                    points: face.iter().map(|&i| verts[i]).collect(),
                    color,
                })
                .collect()
        } else {
            EDGES
                .iter()
                .enumerate()
                .map(|(i, &[a, b])| RenderItem::line(verts[a], verts[b], colors[i / 2]))
                .collect()
        };

        Ok(items)
    }
}

/// Build the faces or edges of an oriented box.
///
/// `orientation` is packed as `(pitch, yaw, roll)` in degrees.
pub fn build_cube(
    colors: &[Color],
    position: DVec3,
    orientation: DVec3,
    lx: f64,
    ly: f64,
    lz: f64,
    filled: bool,
) -> Result<Vec<RenderItem>, GeometryError> {
    CubeBuilder::new(colors)
        .at(position)
        .oriented(Orientation::from_packed(orientation))
        .size(lx, ly, lz)
        .filled(filled)
        .build()
}
