//! Grid snapping and the block placement ray.
//!
//! Placement marches a sample point along a [`Ray`] in fixed steps. Each sample
//! is snapped to its grid cell; the first cell that is either an existing block
//! or on the ground decides where the new block goes:
//!
//! - a sample inside an existing block attaches the new block to the face on the
//!   dominant axis of the sample's offset inside that block,
//! - a sample whose cell satisfies the [`BaseplateRule`] is itself the target.
//!
//! Under [`BaseplateRule::Ground`] the block check comes first, so blocks
//! resting on the ground can be built on. [`BaseplateRule::Legacy`] checks the
//! ground first.
//!
//! # Example
//!
//! ```
//! use flat_builder::{BlockSet, DVec3, PlacementCaster, Ray};
//!
//! let caster = PlacementCaster::new(5.0);
//! let blocks = BlockSet::new(5.0);
//! let ray = Ray::new(DVec3::new(0.0, 20.0, -50.0), DVec3::NEG_Y);
//!
//! assert_eq!(caster.cast(&ray, &blocks), Some(DVec3::new(0.0, 0.0, -50.0)));
//! ```

use std::collections::HashSet;

use glam::{DVec3, I64Vec3};

/// A ray with an origin and a normalized direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: DVec3,
    pub direction: DVec3,
}

impl Ray {
    /// Create a ray; the direction is normalized (a zero direction stays zero).
    pub fn new(origin: DVec3, direction: DVec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    #[inline]
    pub fn point_at(&self, t: f64) -> DVec3 {
        self.origin + self.direction * t
    }
}

/// Snap a point to the origin corner of its grid cell.
#[inline]
pub fn snap_to_grid(point: DVec3, grid_size: f64) -> DVec3 {
    (point / grid_size).floor() * grid_size
}

/// When a snapped cell counts as the ground.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BaseplateRule {
    /// Cells at or below `y = 0`.
    #[default]
    Ground,
    /// `y <= 0 || y >= 1`, checked before placed blocks. With a grid size of 1
    /// or more this matches every cell, so the ray stops on its first sample.
    Legacy,
}

impl BaseplateRule {
    /// Whether the ground test runs before the placed-block test.
    pub fn checked_first(self) -> bool {
        self == BaseplateRule::Legacy
    }

    pub fn hits(self, cell: DVec3) -> bool {
        match self {
            BaseplateRule::Ground => cell.y <= 0.0,
            BaseplateRule::Legacy => cell.y <= 0.0 || cell.y >= 1.0,
        }
    }
}

/// Placed block cells, in placement order, without duplicates.
#[derive(Clone, Debug)]
pub struct BlockSet {
    grid_size: f64,
    cells: Vec<DVec3>,
    index: HashSet<I64Vec3>,
}

impl BlockSet {
    pub fn new(grid_size: f64) -> Self {
        Self {
            grid_size,
            cells: Vec::new(),
            index: HashSet::new(),
        }
    }

    fn key(&self, cell: DVec3) -> I64Vec3 {
        (cell / self.grid_size).round().as_i64vec3()
    }

    /// Record a cell. Returns `false` if it was already present.
    pub fn insert(&mut self, cell: DVec3) -> bool {
        if !self.index.insert(self.key(cell)) {
            return false;
        }
        self.cells.push(cell);
        true
    }

    pub fn contains(&self, cell: DVec3) -> bool {
        self.index.contains(&self.key(cell))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = DVec3> + '_ {
        self.cells.iter().copied()
    }

    pub fn grid_size(&self) -> f64 {
        self.grid_size
    }
}

/// Step from a block to its neighbour across the face nearest `local`.
///
/// `local` is the sample's offset from the block's origin corner. The axis with
/// the largest magnitude wins, ties going to X, then Y, then Z. A zero offset
/// steps in the negative direction.
pub fn attachment_offset(local: DVec3, grid_size: f64) -> DVec3 {
    let a = local.abs();
    let step = |v: f64| if v > 0.0 { grid_size } else { -grid_size };

    if a.x >= a.y && a.x >= a.z {
        DVec3::new(step(local.x), 0.0, 0.0)
    } else if a.y >= a.z {
        DVec3::new(0.0, step(local.y), 0.0)
    } else {
        DVec3::new(0.0, 0.0, step(local.z))
    }
}

/// Marches placement rays through the grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacementCaster {
    pub grid_size: f64,
    /// The march stops before reaching this distance.
    pub max_distance: f64,
    /// Distance between samples. Must be positive.
    pub step: f64,
    pub baseplate: BaseplateRule,
}

impl PlacementCaster {
    /// A caster with a reach of 50 and a step of half a cell.
    pub fn new(grid_size: f64) -> Self {
        Self {
            grid_size,
            max_distance: 50.0,
            step: grid_size / 2.0,
            baseplate: BaseplateRule::Ground,
        }
    }

    pub fn max_distance(mut self, max_distance: f64) -> Self {
        self.max_distance = max_distance;
        self
    }

    pub fn step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    pub fn baseplate(mut self, rule: BaseplateRule) -> Self {
        self.baseplate = rule;
        self
    }

    /// Find the cell a block would be attached to, if any.
    ///
    /// The returned cell may already be occupied; see [`target`](Self::target).
    pub fn cast(&self, ray: &Ray, blocks: &BlockSet) -> Option<DVec3> {
        if self.step <= 0.0 {
            log::warn!("placement step must be positive, got {}", self.step);
            return None;
        }

        let samples = (0u32..)
            .map(|i| f64::from(i) * self.step)
            .take_while(|&d| d < self.max_distance);

        for d in samples {
            let p = ray.point_at(d);
            let cell = snap_to_grid(p, self.grid_size);

            if self.baseplate.checked_first() && self.baseplate.hits(cell) {
                return Some(cell);
            }
            if blocks.contains(cell) {
                return Some(cell + attachment_offset(p - cell, self.grid_size));
            }
            if self.baseplate.hits(cell) {
                return Some(cell);
            }
        }

        None
    }

    /// Like [`cast`](Self::cast), but `None` when the hit cell is already occupied.
    pub fn target(&self, ray: &Ray, blocks: &BlockSet) -> Option<DVec3> {
        self.cast(ray, blocks).filter(|&cell| !blocks.contains(cell))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRID: f64 = 5.0;

    #[test]
    fn snapping_floors_each_axis() {
        assert_eq!(
            snap_to_grid(DVec3::new(7.4, -0.1, 5.0), GRID),
            DVec3::new(5.0, -5.0, 5.0)
        );
        assert_eq!(snap_to_grid(DVec3::new(-12.5, 0.0, 4.99), GRID), DVec3::new(-15.0, 0.0, 0.0));
    }

    #[test]
    fn aiming_down_hits_the_baseplate() {
        let caster = PlacementCaster::new(GRID);
        let ray = Ray::new(DVec3::new(0.0, 20.0, -50.0), DVec3::new(0.0, -3.0, 0.0));
        let hit = caster.cast(&ray, &BlockSet::new(GRID)).unwrap();
        assert_eq!(hit, DVec3::new(0.0, 0.0, -50.0));
    }

    #[test]
    fn legacy_baseplate_stops_on_first_sample() {
        let caster = PlacementCaster::new(GRID).baseplate(BaseplateRule::Legacy);
        let ray = Ray::new(DVec3::new(1.0, 20.0, -49.0), DVec3::NEG_Y);
        let hit = caster.cast(&ray, &BlockSet::new(GRID)).unwrap();
        assert_eq!(hit, DVec3::new(0.0, 20.0, -50.0));
    }

    #[test]
    fn ray_that_never_reaches_ground_misses() {
        let caster = PlacementCaster::new(GRID);
        let ray = Ray::new(DVec3::new(0.0, 20.0, 0.0), DVec3::Y);
        assert_eq!(caster.cast(&ray, &BlockSet::new(GRID)), None);

        let level = Ray::new(DVec3::new(0.0, 20.0, 0.0), DVec3::X);
        assert_eq!(caster.cast(&level, &BlockSet::new(GRID)), None);
    }

    #[test]
    fn reach_limits_the_march() {
        let caster = PlacementCaster::new(GRID).max_distance(10.0);
        let ray = Ray::new(DVec3::new(0.0, 20.0, 0.0), DVec3::NEG_Y);
        assert_eq!(caster.cast(&ray, &BlockSet::new(GRID)), None);
    }

    #[test]
    fn attaches_on_positive_x_face() {
        let mut blocks = BlockSet::new(GRID);
        blocks.insert(DVec3::new(0.0, 10.0, 0.0));
        let caster = PlacementCaster::new(GRID).step(4.0);

        // Travelling +X at y = 11, z = 1: the first sample inside the block is
        // at local x = 3, the largest local offset.
        let ray = Ray::new(DVec3::new(-1.0, 11.0, 1.0), DVec3::X);
        let hit = caster.cast(&ray, &blocks).unwrap();
        assert_eq!(hit, DVec3::new(5.0, 10.0, 0.0));
    }

    #[test]
    fn stacks_on_top_when_aiming_down() {
        let mut blocks = BlockSet::new(GRID);
        blocks.insert(DVec3::new(0.0, 0.0, -50.0));
        let caster = PlacementCaster::new(GRID);
        let ray = Ray::new(DVec3::new(1.0, 20.0, -49.0), DVec3::NEG_Y);
        assert_eq!(caster.cast(&ray, &blocks), Some(DVec3::new(0.0, 5.0, -50.0)));
    }

    #[test]
    fn attachment_prefers_x_then_y_on_ties() {
        assert_eq!(
            attachment_offset(DVec3::new(2.0, 2.0, 2.0), GRID),
            DVec3::new(GRID, 0.0, 0.0)
        );
        assert_eq!(
            attachment_offset(DVec3::new(1.0, 3.0, 3.0), GRID),
            DVec3::new(0.0, GRID, 0.0)
        );
        assert_eq!(
            attachment_offset(DVec3::new(1.0, 2.0, -4.0), GRID),
            DVec3::new(0.0, 0.0, -GRID)
        );
        assert_eq!(attachment_offset(DVec3::ZERO, GRID), DVec3::new(-GRID, 0.0, 0.0));
    }

    #[test]
    fn target_skips_occupied_cells() {
        let mut blocks = BlockSet::new(GRID);
        blocks.insert(DVec3::new(0.0, 0.0, -50.0));
        let caster = PlacementCaster::new(GRID);
        let ray = Ray::new(DVec3::new(4.0, 20.0, -49.0), DVec3::NEG_Y);

        // The ray enters the block near its +X face.
        assert_eq!(caster.target(&ray, &blocks), Some(DVec3::new(5.0, 0.0, -50.0)));

        blocks.insert(DVec3::new(5.0, 0.0, -50.0));
        assert_eq!(caster.cast(&ray, &blocks), Some(DVec3::new(5.0, 0.0, -50.0)));
        assert_eq!(caster.target(&ray, &blocks), None);
    }

    #[test]
    fn legacy_checks_ground_before_blocks() {
        let mut blocks = BlockSet::new(GRID);
        blocks.insert(DVec3::new(0.0, 20.0, -50.0));
        let caster = PlacementCaster::new(GRID).baseplate(BaseplateRule::Legacy);
        let ray = Ray::new(DVec3::new(0.0, 23.0, -50.0), DVec3::NEG_Y);

        // The camera's own cell wins, even though it is occupied.
        assert_eq!(caster.cast(&ray, &blocks), Some(DVec3::new(0.0, 20.0, -50.0)));
        assert_eq!(caster.target(&ray, &blocks), None);

        let ground = PlacementCaster::new(GRID);
        assert_eq!(ground.cast(&ray, &blocks), Some(DVec3::new(0.0, 25.0, -50.0)));
    }

    #[test]
    fn block_set_rejects_duplicates() {
        let mut blocks = BlockSet::new(GRID);
        assert!(blocks.insert(DVec3::new(5.0, 0.0, -10.0)));
        assert!(!blocks.insert(DVec3::new(5.0, 0.0, -10.0)));
        assert!(blocks.insert(DVec3::new(-5.0, 0.0, -10.0)));
        assert_eq!(blocks.len(), 2);
        assert!(blocks.contains(DVec3::new(-5.0, 0.0, -10.0)));
        assert_eq!(
            blocks.iter().collect::<Vec<_>>(),
            vec![DVec3::new(5.0, 0.0, -10.0), DVec3::new(-5.0, 0.0, -10.0)]
        );
    }

    #[test]
    fn non_positive_step_never_hits() {
        let caster = PlacementCaster::new(GRID).step(0.0);
        let ray = Ray::new(DVec3::new(0.0, 20.0, 0.0), DVec3::NEG_Y);
        assert_eq!(caster.cast(&ray, &BlockSet::new(GRID)), None);
    }
}
