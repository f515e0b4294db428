//! Bounding volumes
//!
//! [`Aabb`] describes query extents; [`BoundsTracker`] follows the box that
//! encloses every registered object so whole queries can be rejected early.

use crate::foundation::math::{Quat, Vec3};

/// Axis-Aligned Bounding Box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Aabb {
    /// Box spanning `min` to `max`
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box of half-size `extents` around `center`
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Smallest AABB enclosing a box of half-size `extents` rotated by `rotation`
    pub fn from_oriented_box(center: Vec3, rotation: &Quat, extents: Vec3) -> Self {
        let basis = rotation.to_rotation_matrix();
        let world_extents = basis.matrix().abs() * extents.abs();
        Self::from_center_extents(center, world_extents)
    }

    /// Smallest AABB enclosing both points
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.inf(&b),
            max: a.sup(&b),
        }
    }

    /// Midpoint of the box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half-size of the box on each axis
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Grow the box by `amount` on every side
    pub fn expanded(&self, amount: Vec3) -> Self {
        Self {
            min: self.min - amount,
            max: self.max + amount,
        }
    }

    /// Smallest AABB enclosing this box and `other`
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Whether `point` lies inside or on the surface of the box
    pub fn contains_point(&self, point: &Vec3) -> bool {
        self.min
            .iter()
            .zip(point.iter())
            .zip(self.max.iter())
            .all(|((low, value), high)| low <= value && value <= high)
    }

    /// Whether the two boxes overlap or touch on every axis
    pub fn intersects(&self, other: &Self) -> bool {
        (0..3).all(|axis| self.min[axis] <= other.max[axis] && other.min[axis] <= self.max[axis])
    }
}

/// Running bounds of every registered object's position
///
/// Reset and rebuilt once per grid update. Until the first point is recorded
/// the tracker is clear and never rejects anything.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundsTracker {
    bounds: Option<Aabb>,
}

impl BoundsTracker {
    /// Create a clear tracker
    pub const fn new() -> Self {
        Self { bounds: None }
    }

    /// Whether no point has been recorded since the last reset
    pub fn is_clear(&self) -> bool {
        self.bounds.is_none()
    }

    /// Forget every recorded point
    pub fn reset(&mut self) {
        self.bounds = None;
    }

    /// Widen the tracked box to include `point`
    pub fn update(&mut self, point: &Vec3) {
        self.bounds = Some(match self.bounds {
            None => Aabb::new(*point, *point),
            Some(bounds) => Aabb::new(bounds.min.inf(point), bounds.max.sup(point)),
        });
    }

    /// Tracked box, if any point has been recorded
    pub fn bounding_box(&self) -> Option<Aabb> {
        self.bounds
    }

    /// True if a search box around `center` cannot contain any tracked point
    pub fn can_fast_reject(&self, center: &Vec3, extents: &Vec3) -> bool {
        self.bounds
            .is_some_and(|bounds| !bounds.intersects(&Aabb::from_center_extents(*center, *extents)))
    }

    /// True if `search` cannot contain any tracked point
    pub fn can_fast_reject_box(&self, search: &Aabb) -> bool {
        self.bounds.is_some_and(|bounds| !bounds.intersects(search))
    }
}
