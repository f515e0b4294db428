//! Query shapes for grid searches
//!
//! Every query runs the same pipeline: reject against the tracked object
//! bounds, pick the tile of cells under the shape's XY footprint, cull cells
//! that cannot hold a match, then run the exact per-object test. A
//! [`QueryShape`] supplies the geometry for each of those stages.

use crate::foundation::math::{
    closest_point_on_segment, constants::HALF_PI, safe_normalize, xy, Isometry3, Point3, Quat,
    Vec2, Vec3,
};
use crate::spatial::bounds::Aabb;

/// Cell-level rejection test a shape asks the grid to run
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellCull {
    /// Visit every cell in the tile
    None,
    /// Skip cells whose bounding circle is further than `radius` from `point`
    Range {
        /// Query point on the grid plane
        point: Vec2,
        /// Search radius around the point
        radius: f32,
    },
    /// Skip cells whose bounding circle is further than `distance` from the segment
    Line {
        /// Segment start on the grid plane
        start: Vec2,
        /// Segment end on the grid plane
        end: Vec2,
        /// Search distance around the segment
        distance: f32,
    },
}

/// Geometry needed to run a grid query
pub trait QueryShape {
    /// Short name used in log output
    fn name(&self) -> &'static str;

    /// World-space box enclosing the shape
    fn bounds(&self) -> Aabb;

    /// Conservative per-cell rejection test
    fn cell_cull(&self) -> CellCull;

    /// Exact test for a single object position
    fn contains(&self, point: &Vec3) -> bool;
}

/// Sphere around a center point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    center: Vec3,
    radius: f32,
}

impl Sphere {
    /// Create a sphere query
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Sphere center
    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Sphere radius
    pub fn radius(&self) -> f32 {
        self.radius
    }
}

impl QueryShape for Sphere {
    fn name(&self) -> &'static str {
        "sphere"
    }

    fn bounds(&self) -> Aabb {
        Aabb::from_center_extents(self.center, Vec3::repeat(self.radius))
    }

    fn cell_cull(&self) -> CellCull {
        CellCull::Range {
            point: xy(&self.center),
            radius: self.radius,
        }
    }

    fn contains(&self, point: &Vec3) -> bool {
        (point - self.center).norm_squared() <= self.radius * self.radius
    }
}

/// Capsule oriented along an arbitrary axis
///
/// `half_height` is measured from the center to the tip of either cap, so a
/// capsule with `half_height == radius` is a sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capsule {
    center: Vec3,
    up_axis: Vec3,
    radius: f32,
    half_height: f32,
    segment_start: Vec3,
    segment_end: Vec3,
}

impl Capsule {
    /// Create a capsule query
    ///
    /// `half_height` is raised to at least `radius` and zero, then `radius`
    /// is clamped to `[0, half_height]`. A zero-length axis falls back to +Z.
    pub fn new(center: Vec3, up_axis: Vec3, radius: f32, half_height: f32) -> Self {
        let half_height = half_height.max(radius).max(0.0);
        let radius = radius.clamp(0.0, half_height);
        let up_axis = safe_normalize(&up_axis).unwrap_or_else(Vec3::z);

        let offset = up_axis * (half_height - radius);

        Self {
            center,
            up_axis,
            radius,
            half_height,
            segment_start: center + offset,
            segment_end: center - offset,
        }
    }

    /// Capsule center
    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Normalized capsule axis
    pub fn up_axis(&self) -> Vec3 {
        self.up_axis
    }

    /// Clamped radius
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Clamped half height
    pub fn half_height(&self) -> f32 {
        self.half_height
    }

    /// Inner segment the radius is measured from
    pub fn segment(&self) -> (Vec3, Vec3) {
        (self.segment_start, self.segment_end)
    }
}

impl QueryShape for Capsule {
    fn name(&self) -> &'static str {
        "capsule"
    }

    fn bounds(&self) -> Aabb {
        Aabb::from_points(self.segment_start, self.segment_end).expanded(Vec3::repeat(self.radius))
    }

    fn cell_cull(&self) -> CellCull {
        CellCull::Line {
            start: xy(&self.segment_start),
            end: xy(&self.segment_end),
            distance: self.radius,
        }
    }

    fn contains(&self, point: &Vec3) -> bool {
        let closest = closest_point_on_segment(point, &self.segment_start, &self.segment_end);
        (point - closest).norm_squared() <= self.radius * self.radius
    }
}

/// Axis-aligned box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisAlignedBox {
    center: Vec3,
    extents: Vec3,
}

impl AxisAlignedBox {
    /// Create a box query from its center and half-size
    pub fn new(center: Vec3, extents: Vec3) -> Self {
        Self { center, extents }
    }

    /// Box center
    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Box half-size
    pub fn extents(&self) -> Vec3 {
        self.extents
    }
}

impl QueryShape for AxisAlignedBox {
    fn name(&self) -> &'static str {
        "box"
    }

    fn bounds(&self) -> Aabb {
        Aabb::from_center_extents(self.center, self.extents)
    }

    fn cell_cull(&self) -> CellCull {
        CellCull::None
    }

    fn contains(&self, point: &Vec3) -> bool {
        self.bounds().contains_point(point)
    }
}

/// Box with an arbitrary rotation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatedBox {
    box_to_world: Isometry3,
    extents: Vec3,
    axis_aligned: bool,
}

impl RotatedBox {
    /// Create a rotated box query from its center, rotation and half-size
    pub fn new(center: Vec3, rotation: Quat, extents: Vec3) -> Self {
        Self {
            box_to_world: Isometry3::from_parts(center.into(), rotation),
            extents,
            axis_aligned: rotation.imag() == Vec3::zeros(),
        }
    }

    /// Box center
    pub fn center(&self) -> Vec3 {
        self.box_to_world.translation.vector
    }

    /// Box rotation
    pub fn rotation(&self) -> Quat {
        self.box_to_world.rotation
    }

    /// Box half-size in local space
    pub fn extents(&self) -> Vec3 {
        self.extents
    }

    /// Whether the rotation is exactly identity
    pub fn is_axis_aligned(&self) -> bool {
        self.axis_aligned
    }
}

impl QueryShape for RotatedBox {
    fn name(&self) -> &'static str {
        "rotated box"
    }

    fn bounds(&self) -> Aabb {
        Aabb::from_oriented_box(self.center(), &self.box_to_world.rotation, self.extents)
    }

    fn cell_cull(&self) -> CellCull {
        CellCull::None
    }

    fn contains(&self, point: &Vec3) -> bool {
        if self.axis_aligned {
            return Aabb::from_center_extents(self.center(), self.extents).contains_point(point);
        }

        let local = self.box_to_world.inverse_transform_point(&Point3::from(*point));
        local.x.abs() <= self.extents.x
            && local.y.abs() <= self.extents.y
            && local.z.abs() <= self.extents.z
    }
}

/// Cone with its tip at `apex`, opening along `axis`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cone {
    apex: Vec3,
    axis: Vec3,
    length: f32,
    half_angle: f32,
    cos_half_angle: f32,
}

impl Cone {
    /// Create a cone query
    ///
    /// A zero-length axis falls back to +X.
    pub fn new(apex: Vec3, axis: Vec3, length: f32, half_angle_radians: f32) -> Self {
        Self {
            apex,
            axis: safe_normalize(&axis).unwrap_or_else(Vec3::x),
            length,
            half_angle: half_angle_radians,
            cos_half_angle: half_angle_radians.cos(),
        }
    }

    /// Cone tip
    pub fn apex(&self) -> Vec3 {
        self.apex
    }

    /// Normalized cone axis
    pub fn axis(&self) -> Vec3 {
        self.axis
    }

    /// Cone length (spherical cap radius)
    pub fn length(&self) -> f32 {
        self.length
    }

    /// Half opening angle in radians
    pub fn half_angle(&self) -> f32 {
        self.half_angle
    }

    /// Radius of the cone at `length` along the axis, if the cone is narrower than a hemisphere
    fn end_radius(&self) -> Option<f32> {
        (self.half_angle < HALF_PI).then(|| self.length * self.half_angle.tan())
    }
}

impl QueryShape for Cone {
    fn name(&self) -> &'static str {
        "cone"
    }

    fn bounds(&self) -> Aabb {
        let Some(end_radius) = self.end_radius() else {
            return Aabb::from_center_extents(self.apex, Vec3::repeat(self.length));
        };

        // Hull of the apex and the end disc
        let end = self.apex + self.axis * self.length;
        let disc_extents = self.axis.map(|a| end_radius * (1.0 - a * a).max(0.0).sqrt());
        Aabb::from_points(self.apex, end).union(&Aabb::from_center_extents(end, disc_extents))
    }

    fn cell_cull(&self) -> CellCull {
        match self.end_radius() {
            Some(end_radius) => CellCull::Line {
                start: xy(&self.apex),
                end: xy(&(self.apex + self.axis * self.length)),
                distance: end_radius,
            },
            None => CellCull::Range {
                point: xy(&self.apex),
                radius: self.length,
            },
        }
    }

    fn contains(&self, point: &Vec3) -> bool {
        let offset = point - self.apex;
        if offset.norm_squared() > self.length * self.length {
            return false;
        }

        // A point on the apex has no direction and counts as inside
        safe_normalize(&offset).map_or(true, |direction| self.axis.dot(&direction) >= self.cos_half_angle)
    }
}
