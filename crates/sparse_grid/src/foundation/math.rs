//! Math utilities and types
//!
//! Provides the vector and rotation types used by the grid and its queries.
//! World space is right-handed with Z up; the grid partitions the XY plane.

pub use nalgebra::{
    Vector2, Vector3,
    Quaternion,
    Unit,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Rigid transform (rotation then translation, no scale)
pub type Isometry3 = nalgebra::Isometry3<f32>;

/// Projects a world-space vector onto the grid plane
#[inline]
pub fn xy(v: &Vec3) -> Vec2 {
    Vec2::new(v.x, v.y)
}

/// Normalizes `v`, returning `None` when it is too short to have a direction
#[inline]
pub fn safe_normalize(v: &Vec3) -> Option<Vec3> {
    v.try_normalize(constants::SMALL_NUMBER)
}

/// Closest point to `point` on the segment `[start, end]`
pub fn closest_point_on_segment(point: &Vec3, start: &Vec3, end: &Vec3) -> Vec3 {
    let segment = end - start;
    let length_squared = segment.norm_squared();
    if length_squared <= constants::SMALL_NUMBER {
        return *start;
    }

    let t = (point - start).dot(&segment) / length_squared;
    start + segment * t.clamp(0.0, 1.0)
}

/// Closest point to `point` on the 2D segment `[start, end]`
pub fn closest_point_on_segment_2d(point: &Vec2, start: &Vec2, end: &Vec2) -> Vec2 {
    let segment = end - start;
    let length_squared = segment.norm_squared();
    if length_squared <= constants::SMALL_NUMBER {
        return *start;
    }

    let t = (point - start).dot(&segment) / length_squared;
    start + segment * t.clamp(0.0, 1.0)
}

/// Math constants
pub mod constants {
    /// Lengths at or below this are treated as zero
    pub const SMALL_NUMBER: f32 = 1.0e-8;

    /// Pi / 2
    pub const HALF_PI: f32 = std::f32::consts::FRAC_PI_2;

    /// Square root of 2
    pub const SQRT_2: f32 = std::f32::consts::SQRT_2;
}
