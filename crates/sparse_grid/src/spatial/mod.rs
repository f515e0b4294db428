//! Spatial partitioning
//!
//! A uniform 2D grid that buckets externally owned objects by position and
//! answers sphere, capsule, box, rotated box and cone queries against them.

pub mod bounds;
pub mod cell;
pub mod coordinate;
pub mod grid;
pub mod grid_state;
pub mod spatial_query;

#[cfg(test)]
mod tests;

pub use bounds::{Aabb, BoundsTracker};
pub use cell::GridCell;
pub use coordinate::{CellTile, GridCoordinate};
pub use grid::{GridError, GridMemoryInfo, SparseGrid};
pub use grid_state::{GridObject, ObjectGridState};
pub use spatial_query::{AxisAlignedBox, Capsule, CellCull, Cone, QueryShape, RotatedBox, Sphere};
