//! # Sparse Grid
//!
//! A uniform 2D spatial grid for fast proximity queries over many moving
//! objects.
//!
//! ## Features
//!
//! - **O(1) bookkeeping**: register, unregister and cell moves never search
//! - **Shape queries**: sphere, capsule, box, rotated box and cone
//! - **Cell culling**: conservative per-cell rejection before exact tests
//! - **Bounds fast reject**: whole queries skipped when they miss every object
//!   (`grid-bounds` feature, on by default)
//! - **Configurable allocation**: block growth and shrink hysteresis per array
//!
//! The grid never owns objects. Hosts keep them in a [`GridObjectStore`]
//! (a `SlotMap` or `Vec`), embed an [`ObjectGridState`] in each one and pass
//! the store to every call that needs positions.
//!
//! ## Quick Start
//!
//! ```rust
//! use sparse_grid::prelude::*;
//!
//! struct Ship {
//!     position: Vec3,
//!     grid: ObjectGridState,
//! }
//!
//! impl GridObject for Ship {
//!     fn grid_location(&self) -> Vec3 { self.position }
//!     fn grid_state(&self) -> &ObjectGridState { &self.grid }
//!     fn grid_state_mut(&mut self) -> &mut ObjectGridState { &mut self.grid }
//! }
//!
//! fn main() -> Result<(), GridError> {
//!     let mut ships = HandleMap::new();
//!     let ship = ships.insert(Ship { position: Vec3::new(10.0, 20.0, 0.0), grid: ObjectGridState::new() });
//!
//!     let mut grid = SparseGrid::new(&SparseGridConfig::default())?;
//!     grid.register(&mut ships, ship);
//!
//!     // Once per frame, after objects move
//!     grid.update(&mut ships);
//!
//!     let nearby = grid.query_sphere(&ships, Vec3::zeros(), 50.0);
//!     assert_eq!(nearby, vec![ship]);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod spatial;

pub use foundation::collections::{GridHandle, GridObjectStore};
pub use spatial::{GridObject, ObjectGridState, SparseGrid};

/// Common imports for grid users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, SparseGridConfig},
        foundation::{
            collections::{AllocPolicy, GridHandle, GridObjectStore, Handle, HandleMap},
            math::{Quat, Vec2, Vec3},
        },
        spatial::{
            Aabb, AxisAlignedBox, Capsule, CellTile, Cone, GridCoordinate, GridError, GridMemoryInfo, GridObject,
            ObjectGridState, QueryShape, RotatedBox, SparseGrid, Sphere,
        },
    };
}
