//! Uniform sparse grid
//!
//! Partitions the XY plane into `num_cells.x * num_cells.y` square cells of
//! `cell_size` units starting at `origin`. Registered objects are bucketed by
//! position once per [`SparseGrid::update`]; queries only read the buckets.
//!
//! Objects outside the grid are clamped into the nearest boundary cell, so a
//! boundary cell may hold objects arbitrarily far from it in world space.

use std::mem::size_of;

use thiserror::Error;

use crate::config::SparseGridConfig;
use crate::foundation::collections::{AllocPolicy, GridHandle, GridObjectStore};
use crate::foundation::math::{closest_point_on_segment_2d, constants::SQRT_2, xy, Quat, Vec2, Vec3};
#[cfg(feature = "grid-bounds")]
use crate::spatial::bounds::BoundsTracker;
use crate::spatial::cell::GridCell;
use crate::spatial::coordinate::{CellTile, GridCoordinate};
use crate::spatial::spatial_query::{AxisAlignedBox, Capsule, CellCull, Cone, QueryShape, RotatedBox, Sphere};
use crate::spatial::GridObject;

/// Errors raised when a grid cannot be built
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// Cell count outside the supported range on either axis
    #[error("Invalid cell count {x} x {y}, each axis must be within 1..={max}")]
    InvalidCellCount {
        /// Cells along X
        x: i32,
        /// Cells along Y
        y: i32,
        /// Largest supported count per axis
        max: i32,
    },

    /// Cell size of zero or less
    #[error("Invalid cell size {0}, must be positive")]
    InvalidCellSize(i32),

    /// Far grid corner does not fit in `i32` world coordinates
    #[error("Grid bounds overflow: origin {origin} plus {cells} cells of {cell_size} exceeds the i32 range")]
    BoundsOverflow {
        /// Origin on the overflowing axis
        origin: i32,
        /// Cells on the overflowing axis
        cells: i32,
        /// Configured cell size
        cell_size: i32,
    },

    /// Allocation block size of zero or less
    #[error("Invalid {array} block size {size}, must be positive")]
    InvalidBlockSize {
        /// Which array the block size applies to
        array: &'static str,
        /// Configured value
        size: i32,
    },

    /// Shrink multiplier below -1
    #[error("Invalid {array} shrink multiplier {multiplier}, must be -1 or greater")]
    InvalidShrinkMultiplier {
        /// Which array the multiplier applies to
        array: &'static str,
        /// Configured value
        multiplier: i32,
    },
}

/// Memory usage of a grid, in bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridMemoryInfo {
    /// Number of registered objects
    pub total_objects: usize,
    /// Bytes allocated for the registration array
    pub registration_allocated: u64,
    /// Bytes in use by the registration array
    pub registration_used: u64,
    /// Bytes allocated across every cell
    pub cell_allocated: u64,
    /// Bytes in use across every cell
    pub cell_used: u64,
}

/// Uniform 2D grid of object handles
///
/// The grid never owns objects. Every operation that reads positions or
/// writes bookkeeping takes the owning [`GridObjectStore`] as an argument.
///
/// Invariants, outside of a mutating call:
/// - `registered_objects()[i]` has grid index `i`
/// - `cells()[c].objects()[j]` has cell index `c` and cell sub-index `j`
/// - the sum of cell populations equals the number of registered objects
#[derive(Debug, Clone)]
pub struct SparseGrid<K> {
    registered: Vec<K>,
    register_policy: AllocPolicy,
    cells: Vec<GridCell<K>>,

    origin: GridCoordinate,
    num_cells: GridCoordinate,
    cell_size: i32,
    cell_bounds_radius: f32,
    cell_bounds_radius_squared: f32,

    #[cfg(feature = "grid-bounds")]
    object_bounds: BoundsTracker,
}

impl<K: GridHandle> SparseGrid<K> {
    /// Build a grid and all of its cells
    pub fn new(config: &SparseGridConfig) -> Result<Self, GridError> {
        config.validate()?;

        let cell_policy = config.cell_policy();
        let num_cells = GridCoordinate::new(config.num_cells_x, config.num_cells_y);
        let cells = (0..config.total_cells()).map(|_| GridCell::new(cell_policy)).collect();
        let cell_bounds_radius = SQRT_2 * config.cell_size as f32 * 0.5;

        log::info!("Sparse grid created: {config}");

        Ok(Self {
            registered: Vec::new(),
            register_policy: config.register_policy(),
            cells,
            origin: config.origin,
            num_cells,
            cell_size: config.cell_size,
            cell_bounds_radius,
            cell_bounds_radius_squared: cell_bounds_radius * cell_bounds_radius,
            #[cfg(feature = "grid-bounds")]
            object_bounds: BoundsTracker::new(),
        })
    }

    // ---------------------------------------------------------------------
    // Registration
    // ---------------------------------------------------------------------

    /// Add an object to the grid
    ///
    /// Returns true if the object is registered with this grid afterwards,
    /// including when it already was. Returns false without changing
    /// anything if it belongs to another grid or the store cannot resolve it.
    pub fn register<S>(&mut self, store: &mut S, handle: K) -> bool
    where
        S: GridObjectStore<K> + ?Sized,
    {
        let Some(object) = store.object(handle) else {
            log::warn!("SparseGrid::register - unresolvable handle {:?}", handle);
            return false;
        };

        let state = *object.grid_state();
        if let Some(grid_index) = state.grid_index() {
            if self.registered.get(grid_index) == Some(&handle) {
                log::debug!("SparseGrid::register - {:?} already registered", handle);
                return true;
            }

            log::warn!("SparseGrid::register - {:?} is registered with another grid", handle);
            return false;
        }
        debug_assert!(state.is_clear(), "SparseGrid::register - {handle:?} has partial grid state {state:?}");

        let location = object.grid_location();
        let cell_index = self.world_to_cell(&xy(&location));

        if self.register_policy.reserve_for_push(&mut self.registered) {
            log::debug!("Registered objects resized, {} max objects", self.registered.capacity());
        }

        let grid_index = self.registered.len();
        self.registered.push(handle);

        if let Some(object) = store.object_mut(handle) {
            let state = object.grid_state_mut();
            state.set_grid_index(Some(grid_index));
            state.set_cell_index(Some(cell_index));
        }
        self.cells[cell_index].add(store, handle);

        // Keep the tracker conservative until the next update rebuilds it
        #[cfg(feature = "grid-bounds")]
        self.object_bounds.update(&location);

        true
    }

    /// Remove an object from the grid
    ///
    /// Returns true if the object is not registered with this grid afterwards,
    /// including when it never was. Returns false without changing anything if
    /// it belongs to another grid.
    ///
    /// A handle the store can no longer resolve is purged from the grid by
    /// linear search.
    pub fn unregister<S>(&mut self, store: &mut S, handle: K) -> bool
    where
        S: GridObjectStore<K> + ?Sized,
    {
        let Some(object) = store.object(handle) else {
            self.purge_stale(store, handle);
            return true;
        };

        let state = *object.grid_state();
        let Some(grid_index) = state.grid_index() else {
            log::debug!("SparseGrid::unregister - {:?} is not registered", handle);
            return true;
        };

        if self.registered.get(grid_index) != Some(&handle) {
            log::warn!("SparseGrid::unregister - {:?} is registered with another grid", handle);
            return false;
        }

        let cell = state.cell_index().and_then(|index| self.cells.get_mut(index));
        debug_assert!(cell.is_some(), "SparseGrid::unregister - {handle:?} has no valid cell index");
        if let Some(cell) = cell {
            cell.remove(store, handle);
        }

        self.remove_registered_at(store, grid_index);

        if let Some(object) = store.object_mut(handle) {
            object.grid_state_mut().clear();
        }

        true
    }

    /// Register every object in the store whose grid state is clear
    ///
    /// Returns the number of newly registered objects.
    pub fn register_all<S>(&mut self, store: &mut S) -> usize
    where
        S: GridObjectStore<K> + ?Sized,
    {
        let mut added = 0;
        for handle in store.handles() {
            let is_clear = store
                .object(handle)
                .is_some_and(|object| object.grid_state().is_clear());
            if !is_clear {
                log::trace!("SparseGrid::register_all - skipping {:?}", handle);
                continue;
            }

            if self.register(store, handle) {
                added += 1;
            }
        }

        log::debug!("SparseGrid::register_all - registered {} objects", added);
        added
    }

    /// Unregister every object at once
    ///
    /// Cells are kept. Every registered object's grid state is cleared.
    pub fn empty<S>(&mut self, store: &mut S)
    where
        S: GridObjectStore<K> + ?Sized,
    {
        for &handle in &self.registered {
            if let Some(object) = store.object_mut(handle) {
                object.grid_state_mut().clear();
            }
        }

        log::debug!("SparseGrid::empty - released {} objects", self.registered.len());

        self.registered = Vec::new();
        for cell in &mut self.cells {
            cell.reset();
        }

        #[cfg(feature = "grid-bounds")]
        self.object_bounds.reset();
    }

    /// Re-bucket every registered object by its current position
    ///
    /// Objects only move between cells here. When bounds tracking is enabled
    /// the tracked bounds are rebuilt in the same pass.
    pub fn update<S>(&mut self, store: &mut S)
    where
        S: GridObjectStore<K> + ?Sized,
    {
        #[cfg(feature = "grid-bounds")]
        self.object_bounds.reset();

        for grid_index in 0..self.registered.len() {
            let handle = self.registered[grid_index];

            let object = store.object(handle);
            debug_assert!(object.is_some(), "SparseGrid::update - unresolvable handle {handle:?}");
            let Some(object) = object else {
                log::error!("SparseGrid::update - unresolvable handle {:?}, unregister objects before dropping them", handle);
                continue;
            };

            let location = object.grid_location();
            let current = object.grid_state().cell_index();

            #[cfg(feature = "grid-bounds")]
            self.object_bounds.update(&location);

            let desired = self.world_to_cell(&xy(&location));
            if current == Some(desired) {
                continue;
            }

            if let Some(cell) = current.and_then(|index| self.cells.get_mut(index)) {
                cell.remove(store, handle);
            }
            if let Some(object) = store.object_mut(handle) {
                object.grid_state_mut().set_cell_index(Some(desired));
            }
            self.cells[desired].add(store, handle);

            log::trace!("{:?} moved from cell {:?} to {}", handle, current, desired);
        }
    }

    fn remove_registered_at<S>(&mut self, store: &mut S, grid_index: usize)
    where
        S: GridObjectStore<K> + ?Sized,
    {
        self.registered.swap_remove(grid_index);
        if let Some(&moved) = self.registered.get(grid_index) {
            if let Some(object) = store.object_mut(moved) {
                object.grid_state_mut().set_grid_index(Some(grid_index));
            }
        }

        if self.register_policy.release_slack(&mut self.registered) {
            log::debug!("Registered objects shrunk, {} max objects", self.registered.capacity());
        }
    }

    fn purge_stale<S>(&mut self, store: &mut S, handle: K)
    where
        S: GridObjectStore<K> + ?Sized,
    {
        let mut purged = false;
        while let Some(grid_index) = self.registered.iter().position(|&item| item == handle) {
            self.remove_registered_at(store, grid_index);
            purged = true;
        }
        for cell in &mut self.cells {
            purged |= cell.purge(store, handle);
        }

        if purged {
            log::warn!("SparseGrid::unregister - purged stale handle {:?}", handle);
        } else {
            log::warn!("SparseGrid::unregister - unresolvable handle {:?}", handle);
        }
    }

    // ---------------------------------------------------------------------
    // Coordinates
    // ---------------------------------------------------------------------

    /// Cell coordinate for a world position, clamped into the grid
    pub fn world_to_coordinate(&self, location: &Vec2) -> GridCoordinate {
        let cell_size = self.cell_size as f32;
        let x = ((location.x - self.origin.x as f32) / cell_size).floor() as i32;
        let y = ((location.y - self.origin.y as f32) / cell_size).floor() as i32;

        GridCoordinate::new(x.clamp(0, self.num_cells.x - 1), y.clamp(0, self.num_cells.y - 1))
    }

    /// Flat cell index for a world position, clamped into the grid
    pub fn world_to_cell(&self, location: &Vec2) -> usize {
        self.cell_index(self.world_to_coordinate(location))
    }

    /// Flat cell index for a cell coordinate
    ///
    /// `coord` must lie inside the grid.
    #[inline]
    pub fn cell_index(&self, coord: GridCoordinate) -> usize {
        debug_assert!(
            coord.x >= 0 && coord.x < self.num_cells.x && coord.y >= 0 && coord.y < self.num_cells.y,
            "SparseGrid::cell_index - {coord:?} outside the grid"
        );
        (coord.y + coord.x * self.num_cells.y) as usize
    }

    /// Cell coordinate for a flat cell index
    pub fn cell_xy(&self, index: usize) -> Option<GridCoordinate> {
        if !self.is_valid_cell_index(index) {
            return None;
        }

        let index = index as i32;
        Some(GridCoordinate::new(index / self.num_cells.y, index % self.num_cells.y))
    }

    /// Whether `index` names a cell of this grid
    #[inline]
    pub fn is_valid_cell_index(&self, index: usize) -> bool {
        index < self.cells.len()
    }

    /// Whether `coord` lies on the outer ring of cells
    pub fn is_boundary_cell(&self, coord: GridCoordinate) -> bool {
        coord.x == 0 || coord.y == 0 || coord.x == self.num_cells.x - 1 || coord.y == self.num_cells.y - 1
    }

    /// World-space corner of a cell closest to the origin
    pub fn cell_min(&self, coord: GridCoordinate) -> GridCoordinate {
        self.origin + coord * self.cell_size
    }

    /// World-space corner of a cell furthest from the origin
    pub fn cell_max(&self, coord: GridCoordinate) -> GridCoordinate {
        self.cell_min(coord) + self.cell_size
    }

    /// World-space center of a cell
    pub fn cell_center(&self, coord: GridCoordinate) -> Vec2 {
        self.cell_min(coord).to_vector() + Vec2::repeat(self.cell_size as f32 * 0.5)
    }

    /// Cells to visit for a world-space search rectangle `origin ± extents`
    ///
    /// The rectangle is first clamped to the grid's world bounds. The end is
    /// exclusive but always includes the cell holding the rectangle's maximum
    /// corner, so objects lying exactly on a cell edge are visited. With
    /// `clamp_to_grid`, the tile always holds at least one row and one column
    /// of cells, so searches outside the grid still visit the boundary cells
    /// that out-of-bounds objects are bucketed into.
    pub fn search_tile(&self, origin: &Vec2, extents: &Vec2, clamp_to_grid: bool) -> CellTile {
        let grid_min = self.origin.to_vector();
        let grid_max = self.grid_max().to_vector();

        let search_min = (origin - extents).sup(&grid_min).inf(&grid_max) - grid_min;
        let search_max = (origin + extents).sup(&grid_min).inf(&grid_max) - grid_min;

        let cell_size = self.cell_size as f32;
        let mut tile = CellTile::new(
            GridCoordinate::new(
                (search_min.x / cell_size).floor() as i32,
                (search_min.y / cell_size).floor() as i32,
            ),
            GridCoordinate::new(
                ((search_max.x / cell_size).floor() as i32 + 1).min(self.num_cells.x),
                ((search_max.y / cell_size).floor() as i32 + 1).min(self.num_cells.y),
            ),
        );

        if clamp_to_grid {
            tile.start.x = tile.start.x.clamp(0, self.num_cells.x - 1);
            tile.start.y = tile.start.y.clamp(0, self.num_cells.y - 1);
            tile.end.x = tile.end.x.clamp(1, self.num_cells.x);
            tile.end.y = tile.end.y.clamp(1, self.num_cells.y);
        }

        tile
    }

    // ---------------------------------------------------------------------
    // Culling
    // ---------------------------------------------------------------------

    /// True if no object in the cell can be within `radius` of `point`
    ///
    /// Boundary cells are never culled.
    pub fn cull_cell_range(&self, coord: GridCoordinate, point: &Vec2, radius: f32) -> bool {
        if self.is_boundary_cell(coord) {
            return false;
        }

        let reach = radius + self.cell_bounds_radius;
        (self.cell_center(coord) - point).norm_squared() > reach * reach
    }

    /// True if no object in the cell can be within `distance` of the segment
    ///
    /// Boundary cells are never culled.
    pub fn cull_cell_line(&self, coord: GridCoordinate, start: &Vec2, end: &Vec2, distance: f32) -> bool {
        if self.is_boundary_cell(coord) {
            return false;
        }

        let center = self.cell_center(coord);
        let closest = closest_point_on_segment_2d(&center, start, end);
        let reach = distance + self.cell_bounds_radius;
        (center - closest).norm_squared() > reach * reach
    }

    fn is_culled(&self, coord: GridCoordinate, cull: &CellCull) -> bool {
        match cull {
            CellCull::None => false,
            CellCull::Range { point, radius } => self.cull_cell_range(coord, point, *radius),
            CellCull::Line { start, end, distance } => self.cull_cell_line(coord, start, end, *distance),
        }
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    /// Every registered object inside `shape`
    ///
    /// Results come in cell traversal order then cell order. Neither is
    /// stable across mutation.
    pub fn query<S, Q>(&self, store: &S, shape: &Q) -> Vec<K>
    where
        S: GridObjectStore<K> + ?Sized,
        Q: QueryShape + ?Sized,
    {
        let mut found = Vec::new();
        self.query_into(store, shape, &mut found);
        found
    }

    /// Append every registered object inside `shape` to `out`
    pub fn query_into<S, Q>(&self, store: &S, shape: &Q, out: &mut Vec<K>)
    where
        S: GridObjectStore<K> + ?Sized,
        Q: QueryShape + ?Sized,
    {
        let bounds = shape.bounds();

        #[cfg(feature = "grid-bounds")]
        if self.object_bounds.can_fast_reject_box(&bounds) {
            log::trace!("SparseGrid::query - {} rejected by object bounds", shape.name());
            return;
        }

        let tile = self.search_tile(&xy(&bounds.center()), &xy(&bounds.extents()), true);
        let cull = shape.cell_cull();

        for coord in tile.iter() {
            let cell = &self.cells[self.cell_index(coord)];
            if cell.is_empty() || self.is_culled(coord, &cull) {
                continue;
            }

            out.extend(cell.objects().iter().copied().filter(|&handle| {
                store
                    .object(handle)
                    .is_some_and(|object| shape.contains(&object.grid_location()))
            }));
        }
    }

    /// Objects within `radius` of `center`
    pub fn query_sphere<S>(&self, store: &S, center: Vec3, radius: f32) -> Vec<K>
    where
        S: GridObjectStore<K> + ?Sized,
    {
        self.query(store, &Sphere::new(center, radius))
    }

    /// Objects inside a capsule
    pub fn query_capsule<S>(&self, store: &S, center: Vec3, up_axis: Vec3, radius: f32, half_height: f32) -> Vec<K>
    where
        S: GridObjectStore<K> + ?Sized,
    {
        self.query(store, &Capsule::new(center, up_axis, radius, half_height))
    }

    /// Objects inside an axis-aligned box
    pub fn query_box<S>(&self, store: &S, center: Vec3, extents: Vec3) -> Vec<K>
    where
        S: GridObjectStore<K> + ?Sized,
    {
        self.query(store, &AxisAlignedBox::new(center, extents))
    }

    /// Objects inside a rotated box
    pub fn query_rotated_box<S>(&self, store: &S, center: Vec3, rotation: Quat, extents: Vec3) -> Vec<K>
    where
        S: GridObjectStore<K> + ?Sized,
    {
        self.query(store, &RotatedBox::new(center, rotation, extents))
    }

    /// Objects inside a cone
    pub fn query_cone<S>(&self, store: &S, apex: Vec3, axis: Vec3, length: f32, half_angle_radians: f32) -> Vec<K>
    where
        S: GridObjectStore<K> + ?Sized,
    {
        self.query(store, &Cone::new(apex, axis, length, half_angle_radians))
    }

    // ---------------------------------------------------------------------
    // Introspection
    // ---------------------------------------------------------------------

    /// World position of the first cell's minimum corner
    pub fn origin(&self) -> GridCoordinate {
        self.origin
    }

    /// Number of cells along each axis
    pub fn num_cells(&self) -> GridCoordinate {
        self.num_cells
    }

    /// Total number of cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Edge length of one cell
    pub fn cell_size(&self) -> i32 {
        self.cell_size
    }

    /// World position of the last cell's maximum corner
    pub fn grid_max(&self) -> GridCoordinate {
        self.origin + self.num_cells * self.cell_size
    }

    /// Half diagonal of one cell
    pub fn cell_bounds_radius(&self) -> f32 {
        self.cell_bounds_radius
    }

    /// Squared half diagonal of one cell
    pub fn cell_bounds_radius_squared(&self) -> f32 {
        self.cell_bounds_radius_squared
    }

    /// Every cell in flat index order
    pub fn cells(&self) -> &[GridCell<K>] {
        &self.cells
    }

    /// Cell at a flat index
    pub fn cell(&self, index: usize) -> Option<&GridCell<K>> {
        self.cells.get(index)
    }

    /// Handles in the cell at a flat index, empty for invalid indices
    pub fn cell_objects(&self, index: usize) -> &[K] {
        self.cells.get(index).map(GridCell::objects).unwrap_or_default()
    }

    /// Handles in every cell of a tile, in traversal order
    pub fn tile_objects(&self, tile: &CellTile) -> Vec<K> {
        tile.iter()
            .filter(|coord| {
                coord.x >= 0 && coord.x < self.num_cells.x && coord.y >= 0 && coord.y < self.num_cells.y
            })
            .flat_map(|coord| self.cells[self.cell_index(coord)].objects().iter().copied())
            .collect()
    }

    /// Population of each cell in flat index order
    pub fn cell_populations(&self) -> Vec<u32> {
        self.cells
            .iter()
            .map(|cell| u32::try_from(cell.len()).unwrap_or(u32::MAX))
            .collect()
    }

    /// Every registered handle, in registration-array order
    pub fn registered_objects(&self) -> &[K] {
        &self.registered
    }

    /// Number of registered objects
    pub fn len(&self) -> usize {
        self.registered.len()
    }

    /// Whether no object is registered
    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    /// Whether `handle` is registered with this grid
    pub fn contains<S>(&self, store: &S, handle: K) -> bool
    where
        S: GridObjectStore<K> + ?Sized,
    {
        store
            .object(handle)
            .and_then(|object| object.grid_state().grid_index())
            .is_some_and(|index| self.registered.get(index) == Some(&handle))
    }

    /// Bounds of every object position seen since the last update
    #[cfg(feature = "grid-bounds")]
    pub fn object_bounds(&self) -> &BoundsTracker {
        &self.object_bounds
    }

    /// Memory used by the registration array and the cells
    pub fn memory_info(&self) -> GridMemoryInfo {
        let element = size_of::<K>() as u64;
        let (cell_allocated, cell_used) = self
            .cells
            .iter()
            .map(GridCell::memory_info)
            .fold((0, 0), |(allocated, used), (a, u)| (allocated + a, used + u));

        GridMemoryInfo {
            total_objects: self.registered.len(),
            registration_allocated: element * self.registered.capacity() as u64,
            registration_used: element * self.registered.len() as u64,
            cell_allocated,
            cell_used,
        }
    }
}
