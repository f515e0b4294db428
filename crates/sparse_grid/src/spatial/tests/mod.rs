//! Integration tests for the sparse grid
//!
//! Drive full register / update / query flows against a slot map store and
//! check the bookkeeping that ties objects, cells and the grid together.

mod query_integration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SparseGridConfig;
use crate::foundation::collections::{Handle, HandleMap};
use crate::foundation::math::Vec3;
use crate::spatial::{GridCoordinate, GridObject, ObjectGridState, SparseGrid};

/// Test object with a position and embedded grid state
#[derive(Debug, Clone, Default)]
pub(super) struct Agent {
    pub position: Vec3,
    pub state: ObjectGridState,
}

impl Agent {
    pub fn at(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vec3::new(x, y, z),
            state: ObjectGridState::new(),
        }
    }
}

impl GridObject for Agent {
    fn grid_location(&self) -> Vec3 {
        self.position
    }

    fn grid_state(&self) -> &ObjectGridState {
        &self.state
    }

    fn grid_state_mut(&mut self) -> &mut ObjectGridState {
        &mut self.state
    }
}

/// 5 x 5 cells of 100 units starting at the world origin
pub(super) fn small_config() -> SparseGridConfig {
    SparseGridConfig {
        origin: GridCoordinate::new(0, 0),
        num_cells_x: 5,
        num_cells_y: 5,
        cell_size: 100,
        register_block_size: 4,
        cell_block_size: 2,
        ..SparseGridConfig::default()
    }
}

pub(super) fn small_grid() -> SparseGrid<Handle> {
    SparseGrid::new(&small_config()).unwrap()
}

/// Deterministic scatter of points over `[-extent, extent]` on X and Y
pub(super) fn scatter(count: usize, center: f32, extent: f32) -> Vec<Vec3> {
    let mut rng = StdRng::seed_from_u64(0x2545_f491);
    (0..count)
        .map(|_| {
            Vec3::new(
                center + rng.gen_range(-extent..=extent),
                center + rng.gen_range(-extent..=extent),
                rng.gen_range(-10.0..=10.0),
            )
        })
        .collect()
}

/// Check every index the grid and the objects record about each other
pub(super) fn assert_consistent(grid: &SparseGrid<Handle>, store: &HandleMap<Agent>) {
    for (grid_index, &handle) in grid.registered_objects().iter().enumerate() {
        let state = store[handle].state;
        assert!(state.is_valid(), "{handle:?} registered with partial state {state:?}");
        assert_eq!(state.grid_index(), Some(grid_index));
    }

    for (cell_index, cell) in grid.cells().iter().enumerate() {
        for (sub_index, &handle) in cell.objects().iter().enumerate() {
            let state = store[handle].state;
            assert_eq!(state.cell_index(), Some(cell_index), "{handle:?} in the wrong cell");
            assert_eq!(state.cell_sub_index(), Some(sub_index));
        }
    }

    let population: u32 = grid.cell_populations().iter().sum();
    assert_eq!(population as usize, grid.len());
}
