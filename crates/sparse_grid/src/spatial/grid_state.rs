//! Per-object grid bookkeeping
//!
//! Every object that can live in a grid stores an [`ObjectGridState`]. It is
//! the object's only link back into the grid and makes removal O(1): the
//! grid reads the recorded indices instead of searching its arrays.

use crate::foundation::math::Vec3;

/// Indices locating an object inside a grid
///
/// Either all three indices are set (registered) or none are (clear).
/// Objects start clear and must only be mutated by the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ObjectGridState {
    grid_index: Option<usize>,
    cell_index: Option<usize>,
    cell_sub_index: Option<usize>,
}

impl ObjectGridState {
    /// A clear state
    pub const fn new() -> Self {
        Self {
            grid_index: None,
            cell_index: None,
            cell_sub_index: None,
        }
    }

    /// All indices are set
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.grid_index.is_some() && self.cell_index.is_some() && self.cell_sub_index.is_some()
    }

    /// No index is set
    #[inline]
    pub fn is_clear(&self) -> bool {
        self.grid_index.is_none() && self.cell_index.is_none() && self.cell_sub_index.is_none()
    }

    /// Position in the grid's registration array
    #[inline]
    pub fn grid_index(&self) -> Option<usize> {
        self.grid_index
    }

    /// Flat index of the owning cell
    #[inline]
    pub fn cell_index(&self) -> Option<usize> {
        self.cell_index
    }

    /// Position within the owning cell's object array
    #[inline]
    pub fn cell_sub_index(&self) -> Option<usize> {
        self.cell_sub_index
    }

    #[inline]
    pub(crate) fn set_grid_index(&mut self, index: Option<usize>) {
        self.grid_index = index;
    }

    #[inline]
    pub(crate) fn set_cell_index(&mut self, index: Option<usize>) {
        self.cell_index = index;
    }

    #[inline]
    pub(crate) fn set_cell_sub_index(&mut self, index: Option<usize>) {
        self.cell_sub_index = index;
    }

    #[inline]
    pub(crate) fn clear(&mut self) {
        *self = Self::new();
    }
}

/// An object that can be registered in a sparse grid
///
/// Implementors embed an [`ObjectGridState`] and expose their world position.
/// Only XY is used for bucketing; Z still participates in the exact query tests.
pub trait GridObject {
    /// Current world-space position
    fn grid_location(&self) -> Vec3;

    /// Grid bookkeeping for this object
    fn grid_state(&self) -> &ObjectGridState;

    /// Mutable grid bookkeeping for this object
    fn grid_state_mut(&mut self) -> &mut ObjectGridState;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_clear() {
        let state = ObjectGridState::new();
        assert!(state.is_clear());
        assert!(!state.is_valid());
        assert_eq!(state, ObjectGridState::default());
    }

    #[test]
    fn test_partial_state_is_neither() {
        let mut state = ObjectGridState::new();
        state.set_grid_index(Some(3));
        state.set_cell_index(Some(7));

        assert!(!state.is_clear());
        assert!(!state.is_valid());

        state.set_cell_sub_index(Some(0));
        assert!(state.is_valid());

        state.clear();
        assert!(state.is_clear());
    }
}
