//! Grid cells
//!
//! A cell is an unordered array of handles. Removal swaps the removed handle
//! with the last one, so cell order changes whenever the cell is mutated.

use std::mem::size_of;

use crate::foundation::collections::{AllocPolicy, GridHandle, GridObjectStore};
use crate::spatial::GridObject;

/// One square region of the grid and the handles bucketed into it
///
/// For every handle at position `i`, the object's recorded cell sub-index is `i`.
#[derive(Debug, Clone)]
pub struct GridCell<K> {
    objects: Vec<K>,
    policy: AllocPolicy,
}

impl<K: GridHandle> GridCell<K> {
    /// Create an empty cell with the given allocation policy
    pub fn new(policy: AllocPolicy) -> Self {
        Self {
            objects: Vec::new(),
            policy,
        }
    }

    /// Handles currently in this cell, in unspecified order
    #[inline]
    pub fn objects(&self) -> &[K] {
        &self.objects
    }

    /// Number of handles in this cell
    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the cell holds no handles
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Allocated capacity in elements
    #[inline]
    pub fn capacity(&self) -> usize {
        self.objects.capacity()
    }

    /// Allocation policy for this cell
    pub fn policy(&self) -> AllocPolicy {
        self.policy
    }

    /// Allocated and used bytes
    pub fn memory_info(&self) -> (u64, u64) {
        let element = size_of::<K>() as u64;
        (element * self.objects.capacity() as u64, element * self.objects.len() as u64)
    }

    /// Append a handle and record its position on the object
    ///
    /// The object must not already belong to a cell.
    pub(crate) fn add<S>(&mut self, store: &mut S, handle: K)
    where
        S: GridObjectStore<K> + ?Sized,
    {
        let object = store.object_mut(handle);
        debug_assert!(object.is_some(), "GridCell::add - unresolvable handle {handle:?}");
        let Some(object) = object else {
            log::error!("GridCell::add - unresolvable handle {:?}", handle);
            return;
        };
        debug_assert!(
            object.grid_state().cell_sub_index().is_none(),
            "GridCell::add - object {handle:?} already in another cell"
        );

        if self.policy.reserve_for_push(&mut self.objects) {
            log::trace!("Cell objects resized, {} max objects", self.objects.capacity());
        }

        object.grid_state_mut().set_cell_sub_index(Some(self.objects.len()));
        self.objects.push(handle);
    }

    /// Remove a handle by swapping it with the last element
    ///
    /// Updates the moved object's sub-index and clears the removed object's.
    pub(crate) fn remove<S>(&mut self, store: &mut S, handle: K)
    where
        S: GridObjectStore<K> + ?Sized,
    {
        let sub_index = store
            .object(handle)
            .and_then(|object| object.grid_state().cell_sub_index())
            .filter(|&index| self.objects.get(index) == Some(&handle));

        debug_assert!(sub_index.is_some(), "GridCell::remove - {handle:?} is not at its recorded cell sub-index");
        let Some(sub_index) = sub_index else {
            log::error!("GridCell::remove - {:?} is not at its recorded cell sub-index", handle);
            return;
        };

        self.remove_at(store, sub_index);
        if let Some(object) = store.object_mut(handle) {
            object.grid_state_mut().set_cell_sub_index(None);
        }
    }

    /// Remove every copy of a handle the store can no longer resolve
    ///
    /// Linear in the cell size. Returns true if anything was removed.
    pub(crate) fn purge<S>(&mut self, store: &mut S, handle: K) -> bool
    where
        S: GridObjectStore<K> + ?Sized,
    {
        let mut purged = false;
        while let Some(index) = self.objects.iter().position(|&item| item == handle) {
            self.remove_at(store, index);
            purged = true;
        }
        purged
    }

    fn remove_at<S>(&mut self, store: &mut S, index: usize)
    where
        S: GridObjectStore<K> + ?Sized,
    {
        self.objects.swap_remove(index);
        if let Some(&moved) = self.objects.get(index) {
            if let Some(object) = store.object_mut(moved) {
                object.grid_state_mut().set_cell_sub_index(Some(index));
            }
        }

        if self.policy.release_slack(&mut self.objects) {
            log::trace!("Cell objects shrunk, {} max objects", self.objects.capacity());
        }
    }

    /// Drop every handle and release the allocation
    ///
    /// Does not touch the objects' state.
    pub(crate) fn reset(&mut self) {
        self.objects = Vec::new();
    }
}
