//! Specialized collection types
//!
//! Block-allocated arrays and the object store abstraction the grid reads
//! positions and bookkeeping through.

use std::fmt::Debug;

pub use slotmap::{SlotMap, DefaultKey};

use crate::spatial::GridObject;

/// Handle-based map using slot map for stable references
pub type HandleMap<T> = SlotMap<DefaultKey, T>;

/// Handle type for stable references
pub type Handle = DefaultKey;

/// Anything the grid can use to refer to an externally owned object
///
/// Handles are compared by value, so two handles are the same object
/// exactly when they are equal.
pub trait GridHandle: Copy + Eq + Debug {}

impl<T: Copy + Eq + Debug> GridHandle for T {}

/// Storage that owns grid objects and resolves handles to them
///
/// The grid never owns objects. Every call that needs an object's position or
/// bookkeeping receives the store explicitly, so mutation of the grid and of
/// the objects' grid state always happens under one exclusive borrow.
pub trait GridObjectStore<K: GridHandle> {
    /// The stored object type
    type Object: GridObject;

    /// Resolve a handle
    fn object(&self, handle: K) -> Option<&Self::Object>;

    /// Resolve a handle mutably
    fn object_mut(&mut self, handle: K) -> Option<&mut Self::Object>;

    /// Every handle currently in the store
    fn handles(&self) -> Vec<K>;
}

impl<K: slotmap::Key, T: GridObject> GridObjectStore<K> for SlotMap<K, T> {
    type Object = T;

    fn object(&self, handle: K) -> Option<&T> {
        self.get(handle)
    }

    fn object_mut(&mut self, handle: K) -> Option<&mut T> {
        self.get_mut(handle)
    }

    fn handles(&self) -> Vec<K> {
        self.keys().collect()
    }
}

impl<T: GridObject> GridObjectStore<usize> for Vec<T> {
    type Object = T;

    fn object(&self, handle: usize) -> Option<&T> {
        self.get(handle)
    }

    fn object_mut(&mut self, handle: usize) -> Option<&mut T> {
        self.get_mut(handle)
    }

    fn handles(&self) -> Vec<usize> {
        (0..self.len()).collect()
    }
}

/// Block allocation policy for a growable array
///
/// Arrays grow by `block_size` elements whenever they run out of capacity.
/// After a removal, excess capacity is released according to
/// `shrink_multiplier`:
///
/// - `-1`: never shrink.
/// - `0`: shrink to the smallest multiple of `block_size` that holds every
///   element whenever the slack lands on a block boundary.
/// - `n > 0`: as above, but only once the slack exceeds `n * block_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocPolicy {
    block_size: usize,
    shrink_multiplier: i32,
}

impl AllocPolicy {
    /// Shrink multiplier that disables shrinking
    pub const NEVER_SHRINK: i32 = -1;

    /// Create a new allocation policy
    pub fn new(block_size: usize, shrink_multiplier: i32) -> Self {
        debug_assert!(block_size > 0, "AllocPolicy block size must be positive");
        debug_assert!(shrink_multiplier >= Self::NEVER_SHRINK, "AllocPolicy shrink multiplier below -1");

        Self {
            block_size: block_size.max(1),
            shrink_multiplier,
        }
    }

    /// Allocation block size in elements
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Configured shrink multiplier
    pub fn shrink_multiplier(&self) -> i32 {
        self.shrink_multiplier
    }

    /// Make room for one more element, growing by a whole block if full
    ///
    /// Returns true if the array was reallocated.
    pub fn reserve_for_push<T>(&self, items: &mut Vec<T>) -> bool {
        if items.len() < items.capacity() {
            return false;
        }

        items.reserve_exact(self.block_size);
        true
    }

    /// Release excess capacity if the shrink policy calls for it
    ///
    /// Returns true if the array was reallocated.
    pub fn release_slack<T>(&self, items: &mut Vec<T>) -> bool {
        if self.shrink_multiplier < 0 {
            return false;
        }

        let slack = items.capacity() - items.len();
        let threshold = self.block_size * self.shrink_multiplier as usize;
        if slack == 0 || slack % self.block_size != 0 || slack <= threshold {
            return false;
        }

        let target = items.len().div_ceil(self.block_size) * self.block_size;
        items.shrink_to(target);
        true
    }
}
