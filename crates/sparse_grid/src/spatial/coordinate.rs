//! Integer grid coordinates and cell tiles

use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec2;

/// Integer 2D coordinate
///
/// Used both for cell column/row pairs and for integer world-space
/// quantities such as the grid origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridCoordinate {
    /// X component
    pub x: i32,
    /// Y component
    pub y: i32,
}

impl GridCoordinate {
    /// Sentinel used for unset coordinates
    pub const NONE: Self = Self { x: -1, y: -1 };

    /// Create a new coordinate
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Create a coordinate with the same value on both axes
    pub const fn splat(value: i32) -> Self {
        Self { x: value, y: value }
    }

    /// Convert to a floating point vector
    pub fn to_vector(self) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32)
    }
}

impl From<(i32, i32)> for GridCoordinate {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

macro_rules! impl_coordinate_op {
    ($op:ident, $op_fn:ident, $assign:ident, $assign_fn:ident, $sym:tt) => {
        impl $op for GridCoordinate {
            type Output = Self;

            fn $op_fn(self, rhs: Self) -> Self {
                Self::new(self.x $sym rhs.x, self.y $sym rhs.y)
            }
        }

        impl $op<i32> for GridCoordinate {
            type Output = Self;

            fn $op_fn(self, rhs: i32) -> Self {
                Self::new(self.x $sym rhs, self.y $sym rhs)
            }
        }

        impl $assign for GridCoordinate {
            fn $assign_fn(&mut self, rhs: Self) {
                *self = *self $sym rhs;
            }
        }

        impl $assign<i32> for GridCoordinate {
            fn $assign_fn(&mut self, rhs: i32) {
                *self = *self $sym rhs;
            }
        }
    };
}

impl_coordinate_op!(Add, add, AddAssign, add_assign, +);
impl_coordinate_op!(Sub, sub, SubAssign, sub_assign, -);
impl_coordinate_op!(Mul, mul, MulAssign, mul_assign, *);
impl_coordinate_op!(Div, div, DivAssign, div_assign, /);

/// Half-open rectangle of cell coordinates, `[start, end)`
///
/// Describes the cells a query visits. An unset tile has both corners at
/// [`GridCoordinate::NONE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellTile {
    /// First cell coordinate (inclusive)
    pub start: GridCoordinate,
    /// Last cell coordinate (exclusive)
    pub end: GridCoordinate,
}

impl Default for CellTile {
    fn default() -> Self {
        Self {
            start: GridCoordinate::NONE,
            end: GridCoordinate::NONE,
        }
    }
}

impl CellTile {
    /// Create a tile from its corners
    pub const fn new(start: GridCoordinate, end: GridCoordinate) -> Self {
        Self { start, end }
    }

    /// Whether the tile is set and `start <= end` on both axes
    pub fn is_valid(&self) -> bool {
        self.start.x >= 0 && self.start.y >= 0
            && self.start.x <= self.end.x && self.start.y <= self.end.y
    }

    /// Number of cells covered by the tile
    pub fn cell_count(&self) -> usize {
        if !self.is_valid() {
            return 0;
        }
        ((self.end.x - self.start.x) * (self.end.y - self.start.y)) as usize
    }

    /// Whether the tile covers `coord`
    pub fn contains(&self, coord: GridCoordinate) -> bool {
        coord.x >= self.start.x && coord.x < self.end.x
            && coord.y >= self.start.y && coord.y < self.end.y
    }

    /// Visit order for queries: rows (Y) outer, columns (X) inner
    pub fn iter(&self) -> impl Iterator<Item = GridCoordinate> {
        let (start, end) = (self.start, self.end);
        (start.y..end.y).flat_map(move |y| (start.x..end.x).map(move |x| GridCoordinate::new(x, y)))
    }
}
