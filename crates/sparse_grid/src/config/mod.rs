//! Configuration system
//!
//! Grid settings load from TOML or RON. Every field has a default, so a file
//! only needs the values it changes.

use std::fmt;
use std::path::Path;

pub use serde::{Deserialize, Serialize};

use crate::foundation::collections::AllocPolicy;
use crate::foundation::math::Vec3;
use crate::spatial::{GridCoordinate, GridError};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    ///
    /// The format is picked from the extension, `.toml` or `.ron`.
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or_default();
        if extension != "toml" && extension != "ron" {
            return Err(ConfigError::UnsupportedFormat(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config = if extension == "toml" {
            Self::from_toml_str(&contents)?
        } else {
            Self::from_ron_str(&contents)?
        };

        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse TOML text
    fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate_config()?;
        Ok(config)
    }

    /// Parse RON text
    fn from_ron_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate_config()?;
        Ok(config)
    }

    /// Reject values the consumer cannot work with
    fn validate_config(&self) -> Result<(), ConfigError> {
        Ok(())
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Parsed values are out of range
    #[error("Invalid grid configuration: {0}")]
    Invalid(#[from] GridError),
}

/// Largest number of cells along either axis
pub const MAX_CELLS_PER_AXIS: i32 = 192;

/// Recommended cell size range; sizes outside it still work
pub const RECOMMENDED_CELL_SIZE: std::ops::RangeInclusive<i32> = 100..=16000;

/// Layout and allocation settings for a [`crate::spatial::SparseGrid`]
///
/// World units are centimetres, so the default grid spans 50m x 50m
/// centered on the world origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SparseGridConfig {
    /// World position of the grid's minimum corner
    pub origin: GridCoordinate,
    /// Cells along X
    pub num_cells_x: i32,
    /// Cells along Y
    pub num_cells_y: i32,
    /// Edge length of one square cell
    pub cell_size: i32,
    /// Growth block for the registration array
    pub register_block_size: i32,
    /// Shrink multiplier for the registration array, -1 to never shrink
    pub register_shrink_multiplier: i32,
    /// Growth block for each cell's object array
    pub cell_block_size: i32,
    /// Shrink multiplier for each cell's object array, -1 to never shrink
    pub cell_shrink_multiplier: i32,
}

impl Default for SparseGridConfig {
    fn default() -> Self {
        Self {
            origin: GridCoordinate::new(-2500, -2500),
            num_cells_x: 5,
            num_cells_y: 5,
            cell_size: 1000,
            register_block_size: 128,
            register_shrink_multiplier: 0,
            cell_block_size: 16,
            cell_shrink_multiplier: 1,
        }
    }
}

impl Config for SparseGridConfig {
    fn validate_config(&self) -> Result<(), ConfigError> {
        self.validate().map_err(ConfigError::from)
    }
}

impl SparseGridConfig {
    /// Check every value a grid needs to operate
    pub fn validate(&self) -> Result<(), GridError> {
        let axis_range = 1..=MAX_CELLS_PER_AXIS;
        if !axis_range.contains(&self.num_cells_x) || !axis_range.contains(&self.num_cells_y) {
            return Err(GridError::InvalidCellCount {
                x: self.num_cells_x,
                y: self.num_cells_y,
                max: MAX_CELLS_PER_AXIS,
            });
        }

        if self.cell_size <= 0 {
            return Err(GridError::InvalidCellSize(self.cell_size));
        }
        for (origin, cells) in [(self.origin.x, self.num_cells_x), (self.origin.y, self.num_cells_y)] {
            let far_corner = cells.checked_mul(self.cell_size).and_then(|size| size.checked_add(origin));
            if far_corner.is_none() {
                return Err(GridError::BoundsOverflow {
                    origin,
                    cells,
                    cell_size: self.cell_size,
                });
            }
        }
        if !RECOMMENDED_CELL_SIZE.contains(&self.cell_size) {
            log::debug!(
                "Cell size {} is outside the recommended range {:?}",
                self.cell_size,
                RECOMMENDED_CELL_SIZE
            );
        }

        for (array, size) in [("registration", self.register_block_size), ("cell", self.cell_block_size)] {
            if size <= 0 {
                return Err(GridError::InvalidBlockSize { array, size });
            }
        }

        for (array, multiplier) in [
            ("registration", self.register_shrink_multiplier),
            ("cell", self.cell_shrink_multiplier),
        ] {
            if multiplier < AllocPolicy::NEVER_SHRINK {
                return Err(GridError::InvalidShrinkMultiplier { array, multiplier });
            }
        }

        Ok(())
    }

    /// Number of cells in the grid
    pub fn total_cells(&self) -> usize {
        (self.num_cells_x.max(0) * self.num_cells_y.max(0)) as usize
    }

    /// World size covered by the grid
    pub fn world_size(&self) -> (i32, i32) {
        (self.num_cells_x * self.cell_size, self.num_cells_y * self.cell_size)
    }

    /// Allocation policy for the registration array
    pub fn register_policy(&self) -> AllocPolicy {
        AllocPolicy::new(self.register_block_size.max(1) as usize, self.register_shrink_multiplier)
    }

    /// Allocation policy for each cell
    pub fn cell_policy(&self) -> AllocPolicy {
        AllocPolicy::new(self.cell_block_size.max(1) as usize, self.cell_shrink_multiplier)
    }

    /// Resize the grid to cover a world-space box
    ///
    /// Bigger worlds get bigger cells: the mean XY side length is mapped from
    /// `[1000, 250000]` onto a cell size in `[400, 16000]`. Does nothing if
    /// the box is empty on X or Y.
    pub fn fit_to_world_bounds(&mut self, min: &Vec3, max: &Vec3) {
        let size_x = max.x - min.x;
        let size_y = max.y - min.y;
        if size_x <= 0.0 || size_y <= 0.0 {
            return;
        }

        let mean_side = (size_x + size_y) * 0.5;
        let alpha = ((mean_side - 1000.0) / (250_000.0 - 1000.0)).clamp(0.0, 1.0);
        let cell_size = (400.0 + alpha * (16000.0 - 400.0)).ceil();

        self.origin = GridCoordinate::new(min.x.floor() as i32, min.y.floor() as i32);
        self.num_cells_x = ((size_x / cell_size).ceil() as i32).clamp(1, MAX_CELLS_PER_AXIS);
        self.num_cells_y = ((size_y / cell_size).ceil() as i32).clamp(1, MAX_CELLS_PER_AXIS);
        self.cell_size = cell_size as i32;

        log::debug!("Fit grid to world bounds: {self}");
    }

    /// Add `delta` cells on both axes without shrinking the covered area
    ///
    /// `delta` is clamped so neither axis leaves `1..=192`; the cell size
    /// then grows as needed to keep covering the previous world size.
    pub fn modify_density(&mut self, delta: i32) {
        let delta = if delta > 0 {
            delta.min(MAX_CELLS_PER_AXIS - self.num_cells_x.max(self.num_cells_y))
        } else {
            delta.max(1 - self.num_cells_x.min(self.num_cells_y))
        };
        if delta == 0 {
            return;
        }

        let (width, height) = self.world_size();
        self.num_cells_x += delta;
        self.num_cells_y += delta;

        let ceil_div = |size: i32, count: i32| (size + count - 1) / count;
        self.cell_size = ceil_div(width, self.num_cells_x).max(ceil_div(height, self.num_cells_y));
    }
}

impl fmt::Display for SparseGridConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (width, height) = self.world_size();
        write!(
            f,
            "{} x {} cells ({} total) of {}, {:.2}M x {:.2}M from ({}, {})",
            self.num_cells_x,
            self.num_cells_y,
            self.total_cells(),
            self.cell_size,
            width as f32 / 100.0,
            height as f32 / 100.0,
            self.origin.x,
            self.origin.y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SparseGridConfig::default();
        assert_eq!(config.origin, GridCoordinate::new(-2500, -2500));
        assert_eq!(config.total_cells(), 25);
        assert_eq!(config.world_size(), (5000, 5000));
        assert!(config.validate().is_ok());

        assert_eq!(config.register_policy(), AllocPolicy::new(128, 0));
        assert_eq!(config.cell_policy(), AllocPolicy::new(16, 1));
    }

    #[test]
    fn test_validate_limits() {
        let too_many = SparseGridConfig {
            num_cells_y: MAX_CELLS_PER_AXIS + 1,
            ..SparseGridConfig::default()
        };
        assert!(matches!(too_many.validate(), Err(GridError::InvalidCellCount { .. })));

        let no_block = SparseGridConfig {
            cell_block_size: 0,
            ..SparseGridConfig::default()
        };
        assert_eq!(no_block.validate(), Err(GridError::InvalidBlockSize { array: "cell", size: 0 }));

        let bad_shrink = SparseGridConfig {
            register_shrink_multiplier: -2,
            ..SparseGridConfig::default()
        };
        assert!(matches!(bad_shrink.validate(), Err(GridError::InvalidShrinkMultiplier { .. })));

        // Outside the recommended range is still valid
        let tiny_cells = SparseGridConfig {
            cell_size: 10,
            ..SparseGridConfig::default()
        };
        assert!(tiny_cells.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_overflowing_bounds() {
        let huge_cells = SparseGridConfig {
            num_cells_x: MAX_CELLS_PER_AXIS,
            num_cells_y: MAX_CELLS_PER_AXIS,
            cell_size: 20_000_000,
            ..SparseGridConfig::default()
        };
        assert_eq!(
            huge_cells.validate(),
            Err(GridError::BoundsOverflow {
                origin: -2500,
                cells: MAX_CELLS_PER_AXIS,
                cell_size: 20_000_000,
            })
        );

        // Fits on its own, but not once the origin is added
        let far_origin = SparseGridConfig {
            origin: GridCoordinate::new(0, i32::MAX - 4000),
            ..SparseGridConfig::default()
        };
        assert!(matches!(far_origin.validate(), Err(GridError::BoundsOverflow { cells: 5, .. })));

        let near_limit = SparseGridConfig {
            origin: GridCoordinate::new(0, i32::MAX - 5000),
            ..SparseGridConfig::default()
        };
        assert!(near_limit.validate().is_ok());
        assert_eq!(near_limit.world_size(), (5000, 5000));

        let result = SparseGridConfig::from_toml_str("num_cells_x = 192\ncell_size = 20000000");
        assert!(matches!(result, Err(ConfigError::Invalid(GridError::BoundsOverflow { .. }))));
    }

    #[test]
    fn test_fit_to_world_bounds() {
        let mut config = SparseGridConfig::default();
        config.fit_to_world_bounds(&Vec3::new(-500.5, -250.0, 0.0), &Vec3::new(499.5, 750.0, 100.0));

        // Mean side of 1000 maps to the smallest cell size
        assert_eq!(config.cell_size, 400);
        assert_eq!(config.origin, GridCoordinate::new(-501, -250));
        assert_eq!((config.num_cells_x, config.num_cells_y), (3, 3));

        let mut large = SparseGridConfig::default();
        large.fit_to_world_bounds(&Vec3::new(0.0, 0.0, 0.0), &Vec3::new(300_000.0, 200_000.0, 0.0));
        assert_eq!(large.cell_size, 16000);
        assert_eq!((large.num_cells_x, large.num_cells_y), (19, 13));
    }

    #[test]
    fn test_fit_ignores_empty_bounds() {
        let mut config = SparseGridConfig::default();
        config.fit_to_world_bounds(&Vec3::new(0.0, 0.0, 0.0), &Vec3::new(100.0, 0.0, 0.0));
        assert_eq!(config, SparseGridConfig::default());
    }

    #[test]
    fn test_modify_density_keeps_area() {
        let mut config = SparseGridConfig::default();
        config.modify_density(3);

        assert_eq!((config.num_cells_x, config.num_cells_y), (8, 8));
        assert_eq!(config.cell_size, 625);
        assert!(config.world_size().0 >= 5000);

        config.modify_density(-100);
        assert_eq!((config.num_cells_x, config.num_cells_y), (1, 1));
        assert_eq!(config.cell_size, 5000);

        config.modify_density(1000);
        assert_eq!(config.num_cells_x, MAX_CELLS_PER_AXIS);
    }

    #[test]
    fn test_parse_toml_with_defaults() {
        let config = SparseGridConfig::from_toml_str(
            r"
            num_cells_x = 12
            cell_size = 250

            [origin]
            x = 0
            y = -100
            ",
        )
        .unwrap();

        assert_eq!(config.num_cells_x, 12);
        assert_eq!(config.num_cells_y, 5);
        assert_eq!(config.cell_size, 250);
        assert_eq!(config.origin, GridCoordinate::new(0, -100));
        assert_eq!(config.cell_block_size, 16);
    }

    #[test]
    fn test_parse_ron() {
        let config = SparseGridConfig::from_ron_str(
            "(origin: (x: 10, y: 20), num_cells_x: 3, num_cells_y: 4, cell_size: 50, cell_shrink_multiplier: -1)",
        )
        .unwrap();

        assert_eq!(config.origin, GridCoordinate::new(10, 20));
        assert_eq!(config.total_cells(), 12);
        assert_eq!(config.cell_policy().shrink_multiplier(), AllocPolicy::NEVER_SHRINK);
    }

    #[test]
    fn test_parse_rejects_invalid_values() {
        let result = SparseGridConfig::from_toml_str("num_cells_x = 0");
        assert!(matches!(result, Err(ConfigError::Invalid(GridError::InvalidCellCount { .. }))));

        let result = SparseGridConfig::from_toml_str("num_cells_x = \"many\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = std::env::temp_dir().join(format!("sparse_grid_config_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let path = dir.join("grid.toml");
        std::fs::write(&path, "num_cells_y = 9\n").unwrap();
        let config = SparseGridConfig::load_from_file(&path).unwrap();
        assert_eq!(config.num_cells_y, 9);

        assert!(matches!(
            SparseGridConfig::load_from_file(dir.join("grid.json")),
            Err(ConfigError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            SparseGridConfig::load_from_file(dir.join("missing.ron")),
            Err(ConfigError::Io(_))
        ));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_display() {
        let text = SparseGridConfig::default().to_string();
        assert_eq!(text, "5 x 5 cells (25 total) of 1000, 50.00M x 50.00M from (-2500, -2500)");
    }
}
