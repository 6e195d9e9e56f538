//! Test data generators for creating synthetic band data.
//!
//! Every generator returns a row-major `Vec<f64>` for one band of a
//! [`GridSpec`], so values at known pixels can be checked directly.

use raster_access::MemoryRaster;

use crate::fixtures::{grid_info, GridSpec};

/// A band with every pixel set to `value`.
pub fn constant_band(spec: &GridSpec, value: f64) -> Vec<f64> {
    vec![value; spec.size()]
}

/// A band with predictable values.
///
/// Each cell value is calculated as: `row * ncols + col`
///
/// # Example
///
/// ```
/// use test_utils::{gradient_band, grid};
///
/// let band = gradient_band(&grid::UTM_20);
/// assert_eq!(band[0], 0.0);
/// assert_eq!(band[21], 21.0); // row 1, col 1
/// ```
pub fn gradient_band(spec: &GridSpec) -> Vec<f64> {
    (0..spec.size()).map(|i| i as f64).collect()
}

/// A band of `value` with every `every`-th column (starting at column 0)
/// set to `null`.
pub fn null_striped_band(spec: &GridSpec, value: f64, null: f64, every: usize) -> Vec<f64> {
    let every = every.max(1);
    (0..spec.size())
        .map(|i| if (i % spec.ncols) % every == 0 { null } else { value })
        .collect()
}

/// An in-memory raster on `spec` in UTM 55S.
///
/// # Panics
///
/// Panics if `bands` and `nodata` disagree with each other or with the grid.
pub fn memory_raster(spec: &GridSpec, nodata: Vec<Option<f64>>, bands: Vec<Vec<f64>>) -> MemoryRaster {
    MemoryRaster::new(grid_info(spec, nodata), bands).expect("band data does not match the grid")
}

/// A single-band in-memory raster with a constant value.
pub fn constant_raster(spec: &GridSpec, value: f64, nodata: Option<f64>) -> MemoryRaster {
    memory_raster(spec, vec![nodata], vec![constant_band(spec, value)])
}
