//! Common test fixtures for pixdrill tests.
//!
//! This module provides pre-defined image geometries and survey times that
//! the test suites share.

use chrono::{DateTime, TimeZone, Utc};
use drill_common::GeoTransform;
use projection::Crs;
use raster_access::ImageInfo;

/// Common grid specifications for testing.
pub mod grid {
    /// EPSG code of WGS84 / UTM zone 55S, used by the projected test grids.
    pub const UTM_55S: u32 = 32755;

    /// 100x100 grid of 10 m pixels in UTM 55S.
    pub const UTM_100: GridSpec = GridSpec {
        ncols: 100,
        nrows: 100,
        origin_x: 300000.0,
        origin_y: 6000000.0,
        pixel_size: 10.0,
    };

    /// 20x20 grid of 10 m pixels sharing the origin of [`UTM_100`].
    pub const UTM_20: GridSpec = GridSpec {
        ncols: 20,
        nrows: 20,
        origin_x: 300000.0,
        origin_y: 6000000.0,
        pixel_size: 10.0,
    };

    /// North-up grid specification for testing.
    #[derive(Debug, Clone, Copy)]
    pub struct GridSpec {
        pub ncols: usize,
        pub nrows: usize,
        /// World x of the upper-left corner.
        pub origin_x: f64,
        /// World y of the upper-left corner.
        pub origin_y: f64,
        pub pixel_size: f64,
    }

    impl GridSpec {
        /// Returns the total number of grid cells.
        pub fn size(&self) -> usize {
            self.ncols * self.nrows
        }

        /// Returns the world coordinates of a pixel centre.
        pub fn pixel_centre(&self, col: usize, row: usize) -> (f64, f64) {
            (
                self.origin_x + (col as f64 + 0.5) * self.pixel_size,
                self.origin_y - (row as f64 + 0.5) * self.pixel_size,
            )
        }

        /// Returns the lower-right corner as (x, y).
        pub fn lower_right(&self) -> (f64, f64) {
            (
                self.origin_x + self.ncols as f64 * self.pixel_size,
                self.origin_y - self.nrows as f64 * self.pixel_size,
            )
        }
    }
}

pub use grid::GridSpec;

/// The UTM 55S CRS of the projected test grids.
pub fn utm() -> Crs {
    Crs::from_epsg(grid::UTM_55S).expect("EPSG:32755 is a known code")
}

/// Grid metadata for a spec in UTM 55S, with one entry of `nodata` per band.
pub fn grid_info(spec: &GridSpec, nodata: Vec<Option<f64>>) -> ImageInfo {
    ImageInfo::new(
        spec.ncols,
        spec.nrows,
        GeoTransform::north_up(spec.origin_x, spec.origin_y, spec.pixel_size, -spec.pixel_size),
        utm(),
        nodata,
    )
}

/// A fixed survey time for tests (2022-07-28T00:00:00Z).
pub fn survey_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2022, 7, 28, 0, 0, 0).unwrap()
}
