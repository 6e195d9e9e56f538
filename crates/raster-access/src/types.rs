//! Core types for raster access.

use drill_common::{BoundingBox, GeoTransform};
use projection::Crs;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Grid metadata of an opened raster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageInfo {
    /// Number of columns (x size).
    pub ncols: usize,
    /// Number of rows (y size).
    pub nrows: usize,
    /// Pixel to world affine transform.
    pub transform: GeoTransform,
    /// Coordinate reference system of the grid.
    pub crs: Crs,
    /// Native null value of each band, `None` when the band has none.
    pub nodata: Vec<Option<f64>>,
}

impl ImageInfo {
    pub fn new(
        ncols: usize,
        nrows: usize,
        transform: GeoTransform,
        crs: Crs,
        nodata: Vec<Option<f64>>,
    ) -> Self {
        Self {
            ncols,
            nrows,
            transform,
            crs,
            nodata,
        }
    }

    /// Number of bands.
    pub fn band_count(&self) -> usize {
        self.nodata.len()
    }

    /// Native null value of a band (0-based).
    pub fn band_nodata(&self, band: usize) -> Option<f64> {
        self.nodata.get(band).copied().flatten()
    }

    /// Absolute pixel width.
    pub fn x_res(&self) -> f64 {
        self.transform.x_res()
    }

    /// Absolute pixel height.
    pub fn y_res(&self) -> f64 {
        self.transform.y_res()
    }

    /// World extent covered by the grid.
    pub fn extent(&self) -> BoundingBox {
        let cols = self.ncols as f64;
        let rows = self.nrows as f64;
        let corners = [
            self.transform.pixel_to_world(0.0, 0.0),
            self.transform.pixel_to_world(cols, 0.0),
            self.transform.pixel_to_world(0.0, rows),
            self.transform.pixel_to_world(cols, rows),
        ];

        let mut bbox = BoundingBox::new(f64::MAX, f64::MAX, f64::MIN, f64::MIN);
        for (x, y) in corners {
            bbox.min_x = bbox.min_x.min(x);
            bbox.min_y = bbox.min_y.min(y);
            bbox.max_x = bbox.max_x.max(x);
            bbox.max_y = bbox.max_y.max(y);
        }
        bbox
    }

    /// Whether a window lies entirely within the grid.
    pub fn contains_window(&self, window: &PixelWindow) -> bool {
        window.x_off + window.width <= self.ncols && window.y_off + window.height <= self.nrows
    }
}

/// A rectangle in a grid's pixel space.
///
/// A zero width or height means the region does not overlap the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelWindow {
    pub x_off: usize,
    pub y_off: usize,
    pub width: usize,
    pub height: usize,
}

impl PixelWindow {
    pub fn new(x_off: usize, y_off: usize, width: usize, height: usize) -> Self {
        Self {
            x_off,
            y_off,
            width,
            height,
        }
    }

    /// The zero-size window.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of pixels covered.
    pub fn size(&self) -> usize {
        self.width * self.height
    }
}

impl fmt::Display for PixelWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[x_off={}, y_off={}, {}x{}]",
            self.x_off, self.y_off, self.width, self.height
        )
    }
}
