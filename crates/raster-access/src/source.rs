//! Raster source and dataset traits.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ImageInfo, PixelWindow};

/// Opens raster locations (paths or URLs) into datasets.
#[async_trait]
pub trait RasterSource: Send + Sync {
    /// Open a location and read its grid metadata.
    async fn open(&self, location: &str) -> Result<Box<dyn RasterDataset>>;
}

/// An opened raster.
///
/// A dataset is owned by whoever opened it and released when dropped.
#[async_trait]
pub trait RasterDataset: Send + Sync {
    /// Grid metadata.
    fn info(&self) -> &ImageInfo;

    /// Read a window from every band.
    ///
    /// Returns one row-major array of `window.width * window.height` values
    /// per band.
    async fn read_window(&self, window: &PixelWindow) -> Result<Vec<Vec<f64>>>;
}
