//! Raster access abstraction.
//!
//! The drilling engine never decodes raster bytes itself. It talks to a
//! [`RasterSource`] that opens a location into a [`RasterDataset`], which
//! exposes the grid metadata ([`ImageInfo`]) and reads rectangular pixel
//! windows as per-band `f64` arrays.
//!
//! [`MemoryRasterStore`] is an in-memory implementation for tests and for
//! embedders that already hold decoded data.

pub mod error;
pub mod memory;
pub mod source;
pub mod types;

pub use error::{RasterError, Result};
pub use memory::{MemoryRaster, MemoryRasterStore};
pub use source::{RasterDataset, RasterSource};
pub use types::{ImageInfo, PixelWindow};
