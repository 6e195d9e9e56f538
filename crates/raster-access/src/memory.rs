//! In-memory raster source.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{RasterError, Result};
use crate::source::{RasterDataset, RasterSource};
use crate::types::{ImageInfo, PixelWindow};

/// A fully decoded raster held in memory.
#[derive(Debug, Clone)]
pub struct MemoryRaster {
    info: ImageInfo,
    bands: Vec<Vec<f64>>,
}

impl MemoryRaster {
    /// Create a raster from row-major band arrays, one per band in `info`.
    pub fn new(info: ImageInfo, bands: Vec<Vec<f64>>) -> Result<Self> {
        if bands.len() != info.band_count() {
            return Err(RasterError::invalid_metadata(format!(
                "{} band arrays supplied for {} bands",
                bands.len(),
                info.band_count()
            )));
        }

        let expected = info.ncols * info.nrows;
        if let Some((idx, band)) = bands.iter().enumerate().find(|(_, b)| b.len() != expected) {
            return Err(RasterError::invalid_metadata(format!(
                "band {} has {} values, expected {}",
                idx,
                band.len(),
                expected
            )));
        }

        Ok(Self { info, bands })
    }

    pub fn info(&self) -> &ImageInfo {
        &self.info
    }

    fn read(&self, window: &PixelWindow) -> Result<Vec<Vec<f64>>> {
        if !self.info.contains_window(window) {
            return Err(RasterError::WindowOutOfRange {
                window: window.to_string(),
                ncols: self.info.ncols,
                nrows: self.info.nrows,
            });
        }

        let ncols = self.info.ncols;
        let out = self
            .bands
            .iter()
            .map(|band| {
                let mut values = Vec::with_capacity(window.size());
                for row in window.y_off..window.y_off + window.height {
                    let start = row * ncols + window.x_off;
                    values.extend_from_slice(&band[start..start + window.width]);
                }
                values
            })
            .collect();
        Ok(out)
    }
}

struct MemoryDataset {
    raster: Arc<MemoryRaster>,
    unreadable: bool,
    location: String,
}

#[async_trait]
impl RasterDataset for MemoryDataset {
    fn info(&self) -> &ImageInfo {
        &self.raster.info
    }

    async fn read_window(&self, window: &PixelWindow) -> Result<Vec<Vec<f64>>> {
        if self.unreadable {
            return Err(RasterError::read_failed(format!(
                "{}: pixel data is unreadable",
                self.location
            )));
        }
        self.raster.read(window)
    }
}

/// A [`RasterSource`] serving rasters registered under string locations.
///
/// Locations can be marked unreadable, in which case they open normally but
/// every window read fails, mimicking a corrupt or truncated remote file.
#[derive(Default)]
pub struct MemoryRasterStore {
    rasters: HashMap<String, Arc<MemoryRaster>>,
    unreadable: HashSet<String>,
    opens: AtomicUsize,
}

impl MemoryRasterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a raster under a location, replacing any previous one.
    pub fn insert(&mut self, location: impl Into<String>, raster: MemoryRaster) {
        self.rasters.insert(location.into(), Arc::new(raster));
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_raster(mut self, location: impl Into<String>, raster: MemoryRaster) -> Self {
        self.insert(location, raster);
        self
    }

    /// Make reads from a location fail.
    pub fn mark_unreadable(&mut self, location: impl Into<String>) {
        self.unreadable.insert(location.into());
    }

    /// Number of successful `open` calls so far.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.rasters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rasters.is_empty()
    }
}

#[async_trait]
impl RasterSource for MemoryRasterStore {
    async fn open(&self, location: &str) -> Result<Box<dyn RasterDataset>> {
        let raster = self
            .rasters
            .get(location)
            .cloned()
            .ok_or_else(|| RasterError::open_failed(format!("{}: no such raster", location)))?;

        self.opens.fetch_add(1, Ordering::Relaxed);
        debug!(location = location, "opened in-memory raster");

        Ok(Box::new(MemoryDataset {
            raster,
            unreadable: self.unreadable.contains(location),
            location: location.to_string(),
        }))
    }
}
