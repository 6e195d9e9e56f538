//! Common test utilities for pixdrill tests
//!
//! Provides helpers for:
//! - Installing a log subscriber (set RUST_LOG to see output)
//! - Building points and raster sources on the shared test grids

#![allow(dead_code)]

use std::sync::{Arc, Once};

use chrono::Duration;
use pixdrill::{Footprint, Point};
use raster_access::{MemoryRaster, MemoryRasterStore, RasterSource};
use test_utils::{survey_time, utm, GridSpec};
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Install a test log subscriber once per test binary.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// A UTM point at the centre of pixel (col, row) of `spec`.
pub fn point_at(spec: &GridSpec, col: usize, row: usize, buffer: f64, footprint: Footprint) -> Arc<Point> {
    let (x, y) = spec.pixel_centre(col, row);
    Arc::new(
        Point::new(x, y, survey_time(), utm(), Duration::days(3), buffer, footprint)
            .expect("valid test point"),
    )
}

/// A store holding the given rasters.
pub fn store(rasters: Vec<(&str, MemoryRaster)>) -> MemoryRasterStore {
    let mut store = MemoryRasterStore::new();
    for (location, raster) in rasters {
        store.insert(location, raster);
    }
    store
}

pub fn shared(store: MemoryRasterStore) -> Arc<dyn RasterSource> {
    Arc::new(store)
}
