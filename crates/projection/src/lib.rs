//! Coordinate reference system handles and point transformation.
//!
//! CRSs are built from EPSG authority codes (resolved through the
//! `crs-definitions` database) or from PROJ definition strings, and points
//! are transformed with the pure Rust `proj4rs` port. All coordinates use the
//! traditional GIS axis order: x is easting or longitude, y is northing or
//! latitude, and geographic coordinates are in degrees.

pub mod crs;
pub mod error;
pub mod utm;

pub use crs::{Crs, CrsKind};
pub use error::{ProjectionError, Result};
pub use utm::{utm_crs_for, utm_epsg_for, utm_zone};
