//! UTM zone selection.

use crate::crs::Crs;
use crate::error::Result;

/// UTM zone number (1..=60) containing a longitude in degrees.
pub fn utm_zone(lon: f64) -> u32 {
    let zone = ((lon + 180.0) / 6.0).floor() as i64 + 1;
    zone.clamp(1, 60) as u32
}

/// EPSG code of the WGS84 UTM zone for a WGS84 location.
///
/// Northern hemisphere zones are 326xx, southern hemisphere zones 327xx.
/// The equator counts as north.
pub fn utm_epsg_for(lon: f64, lat: f64) -> u32 {
    let base = if lat >= 0.0 { 32600 } else { 32700 };
    base + utm_zone(lon)
}

/// The WGS84 UTM CRS for a WGS84 location.
pub fn utm_crs_for(lon: f64, lat: f64) -> Result<Crs> {
    Crs::from_epsg(utm_epsg_for(lon, lat))
}
