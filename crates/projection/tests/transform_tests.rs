//! Integration tests for CRS transformation.

use projection::{utm_crs_for, Crs, CrsKind};

// ============================================================================
// Geographic <-> projected
// ============================================================================

#[test]
fn test_wgs84_to_utm() {
    let wgs84 = Crs::wgs84();
    let utm = Crs::from_epsg(32633).unwrap();

    let (x, y) = wgs84.transform_point(&utm, 15.0, 52.0).unwrap();
    assert!(x > 400000.0 && x < 600000.0, "easting: {}", x);
    assert!(y > 5000000.0 && y < 6000000.0, "northing: {}", y);
}

#[test]
fn test_utm_roundtrip() {
    let wgs84 = Crs::wgs84();
    let utm = utm_crs_for(144.96, -37.81).unwrap();
    assert_eq!(utm.kind(), CrsKind::Projected);

    let (x, y) = wgs84.transform_point(&utm, 144.96, -37.81).unwrap();
    let (lon, lat) = utm.transform_point(&wgs84, x, y).unwrap();
    assert!((lon - 144.96).abs() < 1e-6, "lon: {}", lon);
    assert!((lat + 37.81).abs() < 1e-6, "lat: {}", lat);
}

#[test]
fn test_proj4_and_epsg_interoperate() {
    let from_code = Crs::from_epsg(32755).unwrap();
    let from_def = Crs::from_proj4(from_code.definition()).unwrap();
    assert_eq!(from_code, from_def);

    // Identical definitions never touch proj4rs.
    let (x, y) = from_code.transform_point(&from_def, 320000.0, 5810000.0).unwrap();
    assert_eq!((x, y), (320000.0, 5810000.0));
}

#[test]
fn test_invalid_definition() {
    assert!(Crs::from_proj4("+proj=nonsense +datum=WGS84").is_err());
}
