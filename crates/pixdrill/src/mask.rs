//! Footprint masking.

use rayon::prelude::*;

use crate::buffer::normalize_buffer;
use crate::error::{DrillError, Result};
use crate::point::{Footprint, Point};
use crate::record::ArrayInfo;

/// Corner offsets (row, col) of a pixel.
const CORNERS: [(usize, usize); 4] = [(0, 0), (0, 1), (1, 0), (1, 1)];

/// Mask the pixels of `record` that fall outside the point's footprint.
///
/// Square footprints are already the shape of the window, so nothing
/// changes. For circles, a pixel is excluded only when all four of its
/// corners are farther from the centre than the radius, so pixels touched by
/// the boundary are kept. Excluded pixels are set to the band's null value
/// (NaN when the band has none) and masked in every band.
pub fn mask_to_shape(point: &Point, record: &mut ArrayInfo) -> Result<()> {
    match point.footprint() {
        Footprint::Square => Ok(()),
        Footprint::Circle => mask_circle(point, record),
    }
}

fn mask_circle(point: &Point, record: &mut ArrayInfo) -> Result<()> {
    let size = record.data.size();
    if size <= 4 {
        return Err(DrillError::InsufficientPixels { size });
    }

    let (cx, cy) = point.transform(&record.crs)?;
    let radius = normalize_buffer(point, &record.crs)?;
    let outside = outside_circle(record, cx, cy, radius);

    let (bands, rows, cols) = record.data.shape();
    for band in 0..bands {
        let null = record.nulls.get(band).copied().flatten().unwrap_or(f64::NAN);
        for row in 0..rows {
            for col in 0..cols {
                if outside[row * cols + col] {
                    record.data.set_null(band, row, col, null);
                }
            }
        }
    }

    Ok(())
}

/// Row-major flags, true where every corner of the pixel is outside the circle.
fn outside_circle(record: &ArrayInfo, cx: f64, cy: f64, radius: f64) -> Vec<bool> {
    let (_, rows, cols) = record.data.shape();
    let r2 = radius * radius;

    (0..rows * cols)
        .into_par_iter()
        .map(|idx| {
            let (row, col) = (idx / cols, idx % cols);
            CORNERS.iter().all(|(dr, dc)| {
                let xs = record.ulx + (col + dc) as f64 * record.x_res;
                let ys = record.uly - (row + dr) as f64 * record.y_res;
                (xs - cx).powi(2) + (ys - cy).powi(2) > r2
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::masked::MaskedArray;
    use chrono::{Duration, TimeZone, Utc};
    use drill_common::GeoTransform;
    use projection::Crs;
    use raster_access::{ImageInfo, PixelWindow};

    fn utm() -> Crs {
        Crs::from_epsg(32755).unwrap()
    }

    fn point(footprint: Footprint, buffer: f64) -> Point {
        // Centre of pixel (5, 5)
        Point::new(
            300055.0,
            5999945.0,
            Utc.with_ymd_and_hms(2022, 7, 28, 0, 0, 0).unwrap(),
            utm(),
            Duration::days(1),
            buffer,
            footprint,
        )
        .unwrap()
    }

    fn record(window: PixelWindow, bands: usize, nulls: Vec<Option<f64>>) -> ArrayInfo {
        let info = ImageInfo::new(
            20,
            20,
            GeoTransform::north_up(300000.0, 6000000.0, 10.0, -10.0),
            utm(),
            nulls.clone(),
        );
        let data = MaskedArray::from_bands(
            vec![vec![7.0; window.size()]; bands],
            window.height,
            window.width,
            &nulls,
        )
        .unwrap();
        ArrayInfo::new(data, None, window, &info, nulls)
    }

    #[test]
    fn test_square_is_noop() {
        let mut rec = record(PixelWindow::new(0, 0, 11, 11), 1, vec![Some(0.0)]);
        let before = rec.clone();
        mask_to_shape(&point(Footprint::Square, 50.0), &mut rec).unwrap();
        assert_eq!(rec, before);
    }

    #[test]
    fn test_circle_masks_outer_corners() {
        // 50 m radius around the centre of pixel (5, 5) on 10 m pixels
        let mut rec = record(PixelWindow::new(0, 0, 11, 11), 2, vec![Some(0.0), Some(-9.0)]);
        mask_to_shape(&point(Footprint::Circle, 50.0), &mut rec).unwrap();

        // The corner pixels of the 11x11 window lie wholly outside the circle.
        for (row, col) in [(0, 0), (0, 10), (10, 0), (10, 10)] {
            assert!(rec.data.is_masked(0, row, col));
            assert!(rec.data.is_masked(1, row, col));
        }
        // Null values are applied per band.
        assert_eq!(rec.data.band(0)[0], 0.0);
        assert_eq!(rec.data.band(1)[0], -9.0);

        // The centre row and column are kept in full.
        for i in 0..11 {
            assert!(!rec.data.is_masked(0, 5, i));
            assert!(!rec.data.is_masked(0, i, 5));
        }
    }

    #[test]
    fn test_circle_corner_property() {
        let pt = point(Footprint::Circle, 37.0);
        let mut rec = record(PixelWindow::new(0, 0, 11, 11), 1, vec![None]);
        mask_to_shape(&pt, &mut rec).unwrap();

        let (cx, cy) = (300055.0, 5999945.0);
        let r2 = 37.0_f64 * 37.0;
        for row in 0..11 {
            for col in 0..11 {
                let d2: Vec<f64> = CORNERS
                    .iter()
                    .map(|(dr, dc)| {
                        let xs = rec.ulx + (col + dc) as f64 * rec.x_res;
                        let ys = rec.uly - (row + dr) as f64 * rec.y_res;
                        (xs - cx).powi(2) + (ys - cy).powi(2)
                    })
                    .collect();
                if rec.data.is_masked(0, row, col) {
                    assert!(d2.iter().all(|d| *d > r2));
                    assert!(rec.data.band(0)[row * 11 + col].is_nan());
                } else {
                    assert!(d2.iter().any(|d| *d <= r2));
                }
            }
        }
    }

    #[test]
    fn test_circle_needs_five_pixels() {
        let mut rec = record(PixelWindow::new(0, 0, 2, 2), 1, vec![None]);
        let err = mask_to_shape(&point(Footprint::Circle, 10.0), &mut rec).unwrap_err();
        assert!(matches!(err, DrillError::InsufficientPixels { size: 4 }));
    }

    #[test]
    fn test_square_small_window_ok() {
        let mut rec = record(PixelWindow::new(5, 5, 1, 1), 1, vec![None]);
        assert!(mask_to_shape(&point(Footprint::Square, 0.0), &mut rec).is_ok());
    }
}
