//! Pixel window resolution.

use raster_access::{ImageInfo, PixelWindow, RasterError};

use crate::buffer::normalize_buffer;
use crate::error::Result;
use crate::point::Point;

/// The pixel window covering a point's region of interest in an image.
///
/// The ROI is the box `centre ± buffer` in the image's CRS. Its corners are
/// converted to pixel coordinates, flooring the upper-left and ceiling the
/// lower-right so every pixel touched by the ROI is included. The window is
/// then clipped to the grid. A window with no overlap has zero width and
/// height.
///
/// A zero buffer selects the single pixel containing the centre, or the
/// empty window when the centre is off the grid.
pub fn resolve_window(point: &Point, info: &ImageInfo) -> Result<PixelWindow> {
    let (cx, cy) = point.transform(&info.crs)?;
    let buffer = normalize_buffer(point, &info.crs)?;
    let gt = &info.transform;
    let to_pixel = |x: f64, y: f64| {
        gt.world_to_pixel(x, y).ok_or_else(|| {
            RasterError::invalid_metadata(format!("geotransform {:?} is not invertible", gt.to_gdal()))
        })
    };

    let ncols = info.ncols as i64;
    let nrows = info.nrows as i64;

    if buffer > 0.0 {
        let (ul_px, ul_py) = to_pixel(cx - buffer, cy + buffer)?;
        let (lr_px, lr_py) = to_pixel(cx + buffer, cy - buffer)?;

        let col_start = ul_px.min(lr_px).floor() as i64;
        let col_end = ul_px.max(lr_px).ceil() as i64;
        let row_start = ul_py.min(lr_py).floor() as i64;
        let row_end = ul_py.max(lr_py).ceil() as i64;

        Ok(clip(col_start, col_end, row_start, row_end, ncols, nrows))
    } else {
        let (c_px, c_py) = to_pixel(cx, cy)?;
        let col = c_px.floor() as i64;
        let row = c_py.floor() as i64;

        Ok(clip(col, col + 1, row, row + 1, ncols, nrows))
    }
}

/// Clip the half-open pixel ranges to the grid.
fn clip(
    col_start: i64,
    col_end: i64,
    row_start: i64,
    row_end: i64,
    ncols: i64,
    nrows: i64,
) -> PixelWindow {
    let x0 = col_start.clamp(0, ncols);
    let x1 = col_end.clamp(0, ncols);
    let y0 = row_start.clamp(0, nrows);
    let y1 = row_end.clamp(0, nrows);

    if x1 <= x0 || y1 <= y0 {
        return PixelWindow::new(x0 as usize, y0 as usize, 0, 0);
    }

    PixelWindow::new(x0 as usize, y0 as usize, (x1 - x0) as usize, (y1 - y0) as usize)
}
