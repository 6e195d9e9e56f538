//! Affine geotransform for raster grids.

use serde::{Deserialize, Serialize};

/// Affine coefficients mapping pixel space to world space, in GDAL order.
///
/// ```text
/// x = origin_x + col * pixel_width + row * row_rotation
/// y = origin_y + col * col_rotation + row * pixel_height
/// ```
///
/// `(col, row)` are fractional pixel coordinates measured from the outer
/// upper-left corner of the grid, so `(0.0, 0.0)` is the corner of the first
/// pixel rather than its centre. North-up images have zero rotation terms and
/// a negative `pixel_height`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub row_rotation: f64,
    pub origin_y: f64,
    pub col_rotation: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// North-up transform with no rotation.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            pixel_width,
            row_rotation: 0.0,
            origin_y,
            col_rotation: 0.0,
            pixel_height,
        }
    }

    /// Create from a GDAL-style array
    /// `[origin_x, pixel_width, row_rotation, origin_y, col_rotation, pixel_height]`.
    pub fn from_gdal(coeffs: [f64; 6]) -> Self {
        Self {
            origin_x: coeffs[0],
            pixel_width: coeffs[1],
            row_rotation: coeffs[2],
            origin_y: coeffs[3],
            col_rotation: coeffs[4],
            pixel_height: coeffs[5],
        }
    }

    /// Convert to a GDAL-style array.
    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            self.row_rotation,
            self.origin_y,
            self.col_rotation,
            self.pixel_height,
        ]
    }

    /// Map fractional pixel coordinates to world coordinates.
    pub fn pixel_to_world(&self, col: f64, row: f64) -> (f64, f64) {
        let x = self.origin_x + col * self.pixel_width + row * self.row_rotation;
        let y = self.origin_y + col * self.col_rotation + row * self.pixel_height;
        (x, y)
    }

    /// Map world coordinates to fractional pixel coordinates.
    ///
    /// Returns `None` when the transform is not invertible.
    pub fn world_to_pixel(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let det = self.pixel_width * self.pixel_height - self.row_rotation * self.col_rotation;
        if det == 0.0 || !det.is_finite() {
            return None;
        }

        let dx = x - self.origin_x;
        let dy = y - self.origin_y;
        let col = (self.pixel_height * dx - self.row_rotation * dy) / det;
        let row = (-self.col_rotation * dx + self.pixel_width * dy) / det;
        Some((col, row))
    }

    /// Absolute pixel size along x.
    pub fn x_res(&self) -> f64 {
        self.pixel_width.abs()
    }

    /// Absolute pixel size along y.
    pub fn y_res(&self) -> f64 {
        self.pixel_height.abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gdal_roundtrip() {
        let coeffs = [500000.0, 10.0, 0.0, 7000000.0, 0.0, -10.0];
        let gt = GeoTransform::from_gdal(coeffs);
        assert_eq!(gt.to_gdal(), coeffs);
        assert_eq!(gt, GeoTransform::north_up(500000.0, 7000000.0, 10.0, -10.0));
    }

    #[test]
    fn test_pixel_world_inverse() {
        let gt = GeoTransform::north_up(500000.0, 7000000.0, 10.0, -10.0);
        let (x, y) = gt.pixel_to_world(12.5, 7.25);
        assert_eq!((x, y), (500125.0, 6999927.5));

        let (col, row) = gt.world_to_pixel(x, y).unwrap();
        assert!((col - 12.5).abs() < 1e-9);
        assert!((row - 7.25).abs() < 1e-9);
    }

    #[test]
    fn test_rotated_inverse() {
        let gt = GeoTransform::from_gdal([100.0, 2.0, 0.5, 200.0, 0.25, -2.0]);
        let (x, y) = gt.pixel_to_world(3.0, 4.0);
        let (col, row) = gt.world_to_pixel(x, y).unwrap();
        assert!((col - 3.0).abs() < 1e-9);
        assert!((row - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_singular_transform() {
        let gt = GeoTransform::north_up(0.0, 0.0, 0.0, -1.0);
        assert!(gt.world_to_pixel(1.0, 1.0).is_none());
    }
}
