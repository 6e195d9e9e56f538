//! Buffer unit conversion between CRSs.

use projection::{utm_crs_for, Crs, CrsKind};

use crate::error::{DrillError, Result};
use crate::point::{BufferUnits, Point};

/// The point's buffer distance expressed in the units of `target`.
///
/// A linear buffer applied to a geographic target is converted to degrees,
/// and an angular buffer applied to a projected target is converted to
/// linear units. Compatible combinations return the buffer unchanged.
///
/// Conversion offsets a synthetic point by the buffer along the x axis,
/// projects it and the centre into `target` and measures the x distance
/// between them. A linear buffer on a point that is itself in geographic
/// coordinates is first applied in the WGS84 UTM zone of the point, and an
/// angular buffer on a projected point is applied in WGS84.
pub fn normalize_buffer(point: &Point, target: &Crs) -> Result<f64> {
    let buffer = point.buffer();

    match (point.buffer_units(), target.kind()) {
        (_, CrsKind::Other) => Err(unknown_class("target", target)),
        (BufferUnits::Linear, CrsKind::Geographic) => match point.crs().kind() {
            CrsKind::Projected => {
                transformed_buffer(point.x(), point.y(), buffer, point.crs(), target)
            }
            CrsKind::Geographic => {
                let utm = utm_crs_for(point.wgs84_x(), point.wgs84_y())?;
                let (px, py) = point.transform(&utm)?;
                transformed_buffer(px, py, buffer, &utm, target)
            }
            CrsKind::Other => Err(unknown_class("point", point.crs())),
        },
        (BufferUnits::Angular, CrsKind::Projected) => match point.crs().kind() {
            CrsKind::Projected => transformed_buffer(
                point.wgs84_x(),
                point.wgs84_y(),
                buffer,
                &Crs::wgs84(),
                target,
            ),
            CrsKind::Geographic => {
                transformed_buffer(point.x(), point.y(), buffer, point.crs(), target)
            }
            CrsKind::Other => Err(unknown_class("point", point.crs())),
        },
        _ => Ok(buffer),
    }
}

/// Distance along x, in `dst`, between (x, y) and (x + buffer, y) given in `src`.
pub fn transformed_buffer(x: f64, y: f64, buffer: f64, src: &Crs, dst: &Crs) -> Result<f64> {
    if buffer == 0.0 {
        return Ok(0.0);
    }
    let (t_x, _) = src.transform_point(dst, x, y)?;
    let (t_xn, _) = src.transform_point(dst, x + buffer, y)?;
    Ok((t_xn - t_x).abs())
}

fn unknown_class(role: &'static str, crs: &Crs) -> DrillError {
    DrillError::UnknownCrsClass {
        role,
        crs: crs.to_string(),
    }
}
