//! Survey points.
//!
//! A [`Point`] is an immutable x/y/time location with a CRS, a temporal
//! half-window used for catalog searches, and a spatial buffer that together
//! with the [`Footprint`] defines the region of interest around it. Each
//! point owns the [`PointStats`] that accumulate what is drilled for it.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, TimeZone, Utc};
use drill_common::TimeWindow;
use projection::Crs;
use raster_access::ImageInfo;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DrillError, Result};
use crate::stats::PointStats;

static NEXT_POINT_ID: AtomicU64 = AtomicU64::new(1);

/// Shape of the region of interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Footprint {
    /// Square with half-side equal to the buffer.
    Square,
    /// Circle with radius equal to the buffer.
    Circle,
}

impl Footprint {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "square" => Some(Self::Square),
            "circle" => Some(Self::Circle),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "square",
            Self::Circle => "circle",
        }
    }
}

/// Units of a point's buffer distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BufferUnits {
    /// Linear units, e.g. metres.
    #[default]
    Linear,
    /// Degrees.
    Angular,
}

/// A survey point.
#[derive(Debug)]
pub struct Point {
    id: u64,
    x: f64,
    y: f64,
    t: DateTime<Utc>,
    crs: Crs,
    t_delta: Duration,
    window: TimeWindow,
    buffer: f64,
    buffer_units: BufferUnits,
    footprint: Footprint,
    wgs84_x: f64,
    wgs84_y: f64,
    attributes: Map<String, Value>,
    stats: PointStats,
}

impl Point {
    /// Create a point with a linear buffer.
    ///
    /// `t` is converted to UTC. Use [`drill_common::parse_datetime`] to turn
    /// timestamps without an offset into UTC times.
    pub fn new<Tz: TimeZone>(
        x: f64,
        y: f64,
        t: DateTime<Tz>,
        crs: Crs,
        t_delta: Duration,
        buffer: f64,
        footprint: Footprint,
    ) -> Result<Self> {
        if !x.is_finite() || !y.is_finite() {
            return Err(DrillError::invalid_argument(format!(
                "point coordinates must be finite, got ({}, {})",
                x, y
            )));
        }
        if !buffer.is_finite() || buffer < 0.0 {
            return Err(DrillError::invalid_argument(format!(
                "buffer must be a non-negative number, got {}",
                buffer
            )));
        }
        if t_delta < Duration::zero() {
            return Err(DrillError::invalid_argument("t_delta must not be negative"));
        }

        let t = t.with_timezone(&Utc);
        let (wgs84_x, wgs84_y) = crs.transform_point(&Crs::wgs84(), x, y)?;
        let wgs84_x = if (wgs84_x - 180.0).abs() <= 180.0 * 1e-9 {
            -180.0
        } else {
            wgs84_x
        };

        Ok(Self {
            id: NEXT_POINT_ID.fetch_add(1, Ordering::Relaxed),
            x,
            y,
            t,
            crs,
            t_delta,
            window: TimeWindow::centred(t, t_delta),
            buffer,
            buffer_units: BufferUnits::Linear,
            footprint,
            wgs84_x,
            wgs84_y,
            attributes: Map::new(),
            stats: PointStats::new(),
        })
    }

    /// Set the units of the buffer distance.
    pub fn with_buffer_units(mut self, units: BufferUnits) -> Self {
        self.buffer_units = units;
        self
    }

    /// Attach caller attributes, e.g. the survey record the point came from.
    pub fn with_attributes(mut self, attributes: Map<String, Value>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Process-unique identifier.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn t(&self) -> DateTime<Utc> {
        self.t
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    pub fn t_delta(&self) -> Duration {
        self.t_delta
    }

    /// Image-acquisition window, `t - t_delta ..= t + t_delta`.
    pub fn time_window(&self) -> TimeWindow {
        self.window
    }

    pub fn start_date(&self) -> DateTime<Utc> {
        self.window.start
    }

    pub fn end_date(&self) -> DateTime<Utc> {
        self.window.end
    }

    pub fn buffer(&self) -> f64 {
        self.buffer
    }

    pub fn buffer_units(&self) -> BufferUnits {
        self.buffer_units
    }

    pub fn footprint(&self) -> Footprint {
        self.footprint
    }

    /// Longitude in WGS84. 180 is reported as -180.
    pub fn wgs84_x(&self) -> f64 {
        self.wgs84_x
    }

    /// Latitude in WGS84.
    pub fn wgs84_y(&self) -> f64 {
        self.wgs84_y
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Drilled data and statistics for this point.
    pub fn stats(&self) -> &PointStats {
        &self.stats
    }

    /// The point's location in another CRS.
    pub fn transform(&self, dst: &Crs) -> Result<(f64, f64)> {
        Self::transform_from(&self.crs, dst, self.x, self.y)
    }

    /// Transform a coordinate between two CRSs, in x/y (easting/northing or
    /// longitude/latitude) order.
    pub fn transform_from(src: &Crs, dst: &Crs, x: f64, y: f64) -> Result<(f64, f64)> {
        Ok(src.transform_point(dst, x, y)?)
    }

    /// Whether the point lies within the image's extent, compared in the
    /// image's CRS. Edges count as inside.
    pub fn intersects(&self, info: &ImageInfo) -> Result<bool> {
        let (x, y) = self.transform(&info.crs)?;
        Ok(info.extent().contains_point(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use drill_common::GeoTransform;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 7, 28, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_derived_fields() {
        let pt = Point::new(
            140.0,
            -36.0,
            t0(),
            Crs::wgs84(),
            Duration::days(3),
            50.0,
            Footprint::Square,
        )
        .unwrap();

        assert_eq!(pt.wgs84_x(), 140.0);
        assert_eq!(pt.wgs84_y(), -36.0);
        assert_eq!(pt.start_date(), Utc.with_ymd_and_hms(2022, 7, 25, 0, 0, 0).unwrap());
        assert_eq!(pt.end_date(), Utc.with_ymd_and_hms(2022, 7, 31, 0, 0, 0).unwrap());
        assert_eq!(pt.buffer_units(), BufferUnits::Linear);
        assert!(pt.stats().item_ids().is_empty());
    }

    #[test]
    fn test_time_converted_to_utc() {
        let aest = FixedOffset::east_opt(10 * 3600).unwrap();
        let t = aest.with_ymd_and_hms(2022, 7, 28, 10, 0, 0).unwrap();
        let pt = Point::new(0.0, 0.0, t, Crs::wgs84(), Duration::hours(1), 0.0, Footprint::Square)
            .unwrap();
        assert_eq!(pt.t(), t0());
    }

    #[test]
    fn test_antimeridian_normalised() {
        let pt = Point::new(180.0, 10.0, t0(), Crs::wgs84(), Duration::zero(), 1.0, Footprint::Square)
            .unwrap();
        assert_eq!(pt.wgs84_x(), -180.0);
        assert_eq!(pt.x(), 180.0);
    }

    #[test]
    fn test_invalid_buffer() {
        for buffer in [-1.0, f64::NAN, f64::INFINITY] {
            let res = Point::new(0.0, 0.0, t0(), Crs::wgs84(), Duration::zero(), buffer, Footprint::Circle);
            assert!(matches!(res, Err(DrillError::InvalidArgument(_))));
        }
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Point::new(0.0, 0.0, t0(), Crs::wgs84(), Duration::zero(), 1.0, Footprint::Square).unwrap();
        let b = Point::new(0.0, 0.0, t0(), Crs::wgs84(), Duration::zero(), 1.0, Footprint::Square).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_intersects_edges_inclusive() {
        let info = ImageInfo::new(
            10,
            10,
            GeoTransform::north_up(140.0, -35.0, 0.1, -0.1),
            Crs::wgs84(),
            vec![None],
        );
        let at = |x: f64, y: f64| {
            Point::new(x, y, t0(), Crs::wgs84(), Duration::zero(), 0.0, Footprint::Square).unwrap()
        };

        assert!(at(140.5, -35.5).intersects(&info).unwrap());
        assert!(at(140.0, -35.0).intersects(&info).unwrap());
        assert!(!at(139.9, -35.5).intersects(&info).unwrap());
    }

    #[test]
    fn test_attributes() {
        let mut attrs = Map::new();
        attrs.insert("site".to_string(), Value::from("A12"));
        let pt = Point::new(0.0, 0.0, t0(), Crs::wgs84(), Duration::zero(), 1.0, Footprint::Square)
            .unwrap()
            .with_attributes(attrs);
        assert_eq!(pt.attribute("site"), Some(&Value::from("A12")));
        assert!(pt.attribute("missing").is_none());
    }

    #[test]
    fn test_footprint_parse() {
        assert_eq!(Footprint::from_str("Circle"), Some(Footprint::Circle));
        assert_eq!(Footprint::from_str("square"), Some(Footprint::Square));
        assert_eq!(Footprint::from_str("hexagon"), None);
    }
}
