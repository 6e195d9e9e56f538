//! Common value types shared across the pixdrill workspace.

pub mod bbox;
pub mod geotransform;
pub mod time;

pub use bbox::BoundingBox;
pub use geotransform::GeoTransform;
pub use time::{parse_datetime, TimeParseError, TimeWindow};
