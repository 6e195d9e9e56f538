//! Pixel drilling around survey points.
//!
//! Given survey points (x, y, time, CRS, buffer, footprint) and images
//! (catalog items with named channels, or plain raster locations), this
//! crate extracts the pixels inside each point's region of interest and
//! reduces them to statistics stored on the point.
//!
//! # Architecture
//!
//! ```text
//! Drill::run(points, request)
//!      │
//!      ├─► Discover: CatalogClient::search per point, extents of plain images
//!      │
//!      ├─► Group: one ItemDriller per image identity
//!      │
//!      └─► Extract (sequential, or one task per image)
//!               │
//!               ├─► ItemDriller::read_data
//!               │         │
//!               │         └─► per channel: ImageReader::read_roi per point
//!               │                   resolve_window ─► read ─► mask_to_shape
//!               │
//!               └─► ItemDriller::calc_stats ─► PointStats::compute
//! ```
//!
//! # Example
//!
//! ```ignore
//! use pixdrill::{Drill, DrillConfig, DrillRequest, Footprint, Point, StdStat};
//!
//! let drill = Drill::new(raster_source, DrillConfig::from_env())?.with_catalog(catalog);
//! let point = Arc::new(Point::new(x, y, t, crs, Duration::days(3), 50.0, Footprint::Circle)?);
//!
//! let request = DrillRequest::new()
//!     .with_collections(["sentinel-2-l2a"])
//!     .with_channels(["B02", "B03"])
//!     .with_std_stats(StdStat::ALL);
//! let report = drill.run(&[point.clone()], &request).await?;
//!
//! for (item_id, stats) in point.stats().all() {
//!     println!("{}: {:?}", item_id, stats["mean"]);
//! }
//! ```

pub mod buffer;
pub mod catalog;
pub mod config;
pub mod drill;
pub mod driller;
pub mod error;
pub mod item;
pub mod mask;
pub mod masked;
pub mod point;
pub mod reader;
pub mod record;
pub mod stats;
pub mod std_stats;
pub mod window;

// Re-export commonly used types at crate root
pub use buffer::{normalize_buffer, transformed_buffer};
pub use catalog::{
    create_catalog_drillers, nearest_in_time, CatalogClient, CatalogSearch, MemoryCatalog,
    SearchQuery,
};
pub use config::{DrillConfig, DrillRequest, NullOverride};
pub use drill::{group_by_image, Drill, DrillReport, ItemOutcome, ItemReport, Phase};
pub use driller::{create_image_drillers, ItemDriller, ReadStatus};
pub use error::{DrillError, Result};
pub use item::{CatalogImage, ImageHandle, PlainImage};
pub use mask::mask_to_shape;
pub use masked::MaskedArray;
pub use point::{BufferUnits, Footprint, Point};
pub use reader::ImageReader;
pub use record::ArrayInfo;
pub use stats::{ItemStats, PointStats, StatValue, StatsLookup, UserStat};
pub use std_stats::{
    StdStat, STATS_ARRAYINFO, STATS_COUNT, STATS_COUNTNULL, STATS_MEAN, STATS_RAW, STATS_STDEV,
};
pub use window::resolve_window;
