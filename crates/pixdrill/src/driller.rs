//! Item drillers.
//!
//! An [`ItemDriller`] drills one image for every point that intersects it.
//! Reading opens each of the image's requested channels in turn and appends
//! one array record per channel to every point's statistics. Computing then
//! reduces those records to statistics.
//!
//! A raster I/O failure while reading is not returned as an error. The
//! driller rolls back everything read for its image across all of its points
//! and reports [`ReadStatus::RolledBack`], so callers can carry on with other
//! images.

use std::collections::HashSet;
use std::sync::Arc;

use raster_access::{RasterError, RasterSource};
use tracing::{debug, error, instrument, warn};

use crate::config::NullOverride;
use crate::error::{DrillError, Result};
use crate::item::{ImageHandle, PlainImage};
use crate::point::Point;
use crate::reader::ImageReader;
use crate::stats::UserStat;
use crate::std_stats::StdStat;

/// Outcome of [`ItemDriller::read_data`].
#[derive(Debug, Clone, PartialEq)]
pub enum ReadStatus {
    /// Every channel was read for every point.
    Complete,
    /// A read failed and the image's data was reset for all points.
    RolledBack { location: String, error: RasterError },
}

impl ReadStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// Drills one image for a set of points.
#[derive(Debug, Clone)]
pub struct ItemDriller {
    item: Arc<ImageHandle>,
    channels: Option<Vec<String>>,
    points: Vec<Arc<Point>>,
}

impl ItemDriller {
    /// Create a driller. Catalog items need channels before reading; plain
    /// images take none.
    pub fn new(item: impl Into<ImageHandle>, channels: Option<Vec<String>>) -> Result<Self> {
        let item = item.into();
        if item.is_plain() && channels.is_some() {
            return Err(DrillError::invalid_argument(format!(
                "plain image {} does not take channels",
                item.id()
            )));
        }

        Ok(Self {
            item: Arc::new(item),
            channels,
            points: Vec::new(),
        })
    }

    /// Set the channels read by the next [`read_data`](Self::read_data).
    ///
    /// Records for the new channels are appended to any already held, so
    /// call [`reset_stats`](Self::reset_stats) first when switching.
    pub fn set_channels(&mut self, channels: Vec<String>) -> Result<()> {
        if self.item.is_plain() {
            return Err(DrillError::invalid_argument(format!(
                "plain image {} does not take channels",
                self.item.id()
            )));
        }
        if channels.is_empty() {
            return Err(DrillError::invalid_argument("channel list must not be empty"));
        }
        self.channels = Some(channels);
        Ok(())
    }

    /// Attach a point and register this image in its statistics.
    pub fn add_point(&mut self, point: Arc<Point>) {
        point.stats().register(&self.item);
        self.points.push(point);
    }

    pub fn points(&self) -> &[Arc<Point>] {
        &self.points
    }

    pub fn item(&self) -> &Arc<ImageHandle> {
        &self.item
    }

    pub fn id(&self) -> &str {
        self.item.id()
    }

    pub fn channels(&self) -> Option<&[String]> {
        self.channels.as_deref()
    }

    /// Read the region of interest of every point from every channel.
    ///
    /// `nulls` overrides the rasters' no-data values; per-channel values
    /// must match the channel count and are rejected for plain images.
    ///
    /// Any failure clears the data already read for this image from every
    /// point. Raster I/O failures are reported as [`ReadStatus::RolledBack`],
    /// other errors are returned.
    #[instrument(skip(self, source, nulls), fields(item_id = %self.item.id(), points = self.points.len()))]
    pub async fn read_data(
        &self,
        source: &dyn RasterSource,
        nulls: &NullOverride,
    ) -> Result<ReadStatus> {
        let plan: Vec<(Option<&str>, Option<f64>)> = match &*self.item {
            ImageHandle::Plain(_) => vec![(None, nulls.for_plain()?)],
            ImageHandle::Catalog(_) => {
                let channels = self.channels.as_deref().ok_or_else(|| {
                    DrillError::invalid_argument(format!(
                        "cannot read item {} without channels",
                        self.item.id()
                    ))
                })?;
                let values = nulls.per_channel(channels.len())?;
                channels
                    .iter()
                    .map(String::as_str)
                    .map(Some)
                    .zip(values)
                    .collect()
            }
        };

        for (channel, null) in plan {
            match self.read_channel(source, channel, null).await {
                Ok(()) => {}
                Err(DrillError::Raster(err)) => {
                    let location = self
                        .item
                        .resolve_channel_location(channel)
                        .map(str::to_string)
                        .unwrap_or_else(|_| channel.unwrap_or_default().to_string());
                    error!(
                        item_id = %self.item.id(),
                        channel = channel.unwrap_or("-"),
                        location = %location,
                        points = self.points.len(),
                        error = %err,
                        "failed to read data, rolling back"
                    );
                    self.reset_stats();
                    return Ok(ReadStatus::RolledBack { location, error: err });
                }
                Err(err) => {
                    // Earlier channels or points may already hold records.
                    self.reset_stats();
                    return Err(err);
                }
            }
        }

        debug!(item_id = %self.item.id(), "read complete");
        Ok(ReadStatus::Complete)
    }

    async fn read_channel(
        &self,
        source: &dyn RasterSource,
        channel: Option<&str>,
        null: Option<f64>,
    ) -> Result<()> {
        let reader = ImageReader::open(source, &self.item, channel).await?;
        reader.read_data(&self.points, null).await
    }

    /// Compute statistics for every point from the data read.
    pub fn calc_stats(&self, std_stats: &[StdStat], user_stats: &[UserStat]) -> Result<()> {
        for point in &self.points {
            point
                .stats()
                .compute(self.item.id(), point, std_stats, user_stats)?;
        }
        Ok(())
    }

    /// Clear this image's data from every point.
    pub fn reset_stats(&self) {
        for point in &self.points {
            point.stats().reset(Some(self.item.id()));
        }
    }
}

/// One driller per plain image, with the points that intersect it.
///
/// `image_ids`, when given, must be unique and match `images` one to one.
/// An image that cannot be opened gets a driller with no points.
pub async fn create_image_drillers(
    source: &dyn RasterSource,
    points: &[Arc<Point>],
    images: &[String],
    image_ids: Option<&[String]>,
) -> Result<Vec<ItemDriller>> {
    if let Some(ids) = image_ids {
        let unique: HashSet<&String> = ids.iter().collect();
        if ids.len() != images.len() || unique.len() != ids.len() {
            return Err(DrillError::invalid_argument(
                "the number of image ids must match the number of images and each id must be unique",
            ));
        }
    }

    let mut drillers = Vec::with_capacity(images.len());
    for (idx, image) in images.iter().enumerate() {
        let id = image_ids.map(|ids| ids[idx].clone());
        let mut driller = ItemDriller::new(PlainImage::with_id(image.as_str(), id), None)?;

        match source.open(image).await {
            Ok(dataset) => {
                for point in points {
                    match point.intersects(dataset.info()) {
                        Ok(true) => driller.add_point(Arc::clone(point)),
                        Ok(false) => {}
                        Err(err) => warn!(
                            image = %image,
                            point_id = point.id(),
                            error = %err,
                            "could not test point against image"
                        ),
                    }
                }
            }
            Err(err) => warn!(image = %image, error = %err, "could not open image"),
        }

        debug!(image = %image, item_id = %driller.id(), points = driller.points().len(), "created driller");
        drillers.push(driller);
    }

    Ok(drillers)
}
