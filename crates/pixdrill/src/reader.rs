//! Reading pixel windows around points from one raster.

use std::sync::Arc;

use raster_access::{ImageInfo, RasterDataset, RasterSource};
use tracing::{debug, instrument};

use crate::error::Result;
use crate::item::ImageHandle;
use crate::mask::mask_to_shape;
use crate::masked::MaskedArray;
use crate::point::Point;
use crate::record::ArrayInfo;
use crate::window::resolve_window;

/// An opened raster: a plain image, or one channel of a catalog item.
///
/// The dataset is released when the reader is dropped.
pub struct ImageReader {
    item: Arc<ImageHandle>,
    channel: Option<String>,
    location: String,
    dataset: Box<dyn RasterDataset>,
}

impl ImageReader {
    /// Open the raster behind `channel` of `item`. Plain images take no
    /// channel.
    pub async fn open(
        source: &dyn RasterSource,
        item: &Arc<ImageHandle>,
        channel: Option<&str>,
    ) -> Result<Self> {
        let location = item.resolve_channel_location(channel)?.to_string();
        let dataset = source.open(&location).await?;
        debug!(
            item_id = item.id(),
            channel = channel.unwrap_or("-"),
            location = %location,
            ncols = dataset.info().ncols,
            nrows = dataset.info().nrows,
            "opened raster"
        );

        Ok(Self {
            item: Arc::clone(item),
            channel: channel.map(str::to_string),
            location,
            dataset,
        })
    }

    pub fn info(&self) -> &ImageInfo {
        self.dataset.info()
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    /// Read the region of interest of every point and append the records to
    /// the points' statistics under this reader's item.
    #[instrument(skip(self, points), fields(item_id = %self.item.id(), location = %self.location, points = points.len()))]
    pub async fn read_data(&self, points: &[Arc<Point>], null: Option<f64>) -> Result<()> {
        for point in points {
            let record = self.read_roi(point, null).await?;
            point.stats().add(&self.item, record);
        }
        Ok(())
    }

    /// Read the smallest window covering a point's region of interest.
    ///
    /// Pixels equal to the null value are masked. `null` overrides the null
    /// value of every band; otherwise each band's own no-data value is used.
    /// A region clipped away entirely gives an empty array. Arrays of more
    /// than four pixels are masked to the point's footprint.
    pub async fn read_roi(&self, point: &Point, null: Option<f64>) -> Result<ArrayInfo> {
        let info = self.info();
        let window = resolve_window(point, info)?;
        let nulls: Vec<Option<f64>> = (0..info.band_count())
            .map(|band| null.or_else(|| info.band_nodata(band)))
            .collect();

        let data = if window.is_empty() {
            MaskedArray::empty()
        } else {
            let bands = self.dataset.read_window(&window).await?;
            MaskedArray::from_bands(bands, window.height, window.width, &nulls)?
        };

        let mut record = ArrayInfo::new(data, self.channel.clone(), window, info, nulls);
        if record.data.size() > 4 {
            mask_to_shape(point, &mut record)?;
        }
        Ok(record)
    }
}

impl std::fmt::Debug for ImageReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageReader")
            .field("item_id", &self.item.id())
            .field("channel", &self.channel)
            .field("location", &self.location)
            .finish()
    }
}
