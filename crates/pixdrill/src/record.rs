//! Array records: one channel's pixels around one point.

use projection::Crs;
use raster_access::{ImageInfo, PixelWindow};
use serde::{Deserialize, Serialize};

use crate::masked::MaskedArray;

/// The masked array read for one (point, channel, image) and where it came
/// from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayInfo {
    /// Pixel data, `(bands, rows, cols)`.
    pub data: MaskedArray,
    /// Channel the data was read from; `None` for plain images.
    pub channel: Option<String>,
    /// Window read, in the image's pixel grid.
    pub window: PixelWindow,
    /// World x of the window's upper-left corner.
    pub ulx: f64,
    /// World y of the window's upper-left corner.
    pub uly: f64,
    /// World x of the window's lower-right corner.
    pub lrx: f64,
    /// World y of the window's lower-right corner.
    pub lry: f64,
    /// Absolute pixel width.
    pub x_res: f64,
    /// Absolute pixel height.
    pub y_res: f64,
    /// CRS of the image.
    pub crs: Crs,
    /// Null value applied to each band: the override when one was given,
    /// otherwise the band's native null.
    pub nulls: Vec<Option<f64>>,
}

impl ArrayInfo {
    /// Record for `window` of an image, with provenance taken from `info`.
    pub fn new(
        data: MaskedArray,
        channel: Option<String>,
        window: PixelWindow,
        info: &ImageInfo,
        nulls: Vec<Option<f64>>,
    ) -> Self {
        let gt = &info.transform;
        let (ulx, uly) = gt.pixel_to_world(window.x_off as f64, window.y_off as f64);
        let (lrx, lry) = gt.pixel_to_world(
            (window.x_off + window.width) as f64,
            (window.y_off + window.height) as f64,
        );

        Self {
            data,
            channel,
            window,
            ulx,
            uly,
            lrx,
            lry,
            x_res: info.x_res(),
            y_res: info.y_res(),
            crs: info.crs.clone(),
            nulls,
        }
    }

    /// Whether the array holds no pixels.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
