//! Image handles.
//!
//! An image is either an item discovered through a catalog, with one raster
//! location per named channel (asset), or a plain raster location. Both
//! expose a stable id that keys the statistics store.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use drill_common::BoundingBox;
use raster_access::RasterError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A catalog item.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CatalogImage {
    pub id: String,
    /// Channel name to raster location.
    pub assets: BTreeMap<String, String>,
    /// Acquisition time.
    pub datetime: Option<DateTime<Utc>>,
    /// WGS84 footprint.
    pub bbox: Option<BoundingBox>,
    /// Collection the item belongs to.
    pub collection: Option<String>,
    /// Free-form item properties.
    pub properties: Map<String, Value>,
}

impl CatalogImage {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_asset(mut self, channel: impl Into<String>, location: impl Into<String>) -> Self {
        self.assets.insert(channel.into(), location.into());
        self
    }

    pub fn with_datetime(mut self, datetime: DateTime<Utc>) -> Self {
        self.datetime = Some(datetime);
        self
    }

    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }
}

/// A plain raster location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlainImage {
    pub location: String,
    pub id: String,
}

impl PlainImage {
    /// A plain image identified by its location.
    pub fn new(location: impl Into<String>) -> Self {
        let location = location.into();
        Self {
            id: location.clone(),
            location,
        }
    }

    /// A plain image with an explicit id. An empty or missing id falls back
    /// to the location.
    pub fn with_id(location: impl Into<String>, id: Option<String>) -> Self {
        let mut image = Self::new(location);
        if let Some(id) = id.filter(|id| !id.is_empty()) {
            image.id = id;
        }
        image
    }
}

/// Either kind of image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ImageHandle {
    Catalog(CatalogImage),
    Plain(PlainImage),
}

impl ImageHandle {
    /// Stable identity of the image.
    pub fn id(&self) -> &str {
        match self {
            Self::Catalog(item) => &item.id,
            Self::Plain(image) => &image.id,
        }
    }

    pub fn is_plain(&self) -> bool {
        matches!(self, Self::Plain(_))
    }

    /// Raster location of a channel.
    ///
    /// Plain images take no channel; catalog items require one that names
    /// one of their assets.
    pub fn resolve_channel_location(&self, channel: Option<&str>) -> Result<&str, RasterError> {
        match (self, channel) {
            (Self::Plain(image), None) => Ok(&image.location),
            (Self::Plain(image), Some(channel)) => Err(RasterError::unsupported(format!(
                "plain image {} has no channel {}",
                image.id, channel
            ))),
            (Self::Catalog(item), Some(channel)) => item
                .assets
                .get(channel)
                .map(String::as_str)
                .ok_or_else(|| {
                    RasterError::unsupported(format!("item {} has no asset {}", item.id, channel))
                }),
            (Self::Catalog(item), None) => Err(RasterError::unsupported(format!(
                "item {} needs a channel name",
                item.id
            ))),
        }
    }

    /// Acquisition time, when known.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Catalog(item) => item.datetime,
            Self::Plain(_) => None,
        }
    }

    /// Item property lookup. Plain images have none.
    pub fn property(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Catalog(item) => item.properties.get(key),
            Self::Plain(_) => None,
        }
    }
}

impl From<CatalogImage> for ImageHandle {
    fn from(item: CatalogImage) -> Self {
        Self::Catalog(item)
    }
}

impl From<PlainImage> for ImageHandle {
    fn from(image: PlainImage) -> Self {
        Self::Plain(image)
    }
}
