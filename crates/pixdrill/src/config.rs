//! Configuration for drilling runs.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DrillError, Result};
use crate::std_stats::StdStat;
use crate::stats::UserStat;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrillConfig {
    /// Extract items concurrently, one task per item.
    pub concurrent: bool,

    /// Maximum number of items extracted at once in concurrent mode.
    pub max_workers: usize,

    /// Keep only the N catalog items closest in time to each point.
    /// 0 keeps every item found.
    pub nearest_n: usize,

    /// Page size hint passed to the catalog.
    pub search_limit: usize,
}

impl Default for DrillConfig {
    fn default() -> Self {
        Self {
            concurrent: false,
            max_workers: 4,
            nearest_n: 0,
            search_limit: 500,
        }
    }
}

impl DrillConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Load configuration from a variable lookup. Unset or unparsable
    /// variables keep their defaults.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(val) = lookup("PIXDRILL_CONCURRENT") {
            config.concurrent = val.to_lowercase() == "true" || val == "1";
        }

        if let Some(val) = lookup("PIXDRILL_MAX_WORKERS") {
            if let Ok(n) = val.parse() {
                config.max_workers = n;
            }
        }

        if let Some(val) = lookup("PIXDRILL_NEAREST_N") {
            if let Ok(n) = val.parse() {
                config.nearest_n = n;
            }
        }

        if let Some(val) = lookup("PIXDRILL_SEARCH_LIMIT") {
            if let Ok(n) = val.parse() {
                config.search_limit = n;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.max_workers == 0 {
            return Err("max_workers must be > 0".to_string());
        }

        if self.search_limit == 0 {
            return Err("search_limit must be > 0".to_string());
        }

        Ok(())
    }
}

/// Null values used in place of the rasters' own no-data values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullOverride {
    /// Use each band's no-data value.
    #[default]
    None,
    /// One value for every band of every channel.
    Single(f64),
    /// One value per channel, for every band of that channel. Catalog items
    /// only.
    PerChannel(Vec<f64>),
}

impl NullOverride {
    /// Per-channel null values for `channels` channels.
    pub fn per_channel(&self, channels: usize) -> Result<Vec<Option<f64>>> {
        match self {
            Self::None => Ok(vec![None; channels]),
            Self::Single(v) => Ok(vec![Some(*v); channels]),
            Self::PerChannel(values) if values.len() == channels => {
                Ok(values.iter().copied().map(Some).collect())
            }
            Self::PerChannel(values) => Err(DrillError::invalid_argument(format!(
                "{} null values given for {} channels",
                values.len(),
                channels
            ))),
        }
    }

    /// The null value for a plain image.
    pub fn for_plain(&self) -> Result<Option<f64>> {
        match self {
            Self::None => Ok(None),
            Self::Single(v) => Ok(Some(*v)),
            Self::PerChannel(_) => Err(DrillError::invalid_argument(
                "per-channel null values are not supported for plain images",
            )),
        }
    }
}

/// Inputs of one drilling run.
#[derive(Debug, Clone, Default)]
pub struct DrillRequest {
    /// Plain raster locations.
    pub images: Vec<String>,
    /// Ids for `images`; when empty the locations are the ids.
    pub image_ids: Vec<String>,
    /// Catalog collections to search.
    pub collections: Vec<String>,
    /// Channels (assets) to read from catalog items.
    pub channels: Vec<String>,
    /// Item properties a catalog item must match.
    pub item_properties: Map<String, Value>,
    pub std_stats: Vec<StdStat>,
    pub user_stats: Vec<UserStat>,
    pub nulls: NullOverride,
}

impl DrillRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_images<I, S>(mut self, images: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.images = images.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_image_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.image_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_collections<I, S>(mut self, collections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.collections = collections.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_channels<I, S>(mut self, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.channels = channels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_item_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.item_properties.insert(key.into(), value);
        self
    }

    pub fn with_std_stats(mut self, stats: impl Into<Vec<StdStat>>) -> Self {
        self.std_stats = stats.into();
        self
    }

    pub fn with_user_stat(mut self, stat: UserStat) -> Self {
        self.user_stats.push(stat);
        self
    }

    pub fn with_nulls(mut self, nulls: NullOverride) -> Self {
        self.nulls = nulls;
        self
    }

    /// Whether the run computes any statistic.
    pub fn has_stats(&self) -> bool {
        !self.std_stats.is_empty() || !self.user_stats.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = DrillConfig::default();
        assert!(!config.concurrent);
        assert_eq!(config.max_workers, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_vars() {
        let vars: HashMap<&str, &str> = [
            ("PIXDRILL_CONCURRENT", "true"),
            ("PIXDRILL_MAX_WORKERS", "8"),
            ("PIXDRILL_NEAREST_N", "2"),
            ("PIXDRILL_SEARCH_LIMIT", "not-a-number"),
        ]
        .into_iter()
        .collect();
        let config = DrillConfig::from_vars(|name| vars.get(name).map(|v| v.to_string()));

        assert!(config.concurrent);
        assert_eq!(config.max_workers, 8);
        assert_eq!(config.nearest_n, 2);
        assert_eq!(config.search_limit, 500);
    }

    #[test]
    fn test_validate() {
        let config = DrillConfig {
            max_workers: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = DrillConfig {
            search_limit: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: DrillConfig = serde_json::from_str(r#"{"concurrent": true}"#).unwrap();
        assert!(config.concurrent);
        assert_eq!(config.search_limit, 500);
    }

    #[test]
    fn test_null_override() {
        assert_eq!(NullOverride::None.per_channel(2).unwrap(), vec![None, None]);
        assert_eq!(NullOverride::Single(0.0).per_channel(2).unwrap(), vec![Some(0.0); 2]);
        assert_eq!(
            NullOverride::PerChannel(vec![0.0, -1.0]).per_channel(2).unwrap(),
            vec![Some(0.0), Some(-1.0)]
        );
        assert!(NullOverride::PerChannel(vec![0.0]).per_channel(2).is_err());

        assert_eq!(NullOverride::Single(3.0).for_plain().unwrap(), Some(3.0));
        assert!(NullOverride::PerChannel(vec![0.0]).for_plain().is_err());
    }

    #[test]
    fn test_request_builder() {
        let req = DrillRequest::new()
            .with_collections(["sentinel-2-l2a"])
            .with_channels(["B02", "B03"])
            .with_std_stats([StdStat::Mean]);
        assert_eq!(req.channels, vec!["B02", "B03"]);
        assert!(req.has_stats());
        assert!(!DrillRequest::new().has_stats());
    }
}
