//! Catalog search and catalog-item drillers.
//!
//! The engine does not talk to any particular catalog service. It is handed
//! a [`CatalogClient`] that answers a [`SearchQuery`] (collections, a WGS84
//! point, a time window and property filters) with the items found.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use drill_common::TimeWindow;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::driller::ItemDriller;
use crate::error::{DrillError, Result};
use crate::item::CatalogImage;
use crate::point::Point;

/// Catalog searches in flight at once.
const SEARCH_CONCURRENCY: usize = 8;

/// A search for the items covering one point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub collections: Vec<String>,
    /// WGS84 longitude.
    pub lon: f64,
    /// WGS84 latitude.
    pub lat: f64,
    /// Acquisition time window, inclusive.
    pub window: TimeWindow,
    /// Item properties that must match exactly.
    pub properties: Map<String, Value>,
    /// Results per page.
    pub limit: usize,
}

impl SearchQuery {
    /// The query for a point's location and time window.
    pub fn for_point(
        point: &Point,
        collections: &[String],
        properties: &Map<String, Value>,
        limit: usize,
    ) -> Self {
        Self {
            collections: collections.to_vec(),
            lon: point.wgs84_x(),
            lat: point.wgs84_y(),
            window: point.time_window(),
            properties: properties.clone(),
            limit,
        }
    }

    /// Whether an item satisfies this query.
    pub fn matches(&self, item: &CatalogImage) -> bool {
        let in_collection = self.collections.is_empty()
            || item
                .collection
                .as_ref()
                .is_some_and(|c| self.collections.contains(c));
        let covers = item
            .bbox
            .as_ref()
            .is_some_and(|bbox| bbox.contains_point(self.lon, self.lat));
        let in_window = item.datetime.is_some_and(|t| self.window.contains(t));
        let props = self
            .properties
            .iter()
            .all(|(k, v)| item.properties.get(k) == Some(v));

        in_collection && covers && in_window && props
    }
}

/// A catalog the engine can search.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// All items matching the query, in catalog order.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<CatalogImage>>;
}

/// A catalog held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    items: Vec<CatalogImage>,
}

impl MemoryCatalog {
    pub fn new(items: Vec<CatalogImage>) -> Self {
        Self { items }
    }

    pub fn push(&mut self, item: CatalogImage) {
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait]
impl CatalogClient for MemoryCatalog {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<CatalogImage>> {
        Ok(self
            .items
            .iter()
            .filter(|item| query.matches(item))
            .cloned()
            .collect())
    }
}

/// Keep the `n` items acquired closest in time to `t`.
///
/// Ties keep catalog order and items without a datetime sort last.
/// `n == 0` keeps everything.
pub fn nearest_in_time(mut items: Vec<CatalogImage>, t: DateTime<Utc>, n: usize) -> Vec<CatalogImage> {
    if n == 0 {
        return items;
    }
    // Stable sort, so equal distances stay in catalog order.
    items.sort_by_key(|item| match item.datetime {
        Some(dt) => (0, (dt - t).num_milliseconds().unsigned_abs()),
        None => (1, 0),
    });
    items.truncate(n);
    items
}

/// Catalog search parameters for [`create_catalog_drillers`].
#[derive(Debug, Clone, Default)]
pub struct CatalogSearch {
    pub collections: Vec<String>,
    /// Channels read from every item found.
    pub channels: Vec<String>,
    pub item_properties: Map<String, Value>,
    /// Keep the N items nearest in time to each point; 0 keeps all.
    pub nearest_n: usize,
    /// Results per page.
    pub limit: usize,
}

/// Search the catalog for every point and build one driller per item found.
///
/// An item found for several points gets a single driller holding all of
/// them. Drillers are returned in the order their items were first found.
pub async fn create_catalog_drillers(
    client: &dyn CatalogClient,
    points: &[Arc<Point>],
    search: &CatalogSearch,
) -> Result<Vec<ItemDriller>> {
    let channels = (!search.channels.is_empty()).then(|| search.channels.clone());
    let mut drillers: Vec<ItemDriller> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    // Results come back in point order, so grouping stays in discovery order.
    let found: Vec<(&Arc<Point>, Vec<CatalogImage>)> = stream::iter(points)
        .map(|point| async move {
            let query = SearchQuery::for_point(
                point,
                &search.collections,
                &search.item_properties,
                search.limit,
            );
            let found = client.search(&query).await?;
            let found_count = found.len();
            let items = nearest_in_time(found, point.t(), search.nearest_n);
            debug!(
                point_id = point.id(),
                found = found_count,
                kept = items.len(),
                "catalog search"
            );
            Ok::<_, DrillError>((point, items))
        })
        .buffered(SEARCH_CONCURRENCY)
        .try_collect()
        .await?;

    for (point, items) in found {
        for item in items {
            let slot = match index.get(&item.id) {
                Some(&slot) => slot,
                None => {
                    index.insert(item.id.clone(), drillers.len());
                    drillers.push(ItemDriller::new(item, channels.clone())?);
                    drillers.len() - 1
                }
            };
            drillers[slot].add_point(Arc::clone(point));
        }
    }

    info!(points = points.len(), items = drillers.len(), "catalog search complete");
    Ok(drillers)
}
