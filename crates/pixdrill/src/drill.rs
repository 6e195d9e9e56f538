//! Extraction orchestrator.
//!
//! A run moves through four phases:
//!
//! 1. **Discover**: find the images each point falls on, through the catalog
//!    client and by testing the plain images' extents.
//! 2. **Group**: build one [`ItemDriller`] per image identity holding every
//!    point associated with it.
//! 3. **Extract**: for each driller, read the data and compute statistics.
//!    Each image is a unit of failure: one image failing leaves the others
//!    untouched.
//! 4. **Done**: the [`DrillReport`] says what happened to each image.
//!
//! Extraction runs sequentially or concurrently, one task per image, with a
//! semaphore bounding the number of images in flight.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use raster_access::{RasterError, RasterSource};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::catalog::{create_catalog_drillers, CatalogClient, CatalogSearch};
use crate::config::{DrillConfig, DrillRequest};
use crate::driller::{create_image_drillers, ItemDriller, ReadStatus};
use crate::error::{DrillError, Result};
use crate::item::ImageHandle;
use crate::point::Point;

/// Phase of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Discover,
    Group,
    Extract,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Discover => "discover",
            Self::Group => "group",
            Self::Extract => "extract",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// What happened to one image.
#[derive(Debug, Clone)]
pub enum ItemOutcome {
    /// Data read and statistics computed.
    Complete,
    /// A raster read failed; the image's data was rolled back for every
    /// point and no statistics were computed.
    RolledBack { location: String, error: RasterError },
    /// Reading or computing failed with a non-recoverable error.
    Failed(DrillError),
}

impl ItemOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// Per-image entry of a [`DrillReport`].
#[derive(Debug, Clone)]
pub struct ItemReport {
    pub item_id: String,
    /// Number of points drilled.
    pub points: usize,
    pub outcome: ItemOutcome,
}

/// Summary of a run.
#[derive(Debug, Clone, Default)]
pub struct DrillReport {
    /// One entry per image, in discovery order.
    pub items: Vec<ItemReport>,
    /// Points not associated with any image.
    pub unmatched_points: usize,
}

impl DrillReport {
    pub fn succeeded(&self) -> Vec<&ItemReport> {
        self.items.iter().filter(|r| r.outcome.is_complete()).collect()
    }

    pub fn failed(&self) -> Vec<&ItemReport> {
        self.items.iter().filter(|r| !r.outcome.is_complete()).collect()
    }

    /// Whether every image completed.
    pub fn is_complete(&self) -> bool {
        self.items.iter().all(|r| r.outcome.is_complete())
    }

    pub fn item(&self, item_id: &str) -> Option<&ItemReport> {
        self.items.iter().find(|r| r.item_id == item_id)
    }
}

/// Drills points against images.
pub struct Drill {
    source: Arc<dyn RasterSource>,
    catalog: Option<Arc<dyn CatalogClient>>,
    config: DrillConfig,
}

impl Drill {
    pub fn new(source: Arc<dyn RasterSource>, config: DrillConfig) -> Result<Self> {
        config.validate().map_err(DrillError::Config)?;
        Ok(Self {
            source,
            catalog: None,
            config,
        })
    }

    /// Use a catalog client for collection searches.
    pub fn with_catalog(mut self, client: Arc<dyn CatalogClient>) -> Self {
        self.catalog = Some(client);
        self
    }

    pub fn config(&self) -> &DrillConfig {
        &self.config
    }

    /// Run all phases for the points.
    ///
    /// On return each point's statistics hold, per image it intersects, the
    /// raw arrays and the requested statistics.
    pub async fn run(&self, points: &[Arc<Point>], request: &DrillRequest) -> Result<DrillReport> {
        info!(
            phase = %Phase::Discover,
            points = points.len(),
            collections = request.collections.len(),
            images = request.images.len(),
            "starting drill"
        );
        let drillers = self.discover(points, request).await?;

        let unmatched = unmatched_points(points, &drillers);
        info!(
            phase = %Phase::Group,
            items = drillers.len(),
            unmatched_points = unmatched,
            "points grouped by image"
        );

        let mut report = self.run_drillers(drillers, request).await;
        report.unmatched_points = unmatched;

        info!(
            phase = %Phase::Done,
            items = report.items.len(),
            failed = report.failed().len(),
            "drill complete"
        );
        Ok(report)
    }

    /// Build the drillers for a request, one per image identity.
    pub async fn discover(
        &self,
        points: &[Arc<Point>],
        request: &DrillRequest,
    ) -> Result<Vec<ItemDriller>> {
        let mut drillers = Vec::new();

        if !request.collections.is_empty() {
            let client = self.catalog.as_ref().ok_or_else(|| {
                DrillError::invalid_argument("collections were given but no catalog client is configured")
            })?;
            let search = CatalogSearch {
                collections: request.collections.clone(),
                channels: request.channels.clone(),
                item_properties: request.item_properties.clone(),
                nearest_n: self.config.nearest_n,
                limit: self.config.search_limit,
            };
            drillers.extend(create_catalog_drillers(client.as_ref(), points, &search).await?);
        }

        if !request.images.is_empty() {
            let ids = (!request.image_ids.is_empty()).then_some(request.image_ids.as_slice());
            drillers.extend(
                create_image_drillers(self.source.as_ref(), points, &request.images, ids).await?,
            );
        }

        check_unique_ids(&drillers)?;
        Ok(drillers)
    }

    /// Extract every driller and compute the request's statistics.
    pub async fn run_drillers(&self, drillers: Vec<ItemDriller>, request: &DrillRequest) -> DrillReport {
        if self.config.concurrent {
            info!(
                phase = %Phase::Extract,
                items = drillers.len(),
                max_workers = self.config.max_workers,
                "running extract concurrently"
            );
            self.extract_concurrent(drillers, request).await
        } else {
            info!(phase = %Phase::Extract, items = drillers.len(), "running extract sequentially");
            self.extract_sequential(drillers, request).await
        }
    }

    async fn extract_sequential(&self, drillers: Vec<ItemDriller>, request: &DrillRequest) -> DrillReport {
        let mut report = DrillReport::default();
        for driller in drillers {
            let outcome = extract(&driller, self.source.as_ref(), request).await;
            report.items.push(item_report(&driller, outcome));
        }
        report
    }

    async fn extract_concurrent(&self, drillers: Vec<ItemDriller>, request: &DrillRequest) -> DrillReport {
        let semaphore = Arc::new(Semaphore::new(self.config.max_workers));
        let request = Arc::new(request.clone());
        let mut handles = Vec::with_capacity(drillers.len());

        for driller in drillers {
            let item_id = driller.id().to_string();
            let points = driller.points().len();
            let semaphore = Arc::clone(&semaphore);
            let source = Arc::clone(&self.source);
            let request = Arc::clone(&request);

            let handle = tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => return ItemOutcome::Failed(DrillError::Task(e.to_string())),
                };
                extract(&driller, source.as_ref(), &request).await
            });
            handles.push((item_id, points, handle));
        }

        let mut report = DrillReport::default();
        for (item_id, points, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(item_id = %item_id, error = %e, "extract task panicked");
                    ItemOutcome::Failed(DrillError::Task(e.to_string()))
                }
            };
            report.items.push(ItemReport {
                item_id,
                points,
                outcome,
            });
        }
        report
    }
}

/// Read one image and compute its statistics.
async fn extract(driller: &ItemDriller, source: &dyn RasterSource, request: &DrillRequest) -> ItemOutcome {
    info!(item_id = %driller.id(), points = driller.points().len(), "calculating stats");

    let outcome = match driller.read_data(source, &request.nulls).await {
        Ok(ReadStatus::Complete) => match driller.calc_stats(&request.std_stats, &request.user_stats) {
            Ok(()) => ItemOutcome::Complete,
            Err(e) => ItemOutcome::Failed(e),
        },
        Ok(ReadStatus::RolledBack { location, error }) => ItemOutcome::RolledBack { location, error },
        Err(e) => ItemOutcome::Failed(e),
    };

    if let ItemOutcome::Failed(e) = &outcome {
        warn!(item_id = %driller.id(), error = %e, "item failed");
    }
    outcome
}

fn item_report(driller: &ItemDriller, outcome: ItemOutcome) -> ItemReport {
    ItemReport {
        item_id: driller.id().to_string(),
        points: driller.points().len(),
        outcome,
    }
}

fn check_unique_ids(drillers: &[ItemDriller]) -> Result<()> {
    let mut seen = HashSet::new();
    for driller in drillers {
        if !seen.insert(driller.id()) {
            return Err(DrillError::invalid_argument(format!(
                "image id {} is used by more than one image",
                driller.id()
            )));
        }
    }
    Ok(())
}

fn unmatched_points(points: &[Arc<Point>], drillers: &[ItemDriller]) -> usize {
    let matched: HashSet<u64> = drillers
        .iter()
        .flat_map(|d| d.points().iter().map(|p| p.id()))
        .collect();
    points.iter().filter(|p| !matched.contains(&p.id())).count()
}

/// Group point-to-image associations into one driller per image identity.
///
/// Catalog items get `channels`; plain images get none. Drillers are in the
/// order their images first appear.
pub fn group_by_image(
    associations: Vec<(Arc<Point>, Vec<ImageHandle>)>,
    channels: Option<Vec<String>>,
) -> Result<Vec<ItemDriller>> {
    let mut drillers: Vec<ItemDriller> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (point, images) in associations {
        for image in images {
            let slot = match index.get(image.id()) {
                Some(&slot) => slot,
                None => {
                    let item_channels = if image.is_plain() { None } else { channels.clone() };
                    index.insert(image.id().to_string(), drillers.len());
                    drillers.push(ItemDriller::new(image, item_channels)?);
                    drillers.len() - 1
                }
            };
            drillers[slot].add_point(Arc::clone(&point));
        }
    }

    Ok(drillers)
}
