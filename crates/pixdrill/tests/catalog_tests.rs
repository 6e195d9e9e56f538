//! Drilling catalog items found through a catalog client.

mod common;

use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, TimeZone, Utc};
use drill_common::BoundingBox;
use pixdrill::{
    CatalogClient, CatalogImage, Drill, DrillConfig, DrillRequest, Footprint, ItemOutcome, MemoryCatalog,
    NullOverride, SearchQuery, StatValue, StdStat, STATS_COUNT, STATS_MEAN,
};
use serde_json::Value;
use test_utils::{constant_raster, grid, survey_time, utm};

use common::{init_tracing, point_at, shared};

/// Items over the UTM test grid, acquired `days` after the survey time.
fn item(id: &str, days: i64) -> CatalogImage {
    let (lon_min, lat_max) = utm()
        .transform_point(&projection::Crs::wgs84(), 300000.0, 6000000.0)
        .unwrap();
    let (lon_max, lat_min) = utm()
        .transform_point(&projection::Crs::wgs84(), 301000.0, 5999000.0)
        .unwrap();

    CatalogImage::new(id)
        .with_collection("s2")
        .with_bbox(BoundingBox::new(lon_min, lat_min, lon_max, lat_max))
        .with_datetime(survey_time() + Duration::days(days))
        .with_asset("B02", format!("{}/B02.tif", id))
        .with_asset("B03", format!("{}/B03.tif", id))
}

fn rasters_for(ids: &[&str]) -> raster_access::MemoryRasterStore {
    let mut rasters = Vec::new();
    for (i, id) in ids.iter().enumerate() {
        let base = (i as f64 + 1.0) * 10.0;
        rasters.push((format!("{}/B02.tif", id), constant_raster(&grid::UTM_100, base + 2.0, Some(0.0))));
        rasters.push((format!("{}/B03.tif", id), constant_raster(&grid::UTM_100, base + 3.0, Some(0.0))));
    }
    let mut source = raster_access::MemoryRasterStore::new();
    for (location, raster) in rasters {
        source.insert(location, raster);
    }
    source
}

// ============================================================================
// Search and grouping
// ============================================================================

#[tokio::test]
async fn test_catalog_items_drilled_per_channel() -> Result<()> {
    init_tracing();
    let ids = ["a", "b"];
    let catalog = MemoryCatalog::new(vec![item("a", -1), item("b", 2)]);
    let drill = Drill::new(shared(rasters_for(&ids)), DrillConfig::default())?
        .with_catalog(Arc::new(catalog));

    let pt = point_at(&grid::UTM_100, 45, 45, 50.0, Footprint::Square);
    let request = DrillRequest::new()
        .with_collections(["s2"])
        .with_channels(["B02", "B03"])
        .with_std_stats([StdStat::Mean, StdStat::Count]);
    let report = drill.run(&[Arc::clone(&pt)], &request).await?;

    assert_eq!(report.items.len(), 2);
    assert!(report.is_complete());
    assert_eq!(pt.stats().stat("a", STATS_MEAN), StatValue::Float(vec![12.0, 13.0]));
    assert_eq!(pt.stats().stat("b", STATS_MEAN), StatValue::Float(vec![22.0, 23.0]));
    assert_eq!(pt.stats().stat("b", STATS_COUNT), StatValue::Count(vec![121, 121]));
    Ok(())
}

#[tokio::test]
async fn test_nearest_n_keeps_closest_item() -> Result<()> {
    init_tracing();
    let ids = ["a", "b", "c"];
    let catalog = MemoryCatalog::new(vec![item("a", -2), item("b", 1), item("c", 3)]);
    let config = DrillConfig {
        nearest_n: 1,
        ..Default::default()
    };
    let drill = Drill::new(shared(rasters_for(&ids)), config)?.with_catalog(Arc::new(catalog));

    let pt = point_at(&grid::UTM_100, 45, 45, 20.0, Footprint::Square);
    let request = DrillRequest::new()
        .with_collections(["s2"])
        .with_channels(["B02"])
        .with_std_stats([StdStat::Mean]);
    let report = drill.run(&[Arc::clone(&pt)], &request).await?;

    assert_eq!(report.items.len(), 1);
    assert_eq!(report.items[0].item_id, "b");
    assert_eq!(pt.stats().item_ids(), vec!["b"]);
    Ok(())
}

#[tokio::test]
async fn test_shared_item_serves_several_points() -> Result<()> {
    init_tracing();
    let catalog = MemoryCatalog::new(vec![item("a", 0)]);
    let drill = Drill::new(shared(rasters_for(&["a"])), DrillConfig::default())?
        .with_catalog(Arc::new(catalog));

    let points = vec![
        point_at(&grid::UTM_100, 20, 20, 10.0, Footprint::Square),
        point_at(&grid::UTM_100, 70, 70, 10.0, Footprint::Circle),
    ];
    let request = DrillRequest::new()
        .with_collections(["s2"])
        .with_channels(["B02"])
        .with_std_stats([StdStat::Count]);
    let report = drill.run(&points, &request).await?;

    assert_eq!(report.items.len(), 1);
    assert_eq!(report.items[0].points, 2);
    for pt in &points {
        assert!(pt.stats().stat("a", STATS_COUNT).as_counts().unwrap()[0] > 0);
    }
    Ok(())
}

#[tokio::test]
async fn test_item_property_filter() -> Result<()> {
    init_tracing();
    let catalog = MemoryCatalog::new(vec![
        item("clear", 0).with_property("eo:cloud_cover", Value::from(5)),
        item("cloudy", 0).with_property("eo:cloud_cover", Value::from(80)),
    ]);
    let drill = Drill::new(shared(rasters_for(&["clear", "cloudy"])), DrillConfig::default())?
        .with_catalog(Arc::new(catalog));

    let pt = point_at(&grid::UTM_100, 45, 45, 20.0, Footprint::Square);
    let request = DrillRequest::new()
        .with_collections(["s2"])
        .with_channels(["B02"])
        .with_item_property("eo:cloud_cover", Value::from(5));
    drill.run(&[Arc::clone(&pt)], &request).await?;

    assert_eq!(pt.stats().item_ids(), vec!["clear"]);
    Ok(())
}

#[tokio::test]
async fn test_point_outside_time_window_finds_nothing() -> Result<()> {
    init_tracing();
    let catalog = MemoryCatalog::new(vec![item("old", -30)]);
    let drill = Drill::new(shared(rasters_for(&["old"])), DrillConfig::default())?
        .with_catalog(Arc::new(catalog));

    let pt = point_at(&grid::UTM_100, 45, 45, 20.0, Footprint::Square);
    let request = DrillRequest::new()
        .with_collections(["s2"])
        .with_channels(["B02"]);
    let report = drill.run(&[pt], &request).await?;

    assert!(report.items.is_empty());
    assert_eq!(report.unmatched_points, 1);
    Ok(())
}

// ============================================================================
// Null overrides and failures
// ============================================================================

#[tokio::test]
async fn test_per_channel_nulls_apply_to_each_channel() -> Result<()> {
    init_tracing();
    let catalog = MemoryCatalog::new(vec![item("a", 0)]);
    let drill = Drill::new(shared(rasters_for(&["a"])), DrillConfig::default())?
        .with_catalog(Arc::new(catalog));

    let pt = point_at(&grid::UTM_100, 45, 45, 50.0, Footprint::Square);
    let request = DrillRequest::new()
        .with_collections(["s2"])
        .with_channels(["B02", "B03"])
        .with_std_stats([StdStat::Count])
        .with_nulls(NullOverride::PerChannel(vec![12.0, 0.0]));
    drill.run(&[Arc::clone(&pt)], &request).await?;

    assert_eq!(pt.stats().stat("a", STATS_COUNT), StatValue::Count(vec![0, 121]));
    Ok(())
}

#[tokio::test]
async fn test_missing_asset_rolls_back_item() -> Result<()> {
    init_tracing();
    let catalog = MemoryCatalog::new(vec![item("a", 0), item("b", 1)]);
    let config = DrillConfig {
        concurrent: true,
        ..Default::default()
    };
    let drill = Drill::new(shared(rasters_for(&["a", "b"])), config)?.with_catalog(Arc::new(catalog));

    let pt = point_at(&grid::UTM_100, 45, 45, 20.0, Footprint::Square);
    let request = DrillRequest::new()
        .with_collections(["s2"])
        .with_channels(["B02", "B04"])
        .with_std_stats([StdStat::Mean]);
    let report = drill.run(&[Arc::clone(&pt)], &request).await?;

    assert_eq!(report.failed().len(), 2);
    for item in &report.items {
        assert!(matches!(item.outcome, ItemOutcome::RolledBack { .. }));
    }
    assert_eq!(pt.stats().record_count("a"), 0);
    assert_eq!(pt.stats().record_count("b"), 0);
    Ok(())
}

#[test]
fn test_search_query_uses_point_window() {
    let pt = point_at(&grid::UTM_100, 0, 0, 0.0, Footprint::Square);
    let query = SearchQuery::for_point(&pt, &["s2".to_string()], &Default::default(), 10);

    let t = Utc.with_ymd_and_hms(2022, 7, 28, 0, 0, 0).unwrap();
    assert_eq!(query.window.start, t - Duration::days(3));
    assert_eq!(query.window.end, t + Duration::days(3));
    assert!(query.lon > 140.0 && query.lon < 150.0, "lon: {}", query.lon);
    assert!(query.lat < 0.0);
}

#[test]
fn test_memory_catalog_matches_location() -> Result<()> {
    let catalog = MemoryCatalog::new(vec![item("a", 0), item("b", 1)]);
    let inside = point_at(&grid::UTM_100, 45, 45, 0.0, Footprint::Square);
    let outside = point_at(&grid::UTM_100, 400, 45, 0.0, Footprint::Square);
    let collections = ["s2".to_string()];

    let query = SearchQuery::for_point(&inside, &collections, &Default::default(), 10);
    let found = tokio_test::block_on(catalog.search(&query))?;
    assert_eq!(found.iter().map(|i| i.id.as_str()).collect::<Vec<_>>(), vec!["a", "b"]);

    let query = SearchQuery::for_point(&outside, &collections, &Default::default(), 10);
    assert!(tokio_test::block_on(catalog.search(&query))?.is_empty());
    Ok(())
}
