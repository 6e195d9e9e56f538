//! Per-point statistics store.
//!
//! Every [`Point`] owns a [`PointStats`], a map from image identity to the
//! [`ItemStats`] drilled from that image: the array records read (one per
//! channel, in read order), the raw arrays derived from them, and the
//! computed standard and user statistics.
//!
//! Entries for different image identities are independent. Extraction tasks
//! for different images may write to the same point's store concurrently;
//! each task only touches its own identity.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;
use tracing::debug;

use crate::error::{DrillError, Result};
use crate::item::ImageHandle;
use crate::masked::MaskedArray;
use crate::point::Point;
use crate::record::ArrayInfo;
use crate::std_stats::{self, is_reserved_name, StdStat, STATS_ARRAYINFO, STATS_RAW};

/// Signature of a user statistic: array records (one per channel), the image
/// and the point.
pub type UserStatFn = dyn Fn(&[ArrayInfo], &ImageHandle, &Point) -> Value + Send + Sync;

/// A named user statistic.
#[derive(Clone)]
pub struct UserStat {
    name: String,
    func: Arc<UserStatFn>,
}

impl UserStat {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[ArrayInfo], &ImageHandle, &Point) -> Value + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, records: &[ArrayInfo], item: &ImageHandle, point: &Point) -> Value {
        (self.func)(records, item, point)
    }
}

impl fmt::Debug for UserStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserStat").field("name", &self.name).finish()
    }
}

// ============================================================================
// Values
// ============================================================================

/// A statistic's value.
#[derive(Debug, Clone, PartialEq)]
pub enum StatValue {
    /// Raw masked arrays, one per channel.
    Raw(Vec<MaskedArray>),
    /// Array records, one per channel.
    ArrayInfo(Vec<ArrayInfo>),
    /// One float per channel (mean, standard deviation).
    Float(Vec<f64>),
    /// One count per channel.
    Count(Vec<usize>),
    /// Whatever a user statistic returned.
    User(Value),
    /// A user statistic that has not been computed.
    Missing,
}

impl StatValue {
    /// The value reported for a statistic that has not been computed: an
    /// empty list for built-in names, `Missing` for user names.
    pub fn sentinel(name: &str) -> Self {
        match name {
            STATS_RAW => Self::Raw(Vec::new()),
            STATS_ARRAYINFO => Self::ArrayInfo(Vec::new()),
            _ => match StdStat::from_name(name) {
                Some(StdStat::Mean | StdStat::Stdev) => Self::Float(Vec::new()),
                Some(StdStat::Count | StdStat::CountNull) => Self::Count(Vec::new()),
                None => Self::Missing,
            },
        }
    }

    pub fn as_floats(&self) -> Option<&[f64]> {
        match self {
            Self::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_counts(&self) -> Option<&[usize]> {
        match self {
            Self::Count(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> Option<&[MaskedArray]> {
        match self {
            Self::Raw(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array_info(&self) -> Option<&[ArrayInfo]> {
        match self {
            Self::ArrayInfo(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_user(&self) -> Option<&Value> {
        match self {
            Self::User(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// True for `Missing` and for empty lists.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Raw(v) => v.is_empty(),
            Self::ArrayInfo(v) => v.is_empty(),
            Self::Float(v) => v.is_empty(),
            Self::Count(v) => v.is_empty(),
            Self::User(_) => false,
            Self::Missing => true,
        }
    }
}

// ============================================================================
// Per-item entry
// ============================================================================

/// Everything drilled for one point from one image.
#[derive(Debug, Clone)]
pub struct ItemStats {
    item: Arc<ImageHandle>,
    records: Vec<ArrayInfo>,
    standard: BTreeMap<StdStat, StatValue>,
    user: BTreeMap<String, Value>,
}

impl ItemStats {
    fn new(item: Arc<ImageHandle>) -> Self {
        Self {
            item,
            records: Vec::new(),
            standard: BTreeMap::new(),
            user: BTreeMap::new(),
        }
    }

    fn clear(&mut self) {
        self.records.clear();
        self.standard.clear();
        self.user.clear();
    }

    pub fn item(&self) -> &Arc<ImageHandle> {
        &self.item
    }

    /// Array records in the order channels were read.
    pub fn records(&self) -> &[ArrayInfo] {
        &self.records
    }

    /// Raw arrays, parallel to [`records`](Self::records).
    pub fn raw(&self) -> Vec<&MaskedArray> {
        self.records.iter().map(|r| &r.data).collect()
    }

    /// Value of a statistic, or its sentinel when absent.
    pub fn get(&self, name: &str) -> StatValue {
        match name {
            STATS_RAW => StatValue::Raw(self.records.iter().map(|r| r.data.clone()).collect()),
            STATS_ARRAYINFO => StatValue::ArrayInfo(self.records.clone()),
            _ => {
                let standard = StdStat::from_name(name).and_then(|s| self.standard.get(&s));
                match standard {
                    Some(value) => value.clone(),
                    None => match self.user.get(name) {
                        Some(value) => StatValue::User(value.clone()),
                        None => StatValue::sentinel(name),
                    },
                }
            }
        }
    }

    /// All statistics: raw arrays, array records, then computed values.
    pub fn to_map(&self) -> BTreeMap<String, StatValue> {
        let mut map = BTreeMap::new();
        map.insert(STATS_RAW.to_string(), self.get(STATS_RAW));
        map.insert(STATS_ARRAYINFO.to_string(), self.get(STATS_ARRAYINFO));
        for (stat, value) in &self.standard {
            map.insert(stat.name().to_string(), value.clone());
        }
        for (name, value) in &self.user {
            map.insert(name.clone(), StatValue::User(value.clone()));
        }
        map
    }
}

// ============================================================================
// Lookup results
// ============================================================================

/// Result of [`PointStats::get`].
#[derive(Debug, Clone, PartialEq)]
pub enum StatsLookup {
    /// Item and statistic given.
    Value(StatValue),
    /// Item given: its statistics by name.
    Item(BTreeMap<String, StatValue>),
    /// Statistic given: its value for every known item.
    ByItem(BTreeMap<String, StatValue>),
    /// Neither given: everything, by item then statistic.
    All(BTreeMap<String, BTreeMap<String, StatValue>>),
}

// ============================================================================
// Store
// ============================================================================

/// Statistics of one point, keyed by image identity.
#[derive(Debug, Default)]
pub struct PointStats {
    items: RwLock<BTreeMap<String, ItemStats>>,
}

impl PointStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, ItemStats>> {
        self.items.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, ItemStats>> {
        self.items.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an image, or clear its entry if already registered.
    pub fn reset_item(&self, item: &Arc<ImageHandle>) {
        let mut items = self.write();
        items
            .entry(item.id().to_string())
            .and_modify(ItemStats::clear)
            .or_insert_with(|| ItemStats::new(Arc::clone(item)));
    }

    /// Register an image if it is not yet known. Existing data is kept.
    pub fn register(&self, item: &Arc<ImageHandle>) {
        let mut items = self.write();
        items
            .entry(item.id().to_string())
            .or_insert_with(|| ItemStats::new(Arc::clone(item)));
    }

    /// Clear the data of one image, or of every image when `item_id` is
    /// `None`. Registrations are kept, so re-reading repopulates in place.
    pub fn reset(&self, item_id: Option<&str>) {
        let mut items = self.write();
        match item_id {
            Some(id) => {
                if let Some(entry) = items.get_mut(id) {
                    entry.clear();
                }
            }
            None => items.values_mut().for_each(ItemStats::clear),
        }
    }

    /// Append an array record for an image, registering it if needed.
    pub fn add(&self, item: &Arc<ImageHandle>, record: ArrayInfo) {
        let mut items = self.write();
        items
            .entry(item.id().to_string())
            .or_insert_with(|| ItemStats::new(Arc::clone(item)))
            .records
            .push(record);
    }

    /// Compute statistics for an image from the records added so far.
    ///
    /// Standard statistics require every raw array to be single-band. User
    /// statistic names must not collide with built-in names. Values computed
    /// earlier under the same names are replaced.
    pub fn compute(
        &self,
        item_id: &str,
        point: &Point,
        std_stats: &[StdStat],
        user_stats: &[UserStat],
    ) -> Result<()> {
        if let Some(clash) = user_stats.iter().find(|u| is_reserved_name(u.name())) {
            return Err(DrillError::invalid_argument(format!(
                "user statistic name '{}' is reserved",
                clash.name()
            )));
        }

        // User functions run without the lock held so they may query the store.
        let (item, records) = {
            let items = self.read();
            let entry = items.get(item_id).ok_or_else(|| {
                DrillError::invalid_argument(format!("no data has been added for item {}", item_id))
            })?;
            (Arc::clone(&entry.item), entry.records.clone())
        };

        let mut standard = BTreeMap::new();
        if !std_stats.is_empty() {
            let raw: Vec<&MaskedArray> = records.iter().map(|r| &r.data).collect();
            std_stats::check_std_arrays(item_id, &raw)?;
            for stat in std_stats {
                let value = match stat {
                    StdStat::Mean => StatValue::Float(std_stats::mean(&raw)),
                    StdStat::Stdev => StatValue::Float(std_stats::stdev(&raw)),
                    StdStat::Count => StatValue::Count(std_stats::count(&raw)),
                    StdStat::CountNull => StatValue::Count(std_stats::count_null(&raw)),
                };
                standard.insert(*stat, value);
            }
        }

        let user: Vec<(String, Value)> = user_stats
            .iter()
            .map(|u| (u.name().to_string(), u.call(&records, &item, point)))
            .collect();

        let mut items = self.write();
        if let Some(entry) = items.get_mut(item_id) {
            entry.standard.extend(standard);
            entry.user.extend(user);
        }
        debug!(item_id = item_id, records = records.len(), "computed statistics");
        Ok(())
    }

    /// Four-way accessor.
    ///
    /// - item and statistic: the value, or the statistic's sentinel
    /// - item only: that item's statistics, empty if unknown
    /// - statistic only: the value (or sentinel) for every known item
    /// - neither: everything
    pub fn get(&self, item_id: Option<&str>, stat: Option<&str>) -> StatsLookup {
        match (item_id, stat) {
            (Some(id), Some(name)) => StatsLookup::Value(self.stat(id, name)),
            (Some(id), None) => StatsLookup::Item(self.item_stats(id)),
            (None, Some(name)) => StatsLookup::ByItem(self.stat_by_item(name)),
            (None, None) => StatsLookup::All(self.all()),
        }
    }

    /// One statistic of one item. Unknown items yield the sentinel.
    pub fn stat(&self, item_id: &str, name: &str) -> StatValue {
        self.read()
            .get(item_id)
            .map(|entry| entry.get(name))
            .unwrap_or_else(|| StatValue::sentinel(name))
    }

    /// All statistics of one item; empty if unknown.
    pub fn item_stats(&self, item_id: &str) -> BTreeMap<String, StatValue> {
        self.read()
            .get(item_id)
            .map(ItemStats::to_map)
            .unwrap_or_default()
    }

    /// One statistic for every known item.
    pub fn stat_by_item(&self, name: &str) -> BTreeMap<String, StatValue> {
        self.read()
            .iter()
            .map(|(id, entry)| (id.clone(), entry.get(name)))
            .collect()
    }

    /// Every statistic of every item.
    pub fn all(&self) -> BTreeMap<String, BTreeMap<String, StatValue>> {
        self.read()
            .iter()
            .map(|(id, entry)| (id.clone(), entry.to_map()))
            .collect()
    }

    /// Snapshot of one item's entry.
    pub fn entry(&self, item_id: &str) -> Option<ItemStats> {
        self.read().get(item_id).cloned()
    }

    /// Ids of the registered images.
    pub fn item_ids(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Number of records held for an image.
    pub fn record_count(&self, item_id: &str) -> usize {
        self.read().get(item_id).map_or(0, |e| e.records.len())
    }
}
