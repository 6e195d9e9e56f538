//! Standard statistics.
//!
//! Each function reduces a list of single-band masked arrays, one per
//! channel, to one value per array. Arrays for different channels can have
//! different shapes when the channels have different pixel sizes, so every
//! array is reduced on its own.

use serde::{Deserialize, Serialize};

use crate::error::{DrillError, Result};
use crate::masked::MaskedArray;

/// Name of the raw array list.
pub const STATS_RAW: &str = "raw";
/// Name of the array record list.
pub const STATS_ARRAYINFO: &str = "arrayinfo";
pub const STATS_MEAN: &str = "mean";
pub const STATS_STDEV: &str = "stddev";
/// Number of non-null pixels.
pub const STATS_COUNT: &str = "count";
/// Number of null pixels. Together with the count it sums to the array size.
pub const STATS_COUNTNULL: &str = "countnull";

/// A built-in statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StdStat {
    Mean,
    #[serde(rename = "stddev")]
    Stdev,
    Count,
    CountNull,
}

impl StdStat {
    pub const ALL: [StdStat; 4] = [Self::Mean, Self::Stdev, Self::Count, Self::CountNull];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Mean => STATS_MEAN,
            Self::Stdev => STATS_STDEV,
            Self::Count => STATS_COUNT,
            Self::CountNull => STATS_COUNTNULL,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }
}

/// Whether a statistic name is reserved for built-in values.
pub fn is_reserved_name(name: &str) -> bool {
    name == STATS_RAW || name == STATS_ARRAYINFO || StdStat::from_name(name).is_some()
}

/// Fail unless every array has exactly one band.
pub fn check_std_arrays(item_id: &str, arrays: &[&MaskedArray]) -> Result<()> {
    let offending: Vec<(usize, usize)> = arrays
        .iter()
        .enumerate()
        .filter(|(_, arr)| arr.bands() > 1)
        .map(|(idx, arr)| (idx, arr.bands()))
        .collect();

    if offending.is_empty() {
        Ok(())
    } else {
        Err(DrillError::MultibandAsset {
            item_id: item_id.to_string(),
            offending,
        })
    }
}

/// Mean of the non-null values of each array. NaN when all are null.
pub fn mean(arrays: &[&MaskedArray]) -> Vec<f64> {
    arrays.iter().map(|arr| mean_of(arr)).collect()
}

/// Population standard deviation of the non-null values of each array.
/// NaN when all are null.
pub fn stdev(arrays: &[&MaskedArray]) -> Vec<f64> {
    arrays
        .iter()
        .map(|arr| {
            let n = arr.count();
            if n == 0 {
                return f64::NAN;
            }
            let m = mean_of(arr);
            let var = arr.valid().map(|v| (v - m).powi(2)).sum::<f64>() / n as f64;
            var.sqrt()
        })
        .collect()
}

/// Number of non-null values of each array.
pub fn count(arrays: &[&MaskedArray]) -> Vec<usize> {
    arrays.iter().map(|arr| arr.count()).collect()
}

/// Number of null values of each array.
pub fn count_null(arrays: &[&MaskedArray]) -> Vec<usize> {
    arrays.iter().map(|arr| arr.count_null()).collect()
}

fn mean_of(arr: &MaskedArray) -> f64 {
    let n = arr.count();
    if n == 0 {
        return f64::NAN;
    }
    arr.valid().sum::<f64>() / n as f64
}
