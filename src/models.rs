//! Data models for site analytics.
//!
//! This module contains the structures exchanged with the stats API and
//! the aggregated series handed to the chart renderer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One day of hits for a single path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStat {
    /// Calendar day in `YYYY-MM-DD` form.
    pub day: String,
    /// Hits recorded on that day.
    pub daily: u64,
}

/// Hit statistics for one tracked path.
///
/// `count` is the API's own counter for the path and does not have to match
/// the sum of the `stats` entries, which only cover the requested window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitRecord {
    /// Tracked path, e.g. `/posts/euler`.
    pub path: String,
    /// Total hits reported for the path.
    pub count: u64,
    /// Daily breakdown; absent or `null` means no breakdown.
    #[serde(default)]
    pub stats: Option<Vec<DailyStat>>,
}

impl HitRecord {
    /// Iterate over the daily breakdown, empty when there is none.
    pub fn daily_stats(&self) -> impl Iterator<Item = &DailyStat> {
        self.stats.iter().flatten()
    }
}

/// Response envelope of `GET /stats/hits`.
#[derive(Debug, Clone, Deserialize)]
pub struct HitsResponse {
    pub hits: Vec<HitRecord>,
}

/// Summed visits across all paths for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub day: String,
    pub count: u64,
}

/// A ranked page in the top-pages list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopPage {
    pub path: String,
    pub count: u64,
}

impl fmt::Display for TopPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.path, self.count)
    }
}

/// Output of the aggregation step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregate {
    /// Daily totals sorted ascending by day.
    pub daily: Vec<DailyTotal>,
    /// Pages ranked by count, highest first.
    pub top_pages: Vec<TopPage>,
}

impl Aggregate {
    /// Returns true when there is nothing to plot in either chart.
    pub fn is_empty(&self) -> bool {
        self.daily.is_empty() && self.top_pages.is_empty()
    }
}
