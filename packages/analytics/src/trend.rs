//! Complaint counts over time.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use complaint_map_analytics_models::{TimeGranularity, TimeSeriesPoint};

use crate::filter::FilteredComplaints;

/// Sortable period label for a date.
///
/// Weeks use ISO week numbering, so the first days of January can belong
/// to the previous year's last week.
#[must_use]
pub fn period_label(date: NaiveDate, granularity: TimeGranularity) -> String {
    match granularity {
        TimeGranularity::Daily => date.format("%Y-%m-%d").to_string(),
        TimeGranularity::Weekly => {
            let week = date.iso_week();
            format!("{}-W{:02}", week.year(), week.week())
        }
        TimeGranularity::Monthly => date.format("%Y-%m").to_string(),
        TimeGranularity::Yearly => format!("{}", date.year()),
    }
}

/// Counts filtered complaints per period, oldest period first. Undated
/// records are skipped and periods without complaints are not emitted.
#[must_use]
pub fn trend(
    filtered: &FilteredComplaints<'_>,
    granularity: TimeGranularity,
) -> Vec<TimeSeriesPoint> {
    let mut buckets: BTreeMap<String, u64> = BTreeMap::new();
    for date in filtered.records().filter_map(|r| r.date) {
        *buckets.entry(period_label(date, granularity)).or_default() += 1;
    }

    buckets
        .into_iter()
        .map(|(period, count)| TimeSeriesPoint { period, count })
        .collect()
}
