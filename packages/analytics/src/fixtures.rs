//! Shared test data.

use chrono::NaiveDate;
use complaint_map_complaint_models::ComplaintRecord;
use complaint_map_geography_models::{BoundaryLayer, Granularity, RegionFeature};
use geo::MultiPolygon;

use crate::table::ComplaintTable;

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn complaint(state: &str, category: &str, date: Option<NaiveDate>) -> ComplaintRecord {
    ComplaintRecord {
        state: Some(state.to_string()),
        category: Some(category.to_string()),
        date,
        ..ComplaintRecord::default()
    }
}

/// Three complaints over Bavaria and Hesse.
pub fn scenario_table() -> ComplaintTable {
    ComplaintTable::new(vec![
        complaint("Bavaria", "Verkehr", Some(day(2024, 1, 5))),
        complaint("Bavaria", "Umwelt", Some(day(2024, 2, 1))),
        complaint("Hesse", "Umwelt", Some(day(2024, 1, 10))),
    ])
}

pub fn layer(granularity: Granularity, names: &[&str]) -> BoundaryLayer {
    BoundaryLayer::new(
        granularity,
        names
            .iter()
            .map(|name| RegionFeature::new(*name, MultiPolygon(vec![])))
            .collect(),
    )
}

/// Bavaria, Hesse and Saarland state outlines.
pub fn scenario_states() -> BoundaryLayer {
    layer(Granularity::State, &["Bavaria", "Hesse", "Saarland"])
}
