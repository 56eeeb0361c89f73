#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the complaint map server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the analytics types to allow independent evolution of the API
//! contract.

use chrono::NaiveDate;
use complaint_map_analytics_models::{
    DateRange, FilterSpec, InvalidFilterError, MarkerRow, RegionCountRow, TextSearch,
};
use complaint_map_complaint_models::{ComplaintField, IssueCategory};
use complaint_map_geography_models::Granularity;
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
    /// Number of loaded complaints.
    pub complaints: usize,
    /// Granularities with a loaded boundary layer.
    pub layers: Vec<Granularity>,
}

/// Query parameters shared by the map endpoints.
///
/// List-valued filters are comma-separated. Parameters an endpoint does
/// not use are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapQueryParams {
    /// Aggregation level (`state`, `district`, `municipality`).
    pub granularity: Option<String>,
    /// Whether to compute dominant categories.
    pub dominant: Option<bool>,
    /// Trend bucket size (`daily`, `weekly`, `monthly`, `yearly`).
    pub period: Option<String>,
    /// First day included (`YYYY-MM-DD`).
    pub from: Option<NaiveDate>,
    /// Last day included (`YYYY-MM-DD`).
    pub to: Option<NaiveDate>,
    /// Comma-separated category labels.
    pub categories: Option<String>,
    /// Comma-separated age brackets.
    pub age_groups: Option<String>,
    /// Comma-separated genders.
    pub genders: Option<String>,
    /// Comma-separated origins.
    pub origins: Option<String>,
    /// Comma-separated state names.
    pub states: Option<String>,
    /// Comma-separated responsible entity levels.
    pub entity_levels: Option<String>,
    /// Free-text search query.
    pub search: Option<String>,
    /// Comma-separated fields to search (default: municipality, district).
    pub search_fields: Option<String>,
    /// Maximum number of markers to return.
    pub limit: Option<usize>,
}

/// Splits a comma-separated parameter, dropping blank entries.
#[must_use]
pub fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

impl MapQueryParams {
    /// Builds the filter spec described by these parameters.
    ///
    /// A single open date bound extends to the earliest/latest
    /// representable day. Unknown search field names are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if `from` is after `to` or the search names no
    /// known fields.
    pub fn filter_spec(&self) -> Result<FilterSpec, InvalidFilterError> {
        let mut spec = FilterSpec::default()
            .with_values(
                ComplaintField::Category,
                split_list(self.categories.as_deref()),
            )
            .with_values(
                ComplaintField::AgeGroup,
                split_list(self.age_groups.as_deref()),
            )
            .with_values(ComplaintField::Gender, split_list(self.genders.as_deref()))
            .with_values(ComplaintField::Origin, split_list(self.origins.as_deref()))
            .with_values(ComplaintField::State, split_list(self.states.as_deref()))
            .with_values(
                ComplaintField::ResponsibleEntityLevel,
                split_list(self.entity_levels.as_deref()),
            );

        if self.from.is_some() || self.to.is_some() {
            spec = spec.with_date_range(DateRange::new(
                self.from.unwrap_or(NaiveDate::MIN),
                self.to.unwrap_or(NaiveDate::MAX),
            )?);
        }

        if let Some(query) = self.search.as_deref()
            && !query.trim().is_empty()
        {
            let mut search = TextSearch::new(query.trim());
            if self.search_fields.is_some() {
                search = search.with_fields(
                    split_list(self.search_fields.as_deref())
                        .iter()
                        .filter_map(|f| f.parse().ok())
                        .collect(),
                );
            }
            spec = spec.with_search(search);
        }

        spec.validate()?;
        Ok(spec)
    }
}

/// Properties attached to each choropleth feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRegion {
    /// Display name from the boundary file.
    pub name: String,
    /// Join key.
    pub normalized_name: String,
    /// Matching filtered complaints.
    pub issue_count: u64,
    /// Most common category, when requested and non-empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dominant_category: Option<String>,
}

impl From<RegionCountRow> for ApiRegion {
    fn from(row: RegionCountRow) -> Self {
        Self {
            name: row.name,
            normalized_name: row.normalized_name,
            issue_count: row.issue_count,
            dominant_category: row.dominant_category,
        }
    }
}

/// A complaint marker as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMarker {
    /// Row position in the complaint table.
    pub id: usize,
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
    /// Category label.
    pub category: Option<String>,
    /// Marker icon name.
    pub icon: String,
    /// Marker color.
    pub color: String,
    /// Reported date.
    pub date: Option<NaiveDate>,
    /// Municipality name.
    pub municipality: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
}

impl From<MarkerRow> for ApiMarker {
    fn from(row: MarkerRow) -> Self {
        Self {
            id: row.id,
            latitude: row.latitude,
            longitude: row.longitude,
            icon: IssueCategory::icon_for(row.category.as_deref()).to_string(),
            color: IssueCategory::color_for(row.category.as_deref()).to_string(),
            category: row.category,
            date: row.date,
            municipality: row.municipality,
            description: row.description,
        }
    }
}

/// A category with its presentation lookups and filtered count.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCategory {
    /// Category label.
    pub name: String,
    /// Marker icon name.
    pub icon: String,
    /// Marker color.
    pub color: String,
    /// Filtered complaints in this category.
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_params_are_unrestricted() {
        let spec = MapQueryParams::default().filter_spec().unwrap();
        assert!(spec.is_unrestricted());
    }

    #[test]
    fn splits_list_params() {
        let params = MapQueryParams {
            categories: Some("Umwelt, Bildung,,".to_string()),
            states: Some("Hessen".to_string()),
            ..MapQueryParams::default()
        };
        let spec = params.filter_spec().unwrap();
        assert_eq!(
            spec.categories.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["Bildung", "Umwelt"]
        );
        assert!(spec.states.contains("Hessen"));
        assert!(spec.genders.is_empty());
    }

    #[test]
    fn open_date_bounds() {
        let params = MapQueryParams {
            from: Some(day(2024, 1, 1)),
            ..MapQueryParams::default()
        };
        let range = params.filter_spec().unwrap().date_range.unwrap();
        assert_eq!(range.start, day(2024, 1, 1));
        assert_eq!(range.end, NaiveDate::MAX);
    }

    #[test]
    fn reversed_dates_are_rejected() {
        let params = MapQueryParams {
            from: Some(day(2024, 2, 1)),
            to: Some(day(2024, 1, 1)),
            ..MapQueryParams::default()
        };
        assert!(matches!(
            params.filter_spec(),
            Err(InvalidFilterError::ReversedDateRange { .. })
        ));
    }

    #[test]
    fn search_fields_default_and_override() {
        let params = MapQueryParams {
            search: Some(" main ".to_string()),
            ..MapQueryParams::default()
        };
        let search = params.filter_spec().unwrap().search.unwrap();
        assert_eq!(search.query, "main");
        assert_eq!(
            search.fields,
            vec![ComplaintField::Municipality, ComplaintField::District]
        );

        let params = MapQueryParams {
            search: Some("main".to_string()),
            search_fields: Some("description,bogus".to_string()),
            ..MapQueryParams::default()
        };
        let search = params.filter_spec().unwrap().search.unwrap();
        assert_eq!(search.fields, vec![ComplaintField::Description]);

        let params = MapQueryParams {
            search: Some("main".to_string()),
            search_fields: Some("bogus".to_string()),
            ..MapQueryParams::default()
        };
        assert_eq!(
            params.filter_spec().unwrap_err(),
            InvalidFilterError::NoSearchFields
        );
    }

    #[test]
    fn marker_uses_category_lookups() {
        let marker = ApiMarker::from(MarkerRow {
            id: 3,
            latitude: 50.0,
            longitude: 8.0,
            category: Some("Verkehr".to_string()),
            date: None,
            municipality: None,
            description: None,
        });
        assert_eq!(marker.icon, "car");
        assert_eq!(marker.color, "#e67e22");

        let json = serde_json::to_value(&marker).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["category"], "Verkehr");
    }
}
