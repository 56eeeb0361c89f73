#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Filter specifications and aggregation result types.
//!
//! A [`FilterSpec`] is the structured form of the user's current filter
//! selection. Every unset predicate is a pass-through; only populated
//! predicates restrict the complaint set.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use complaint_map_complaint_models::{ComplaintField, ComplaintRecord};
use complaint_map_geography_models::Granularity;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    /// First day included.
    pub start: NaiveDate,
    /// Last day included.
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a range covering `start..=end`.
    ///
    /// # Errors
    ///
    /// Returns an error if `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, InvalidFilterError> {
        if start > end {
            return Err(InvalidFilterError::ReversedDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// A range covering exactly one day.
    #[must_use]
    pub const fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// Whether `date` falls inside the range, both endpoints included.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Fields searched when a [`TextSearch`] does not name any.
pub const DEFAULT_SEARCH_FIELDS: &[ComplaintField] =
    &[ComplaintField::Municipality, ComplaintField::District];

/// Case-insensitive substring search over one or more text fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSearch {
    /// Substring to look for.
    pub query: String,
    /// Fields to search; a record matches if any of them contains the query.
    pub fields: Vec<ComplaintField>,
}

impl TextSearch {
    /// Searches the default municipality and district fields.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            fields: DEFAULT_SEARCH_FIELDS.to_vec(),
        }
    }

    /// Replaces the searched fields.
    #[must_use]
    pub fn with_fields(mut self, fields: Vec<ComplaintField>) -> Self {
        self.fields = fields;
        self
    }

    /// Whether the query is blank, in which case the search is inactive.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.query.trim().is_empty()
    }
}

/// The active filter selection.
///
/// Predicates combine with AND across fields and OR across the values of
/// one field. An empty value set means "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterSpec {
    /// Inclusive date window.
    pub date_range: Option<DateRange>,
    /// Accepted category labels.
    pub categories: BTreeSet<String>,
    /// Accepted age brackets.
    pub age_groups: BTreeSet<String>,
    /// Accepted genders.
    pub genders: BTreeSet<String>,
    /// Accepted origins.
    pub origins: BTreeSet<String>,
    /// Accepted state names (raw, exact match).
    pub states: BTreeSet<String>,
    /// Accepted responsible entity levels.
    pub entity_levels: BTreeSet<String>,
    /// Free-text search.
    pub search: Option<TextSearch>,
}

impl FilterSpec {
    /// Pairs each multi-valued predicate with the record field it tests.
    #[must_use]
    pub const fn value_predicates(&self) -> [(ComplaintField, &BTreeSet<String>); 6] {
        [
            (ComplaintField::Category, &self.categories),
            (ComplaintField::AgeGroup, &self.age_groups),
            (ComplaintField::Gender, &self.genders),
            (ComplaintField::Origin, &self.origins),
            (ComplaintField::State, &self.states),
            (ComplaintField::ResponsibleEntityLevel, &self.entity_levels),
        ]
    }

    /// Whether no predicate is active.
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.date_range.is_none()
            && self.value_predicates().iter().all(|(_, v)| v.is_empty())
            && self.search.as_ref().is_none_or(TextSearch::is_blank)
    }

    /// Checks the caller-supplied values for contract violations.
    ///
    /// # Errors
    ///
    /// Returns an error if the date range is reversed or an active text
    /// search names no fields.
    pub fn validate(&self) -> Result<(), InvalidFilterError> {
        if let Some(range) = self.date_range
            && range.start > range.end
        {
            return Err(InvalidFilterError::ReversedDateRange {
                start: range.start,
                end: range.end,
            });
        }

        if let Some(search) = &self.search
            && !search.is_blank()
            && search.fields.is_empty()
        {
            return Err(InvalidFilterError::NoSearchFields);
        }

        Ok(())
    }

    /// Sets the date window.
    #[must_use]
    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    /// Sets the accepted values for one filterable field.
    ///
    /// Fields without a multi-valued predicate (district, municipality,
    /// description) are ignored.
    #[must_use]
    pub fn with_values<I, S>(mut self, field: ComplaintField, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let target = match field {
            ComplaintField::Category => &mut self.categories,
            ComplaintField::AgeGroup => &mut self.age_groups,
            ComplaintField::Gender => &mut self.genders,
            ComplaintField::Origin => &mut self.origins,
            ComplaintField::State => &mut self.states,
            ComplaintField::ResponsibleEntityLevel => &mut self.entity_levels,
            ComplaintField::District
            | ComplaintField::Municipality
            | ComplaintField::Description => return self,
        };
        target.extend(values.into_iter().map(Into::into));
        self
    }

    /// Sets the free-text search.
    #[must_use]
    pub fn with_search(mut self, search: TextSearch) -> Self {
        self.search = Some(search);
        self
    }
}

/// A caller-supplied [`FilterSpec`] that cannot be evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidFilterError {
    /// The date range starts after it ends.
    ReversedDateRange {
        /// Requested first day.
        start: NaiveDate,
        /// Requested last day.
        end: NaiveDate,
    },
    /// A text search was given without any fields to search.
    NoSearchFields,
}

impl std::fmt::Display for InvalidFilterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReversedDateRange { start, end } => {
                write!(f, "date range starts ({start}) after it ends ({end})")
            }
            Self::NoSearchFields => write!(f, "text search names no fields to search"),
        }
    }
}

impl std::error::Error for InvalidFilterError {}

/// Bucket size for time-series queries.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TimeGranularity {
    /// Daily counts.
    Daily,
    /// ISO-week counts.
    Weekly,
    /// Monthly counts.
    Monthly,
    /// Yearly counts.
    Yearly,
}

/// Count of complaints in a single category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    /// Category label.
    pub category: String,
    /// Number of complaints.
    pub count: u64,
}

/// A time-series data point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesPoint {
    /// Period label (e.g. "2024-01", "2024-W03", "2024-01-15").
    pub period: String,
    /// Complaint count in this period.
    pub count: u64,
}

/// Distinct values offered by each filter control.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterFacets {
    /// Category labels.
    pub categories: Vec<String>,
    /// Age brackets.
    pub age_groups: Vec<String>,
    /// Genders.
    pub genders: Vec<String>,
    /// Origins.
    pub origins: Vec<String>,
    /// State names.
    pub states: Vec<String>,
    /// Responsible entity levels.
    pub entity_levels: Vec<String>,
    /// Earliest parsed complaint date.
    pub min_date: Option<NaiveDate>,
    /// Latest parsed complaint date.
    pub max_date: Option<NaiveDate>,
}

/// One region row of a choropleth pass, detached from its geometry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionCountRow {
    /// Boundary display name.
    pub name: String,
    /// Normalized matching key.
    pub normalized_name: String,
    /// Number of matching filtered complaints.
    pub issue_count: u64,
    /// Most common category, when requested and any complaint matched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dominant_category: Option<String>,
}

/// Bookkeeping for one choropleth pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSummary {
    /// Granularity the pass aggregated at.
    pub granularity: Option<Granularity>,
    /// Complaints surviving the filter.
    pub total_filtered: usize,
    /// Filtered complaints landing on a boundary feature.
    pub attributed: usize,
    /// Filtered complaints whose region name normalizes to nothing.
    pub unnamed: usize,
    /// Aggregate buckets with no matching boundary feature.
    pub dropped_buckets: usize,
    /// Filtered complaints that can be drawn as markers.
    pub with_coordinates: usize,
}

/// A marker-ready complaint for the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerRow {
    /// Row position in the source table.
    pub id: usize,
    /// WGS84 latitude.
    pub latitude: f64,
    /// WGS84 longitude.
    pub longitude: f64,
    /// Category label.
    pub category: Option<String>,
    /// Reported date.
    pub date: Option<NaiveDate>,
    /// Municipality name.
    pub municipality: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
}

impl MarkerRow {
    /// Builds a marker row, or `None` if the record lacks coordinates.
    #[must_use]
    pub fn from_record(record: &ComplaintRecord) -> Option<Self> {
        let (latitude, longitude) = record.coordinates()?;
        Some(Self {
            id: record.id,
            latitude,
            longitude,
            category: record.category.clone(),
            date: record.date,
            municipality: record.municipality.clone(),
            description: record.description.clone(),
        })
    }
}
