#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Citizen complaint record types and category lookup tables.
//!
//! A [`ComplaintRecord`] is one reported issue as loaded from the source
//! table. Records are immutable after load; filtering and aggregation
//! produce views over them.

use chrono::NaiveDate;
use complaint_map_geography_models::Granularity;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// One citizen-reported issue.
///
/// Every attribute except the row position may be missing. Missing and
/// unparsable values are both represented as `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintRecord {
    /// Row position in the source table.
    pub id: usize,
    /// Category label (e.g. "Umwelt").
    pub category: Option<String>,
    /// Calendar date the issue was reported.
    pub date: Option<NaiveDate>,
    /// Reporter age bracket.
    pub age_group: Option<String>,
    /// Reporter gender.
    pub gender: Option<String>,
    /// Reporter origin.
    pub origin: Option<String>,
    /// Free-text state name.
    pub state: Option<String>,
    /// Free-text district name.
    pub district: Option<String>,
    /// Free-text municipality name.
    pub municipality: Option<String>,
    /// Administrative level responsible for the issue.
    pub responsible_entity_level: Option<String>,
    /// WGS84 latitude.
    pub latitude: Option<f64>,
    /// WGS84 longitude.
    pub longitude: Option<f64>,
    /// Free-text description.
    pub description: Option<String>,
}

impl ComplaintRecord {
    /// Returns the value of a text attribute.
    #[must_use]
    pub fn field(&self, field: ComplaintField) -> Option<&str> {
        match field {
            ComplaintField::Category => self.category.as_deref(),
            ComplaintField::AgeGroup => self.age_group.as_deref(),
            ComplaintField::Gender => self.gender.as_deref(),
            ComplaintField::Origin => self.origin.as_deref(),
            ComplaintField::State => self.state.as_deref(),
            ComplaintField::District => self.district.as_deref(),
            ComplaintField::Municipality => self.municipality.as_deref(),
            ComplaintField::ResponsibleEntityLevel => self.responsible_entity_level.as_deref(),
            ComplaintField::Description => self.description.as_deref(),
        }
    }

    /// Returns the raw region name for the given administrative level.
    #[must_use]
    pub fn region_name(&self, granularity: Granularity) -> Option<&str> {
        match granularity {
            Granularity::State => self.state.as_deref(),
            Granularity::District => self.district.as_deref(),
            Granularity::Municipality => self.municipality.as_deref(),
        }
    }

    /// Returns `(latitude, longitude)` when both are present.
    ///
    /// Records without coordinates are still counted in aggregates; they
    /// just cannot be drawn as markers.
    #[must_use]
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

/// Text attributes of a [`ComplaintRecord`] that can be filtered, searched
/// or enumerated.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ComplaintField {
    /// Category label.
    Category,
    /// Reporter age bracket.
    AgeGroup,
    /// Reporter gender.
    Gender,
    /// Reporter origin.
    Origin,
    /// State name.
    State,
    /// District name.
    District,
    /// Municipality name.
    Municipality,
    /// Responsible administrative level.
    ResponsibleEntityLevel,
    /// Free-text description.
    Description,
}

/// Complaint categories known to the dashboard.
///
/// Records may carry other labels; these only drive presentation lookups
/// for marker icons and colors.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum IssueCategory {
    /// Environment, waste, pollution
    Umwelt,
    /// Schools and education
    Bildung,
    /// Traffic and transportation
    Verkehr,
    /// Digital services and connectivity
    Digitalisierung,
    /// Public safety and lighting
    Sicherheit,
    /// Health care
    Gesundheit,
    /// Business and economy
    Wirtschaft,
    /// Migration and residency
    Migration,
}

/// Icon shown for categories without an entry in [`IssueCategory`].
pub const DEFAULT_ICON: &str = "map-marker";

/// Color shown for categories without an entry in [`IssueCategory`].
pub const DEFAULT_COLOR: &str = "#3498db";

impl IssueCategory {
    /// Font Awesome icon name for marker pins.
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Umwelt => "trash",
            Self::Bildung => "school",
            Self::Verkehr => "car",
            Self::Digitalisierung => "laptop",
            Self::Sicherheit => "lock",
            Self::Gesundheit => "hospital",
            Self::Wirtschaft => "briefcase",
            Self::Migration => "passport",
        }
    }

    /// Hex color for marker pins and popup badges.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Umwelt => "#27ae60",
            Self::Bildung => "#8e44ad",
            Self::Verkehr => "#e67e22",
            Self::Digitalisierung => "#2c3e50",
            Self::Sicherheit => "#e74c3c",
            Self::Gesundheit => "#c0392b",
            Self::Wirtschaft => "#f39c12",
            Self::Migration => "#16a085",
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Umwelt,
            Self::Bildung,
            Self::Verkehr,
            Self::Digitalisierung,
            Self::Sicherheit,
            Self::Gesundheit,
            Self::Wirtschaft,
            Self::Migration,
        ]
    }

    /// Icon for an arbitrary category label, falling back to
    /// [`DEFAULT_ICON`].
    #[must_use]
    pub fn icon_for(label: Option<&str>) -> &'static str {
        label
            .and_then(|l| l.parse::<Self>().ok())
            .map_or(DEFAULT_ICON, Self::icon)
    }

    /// Color for an arbitrary category label, falling back to
    /// [`DEFAULT_COLOR`].
    #[must_use]
    pub fn color_for(label: Option<&str>) -> &'static str {
        label
            .and_then(|l| l.parse::<Self>().ok())
            .map_or(DEFAULT_COLOR, Self::color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_require_both_axes() {
        let mut record = ComplaintRecord {
            latitude: Some(50.1),
            ..ComplaintRecord::default()
        };
        assert_eq!(record.coordinates(), None);

        record.longitude = Some(8.7);
        assert_eq!(record.coordinates(), Some((50.1, 8.7)));
    }

    #[test]
    fn region_name_follows_granularity() {
        let record = ComplaintRecord {
            state: Some("Hessen".to_string()),
            district: Some("Darmstadt".to_string()),
            municipality: None,
            ..ComplaintRecord::default()
        };
        assert_eq!(record.region_name(Granularity::State), Some("Hessen"));
        assert_eq!(record.region_name(Granularity::District), Some("Darmstadt"));
        assert_eq!(record.region_name(Granularity::Municipality), None);
    }

    #[test]
    fn field_names_parse() {
        assert_eq!(
            "responsible_entity_level".parse::<ComplaintField>().unwrap(),
            ComplaintField::ResponsibleEntityLevel
        );
        assert_eq!(
            "Municipality".parse::<ComplaintField>().unwrap(),
            ComplaintField::Municipality
        );
        assert!("timestamp".parse::<ComplaintField>().is_err());
    }

    #[test]
    fn every_category_has_distinct_icon() {
        let mut icons: Vec<&str> = IssueCategory::all().iter().map(|c| c.icon()).collect();
        icons.sort_unstable();
        icons.dedup();
        assert_eq!(icons.len(), IssueCategory::all().len());
        assert!(!icons.contains(&DEFAULT_ICON));
    }

    #[test]
    fn unknown_categories_use_defaults() {
        assert_eq!(IssueCategory::icon_for(Some("Verkehr")), "car");
        assert_eq!(IssueCategory::icon_for(Some("Sonstiges")), DEFAULT_ICON);
        assert_eq!(IssueCategory::icon_for(None), DEFAULT_ICON);
        assert_eq!(IssueCategory::color_for(Some("Kultur")), DEFAULT_COLOR);
    }
}
