//! Filter engine.
//!
//! Evaluates a [`FilterSpec`] against every record in one pass and returns
//! the surviving row positions as a borrowed view. The table itself is
//! never touched.

use complaint_map_analytics_models::{FilterSpec, TextSearch};
use complaint_map_complaint_models::{ComplaintField, ComplaintRecord};
use complaint_map_geography_models::Granularity;

use crate::AnalyticsError;
use crate::table::ComplaintTable;

/// A filtered view over a [`ComplaintTable`].
#[derive(Debug, Clone)]
pub struct FilteredComplaints<'a> {
    table: &'a ComplaintTable,
    rows: Vec<usize>,
}

impl<'a> FilteredComplaints<'a> {
    pub(crate) const fn from_rows(table: &'a ComplaintTable, rows: Vec<usize>) -> Self {
        Self { table, rows }
    }

    /// The table this view selects from.
    #[must_use]
    pub const fn table(&self) -> &'a ComplaintTable {
        self.table
    }

    /// Selected row positions, ascending.
    #[must_use]
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    /// Number of selected records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether nothing survived the filter.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Selected records in load order.
    pub fn records(&self) -> impl Iterator<Item = &'a ComplaintRecord> + '_ {
        let records = self.table.records();
        self.rows.iter().map(move |&row| &records[row])
    }

    /// Selected records paired with their normalized key at `granularity`.
    pub fn keyed(
        &self,
        granularity: Granularity,
    ) -> impl Iterator<Item = (Option<&'a str>, &'a ComplaintRecord)> + '_ {
        let table = self.table;
        self.rows
            .iter()
            .map(move |&row| (table.region_key(row, granularity), &table.records()[row]))
    }

    /// Selected records that carry both coordinates, for marker rendering.
    pub fn markers(&self) -> impl Iterator<Item = &'a ComplaintRecord> + '_ {
        self.records().filter(|r| r.coordinates().is_some())
    }
}

/// Returns the records matching every active predicate of `spec`.
///
/// Multi-valued predicates accept a record whose value is any of the listed
/// values; a record missing the value fails that predicate. With a date
/// range active, records without a parsed date are excluded.
///
/// # Errors
///
/// Returns [`AnalyticsError::InvalidFilter`] if the spec is malformed.
pub fn filter_complaints<'a>(
    table: &'a ComplaintTable,
    spec: &FilterSpec,
) -> Result<FilteredComplaints<'a>, AnalyticsError> {
    spec.validate()?;

    if spec.is_unrestricted() {
        return Ok(table.all());
    }

    let matcher = Matcher::new(spec);
    let rows: Vec<usize> = table
        .records()
        .iter()
        .enumerate()
        .filter(|(_, record)| matcher.matches(record))
        .map(|(row, _)| row)
        .collect();

    log::debug!("Filter kept {} of {} complaints", rows.len(), table.len());

    Ok(FilteredComplaints::from_rows(table, rows))
}

/// A [`FilterSpec`] prepared for repeated evaluation.
struct Matcher<'s> {
    spec: &'s FilterSpec,
    /// Lower-cased needle and the fields it is searched in.
    search: Option<(String, &'s [ComplaintField])>,
}

impl<'s> Matcher<'s> {
    fn new(spec: &'s FilterSpec) -> Self {
        let search = spec
            .search
            .as_ref()
            .filter(|s| !s.is_blank())
            .map(|TextSearch { query, fields }| (query.trim().to_lowercase(), fields.as_slice()));

        Self { spec, search }
    }

    fn matches(&self, record: &ComplaintRecord) -> bool {
        if let Some(range) = self.spec.date_range
            && !record.date.is_some_and(|date| range.contains(date))
        {
            return false;
        }

        let values_match = self
            .spec
            .value_predicates()
            .iter()
            .filter(|(_, accepted)| !accepted.is_empty())
            .all(|(field, accepted)| record.field(*field).is_some_and(|v| accepted.contains(v)));
        if !values_match {
            return false;
        }

        self.search.as_ref().is_none_or(|(needle, fields)| {
            fields.iter().any(|field| {
                record
                    .field(*field)
                    .is_some_and(|value| value.to_lowercase().contains(needle.as_str()))
            })
        })
    }
}
