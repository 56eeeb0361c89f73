//! The loaded complaint table.
//!
//! Region names are normalized exactly once, when the table is built, so
//! every later filter/aggregate pass only compares precomputed keys.

use std::sync::atomic::{AtomicU64, Ordering};

use complaint_map_complaint_models::ComplaintRecord;
use complaint_map_geography_models::Granularity;
use complaint_map_geography_models::normalize::region_key;

use crate::filter::FilteredComplaints;

/// Normalized join keys for one record. `None` means the name was missing
/// or normalized to nothing, and the record is unmatched at that level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct RegionKeys {
    state: Option<String>,
    district: Option<String>,
    municipality: Option<String>,
}

impl RegionKeys {
    fn from_record(record: &ComplaintRecord) -> Self {
        Self {
            state: region_key(record.state.as_deref()),
            district: region_key(record.district.as_deref()),
            municipality: region_key(record.municipality.as_deref()),
        }
    }

    fn get(&self, granularity: Granularity) -> Option<&str> {
        match granularity {
            Granularity::State => self.state.as_deref(),
            Granularity::District => self.district.as_deref(),
            Granularity::Municipality => self.municipality.as_deref(),
        }
    }
}

static NEXT_TABLE_VERSION: AtomicU64 = AtomicU64::new(1);

/// Immutable complaint records plus their precomputed region keys.
#[derive(Debug)]
pub struct ComplaintTable {
    version: u64,
    records: Vec<ComplaintRecord>,
    keys: Vec<RegionKeys>,
}

impl ComplaintTable {
    /// Builds the table, renumbering record ids to their row position and
    /// normalizing every region name.
    #[must_use]
    pub fn new(mut records: Vec<ComplaintRecord>) -> Self {
        for (idx, record) in records.iter_mut().enumerate() {
            record.id = idx;
        }
        let keys = records.iter().map(RegionKeys::from_record).collect();

        Self {
            version: NEXT_TABLE_VERSION.fetch_add(1, Ordering::Relaxed),
            records,
            keys,
        }
    }

    /// Process-unique identifier of this table.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// All records in load order.
    #[must_use]
    pub fn records(&self) -> &[ComplaintRecord] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Normalized region key of the record at `row`, if it has one.
    #[must_use]
    pub fn region_key(&self, row: usize, granularity: Granularity) -> Option<&str> {
        self.keys.get(row).and_then(|keys| keys.get(granularity))
    }

    /// An unfiltered view over every record.
    #[must_use]
    pub fn all(&self) -> FilteredComplaints<'_> {
        FilteredComplaints::from_rows(self, (0..self.records.len()).collect())
    }
}
