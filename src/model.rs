use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SCHEMA_VERSION: u32 = 1;

/// Day names in heatmap row order.
pub const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

pub const HOURS_PER_DAY: usize = 24;

/// One commit as read from the repository, with line totals over all files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub hash: String,
    pub author: String,
    pub timestamp: DateTime<FixedOffset>,
    pub insertions: u64,
    pub deletions: u64,
    #[serde(rename = "files")]
    pub files_changed: u64,
}

/// A commit record plus the metadata needed for the text dumps of the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub record: CommitRecord,
    pub author_email: String,
    pub summary: String,
    pub parent_ids: Vec<String>,
    /// Reachable from HEAD, not only from some other reference.
    pub on_head: bool,
}

pub type DailyCounts = BTreeMap<NaiveDate, u64>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChurnDay {
    pub insertions: u64,
    pub deletions: u64,
}

pub type DailyChurn = BTreeMap<NaiveDate, ChurnDay>;

/// Commits per author, most active first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorCounts {
    entries: Vec<(String, u64)>,
}

impl AuthorCounts {
    pub fn new(entries: Vec<(String, u64)>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[(String, u64)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, author: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|(name, _)| name == author)
            .map(|(_, count)| *count)
    }
}

// Serialized as an object whose key order is the ranking.
impl Serialize for AuthorCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (author, count) in &self.entries {
            map.serialize_entry(author, count)?;
        }
        map.end()
    }
}

/// Weekday x hour-of-day commit counts. Rows are Monday..Sunday.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Heatmap {
    cells: [[u64; HOURS_PER_DAY]; 7],
}

impl Heatmap {
    pub fn new(cells: [[u64; HOURS_PER_DAY]; 7]) -> Self {
        Self { cells }
    }

    pub fn rows(&self) -> &[[u64; HOURS_PER_DAY]; 7] {
        &self.cells
    }

    pub fn get(&self, weekday: usize, hour: usize) -> u64 {
        self.cells[weekday][hour]
    }

    pub fn max(&self) -> u64 {
        self.cells.iter().flatten().copied().max().unwrap_or(0)
    }
}

struct HourRow<'a>(&'a [u64; HOURS_PER_DAY]);

impl Serialize for HourRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(HOURS_PER_DAY))?;
        for (hour, count) in self.0.iter().enumerate() {
            map.serialize_entry(&hour, count)?;
        }
        map.end()
    }
}

impl Serialize for Heatmap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(WEEKDAYS.len()))?;
        for (day, row) in WEEKDAYS.iter().zip(self.cells.iter()) {
            map.serialize_entry(day, &HourRow(row))?;
        }
        map.end()
    }
}

/// Dashboard document written by `git-export`.
#[derive(Debug, Clone, Serialize)]
pub struct ExportOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub repository_path: String,
    pub since: String,
    pub commits: Vec<CommitRecord>,
    pub daily: DailyCounts,
    pub authors: AuthorCounts,
    pub heatmap: Heatmap,
    pub churn: DailyChurn,
}
