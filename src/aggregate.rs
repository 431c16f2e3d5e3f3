//! Grouping and counting over a table of commits.
//!
//! Every function here is a pure projection of [`CommitTable`]; none of them
//! share intermediate state, so they can be computed in any order.

use crate::model::{
    AuthorCounts, ChurnDay, CommitRecord, DailyChurn, DailyCounts, Heatmap, HOURS_PER_DAY,
};
use chrono::{Datelike, NaiveDate, Timelike, Weekday};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRow {
    pub record: CommitRecord,
    pub date: NaiveDate,
    pub hour: u32,
    pub weekday: Weekday,
}

impl CommitRow {
    /// Derived columns are read in the commit's own UTC offset.
    pub fn new(record: CommitRecord) -> Self {
        let local = record.timestamp.naive_local();
        Self {
            date: local.date(),
            hour: local.hour(),
            weekday: local.weekday(),
            record,
        }
    }
}

/// Commits in traversal order, with calendar columns used for grouping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitTable {
    rows: Vec<CommitRow>,
}

impl CommitTable {
    pub fn from_records<I: IntoIterator<Item = CommitRecord>>(records: I) -> Self {
        Self {
            rows: records.into_iter().map(CommitRow::new).collect(),
        }
    }

    pub fn rows(&self) -> &[CommitRow] {
        &self.rows
    }

    pub fn records(&self) -> impl Iterator<Item = &CommitRecord> {
        self.rows.iter().map(|row| &row.record)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregates {
    pub daily: DailyCounts,
    pub authors: AuthorCounts,
    pub heatmap: Heatmap,
    pub churn: DailyChurn,
}

impl Aggregates {
    pub fn compute(table: &CommitTable) -> Self {
        Self {
            daily: daily_counts(table),
            authors: author_counts(table),
            heatmap: heatmap(table),
            churn: daily_churn(table),
        }
    }
}

/// Commits per calendar date. Days without commits are absent.
pub fn daily_counts(table: &CommitTable) -> DailyCounts {
    let mut daily = DailyCounts::new();
    for row in table.rows() {
        *daily.entry(row.date).or_insert(0) += 1;
    }
    daily
}

/// Commits per author name, descending. Equal counts keep first-seen order.
pub fn author_counts(table: &CommitTable) -> AuthorCounts {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(String, u64)> = Vec::new();

    for row in table.rows() {
        let author = row.record.author.as_str();
        match index.get(author) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(author, counts.len());
                counts.push((author.to_string(), 1));
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    AuthorCounts::new(counts)
}

pub fn heatmap(table: &CommitTable) -> Heatmap {
    let mut cells = [[0u64; HOURS_PER_DAY]; 7];
    for row in table.rows() {
        let day = row.weekday.num_days_from_monday() as usize;
        cells[day][row.hour as usize] += 1;
    }
    Heatmap::new(cells)
}

/// Insertions and deletions per day over the whole span of the table,
/// zero-filled for days without commits.
pub fn daily_churn(table: &CommitTable) -> DailyChurn {
    let mut churn = DailyChurn::new();

    let first = table.rows().iter().map(|row| row.date).min();
    let last = table.rows().iter().map(|row| row.date).max();
    let (Some(first), Some(last)) = (first, last) else {
        return churn;
    };

    for day in first.iter_days().take_while(|day| *day <= last) {
        churn.insert(day, ChurnDay::default());
    }

    for row in table.rows() {
        let entry = churn.entry(row.date).or_default();
        entry.insertions += row.record.insertions;
        entry.deletions += row.record.deletions;
    }

    churn
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use pretty_assertions::assert_eq;

    fn record(hash: &str, author: &str, at: &str, insertions: u64, deletions: u64) -> CommitRecord {
        CommitRecord {
            hash: hash.to_string(),
            author: author.to_string(),
            timestamp: DateTime::parse_from_rfc3339(at).unwrap(),
            insertions,
            deletions,
            files_changed: 1,
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn three_commits() -> CommitTable {
        CommitTable::from_records(vec![
            record("c1", "alice", "2024-01-01T10:00:00+00:00", 10, 2),
            record("c2", "bob", "2024-01-01T14:00:00+00:00", 5, 5),
            record("c3", "alice", "2024-01-03T09:00:00+00:00", 1, 1),
        ])
    }

    #[test]
    fn derived_columns_follow_commit_offset() {
        let row = CommitRow::new(record("x", "a", "2024-01-07T23:30:00-05:00", 0, 0));
        assert_eq!(row.date, date("2024-01-07"));
        assert_eq!(row.hour, 23);
        assert_eq!(row.weekday, Weekday::Sun);
    }

    #[test]
    fn daily_counts_for_three_commits() {
        let daily = daily_counts(&three_commits());
        let expected: DailyCounts = [(date("2024-01-01"), 2), (date("2024-01-03"), 1)]
            .into_iter()
            .collect();
        assert_eq!(daily, expected);
    }

    #[test]
    fn daily_counts_same_day_is_single_entry() {
        let table = CommitTable::from_records(
            (0..5).map(|i| record(&format!("h{i}"), "a", &format!("2024-02-10T0{i}:00:00+00:00"), 1, 0)),
        );
        let daily = daily_counts(&table);
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[&date("2024-02-10")], 5);
    }

    #[test]
    fn author_counts_for_three_commits() {
        let authors = author_counts(&three_commits());
        assert_eq!(
            authors.entries(),
            &[("alice".to_string(), 2), ("bob".to_string(), 1)]
        );
    }

    #[test]
    fn author_counts_are_descending_and_exact_match() {
        let table = CommitTable::from_records(vec![
            record("1", "carol", "2024-01-01T10:00:00+00:00", 0, 0),
            record("2", "Dave", "2024-01-01T10:00:00+00:00", 0, 0),
            record("3", "dave", "2024-01-01T10:00:00+00:00", 0, 0),
            record("4", "dave", "2024-01-01T10:00:00+00:00", 0, 0),
            record("5", "carol", "2024-01-01T10:00:00+00:00", 0, 0),
            record("6", "dave", "2024-01-01T10:00:00+00:00", 0, 0),
        ]);
        let authors = author_counts(&table);
        let counts: Vec<u64> = authors.entries().iter().map(|(_, n)| *n).collect();
        assert!(counts.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(authors.get("dave"), Some(3));
        assert_eq!(authors.get("carol"), Some(2));
        assert_eq!(authors.get("Dave"), Some(1));
    }

    #[test]
    fn author_ties_keep_first_seen_order() {
        let table = CommitTable::from_records(vec![
            record("1", "zoe", "2024-01-01T10:00:00+00:00", 0, 0),
            record("2", "adam", "2024-01-01T10:00:00+00:00", 0, 0),
        ]);
        let counts = author_counts(&table);
        let names: Vec<&str> = counts
            .entries()
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(names, vec!["zoe", "adam"]);
    }

    #[test]
    fn heatmap_has_seven_monday_first_rows() {
        let map = heatmap(&three_commits());
        assert_eq!(map.rows().len(), 7);
        // 2024-01-01 is a Monday, 2024-01-03 a Wednesday
        assert_eq!(map.get(0, 10), 1);
        assert_eq!(map.get(0, 14), 1);
        assert_eq!(map.get(2, 9), 1);
        for idle in [1usize, 3, 4, 5, 6] {
            assert!(map.rows()[idle].iter().all(|&n| n == 0));
        }
        assert_eq!(map.max(), 1);
    }

    #[test]
    fn daily_churn_fills_gap_days() {
        let churn = daily_churn(&three_commits());
        let expected: DailyChurn = [
            (date("2024-01-01"), ChurnDay { insertions: 15, deletions: 7 }),
            (date("2024-01-02"), ChurnDay { insertions: 0, deletions: 0 }),
            (date("2024-01-03"), ChurnDay { insertions: 1, deletions: 1 }),
        ]
        .into_iter()
        .collect();
        assert_eq!(churn, expected);
    }

    #[test]
    fn daily_churn_covers_whole_span() {
        let table = CommitTable::from_records(vec![
            record("a", "x", "2024-03-30T12:00:00+00:00", 4, 0),
            record("b", "x", "2024-02-27T12:00:00+00:00", 0, 9),
        ]);
        let churn = daily_churn(&table);
        // 2024 is a leap year: Feb 27 ..= Mar 30 is 33 days
        assert_eq!(churn.len(), 33);
        assert_eq!(churn.keys().next(), Some(&date("2024-02-27")));
        assert_eq!(churn.keys().last(), Some(&date("2024-03-30")));
        assert_eq!(churn[&date("2024-02-29")], ChurnDay::default());
    }

    #[test]
    fn empty_table_gives_empty_aggregates() {
        let aggregates = Aggregates::compute(&CommitTable::default());
        assert!(aggregates.daily.is_empty());
        assert!(aggregates.authors.is_empty());
        assert!(aggregates.churn.is_empty());
        assert_eq!(aggregates.heatmap.max(), 0);
    }
}
