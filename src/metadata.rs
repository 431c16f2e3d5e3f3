//! Plain-text history dumps embedded in the report: a decorated one-line
//! graph, a per-author summary and per-commit shortstats.

use crate::error::Result;
use crate::git::Decorations;
use crate::model::{CommitRecord, HistoryEntry};
use std::collections::{HashMap, HashSet};
use std::fmt::Write;
use std::fs;
use std::path::Path;

pub const LOG_GRAPH_FILE: &str = "log-graph.txt";
pub const SHORTLOG_FILE: &str = "shortlog-summary.txt";
pub const STAT_FILE: &str = "commit-stat-summary.txt";

const SHORT_HASH_LEN: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataDumps {
    pub log_graph: String,
    pub shortlog: String,
    pub stats: String,
}

impl MetadataDumps {
    pub fn build(entries: &[HistoryEntry], decorations: &Decorations, user: Option<&str>) -> Self {
        Self {
            log_graph: log_graph(entries, decorations),
            shortlog: shortlog(entries),
            stats: shortstat_summary(entries, user),
        }
    }

    pub fn write(&self, out_dir: &Path) -> Result<()> {
        for (name, text) in [
            (LOG_GRAPH_FILE, &self.log_graph),
            (SHORTLOG_FILE, &self.shortlog),
            (STAT_FILE, &self.stats),
        ] {
            let path = out_dir.join(name);
            fs::write(&path, text)?;
            log::debug!("Wrote {}", path.display());
        }
        Ok(())
    }
}

/// One line per commit, newest first, with an ASCII lane graph on the left.
///
/// `entries` must already be in display order. Parents outside `entries` end
/// their lane.
pub fn log_graph(entries: &[HistoryEntry], decorations: &Decorations) -> String {
    let in_window: HashSet<&str> = entries.iter().map(|e| e.record.hash.as_str()).collect();
    let mut lanes: Vec<Option<&str>> = Vec::new();
    let mut lines = Vec::with_capacity(entries.len());

    for entry in entries {
        let hash = entry.record.hash.as_str();

        let col = match lanes.iter().position(|lane| *lane == Some(hash)) {
            Some(col) => col,
            None => claim_lane(&mut lanes, hash),
        };
        for (i, lane) in lanes.iter_mut().enumerate() {
            if i != col && *lane == Some(hash) {
                *lane = None;
            }
        }

        let graph: Vec<&str> = lanes
            .iter()
            .enumerate()
            .map(|(i, lane)| match lane {
                _ if i == col => "*",
                Some(_) => "|",
                None => " ",
            })
            .collect();

        let mut line = graph.join(" ").trim_end().to_string();
        let short: String = hash.chars().take(SHORT_HASH_LEN).collect();
        let _ = write!(line, " {short}");
        if let Some(labels) = decorations.get(hash).filter(|labels| !labels.is_empty()) {
            let _ = write!(line, " ({})", labels.join(", "));
        }
        let _ = write!(line, " {}", entry.summary);
        lines.push(line.trim_end().to_string());

        let mut parents = entry
            .parent_ids
            .iter()
            .map(String::as_str)
            .filter(|parent| in_window.contains(parent));

        lanes[col] = parents.next();
        for parent in parents {
            if !lanes.contains(&Some(parent)) {
                claim_lane(&mut lanes, parent);
            }
        }
        while lanes.last() == Some(&None) {
            lanes.pop();
        }
    }

    lines.join("\n")
}

fn claim_lane<'a>(lanes: &mut Vec<Option<&'a str>>, hash: &'a str) -> usize {
    match lanes.iter().position(Option::is_none) {
        Some(free) => {
            lanes[free] = Some(hash);
            free
        }
        None => {
            lanes.push(Some(hash));
            lanes.len() - 1
        }
    }
}

/// Commit count per author identity, `%6d\tName <email>`, busiest first.
pub fn shortlog(entries: &[HistoryEntry]) -> String {
    let mut counts: HashMap<(&str, &str), u64> = HashMap::new();
    for entry in entries {
        *counts
            .entry((entry.record.author.as_str(), entry.author_email.as_str()))
            .or_insert(0) += 1;
    }

    let mut rows: Vec<_> = counts.into_iter().collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    rows.into_iter()
        .map(|((name, email), count)| format!("{count:>6}\t{name} <{email}>"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Log with shortstats for the HEAD commits authored by `user`; every HEAD
/// commit when no user is configured.
pub fn shortstat_summary(entries: &[HistoryEntry], user: Option<&str>) -> String {
    entries
        .iter()
        .filter(|entry| entry.on_head)
        .filter(|entry| user.map_or(true, |name| entry.record.author.contains(name)))
        .map(format_stat_entry)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn format_stat_entry(entry: &HistoryEntry) -> String {
    let record = &entry.record;
    let mut out = String::new();
    let _ = writeln!(out, "commit {}", record.hash);
    let _ = writeln!(out, "Author: {} <{}>", record.author, entry.author_email);
    let _ = writeln!(out, "Date:   {}", record.timestamp.format("%a %b %-d %H:%M:%S %Y %z"));
    let _ = write!(out, "\n    {}", entry.summary);
    if let Some(stat) = format_shortstat(record) {
        let _ = write!(out, "\n\n{stat}");
    }
    out
}

/// ` 2 files changed, 5 insertions(+), 1 deletion(-)`; `None` for an empty commit.
pub fn format_shortstat(record: &CommitRecord) -> Option<String> {
    if record.files_changed == 0 {
        return None;
    }

    let mut stat = format!(
        " {} {} changed",
        record.files_changed,
        plural(record.files_changed, "file", "files")
    );
    if record.insertions > 0 {
        let _ = write!(
            stat,
            ", {} {}(+)",
            record.insertions,
            plural(record.insertions, "insertion", "insertions")
        );
    }
    if record.deletions > 0 {
        let _ = write!(
            stat,
            ", {} {}(-)",
            record.deletions,
            plural(record.deletions, "deletion", "deletions")
        );
    }
    Some(stat)
}

fn plural(n: u64, one: &'static str, many: &'static str) -> &'static str {
    if n == 1 {
        one
    } else {
        many
    }
}
