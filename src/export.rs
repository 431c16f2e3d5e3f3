use crate::aggregate::{Aggregates, CommitTable};
use crate::cli::CommonArgs;
use crate::error::Result;
use crate::history::{fetch_history, NO_COMMITS};
use crate::model::{ExportOutput, SCHEMA_VERSION};
use anyhow::Context;
use chrono::Utc;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportTarget {
    File(PathBuf),
    Stdout,
}

pub fn exec(common: &CommonArgs, target: &ExportTarget) -> anyhow::Result<()> {
    let history = fetch_history(common)?;

    if history.entries.is_empty() {
        match target {
            ExportTarget::Stdout => eprintln!("{NO_COMMITS}"),
            ExportTarget::File(_) => println!("{NO_COMMITS}"),
        }
        return Ok(());
    }

    let table = CommitTable::from_records(history.entries.into_iter().map(|entry| entry.record));
    let output = build_export(
        &table,
        history.repo.path().to_string_lossy().to_string(),
        history.since,
    );

    match target {
        ExportTarget::File(path) => {
            write_json(path, &output)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("JSON data written to {}", path.display());
        }
        ExportTarget::Stdout => {
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

pub fn build_export(table: &CommitTable, repository_path: String, since: String) -> ExportOutput {
    let Aggregates {
        daily,
        authors,
        heatmap,
        churn,
    } = Aggregates::compute(table);

    ExportOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        repository_path,
        since,
        commits: table.records().cloned().collect(),
        daily,
        authors,
        heatmap,
        churn,
    }
}

/// Pretty-printed JSON at `path`, creating missing parent directories.
pub fn write_json(path: &Path, output: &ExportOutput) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, output)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    log::debug!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CommitRecord;
    use chrono::DateTime;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn table() -> CommitTable {
        let record = |hash: &str, author: &str, at: &str, ins: u64, del: u64| CommitRecord {
            hash: hash.to_string(),
            author: author.to_string(),
            timestamp: DateTime::parse_from_rfc3339(at).unwrap(),
            insertions: ins,
            deletions: del,
            files_changed: 1,
        };
        CommitTable::from_records(vec![
            record("c3", "alice", "2024-01-03T09:00:00+00:00", 1, 1),
            record("c2", "bob", "2024-01-01T14:00:00+00:00", 5, 5),
            record("c1", "alice", "2024-01-01T10:00:00+00:00", 10, 2),
        ])
    }

    #[test]
    fn export_document_matches_dashboard_shape() {
        let output = build_export(&table(), "/repo".to_string(), "2023-12-01".to_string());
        let value = serde_json::to_value(&output).unwrap();

        assert_eq!(value["version"], json!(SCHEMA_VERSION));
        assert_eq!(value["since"], json!("2023-12-01"));
        assert_eq!(value["commits"].as_array().unwrap().len(), 3);
        assert_eq!(value["commits"][0]["hash"], json!("c3"));
        assert_eq!(value["commits"][0]["timestamp"], json!("2024-01-03T09:00:00+00:00"));
        assert_eq!(value["daily"], json!({"2024-01-01": 2, "2024-01-03": 1}));
        assert_eq!(value["authors"], json!({"alice": 2, "bob": 1}));
        assert_eq!(
            value["churn"],
            json!({
                "2024-01-01": {"insertions": 15, "deletions": 7},
                "2024-01-02": {"insertions": 0, "deletions": 0},
                "2024-01-03": {"insertions": 1, "deletions": 1},
            })
        );
        assert_eq!(value["heatmap"]["Monday"]["10"], json!(1));
        assert_eq!(value["heatmap"]["Monday"]["14"], json!(1));
        assert_eq!(value["heatmap"]["Wednesday"]["9"], json!(1));
        assert_eq!(value["heatmap"]["Sunday"]["23"], json!(0));
    }

    #[test]
    fn numbers_are_integers() {
        let output = build_export(&table(), "/repo".to_string(), "x".to_string());
        let text = serde_json::to_string(&output).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert!(value["churn"]["2024-01-02"]["insertions"].is_u64());
        assert!(value["heatmap"]["Friday"]["0"].is_u64());
        assert!(!text.contains(".0,"));
    }

    #[test]
    fn write_json_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard/public/data/git-data.json");
        let output = build_export(&table(), "/repo".to_string(), "x".to_string());

        write_json(&path, &output).unwrap();

        let value: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["authors"]["alice"], json!(2));
    }
}
