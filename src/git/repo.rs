use crate::error::{GitReportError, Result};
use crate::model::{CommitRecord, HistoryEntry};
use chrono::{DateTime, FixedOffset, Local, NaiveDate, TimeZone, Utc};
use gix::bstr::ByteSlice;
use gix::object::tree::diff::ChangeDetached;
use gix::{discover, ObjectId, Repository};
use indicatif::{ProgressBar, ProgressStyle};
use similar::{ChangeTag, TextDiff};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Ref names pointing at each commit, keyed by full hex id.
pub type Decorations = HashMap<String, Vec<String>>;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct ChangeTotals {
    insertions: u64,
    deletions: u64,
    files: u64,
}

pub struct GitRepo {
    repo: Repository,
    path: PathBuf,
}

impl GitRepo {
    /// Open the repository containing `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = discover(path.as_ref())?;
        let path = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();

        Ok(Self { repo, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Interpret a resolved `--since` value as an absolute instant.
    pub fn resolve_cutoff(&self, input: &str) -> Result<DateTime<Utc>> {
        let input = input.trim();

        // RFC3339
        if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
            return Ok(dt.with_timezone(&Utc));
        }

        // YYYY-MM-DD, start of that day on this machine
        if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
            return local_midnight(date);
        }

        // Anything git's own date parser understands
        if let Some(dt) = parse_git_date(input, SystemTime::now()) {
            return Ok(dt);
        }

        // Fallback to Git ref
        let id = self
            .repo
            .rev_parse_single(input)
            .map_err(|e| GitReportError::Parse(format!("Invalid date or commit '{input}': {e}")))?;

        let commit = id
            .object()?
            .try_into_commit()
            .map_err(|_| GitReportError::Parse(format!("Not a commit: {input}")))?;

        let secs = commit.time()?.seconds;
        DateTime::<Utc>::from_timestamp(secs, 0)
            .ok_or_else(|| GitReportError::InvalidDate(format!("Invalid timestamp: {secs}")))
    }

    /// Commit ids at the tip of every reference, peeled to commits.
    fn ref_tips(&self) -> Result<Vec<ObjectId>> {
        let mut tips = Vec::new();
        for (name, id) in self.peeled_references()? {
            if self.is_commit(id) {
                tips.push(id);
            } else {
                log::debug!("Reference {name} does not point at a commit");
            }
        }
        Ok(tips)
    }

    fn is_commit(&self, id: ObjectId) -> bool {
        self.repo
            .find_object(id)
            .map(|object| object.kind == gix::object::Kind::Commit)
            .unwrap_or(false)
    }

    /// Every reference as (full name, peeled target id).
    fn peeled_references(&self) -> Result<Vec<(String, ObjectId)>> {
        let platform = self
            .repo
            .references()
            .map_err(|e| GitReportError::GitRepo(format!("Failed to read references: {e}")))?;
        let iter = platform
            .all()
            .map_err(|e| GitReportError::GitRepo(format!("Failed to list references: {e}")))?;

        let mut out = Vec::new();
        for reference in iter {
            let mut reference = match reference {
                Ok(reference) => reference,
                Err(e) => {
                    log::warn!("Skipping unreadable reference: {e}");
                    continue;
                }
            };
            let name = reference.name().as_bstr().to_string();
            match reference.peel_to_id_in_place() {
                Ok(id) => out.push((name, id.detach())),
                Err(e) => log::warn!("Skipping reference {name}: {e}"),
            }
        }

        Ok(out)
    }

    /// Walk every commit reachable from any reference and keep those whose
    /// committer time is at or after `cutoff`, newest first.
    ///
    /// HEAD is walked to exhaustion before the other tips, so exactly the
    /// commits found in that first pass are marked `on_head`.
    pub fn collect_history(&self, cutoff: &DateTime<Utc>) -> Result<Vec<HistoryEntry>> {
        let mut entries = Vec::new();
        let mut seen: HashSet<ObjectId> = HashSet::new();

        let mut passes: Vec<(Vec<ObjectId>, bool)> = Vec::new();
        if let Ok(id) = self.repo.head_id() {
            passes.push((vec![id.detach()], true));
        }
        passes.push((self.ref_tips()?, false));

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} ({pos})")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Collecting commits...");

        let cutoff_secs = cutoff.timestamp();
        let mut visited = 0usize;

        for (mut stack, on_head) in passes {
            while let Some(commit_id) = stack.pop() {
                if !seen.insert(commit_id) {
                    continue;
                }
                visited += 1;

                let commit = self.repo.find_commit(commit_id)?;
                let time = commit.time()?;
                let parents: Vec<ObjectId> = commit.parent_ids().map(|id| id.detach()).collect();
                stack.extend(parents.iter().copied());

                if time.seconds < cutoff_secs {
                    continue;
                }

                let timestamp = commit_timestamp(time.seconds, time.offset)?;
                let author = commit.author()?;
                let author_name = author.name.to_string();
                let author_email = author.email.to_string();
                let summary = commit.message()?.title.to_str_lossy().trim().to_string();

                let totals = self.change_totals(&commit, parents.first().copied())?;

                entries.push(HistoryEntry {
                    record: CommitRecord {
                        hash: commit_id.to_string(),
                        author: author_name,
                        timestamp,
                        insertions: totals.insertions,
                        deletions: totals.deletions,
                        files_changed: totals.files,
                    },
                    author_email,
                    summary,
                    parent_ids: parents.iter().map(|id| id.to_string()).collect(),
                    on_head,
                });

                pb.inc(1);
            }
        }

        pb.finish_and_clear();
        log::debug!(
            "Visited {visited} commits, {} at or after {cutoff}",
            entries.len()
        );

        entries.sort_by(|a, b| {
            b.record
                .timestamp
                .cmp(&a.record.timestamp)
                .then_with(|| a.record.hash.cmp(&b.record.hash))
        });
        Ok(entries)
    }

    /// Line and file totals of `commit` against its first parent, or against
    /// the empty tree for a root commit.
    fn change_totals(&self, commit: &gix::Commit<'_>, parent: Option<ObjectId>) -> Result<ChangeTotals> {
        let tree = commit.tree()?;
        let parent_tree = match parent {
            Some(parent_id) => Some(self.repo.find_commit(parent_id)?.tree()?),
            None => None,
        };

        // renames count as a deletion plus an addition, like `git diff --no-renames`
        let options = gix::diff::Options::default().with_rewrites(None);
        let changes: Vec<ChangeDetached> =
            self.repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(options))?;

        let mut totals = ChangeTotals::default();
        for change in changes {
            self.handle_change(change, &mut totals)?;
        }
        Ok(totals)
    }

    fn handle_change(&self, change: ChangeDetached, totals: &mut ChangeTotals) -> Result<()> {
        match change {
            ChangeDetached::Addition { id, entry_mode, .. } => {
                if is_file(entry_mode) {
                    let obj = self.repo.find_object(id)?;
                    totals.files += 1;
                    if !is_binary(&obj.data) {
                        totals.insertions += count_lines(&obj.data);
                    }
                }
            }
            ChangeDetached::Deletion { id, entry_mode, .. } => {
                if is_file(entry_mode) {
                    let obj = self.repo.find_object(id)?;
                    totals.files += 1;
                    if !is_binary(&obj.data) {
                        totals.deletions += count_lines(&obj.data);
                    }
                }
            }
            ChangeDetached::Modification {
                previous_id,
                id,
                entry_mode,
                ..
            } => {
                if is_file(entry_mode) {
                    self.add_blob_diff(previous_id, id, totals)?;
                }
            }
            // not produced while rewrite tracking is off
            ChangeDetached::Rewrite {
                source_id,
                id,
                entry_mode,
                ..
            } => {
                if is_file(entry_mode) {
                    self.add_blob_diff(source_id, id, totals)?;
                }
            }
        }
        Ok(())
    }

    fn add_blob_diff(&self, old_id: ObjectId, new_id: ObjectId, totals: &mut ChangeTotals) -> Result<()> {
        let old_obj = self.repo.find_object(old_id)?;
        let new_obj = self.repo.find_object(new_id)?;
        totals.files += 1;
        if is_binary(&old_obj.data) || is_binary(&new_obj.data) {
            return Ok(());
        }
        let (added, deleted) = line_diff(&old_obj.data, &new_obj.data);
        totals.insertions += added;
        totals.deletions += deleted;
        Ok(())
    }

    /// Ref decorations the way `git log --decorate` prints them.
    pub fn decorations(&self) -> Result<Decorations> {
        let head = self.repo.head()?;
        let head_target = head.referent_name().map(|name| name.as_bstr().to_string());
        let head_id = head.id().map(|id| id.detach().to_string());

        let mut refs = self.peeled_references()?;
        refs.sort_by(|a, b| a.0.cmp(&b.0));

        let mut decorations = Decorations::new();
        if let (Some(id), None) = (&head_id, &head_target) {
            decorations.entry(id.clone()).or_default().push("HEAD".to_string());
        }

        for (full_name, id) in refs {
            let short = shorten_ref(&full_name);
            let label = if head_target.as_deref() == Some(full_name.as_str()) {
                format!("HEAD -> {short}")
            } else if full_name.starts_with("refs/tags/") {
                format!("tag: {short}")
            } else {
                short.to_string()
            };

            let labels = decorations.entry(id.to_string()).or_default();
            if label.starts_with("HEAD") {
                labels.insert(0, label);
            } else {
                labels.push(label);
            }
        }

        Ok(decorations)
    }

    /// `user.name` from the repository configuration, if set.
    pub fn user_name(&self) -> Option<String> {
        self.repo
            .config_snapshot()
            .string("user.name")
            .map(|name| name.to_string())
    }
}

fn shorten_ref(full_name: &str) -> &str {
    ["refs/heads/", "refs/tags/", "refs/remotes/", "refs/"]
        .iter()
        .find_map(|prefix| full_name.strip_prefix(prefix))
        .unwrap_or(full_name)
}

fn is_file(mode: gix::objs::tree::EntryMode) -> bool {
    !mode.is_tree() && !mode.is_commit()
}

fn local_midnight(date: NaiveDate) -> Result<DateTime<Utc>> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| GitReportError::InvalidDate(date.to_string()))?;
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| GitReportError::InvalidDate(format!("No local midnight on {date}")))
}

fn commit_timestamp(seconds: i64, offset_secs: i32) -> Result<DateTime<FixedOffset>> {
    let offset = FixedOffset::east_opt(offset_secs)
        .ok_or_else(|| GitReportError::InvalidDate(format!("Invalid UTC offset: {offset_secs}")))?;
    DateTime::<Utc>::from_timestamp(seconds, 0)
        .map(|dt| dt.with_timezone(&offset))
        .ok_or_else(|| GitReportError::InvalidDate(format!("Invalid timestamp: {seconds}")))
}

fn is_binary(data: &[u8]) -> bool {
    data.iter().take(8000).any(|&b| b == 0)
}

fn count_lines(data: &[u8]) -> u64 {
    String::from_utf8_lossy(data).lines().count() as u64
}

fn line_diff(old: &[u8], new: &[u8]) -> (u64, u64) {
    let old_text = String::from_utf8_lossy(old);
    let new_text = String::from_utf8_lossy(new);
    let diff = TextDiff::from_lines(old_text.as_ref(), new_text.as_ref());

    let mut added = 0u64;
    let mut deleted = 0u64;
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => added += 1,
            ChangeTag::Delete => deleted += 1,
            ChangeTag::Equal => {}
        }
    }
    (added, deleted)
}

/// Absolute or relative dates in any format `gix` shares with git: ISO 8601,
/// RFC 2822, git's default format, unix timestamps and `N <unit> ago`.
fn parse_git_date(input: &str, now: SystemTime) -> Option<DateTime<Utc>> {
    let time = gix::date::parse(input, Some(now)).ok()?;
    DateTime::<Utc>::from_timestamp(time.seconds, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn utc(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn git_dates_with_time_and_zone() {
        let now = SystemTime::now();
        assert_eq!(
            parse_git_date("2024-01-01 12:00:00 +0100", now),
            Some(utc("2024-01-01T11:00:00Z"))
        );
        assert_eq!(
            parse_git_date("Mon, 01 Jan 2024 12:00:00 +0000", now),
            Some(utc("2024-01-01T12:00:00Z"))
        );
    }

    #[test]
    fn relative_git_dates_count_back_from_now() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(1_704_110_400);
        assert_eq!(
            parse_git_date("2 days ago", now),
            Some(utc("2023-12-30T12:00:00Z"))
        );
    }

    #[test]
    fn revisions_are_not_dates() {
        assert_eq!(parse_git_date("HEAD~3", SystemTime::now()), None);
        assert_eq!(parse_git_date("main", SystemTime::now()), None);
    }

    #[test]
    fn line_diff_counts_changed_lines() {
        assert_eq!(line_diff(b"a\nb\nc\n", b"a\nB\nc\nd\n"), (2, 1));
        assert_eq!(line_diff(b"same\n", b"same\n"), (0, 0));
        assert_eq!(line_diff(b"", b"x\ny\n"), (2, 0));
    }

    #[test]
    fn counts_lines_without_trailing_newline() {
        assert_eq!(count_lines(b"one\ntwo"), 2);
        assert_eq!(count_lines(b"one\ntwo\n"), 2);
        assert_eq!(count_lines(b""), 0);
    }

    #[test]
    fn nul_byte_marks_binary() {
        assert!(is_binary(b"\x89PNG\x00\x01"));
        assert!(!is_binary(b"plain text\n"));
    }

    #[test]
    fn commit_timestamp_keeps_offset() {
        let ts = commit_timestamp(1_704_103_200, 3600).unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-01-01T11:00:00+01:00");
    }

    #[test]
    fn ref_names_are_shortened() {
        assert_eq!(shorten_ref("refs/heads/main"), "main");
        assert_eq!(shorten_ref("refs/tags/v1.0"), "v1.0");
        assert_eq!(shorten_ref("refs/remotes/origin/main"), "origin/main");
        assert_eq!(shorten_ref("refs/stash"), "stash");
        assert_eq!(shorten_ref("HEAD"), "HEAD");
    }
}
