use crate::cli::CommonArgs;
use crate::git::GitRepo;
use crate::model::HistoryEntry;
use crate::since::{resolve_since, today};
use anyhow::Context;

pub const NO_COMMITS: &str = "No commits found for the given time range";

/// Commits in the requested window, plus the repository they came from.
pub struct History {
    pub repo: GitRepo,
    pub since: String,
    pub entries: Vec<HistoryEntry>,
}

pub fn fetch_history(common: &CommonArgs) -> anyhow::Result<History> {
    let repo = GitRepo::open(&common.repo).context("Failed to open git repository")?;

    let since = resolve_since(&common.since, today(), common.since_units());
    log::debug!("Resolved --since '{}' to '{since}'", common.since);

    let cutoff = repo
        .resolve_cutoff(&since)
        .context("Failed to resolve since date")?;
    log::info!("Collecting commits since {cutoff}");

    let entries = repo
        .collect_history(&cutoff)
        .context("Failed to collect commits from repository")?;

    Ok(History { repo, since, entries })
}
