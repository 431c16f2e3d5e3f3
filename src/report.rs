use crate::aggregate::{Aggregates, CommitTable};
use crate::chart::{self, ChartTheme};
use crate::cli::CommonArgs;
use crate::document::{self, Converter};
use crate::history::{fetch_history, NO_COMMITS};
use crate::metadata::MetadataDumps;
use anyhow::Context;
use console::style;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub out_dir: PathBuf,
    /// `None` skips the PDF and HTML conversions.
    pub converter: Option<Converter>,
    pub theme: ChartTheme,
}

pub fn exec(common: &CommonArgs, options: &ReportOptions) -> anyhow::Result<()> {
    let history = fetch_history(common)?;

    if history.entries.is_empty() {
        println!("{} {NO_COMMITS}.", style("!").yellow().bold());
        return Ok(());
    }

    let out_dir = &options.out_dir;
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

    let table = CommitTable::from_records(history.entries.iter().map(|entry| entry.record.clone()));
    let aggregates = Aggregates::compute(&table);

    chart::render_all(&aggregates, out_dir, &options.theme).context("Failed to render charts")?;

    let decorations = history
        .repo
        .decorations()
        .context("Failed to read repository references")?;
    let user = history.repo.user_name();
    let dumps = MetadataDumps::build(&history.entries, &decorations, user.as_deref());
    dumps.write(out_dir).context("Failed to write history dumps")?;

    let summary = document::write_summary(out_dir, &dumps).context("Failed to write summary")?;

    if let Some(converter) = &options.converter {
        convert(converter, &summary);
    }

    println!(
        "{} All output saved to: {}",
        style("✓").green().bold(),
        out_dir.display()
    );
    Ok(())
}

/// Conversion failures are reported and otherwise ignored.
fn convert(converter: &Converter, summary: &Path) {
    let attempts = [
        ("PDF", converter.to_pdf(summary)),
        ("HTML", converter.to_html(summary)),
    ];

    for (kind, result) in attempts {
        match result {
            Ok(path) => println!(
                "{} {kind} summary created: {}",
                style("✓").green().bold(),
                path.display()
            ),
            Err(e) => log::warn!("{kind} summary not created, pandoc not available or failed: {e}"),
        }
    }
}
