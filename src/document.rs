//! `summary.md` assembly and conversion to PDF/HTML through pandoc.

use crate::chart::{AUTHORS_CHART, CHURN_CHART, COMMITS_CHART, HEATMAP_CHART};
use crate::error::{GitReportError, Result};
use crate::metadata::MetadataDumps;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

pub const SUMMARY_FILE: &str = "summary.md";

pub fn render_summary(dumps: &MetadataDumps) -> String {
    let mut md = String::from("# Git Activity Report\n\n");

    for (heading, body) in [
        ("Commit Graph", &dumps.log_graph),
        ("Top Contributors", &dumps.shortlog),
        ("LOC Stats", &dumps.stats),
    ] {
        md.push_str(&format!("## {heading}\n```\n{body}\n```\n\n"));
    }

    let images = [
        ("Commits Over Time", "Commits", COMMITS_CHART),
        ("Author Contribution", "Authors", AUTHORS_CHART),
        ("Commit Heatmap", "Heatmap", HEATMAP_CHART),
        ("Code Churn", "LOC Effort", CHURN_CHART),
    ];
    let sections: Vec<String> = images
        .iter()
        .map(|(heading, alt, file)| format!("## {heading}\n![{alt}]({file})\n"))
        .collect();
    md.push_str(&sections.join("\n"));

    md
}

pub fn write_summary(out_dir: &Path, dumps: &MetadataDumps) -> Result<PathBuf> {
    let path = out_dir.join(SUMMARY_FILE);
    fs::write(&path, render_summary(dumps))?;
    log::debug!("Wrote {}", path.display());
    Ok(path)
}

/// External Markdown converter (pandoc).
#[derive(Debug, Clone)]
pub struct Converter {
    program: PathBuf,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new("pandoc")
    }
}

impl Converter {
    pub fn new<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn to_pdf(&self, markdown: &Path) -> Result<PathBuf> {
        let pdf = markdown.with_extension("pdf");
        let resource_path = markdown.parent().unwrap_or_else(|| Path::new("."));

        let mut cmd = Command::new(&self.program);
        cmd.arg(markdown)
            .arg("-o")
            .arg(&pdf)
            .arg("--resource-path")
            .arg(resource_path)
            .arg("--pdf-engine=xelatex");
        self.run(cmd)?;
        Ok(pdf)
    }

    pub fn to_html(&self, markdown: &Path) -> Result<PathBuf> {
        let html = markdown.with_extension("html");

        let mut cmd = Command::new(&self.program);
        cmd.arg(markdown).arg("-o").arg(&html);
        self.run(cmd)?;
        Ok(html)
    }

    fn run(&self, mut cmd: Command) -> Result<()> {
        log::debug!("Running {cmd:?}");
        let output = cmd
            .stdin(Stdio::null())
            .output()
            .map_err(|e| GitReportError::Conversion(format!("{}: {e}", self.program.display())))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(GitReportError::Conversion(format!(
            "{} exited with {}: {}",
            self.program.display(),
            output.status,
            stderr.trim()
        )))
    }
}
