use crate::chart::ChartTheme;
use crate::document::Converter;
use crate::export::ExportTarget;
use crate::report::ReportOptions;
use crate::since::{SinceUnits, DEFAULT_SINCE};
use anyhow::Result;
use clap::{Args, Parser, ValueEnum};
use std::path::PathBuf;

pub const DEFAULT_REPORT_DIR: &str = ".gitreport";
pub const DEFAULT_EXPORT_PATH: &str = "dashboard/public/data/git-data.json";

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    None,
    /// Only error messages
    Error,
    /// Warning and error messages
    Warn,
    /// Info, warning, and error messages
    Info,
    /// Debug and above messages
    Debug,
    /// All messages including trace
    Trace,
}

#[derive(Args, Clone, Debug)]
pub struct CommonArgs {
    #[arg(long, help = "Path to git repository", default_value = ".")]
    pub repo: PathBuf,

    #[arg(
        long,
        help = "Time range, e.g. '90 days ago', a YYYY-MM-DD date or a revision",
        default_value = DEFAULT_SINCE,
        allow_hyphen_values = true
    )]
    pub since: String,

    #[arg(long, help = "Honour the unit in '<N> <unit> ago' instead of reading N as days")]
    pub honor_units: bool,

    #[arg(long, value_enum, value_name = "LEVEL", default_value = "warn", help = "Diagnostic log level (RUST_LOG overrides)")]
    pub log_level: LogLevel,
}

impl CommonArgs {
    pub fn since_units(&self) -> SinceUnits {
        if self.honor_units {
            SinceUnits::Honor
        } else {
            SinceUnits::Ignore
        }
    }

    pub fn init_logging(&self) {
        let level = match self.log_level {
            LogLevel::None => return,
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        };

        let env = env_logger::Env::default().filter_or("RUST_LOG", level);
        let _ = env_logger::Builder::from_env(env)
            .format_timestamp(None)
            .format_module_path(false)
            .format_target(matches!(self.log_level, LogLevel::Debug | LogLevel::Trace))
            .try_init();
    }
}

#[derive(Parser, Debug)]
#[command(name = "gitreport")]
#[command(about = "Git activity report: charts, history dumps and a Markdown/PDF/HTML summary")]
#[command(version)]
pub struct ReportCli {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[arg(long, help = "Output directory", default_value = DEFAULT_REPORT_DIR)]
    pub out: PathBuf,

    #[arg(long, help = "Skip the PDF and HTML conversions")]
    pub no_convert: bool,

    #[arg(long, help = "pandoc executable used for conversions", default_value = "pandoc")]
    pub pandoc: PathBuf,
}

impl ReportCli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> Result<()> {
        self.common.init_logging();
        let options = ReportOptions {
            out_dir: self.out,
            converter: (!self.no_convert).then(|| Converter::new(self.pandoc)),
            theme: ChartTheme::default(),
        };
        crate::report::exec(&self.common, &options)
    }
}

#[derive(Parser, Debug)]
#[command(name = "git-export")]
#[command(about = "Export aggregated git history as JSON for the dashboard")]
#[command(version)]
pub struct ExportCli {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[arg(long, help = "Output JSON file path", default_value = DEFAULT_EXPORT_PATH)]
    pub out: PathBuf,

    #[arg(long, help = "Write the JSON document to stdout instead of --out", conflicts_with = "out")]
    pub stdout: bool,
}

impl ExportCli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> Result<()> {
        self.common.init_logging();
        let target = if self.stdout {
            ExportTarget::Stdout
        } else {
            ExportTarget::File(self.out)
        };
        crate::export::exec(&self.common, &target)
    }
}
