use anyhow::Result;
use gitreport::cli::ReportCli;

fn main() -> Result<()> {
    let cli = ReportCli::parse();
    cli.execute()
}
