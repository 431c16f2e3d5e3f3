use anyhow::Result;
use gitreport::cli::ExportCli;

fn main() -> Result<()> {
    let cli = ExportCli::parse();
    cli.execute()
}
