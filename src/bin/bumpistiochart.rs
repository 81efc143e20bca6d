//! Bump `version` and `appVersion` of a Helm chart descriptor to the next minor release.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use yaml_bump::cli::{self, CommonArgs};
use yaml_bump::BumpPlan;

#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Chart metadata file to update [default: ./Chart.yaml]
    #[arg(long)]
    chart_metadata_path: Option<PathBuf>,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> ExitCode {
    let args = Args::parse();
    cli::init_tracing();

    cli::run(|| {
        let path = cli::resolve_path(args.chart_metadata_path, "Chart.yaml")?;
        let mut chart = cli::load(&path)?;

        let plan = BumpPlan::for_chart(&chart, args.common.branch())?;
        info!(current = %plan.current, next = %plan.next, "bumping chart");
        plan.apply(&mut chart, args.common.missing_field())?;

        cli::store(&path, &chart, args.common.dry_run)
    })
}
