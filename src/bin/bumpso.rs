//! Bump the serverless operator project descriptor to the next minor release.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use yaml_bump::cli::{self, CommonArgs};
use yaml_bump::BumpPlan;

const DEFAULT_PROJECT_PATH: &str = "olm-catalog/serverless-operator/project.yaml";

#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Project descriptor to update [default: ./olm-catalog/serverless-operator/project.yaml]
    #[arg(long)]
    project_path: Option<PathBuf>,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> ExitCode {
    let args = Args::parse();
    cli::init_tracing();

    cli::run(|| {
        let path = cli::resolve_path(args.project_path, DEFAULT_PROJECT_PATH)?;
        let mut project = cli::load(&path)?;

        let plan = BumpPlan::for_project(&project, args.common.branch())?;
        info!(current = %plan.current, next = %plan.next, "bumping project");
        plan.apply(&mut project, args.common.missing_field())?;

        cli::store(&path, &project, args.common.dry_run)
    })
}
