//! Plumbing shared by the command-line tools.

use crate::nested::MissingField;
use crate::yaml::Yaml;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use tracing::{error, info};

/// Flags every bump tool accepts
#[derive(Debug, Clone, Default, clap::Args)]
pub struct CommonArgs {
    /// Release branch to bump from, e.g. `release-1.31`; overrides the version in the file
    #[arg(long, env = "BUMP_BRANCH")]
    pub branch: Option<String>,

    /// Fail when a field to update does not exist instead of skipping it
    #[arg(long, env = "BUMP_STRICT")]
    pub strict: bool,

    /// Print the updated document instead of writing it back
    #[arg(long)]
    pub dry_run: bool,
}

impl CommonArgs {
    /// The branch, if one was given and is not empty
    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref().filter(|branch| !branch.is_empty())
    }

    /// How missing fields are handled
    pub fn missing_field(&self) -> MissingField {
        if self.strict {
            MissingField::Error
        } else {
            MissingField::Ignore
        }
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// `path` if given, otherwise `default` under the working directory
pub fn resolve_path(path: Option<PathBuf>, default: &str) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path),
        None => Ok(std::env::current_dir()
            .context("failed to determine the working directory")?
            .join(default)),
    }
}

/// Read and parse a document; any syntax error is fatal
pub fn load(path: &Path) -> Result<Yaml> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read file {}", path.display()))?;
    Yaml::from_str(&text).with_context(|| format!("failed to decode {}", path.display()))
}

/// Write a document back, or print it to stdout on a dry run
pub fn store(path: &Path, yaml: &Yaml, dry_run: bool) -> Result<()> {
    if dry_run {
        print!("{}", yaml);
        return Ok(());
    }
    std::fs::write(path, yaml.to_string())
        .with_context(|| format!("failed to write updates to {}", path.display()))?;
    info!(path = %path.display(), "wrote updates");
    Ok(())
}

/// Run a tool's body, logging any error and turning it into the exit code
pub fn run(body: impl FnOnce() -> Result<()>) -> ExitCode {
    match body() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
