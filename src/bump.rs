//! Minor version bumps for release metadata files.
//!
//! Two file layouts are supported: a Helm chart descriptor (`Chart.yaml`) with
//! top-level `version` and `appVersion`, and the operator project descriptor
//! (`project.yaml`) whose upgrade graph fields under `olm` must move along
//! with `project.version`.

use crate::error::YamlError;
use crate::nested::{FieldPath, MissingField};
use crate::value::YamlValue;
use crate::yaml::Yaml;
use semver::Version;
use tracing::{debug, info, warn};

/// Errors raised while planning or applying a bump
#[derive(Debug, thiserror::Error)]
pub enum BumpError {
    /// A field the bump is computed from is absent or empty
    #[error("field '{0}' is missing or empty")]
    MissingField(FieldPath),

    /// A version field does not hold a semantic version
    #[error("invalid version '{value}'")]
    InvalidVersion {
        /// The offending text
        value: String,
        /// Why it was rejected
        #[source]
        source: semver::Error,
    },

    /// A branch name does not end in `<major>.<minor>`
    #[error("invalid release branch '{branch}'")]
    InvalidBranch {
        /// The branch as given
        branch: String,
        /// Why the derived version was rejected
        #[source]
        source: semver::Error,
    },

    /// Reading or writing the document failed
    #[error(transparent)]
    Yaml(#[from] YamlError),
}

/// Parse a semantic version, ignoring surrounding whitespace
pub fn parse_version(value: &str) -> Result<Version, BumpError> {
    Version::parse(value.trim()).map_err(|source| BumpError::InvalidVersion {
        value: value.to_string(),
        source,
    })
}

/// The release a branch name stands for: `release-1.31` is `1.31.0`
pub fn branch_version(branch: &str) -> Result<Version, BumpError> {
    let major_minor = branch.replacen("release-", "", 1);
    Version::parse(&format!("{}.0", major_minor)).map_err(|source| BumpError::InvalidBranch {
        branch: branch.to_string(),
        source,
    })
}

/// The release being cut: the branch's version when a branch is given,
/// otherwise `current` with the patch number dropped.
pub fn release_version(current: &Version, branch: Option<&str>) -> Result<Version, BumpError> {
    match branch {
        Some(branch) => branch_version(branch),
        None => {
            let mut version = current.clone();
            version.patch = 0;
            Ok(version)
        }
    }
}

/// The next minor release; patch, pre-release and build metadata are cleared
pub fn next_minor(version: &Version) -> Version {
    Version::new(version.major, version.minor + 1, 0)
}

/// The minor release before `version`, if there is one
pub fn previous_minor(version: &Version) -> Option<Version> {
    let minor = version.minor.checked_sub(1)?;
    Some(Version::new(version.major, minor, 0))
}

/// An OLM skip range covering every release from `from` up to, not including, `to`
pub fn skip_range(from: &Version, to: &Version) -> String {
    format!(">={} <{}", from, to)
}

/// A single field to write
#[derive(Debug, Clone, PartialEq)]
pub struct FieldUpdate {
    /// Where to write
    pub path: FieldPath,
    /// What to write
    pub value: YamlValue,
}

/// The fields a bump writes, computed up front from the document
#[derive(Debug, Clone, PartialEq)]
pub struct BumpPlan {
    /// The release being cut
    pub current: Version,
    /// The release after it
    pub next: Version,
    /// Updates, in the order they are applied
    pub updates: Vec<FieldUpdate>,
}

fn path(dotted: &str) -> Result<FieldPath, BumpError> {
    Ok(dotted.parse()?)
}

/// Read the version at `dotted` unless a branch overrides it.
fn current_release(yaml: &Yaml, dotted: &str, branch: Option<&str>) -> Result<Version, BumpError> {
    if let Some(branch) = branch {
        return branch_version(branch);
    }
    let version_path = path(dotted)?;
    let value = yaml
        .get_nested_string(&version_path)
        .filter(|value| !value.trim().is_empty())
        .ok_or(BumpError::MissingField(version_path))?;
    release_version(&parse_version(&value)?, None)
}

impl BumpPlan {
    fn new(current: Version) -> Self {
        let next = next_minor(&current);
        Self {
            current,
            next,
            updates: Vec::new(),
        }
    }

    fn push(&mut self, dotted: &str, value: impl Into<YamlValue>) -> Result<(), BumpError> {
        self.updates.push(FieldUpdate {
            path: path(dotted)?,
            value: value.into(),
        });
        Ok(())
    }

    /// Plan the bump of a Helm chart descriptor: `version` and `appVersion`
    /// both move to the next minor release.
    pub fn for_chart(yaml: &Yaml, branch: Option<&str>) -> Result<Self, BumpError> {
        let mut plan = Self::new(current_release(yaml, "version", branch)?);
        let next = plan.next.to_string();
        plan.push("version", next.as_str())?;
        plan.push("appVersion", next.as_str())?;
        Ok(plan)
    }

    /// Plan the bump of the operator project descriptor.
    pub fn for_project(yaml: &Yaml, branch: Option<&str>) -> Result<Self, BumpError> {
        let mut plan = Self::new(current_release(yaml, "project.version", branch)?);
        let current = plan.current.clone();
        let next = plan.next.clone();

        plan.push("project.version", &next)?;
        plan.push("dependencies.redhat-knative-istio-authz-chart", &next)?;
        plan.push("olm.replaces", &current)?;
        plan.push("olm.skipRange", skip_range(&current, &next))?;

        let stable = format!("stable-{}.{}", next.major, next.minor);
        let channels = match yaml.get_nested_string(&path("olm.channels.default")?) {
            Some(default) => vec![default, stable],
            None => {
                warn!("olm.channels.default is not set, listing only {}", stable);
                vec![stable]
            }
        };
        plan.push("olm.channels.list", channels)?;

        for component in ["serving", "eventing", "eventing_kafka_broker"] {
            let dependency = format!("dependencies.{}", component);
            match yaml.get_nested_string(&path(&dependency)?) {
                Some(version) => {
                    plan.push(&format!("dependencies.previous.{}", component), version)?
                }
                None => debug!("{} is not set, keeping its previous version", dependency),
            }
        }

        match previous_minor(&current) {
            Some(previous) => {
                plan.push("olm.previous.replaces", &previous)?;
                plan.push("olm.previous.skipRange", skip_range(&previous, &current))?;
            }
            None => warn!(
                "{} has no previous minor release, leaving olm.previous untouched",
                current
            ),
        }

        Ok(plan)
    }

    /// Write every planned field into `yaml`.
    pub fn apply(&self, yaml: &mut Yaml, missing: MissingField) -> Result<(), BumpError> {
        for update in &self.updates {
            info!(field = %update.path, value = %update.value, "setting field");
            yaml.set_nested_field(update.value.clone(), &update.path, missing)?;
        }
        Ok(())
    }
}
