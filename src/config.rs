//! Run configuration: policies, logical groups, ignore patterns, scan limits.
//!
//! A `RunConfig` is loaded once per run (from YAML or defaults) and passed by
//! value into the verifier, synchronizer, and remediation planner so the same
//! run is fully reproducible from its inputs.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::context::ServiceContext;
use crate::matcher::ConfidenceBand;

/// Error loading or parsing a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {detail}")]
    Read {
        /// The configuration file path.
        path: String,
        /// The underlying read error.
        detail: String,
    },
    /// The configuration file is not valid YAML for `RunConfig`.
    #[error("failed to parse config {path}: {detail}")]
    Parse {
        /// The configuration file path.
        path: String,
        /// The underlying YAML error.
        detail: String,
    },
}

/// A configured clustering of related code areas.
///
/// A file belongs to the first group whose prefix matches its path. Groups
/// bias the fuzzy path search toward relevant candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalGroup {
    /// Group name, referenced by `related` lists.
    pub name: String,
    /// Path prefixes that place a file in this group.
    pub prefixes: Vec<String>,
    /// Names of groups considered related to this one.
    #[serde(default)]
    pub related: Vec<String>,
}

impl LogicalGroup {
    /// Returns `true` if the given root-relative path belongs to this group.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }
}

/// Finds the logical group a path belongs to, if any.
#[must_use]
pub fn group_of<'a>(groups: &'a [LogicalGroup], path: &str) -> Option<&'a LogicalGroup> {
    groups.iter().find(|group| group.contains(path))
}

/// Returns `true` if the two groups are the same or configured as related.
#[must_use]
pub fn groups_related(a: &LogicalGroup, b: &LogicalGroup) -> bool {
    a.name == b.name || a.related.contains(&b.name) || b.related.contains(&a.name)
}

/// Global budget for the project-tree scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanLimits {
    /// Maximum number of files enumerated across the whole run.
    pub max_files: usize,
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self { max_files: 50_000 }
    }
}

/// Policy knobs for the verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyPolicy {
    /// Worker threads for per-task evidence resolution.
    pub workers: usize,
    /// Optional whole-run deadline in milliseconds.
    pub deadline_ms: Option<u64>,
}

impl Default for VerifyPolicy {
    fn default() -> Self {
        Self { workers: 4, deadline_ms: None }
    }
}

/// What the synchronizer does with `needs_manual` tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeedsManualPolicy {
    /// Uncheck the task (default).
    Uncheck,
    /// Leave the checkbox as it currently is.
    Leave,
}

/// Policy knobs for the synchronizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncPolicy {
    /// Whether `verified` at `medium` confidence counts as done.
    ///
    /// Off by default: medium confidence is never treated as done unless
    /// explicitly configured.
    pub treat_medium_as_verified: bool,
    /// Handling of `needs_manual` tasks.
    pub needs_manual: NeedsManualPolicy,
    /// Whether parent tasks roll up from their children.
    pub rollup: bool,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            treat_medium_as_verified: false,
            needs_manual: NeedsManualPolicy::Uncheck,
            rollup: false,
        }
    }
}

/// Policy knobs for the remediation planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemediatePolicy {
    /// Minimum confidence band for automatic path substitution.
    pub auto_apply_floor: ConfidenceBand,
}

impl Default for RemediatePolicy {
    fn default() -> Self {
        Self { auto_apply_floor: ConfidenceBand::Medium }
    }
}

/// Complete configuration for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RunConfig {
    /// Path substrings excluded from the tree walk.
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,
    /// Logical groups used by the fuzzy path matcher.
    pub groups: Vec<LogicalGroup>,
    /// Tree-scan budget.
    pub scan: ScanLimits,
    /// Verifier policy.
    pub verify: VerifyPolicy,
    /// Synchronizer policy.
    pub sync: SyncPolicy,
    /// Remediation policy.
    pub remediate: RemediatePolicy,
}

fn default_ignore() -> Vec<String> {
    [".git", "node_modules", "target", "dist", "build", ".attest"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl RunConfig {
    /// Loads configuration from a YAML file, or returns defaults when no
    /// path is given.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or parsed.
    pub fn load_or_default(
        ctx: &ServiceContext,
        path: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::with_default_ignore());
        };
        let contents = ctx.fs.read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            detail: e.to_string(),
        })?;
        serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            detail: e.to_string(),
        })
    }

    /// Returns the default configuration including the default ignore list.
    #[must_use]
    pub fn with_default_ignore() -> Self {
        Self { ignore: default_ignore(), ..Self::default() }
    }
}
