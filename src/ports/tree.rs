//! Project-tree enumeration port.

use std::path::Path;

use super::filesystem::PortError;

/// Result of enumerating a project tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeScan {
    /// Root-relative file paths with `/` separators, in walk order.
    pub files: Vec<String>,
    /// `true` when the walk stopped because the file budget was exhausted.
    pub limit_reached: bool,
}

/// Enumerates files under a project root.
///
/// The walk is read-only, bounded by configured ignore patterns and a global
/// file budget shared across the run.
pub trait TreeWalker: Send + Sync {
    /// Lists files under `root`, skipping any path whose relative form
    /// contains one of the `ignore` substrings, stopping after `max_files`.
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be read at all. Unreadable
    /// subtrees are skipped, not fatal.
    fn walk(&self, root: &Path, ignore: &[String], max_files: usize)
        -> Result<TreeScan, PortError>;
}
