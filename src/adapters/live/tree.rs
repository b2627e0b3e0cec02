//! Live project-tree walker built on `walkdir`.

use std::path::Path;

use walkdir::WalkDir;

use crate::ports::filesystem::PortError;
use crate::ports::tree::{TreeScan, TreeWalker};

/// Live tree walker backed by a real directory walk.
///
/// Entries are visited in sorted order so repeated walks of the same tree
/// produce identical file lists.
pub struct LiveTreeWalker;

/// Converts an absolute entry path into a root-relative `/`-separated string.
fn relative_path(root: &Path, entry: &Path) -> Option<String> {
    let rel = entry.strip_prefix(root).ok()?;
    let mut out = String::new();
    for component in rel.components() {
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(&component.as_os_str().to_string_lossy());
    }
    Some(out)
}

fn is_ignored(rel: &str, ignore: &[String]) -> bool {
    ignore.iter().any(|pattern| rel.contains(pattern.as_str()))
}

impl TreeWalker for LiveTreeWalker {
    fn walk(
        &self,
        root: &Path,
        ignore: &[String],
        max_files: usize,
    ) -> Result<TreeScan, PortError> {
        if !root.is_dir() {
            return Err(format!("not a directory: {}", root.display()).into());
        }

        let mut files = Vec::new();
        let mut limit_reached = false;

        let walker = WalkDir::new(root).sort_by_file_name().into_iter().filter_entry(|entry| {
            relative_path(root, entry.path())
                .is_none_or(|rel| rel.is_empty() || !is_ignored(&rel, ignore))
        });

        for entry in walker {
            // Unreadable subtrees are skipped, not fatal.
            let Ok(entry) = entry else { continue };
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(rel) = relative_path(root, entry.path()) else { continue };
            if files.len() >= max_files {
                limit_reached = true;
                break;
            }
            files.push(rel);
        }

        Ok(TreeScan { files, limit_reached })
    }
}
