//! Task document model.
//!
//! Loads a plain-text task document into one immutable in-memory model at the
//! start of a run: the raw line array, a content fingerprint, and the task
//! tree (checkbox lines, IDs, indent-based parents, attached evidence lines).
//! Only the synchronizer ever produces a new version of the document, and it
//! does so by rewriting checkbox tokens in this line array.

use std::path::{Path, PathBuf};

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::context::ServiceContext;

/// Task ID pattern: uppercase prefix, dash, number (e.g. `TSK-100`).
pub const TASK_ID_PATTERN: &str = r"[A-Z][A-Z0-9]{1,9}-[0-9]+";

/// A raw evidence declaration line attached to a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceLine {
    /// Zero-based line number in the document.
    pub line_no: usize,
    /// The text after the `evidence:` keyword.
    pub text: String,
}

/// A single task parsed from the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Stable task identifier (e.g. `TSK-100`).
    pub id: String,
    /// Title text following the ID.
    pub title: String,
    /// Current completion-marker state.
    pub checked: bool,
    /// Zero-based line number of the task line.
    pub line_no: usize,
    /// Nesting depth (0 for top-level tasks).
    pub indent: usize,
    /// Parent task ID, for roll-up grouping.
    pub parent_id: Option<String>,
    /// Evidence declaration lines belonging to this task, in order.
    pub evidence: Vec<EvidenceLine>,
}

/// An immutable in-memory task document.
#[derive(Debug, Clone)]
pub struct TaskDocument {
    /// Where the document was loaded from.
    pub path: PathBuf,
    /// SHA-256 hex fingerprint of the raw content.
    pub fingerprint: String,
    /// The raw lines, without terminators.
    pub lines: Vec<String>,
    /// Whether the raw content ended with a newline.
    pub trailing_newline: bool,
    /// Parsed tasks in document order.
    pub tasks: Vec<Task>,
    /// Evidence lines that precede any task (line numbers).
    pub stray_evidence: Vec<usize>,
    /// Set when the indent structure is too ambiguous for roll-up.
    pub ambiguous_structure: Option<String>,
}

/// Computes the SHA-256 hex fingerprint of document content.
#[must_use]
pub fn fingerprint(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for byte in digest {
        use std::fmt::Write;
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Counts the indent level of a line (two spaces per level; tabs count as
/// one level).
fn indent_level(line: &str) -> usize {
    let mut spaces = 0;
    for ch in line.chars() {
        match ch {
            ' ' => spaces += 1,
            '\t' => spaces += 2,
            _ => break,
        }
    }
    spaces / 2
}

impl TaskDocument {
    /// Parses document content into the immutable model.
    ///
    /// Lines inside fenced code blocks and table lines are never treated as
    /// tasks or evidence.
    #[must_use]
    pub fn parse(path: &Path, content: &str) -> Self {
        let task_re = Regex::new(&format!(
            r"^\s*[-*] \[([ xX])\]\s+({TASK_ID_PATTERN})\b\s*(.*)$"
        ))
        .expect("task line pattern is valid");
        let evidence_re =
            Regex::new(r"^\s*evidence:\s*(\S.*)$").expect("evidence line pattern is valid");

        let lines: Vec<String> = content.lines().map(String::from).collect();
        let mut tasks: Vec<Task> = Vec::new();
        let mut stray_evidence = Vec::new();
        let mut ambiguous_structure = None;

        // Stack of (indent, task index) for parent assignment.
        let mut stack: Vec<(usize, usize)> = Vec::new();
        let mut in_fence = false;

        for (line_no, line) in lines.iter().enumerate() {
            let trimmed = line.trim_start();
            if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
                in_fence = !in_fence;
                continue;
            }
            if in_fence || trimmed.starts_with('|') {
                continue;
            }

            if let Some(caps) = task_re.captures(line) {
                let indent = indent_level(line);
                while stack.last().is_some_and(|&(level, _)| level >= indent) {
                    stack.pop();
                }
                if ambiguous_structure.is_none() {
                    let parent_level = stack.last().map_or(0, |&(level, _)| level + 1);
                    if indent > parent_level {
                        ambiguous_structure = Some(format!(
                            "line {}: indent jumps more than one level",
                            line_no + 1
                        ));
                    }
                }
                let parent_id =
                    stack.last().map(|&(_, index)| tasks[index].id.clone());
                let task = Task {
                    id: caps[2].to_string(),
                    title: caps[3].trim().to_string(),
                    checked: !caps[1].trim().is_empty(),
                    line_no,
                    indent,
                    parent_id,
                    evidence: Vec::new(),
                };
                stack.push((indent, tasks.len()));
                tasks.push(task);
            } else if let Some(caps) = evidence_re.captures(line) {
                let text = caps[1].trim_end().to_string();
                match tasks.last_mut() {
                    Some(task) => task.evidence.push(EvidenceLine { line_no, text }),
                    None => stray_evidence.push(line_no),
                }
            }
        }

        Self {
            path: path.to_path_buf(),
            fingerprint: fingerprint(content),
            lines,
            trailing_newline: content.ends_with('\n'),
            tasks,
            stray_evidence,
            ambiguous_structure,
        }
    }

    /// Loads and parses a task document from disk.
    ///
    /// # Errors
    ///
    /// Returns an error string if the file cannot be read.
    pub fn load(ctx: &ServiceContext, path: &Path) -> Result<Self, String> {
        let content = ctx
            .fs
            .read_to_string(path)
            .map_err(|e| format!("Failed to read task document {}: {e}", path.display()))?;
        Ok(Self::parse(path, &content))
    }

    /// Reassembles the document content from its line array.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = self.lines.join("\n");
        if self.trailing_newline {
            out.push('\n');
        }
        out
    }

    /// Finds a task by ID.
    #[must_use]
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// Returns the direct children of a task, in document order.
    #[must_use]
    pub fn children_of(&self, id: &str) -> Vec<&Task> {
        self.tasks.iter().filter(|task| task.parent_id.as_deref() == Some(id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# Release plan

- [ ] TSK-1 Wire up login
  evidence: code path=src/auth.rs symbol=login
  evidence: test path=tests/auth.rs
  - [x] TSK-2 Add session store
    evidence: code path=src/session.rs
- [x] TSK-3 Document the API
  evidence: docs path=docs/api.md heading=\"Auth endpoints\"
";

    #[test]
    fn parses_tasks_with_ids_titles_and_markers() {
        let doc = TaskDocument::parse(Path::new("plan.md"), SAMPLE);
        assert_eq!(doc.tasks.len(), 3);

        let first = &doc.tasks[0];
        assert_eq!(first.id, "TSK-1");
        assert_eq!(first.title, "Wire up login");
        assert!(!first.checked);
        assert_eq!(first.evidence.len(), 2);

        let third = &doc.tasks[2];
        assert_eq!(third.id, "TSK-3");
        assert!(third.checked);
    }

    #[test]
    fn nested_tasks_get_parents() {
        let doc = TaskDocument::parse(Path::new("plan.md"), SAMPLE);
        assert_eq!(doc.tasks[1].parent_id.as_deref(), Some("TSK-1"));
        assert!(doc.tasks[0].parent_id.is_none());
        assert!(doc.tasks[2].parent_id.is_none());

        let children = doc.children_of("TSK-1");
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, "TSK-2");
    }

    #[test]
    fn evidence_attaches_to_preceding_task() {
        let doc = TaskDocument::parse(Path::new("plan.md"), SAMPLE);
        assert_eq!(doc.tasks[1].evidence.len(), 1);
        assert_eq!(doc.tasks[1].evidence[0].text, "code path=src/session.rs");
    }

    #[test]
    fn fenced_blocks_and_tables_are_skipped() {
        let content = "\
- [ ] TSK-1 Real task
```
- [x] TSK-2 Inside a fence
evidence: code path=fake.rs
```
| - [ ] TSK-3 Inside a table |
";
        let doc = TaskDocument::parse(Path::new("plan.md"), content);
        assert_eq!(doc.tasks.len(), 1);
        assert_eq!(doc.tasks[0].id, "TSK-1");
        assert!(doc.tasks[0].evidence.is_empty());
    }

    #[test]
    fn stray_evidence_is_recorded() {
        let content = "evidence: code path=src/lib.rs\n- [ ] TSK-1 Task\n";
        let doc = TaskDocument::parse(Path::new("plan.md"), content);
        assert_eq!(doc.stray_evidence, vec![0]);
    }

    #[test]
    fn indent_jump_flags_ambiguous_structure() {
        let content = "\
- [ ] TSK-1 Top
        - [ ] TSK-2 Way too deep
";
        let doc = TaskDocument::parse(Path::new("plan.md"), content);
        assert!(doc.ambiguous_structure.is_some());
    }

    #[test]
    fn render_round_trips_content() {
        let doc = TaskDocument::parse(Path::new("plan.md"), SAMPLE);
        assert_eq!(doc.render(), SAMPLE);
    }

    #[test]
    fn fingerprint_is_stable_and_content_sensitive() {
        let a = fingerprint("hello\n");
        let b = fingerprint("hello\n");
        let c = fingerprint("hello!\n");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.md");
        std::fs::write(&path, SAMPLE).unwrap();

        let ctx = crate::context::testing::fixed_context();
        let doc = TaskDocument::load(&ctx, &path).unwrap();
        assert_eq!(doc.tasks.len(), 3);
        assert_eq!(doc.fingerprint, fingerprint(SAMPLE));
    }
}
