//! Filesystem port for file I/O operations.

use std::path::{Path, PathBuf};

/// Boxed error type returned by port methods.
pub type PortError = Box<dyn std::error::Error + Send + Sync>;

/// Provides filesystem access for reading and writing files.
///
/// Abstracting the filesystem keeps all disk access behind one seam, so the
/// synchronizer's atomic-replace discipline and the resolver's bounded reads
/// are enforced in a single place.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or is not valid UTF-8.
    fn read_to_string(&self, path: &Path) -> Result<String, PortError>;

    /// Reads up to `max_bytes` bytes of a file.
    ///
    /// Returns the bytes read and `true` when the file was larger than the
    /// bound and the read was truncated.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read.
    fn read_bytes(&self, path: &Path, max_bytes: u64) -> Result<(Vec<u8>, bool), PortError>;

    /// Writes the given contents to a file, creating or overwriting it.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails (permissions, disk full, etc.).
    fn write(&self, path: &Path, contents: &str) -> Result<(), PortError>;

    /// Renames `from` to `to`, replacing `to` if it exists.
    ///
    /// On the live adapter this is the atomic step of temp-write-then-rename.
    ///
    /// # Errors
    ///
    /// Returns an error if the rename fails.
    fn rename(&self, from: &Path, to: &Path) -> Result<(), PortError>;

    /// Returns `true` if the path exists on the filesystem.
    fn exists(&self, path: &Path) -> bool;

    /// Resolves a path to its canonical form, following symlinks.
    ///
    /// Used by the resolver to detect symlink escapes from the project root.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not exist or cannot be resolved.
    fn canonicalize(&self, path: &Path) -> Result<PathBuf, PortError>;
}
