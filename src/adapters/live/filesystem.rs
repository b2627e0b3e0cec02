//! Live filesystem adapter using `std::fs`.

use std::io::Read;
use std::path::{Path, PathBuf};

use crate::ports::filesystem::{FileSystem, PortError};

/// Live filesystem adapter backed by real disk I/O.
pub struct LiveFileSystem;

impl FileSystem for LiveFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String, PortError> {
        Ok(std::fs::read_to_string(path)?)
    }

    fn read_bytes(&self, path: &Path, max_bytes: u64) -> Result<(Vec<u8>, bool), PortError> {
        let file = std::fs::File::open(path)?;
        let len = file.metadata()?.len();
        let mut buf = Vec::new();
        file.take(max_bytes).read_to_end(&mut buf)?;
        Ok((buf, len > max_bytes))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), PortError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(std::fs::write(path, contents)?)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), PortError> {
        Ok(std::fs::rename(from, to)?)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf, PortError> {
        Ok(std::fs::canonicalize(path)?)
    }
}
