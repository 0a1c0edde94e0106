use std::path::{Path, PathBuf};

use crate::error::ServerError;

/// The directory all served files are looked up beneath.
///
/// Fixed at construction and never written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRoot {
    dir: PathBuf,
}

impl ResourceRoot {
    /// Validates `dir` and stores its canonical absolute form.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, ServerError> {
        let dir = dir.as_ref();
        let invalid = |reason: String| ServerError::InvalidRoot {
            path: dir.to_path_buf(),
            reason,
        };

        let canonical = std::fs::canonicalize(dir).map_err(|e| invalid(e.to_string()))?;
        if !canonical.is_dir() {
            return Err(invalid("not a directory".to_string()));
        }

        Ok(Self { dir: canonical })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }
}

impl AsRef<Path> for ResourceRoot {
    fn as_ref(&self) -> &Path {
        &self.dir
    }
}
