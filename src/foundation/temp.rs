use std::path::{Path, PathBuf};

use tempfile::TempPath;

use crate::foundation::error::TokenpressResult;

/// Temp files owned by one pipeline stage.
///
/// Every path handed out is registered here and removed by [`TempFiles::cleanup`] or on drop,
/// whichever comes first. Removal failures are logged, never returned, so they cannot replace an
/// error the stage is already propagating.
pub struct TempFiles {
    owner: String,
    dir: Option<PathBuf>,
    paths: Vec<TempPath>,
}

impl TempFiles {
    /// Create an empty registry. `owner` only shows up in log messages.
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            dir: None,
            paths: Vec::new(),
        }
    }

    /// Create temp files under `dir` instead of the system temp directory.
    pub fn in_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.dir = dir;
        self
    }

    /// Reserve a fresh, empty file with the given suffix (e.g. `".svg"`).
    pub fn reserve(&mut self, suffix: &str) -> TokenpressResult<PathBuf> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("tokenpress-").suffix(suffix);
        let file = match self.dir.as_deref() {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        let temp = file.into_temp_path();
        let path = temp.to_path_buf();
        self.paths.push(temp);
        Ok(path)
    }

    /// Reserve a file and write `bytes` into it verbatim.
    pub fn write(&mut self, suffix: &str, bytes: &[u8]) -> TokenpressResult<PathBuf> {
        let path = self.reserve(suffix)?;
        std::fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Take ownership of a path created by someone else on this stage's behalf.
    pub fn adopt(&mut self, path: impl AsRef<Path>) -> TokenpressResult<()> {
        self.paths.push(TempPath::try_from_path(path.as_ref())?);
        Ok(())
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(|p| p.as_ref())
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Delete every registered file. Safe to call repeatedly.
    pub fn cleanup(&mut self) {
        for temp in self.paths.drain(..) {
            let path = temp.to_path_buf();
            if let Err(e) = temp.close() {
                tracing::warn!(
                    owner = %self.owner,
                    path = %path.display(),
                    "could not delete temp file: {e}"
                );
            }
        }
    }
}

impl Drop for TempFiles {
    fn drop(&mut self) {
        self.cleanup();
    }
}

impl std::fmt::Debug for TempFiles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TempFiles")
            .field("owner", &self.owner)
            .field("paths", &self.paths().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/temp.rs"]
mod tests;
