//! Named byte streams

use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use super::error::{StagingError, StagingResult};

/// Stores and retrieves named byte streams
pub trait BlobStore {
    /// Store `data` under `name`, replacing any previous content
    fn put(&self, name: &str, data: &[u8]) -> StagingResult<()>;

    /// Fetch the content stored under `name`
    fn get(&self, name: &str) -> StagingResult<Vec<u8>>;

    /// Names of all stored blobs, sorted
    fn list(&self) -> StagingResult<Vec<String>>;
}

/// Blob store backed by a local directory
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Open (and create if needed) a store rooted at `root`
    pub fn open(root: impl Into<PathBuf>) -> StagingResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StagingError::io(&root, e))?;
        Ok(Self { root })
    }

    /// Directory holding the blobs
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> StagingResult<PathBuf> {
        let relative = Path::new(name);
        let plain = !name.is_empty()
            && relative.components().all(|c| matches!(c, Component::Normal(_)));
        if !plain {
            return Err(StagingError::InvalidBlobName { name: name.to_string() });
        }
        Ok(self.root.join(relative))
    }
}

impl BlobStore for LocalBlobStore {
    fn put(&self, name: &str, data: &[u8]) -> StagingResult<()> {
        let path = self.path_for(name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StagingError::io(parent, e))?;
        }
        fs::write(&path, data).map_err(|e| StagingError::io(&path, e))?;
        debug!("Stored {} bytes as {}", data.len(), path.display());
        Ok(())
    }

    fn get(&self, name: &str) -> StagingResult<Vec<u8>> {
        let path = self.path_for(name)?;
        if !path.is_file() {
            return Err(StagingError::BlobNotFound { name: name.to_string() });
        }
        fs::read(&path).map_err(|e| StagingError::io(&path, e))
    }

    fn list(&self) -> StagingResult<Vec<String>> {
        let entries = fs::read_dir(&self.root).map_err(|e| StagingError::io(&self.root, e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StagingError::io(&self.root, e))?;
            if entry.path().is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}
