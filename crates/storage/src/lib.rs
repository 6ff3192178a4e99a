//! VibeInvite artifact storage adapter.
//!
//! Implements [`pipeline::ArtifactStore`] on the local filesystem: one
//! `<request_id>.html` file per request inside a shared output directory. The
//! directory is created on demand.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use pipeline::{ArtifactLocation, ArtifactStore, RequestId, StorageError};
use tracing::info;

/// Output directory used when none is configured.
pub const DEFAULT_OUTPUT_DIR: &str = "../vibe-artifacts-h5/outputs";

/// Writes artifacts as files under a root directory.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory documents are written to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path the artifact for `request_id` is written to.
    pub fn path_for(&self, request_id: &RequestId) -> Result<PathBuf, StorageError> {
        if !request_id.is_file_safe() {
            return Err(StorageError::UnsafeName(request_id.to_string()));
        }
        Ok(self.root.join(format!("{request_id}.html")))
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn persist(
        &self,
        request_id: &RequestId,
        html: &str,
    ) -> Result<ArtifactLocation, StorageError> {
        let path = self.path_for(request_id)?;
        let io_err = |source| StorageError::Io {
            path: path.display().to_string(),
            source,
        };

        tokio::fs::create_dir_all(&self.root).await.map_err(io_err)?;
        tokio::fs::write(&path, html.as_bytes()).await.map_err(io_err)?;

        info!(%request_id, path = %path.display(), bytes = html.len(), "artifact saved");
        Ok(ArtifactLocation::new(path))
    }
}
