//! Artifact delivery.
//!
//! The pipeline hands each validated artifact to an [`ArtifactStore`] and
//! records the returned [`Locator`]. Stores never see the pipeline's state.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::info;

/// Errors raised by an artifact store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read artifact {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write to store at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Where an artifact should land inside a store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Destination {
    pub folder: String,
    pub name: String,
}

impl Destination {
    pub fn new(folder: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            name: name.into(),
        }
    }
}

/// How the caller retrieves a delivered artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Locator {
    Url(String),
    Bytes(Vec<u8>),
}

impl Locator {
    pub fn as_url(&self) -> Option<&str> {
        match self {
            Self::Url(url) => Some(url),
            Self::Bytes(_) => None,
        }
    }
}

/// Storage collaborator receiving finished artifacts
pub trait ArtifactStore: Send + Sync {
    fn upload(&self, artifact: &Path, destination: &Destination) -> Result<Locator, StoreError>;

    /// Human-readable name for logs
    fn name(&self) -> &str;
}

/// Copies artifacts under a root directory and returns `file://` URLs
#[derive(Debug, Clone)]
pub struct LocalDirectoryStore {
    root: PathBuf,
}

impl LocalDirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ArtifactStore for LocalDirectoryStore {
    fn upload(&self, artifact: &Path, destination: &Destination) -> Result<Locator, StoreError> {
        let folder = self.root.join(&destination.folder);
        fs::create_dir_all(&folder).map_err(|source| StoreError::Write {
            path: folder.clone(),
            source,
        })?;

        let target = folder.join(&destination.name);
        fs::copy(artifact, &target).map_err(|source| {
            if artifact.exists() {
                StoreError::Write {
                    path: target.clone(),
                    source,
                }
            } else {
                StoreError::Read {
                    path: artifact.to_path_buf(),
                    source,
                }
            }
        })?;

        let absolute = fs::canonicalize(&target).unwrap_or(target);
        info!("Stored {} at {}", artifact.display(), absolute.display());
        Ok(Locator::Url(format!("file://{}", absolute.display())))
    }

    fn name(&self) -> &str {
        "local-directory"
    }
}

/// Hands the artifact back to the caller as raw bytes
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineStore;

impl ArtifactStore for InlineStore {
    fn upload(&self, artifact: &Path, _destination: &Destination) -> Result<Locator, StoreError> {
        fs::read(artifact)
            .map(Locator::Bytes)
            .map_err(|source| StoreError::Read {
                path: artifact.to_path_buf(),
                source,
            })
    }

    fn name(&self) -> &str {
        "inline"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_store_copies_into_folder() {
        let work = tempfile::tempdir().unwrap();
        let store_root = tempfile::tempdir().unwrap();
        let artifact = work.path().join("a.dxf");
        fs::write(&artifact, b"0\nEOF\n").unwrap();

        let store = LocalDirectoryStore::new(store_root.path());
        let locator = store
            .upload(&artifact, &Destination::new("outputs", "a.dxf"))
            .unwrap();

        let url = locator.as_url().unwrap();
        assert!(url.starts_with("file://"));
        assert!(url.ends_with("a.dxf"));
        let copied = store_root.path().join("outputs").join("a.dxf");
        assert_eq!(fs::read(copied).unwrap(), b"0\nEOF\n");
    }

    #[test]
    fn missing_artifact_is_a_read_error() {
        let store_root = tempfile::tempdir().unwrap();
        let store = LocalDirectoryStore::new(store_root.path());
        let err = store
            .upload(Path::new("/nonexistent/x.stl"), &Destination::new("o", "x.stl"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Read { .. }));
    }

    #[test]
    fn inline_store_returns_bytes() {
        let work = tempfile::tempdir().unwrap();
        let artifact = work.path().join("a.svg");
        fs::write(&artifact, "<svg/>").unwrap();
        let locator = InlineStore.upload(&artifact, &Destination::new("o", "a.svg")).unwrap();
        assert_eq!(locator, Locator::Bytes(b"<svg/>".to_vec()));
        assert!(locator.as_url().is_none());
    }
}
