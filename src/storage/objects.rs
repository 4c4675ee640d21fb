//! Object storage for generated images.
//!
//! Objects are addressed by a relative key and exposed through a URL. The filesystem
//! implementation lays keys out under a root directory:
//!
//! `{root}/sheets/{sheet_id}/frames/r{row}_c{col}-{digest}.{ext}`
//! `{root}/sheets/{sheet_id}/sheet-{digest}.png`

use crate::error::StorageError;
use crate::provider::extension_for_mime;
use crate::sheet::Position;
use crate::types::short_digest;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Binary object storage capability.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `key`, returning the public URL of the object.
    async fn store(&self, bytes: &[u8], content_type: &str, key: &str)
        -> Result<String, StorageError>;

    /// Fetch an object previously returned by [`ObjectStore::store`].
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, StorageError>;
}

/// Content-addressed key for a frame image.
pub fn frame_object_key(sheet_id: &str, position: Position, bytes: &[u8], mime_type: &str) -> String {
    format!(
        "sheets/{}/frames/r{}_c{}-{}.{}",
        sheet_id,
        position.row,
        position.col,
        short_digest(bytes),
        extension_for_mime(mime_type)
    )
}

/// Content-addressed key for a composite sheet image.
pub fn composite_object_key(sheet_id: &str, bytes: &[u8]) -> String {
    format!("sheets/{}/sheet-{}.png", sheet_id, short_digest(bytes))
}

/// Filesystem-backed object store.
///
/// URLs are `{public_base_url}/{key}` when a base URL is configured, otherwise
/// `file://{root}/{key}`.
pub struct FilesystemObjectStore {
    root: PathBuf,
    public_base_url: Option<String>,
}

impl FilesystemObjectStore {
    pub fn new<P: AsRef<Path>>(root: P, public_base_url: Option<String>) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root).map_err(|e| {
            StorageError::IoError(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Failed to create object directory at {:?}: {}", root, e),
            ))
        })?;
        Ok(Self {
            root,
            public_base_url: public_base_url.map(|u| u.trim_end_matches('/').to_string()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn url_for(&self, key: &str) -> String {
        match &self.public_base_url {
            Some(base) => format!("{}/{}", base, key),
            None => format!("file://{}", self.root.join(key).display()),
        }
    }

    /// Map a URL produced by this store back to a path on disk.
    fn path_for_url(&self, url: &str) -> Result<PathBuf, StorageError> {
        let key = match &self.public_base_url {
            Some(base) => url.strip_prefix(base.as_str()).map(|k| k.trim_start_matches('/')),
            None => None,
        };
        let path = match key {
            Some(key) => self.root.join(key),
            None => {
                let raw = url
                    .strip_prefix("file://")
                    .ok_or_else(|| StorageError::ObjectNotFound(url.to_string()))?;
                PathBuf::from(raw)
            }
        };
        if !path.starts_with(&self.root) {
            return Err(StorageError::ObjectNotFound(url.to_string()));
        }
        Ok(path)
    }

    fn validate_key(key: &str) -> Result<(), StorageError> {
        let escapes = Path::new(key)
            .components()
            .any(|c| !matches!(c, std::path::Component::Normal(_)));
        if key.is_empty() || escapes {
            return Err(StorageError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Invalid object key: {:?}", key),
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for FilesystemObjectStore {
    async fn store(
        &self,
        bytes: &[u8],
        _content_type: &str,
        key: &str,
    ) -> Result<String, StorageError> {
        Self::validate_key(key)?;
        let object_path = self.root.join(key);

        // Same key means same content; keep the existing object
        if tokio::fs::try_exists(&object_path).await? {
            return Ok(self.url_for(key));
        }

        if let Some(parent) = object_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::IoError(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("Failed to create parent directory {:?}: {}", parent, e),
                ))
            })?;
        }

        let temp_path = object_path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
        tokio::fs::write(&temp_path, bytes).await.map_err(|e| {
            StorageError::IoError(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Failed to write object to {:?}: {}", temp_path, e),
            ))
        })?;

        if let Err(e) = tokio::fs::rename(&temp_path, &object_path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(StorageError::IoError(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Failed to rename temp file to {:?}: {}", object_path, e),
            )));
        }

        Ok(self.url_for(key))
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for_url(url)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::ObjectNotFound(url.to_string()))
            }
            Err(e) => Err(StorageError::IoError(e)),
        }
    }
}
