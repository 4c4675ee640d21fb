//! Storage paths resolved against a workspace root.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Sled database holding sheet records
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Root directory for generated frame and composite images
    #[serde(default = "default_objects_path")]
    pub objects_path: PathBuf,

    /// Public URL prefix for stored objects; `file://` URLs are used when absent
    #[serde(default)]
    pub public_base_url: Option<String>,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".sheetsmith/store")
}

fn default_objects_path() -> PathBuf {
    PathBuf::from(".sheetsmith/objects")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            objects_path: default_objects_path(),
            public_base_url: None,
        }
    }
}

impl StorageConfig {
    /// Resolve relative paths against the workspace root.
    pub fn resolve_paths(&self, workspace_root: &Path) -> (PathBuf, PathBuf) {
        let resolve = |p: &PathBuf| {
            if p.is_absolute() {
                p.clone()
            } else {
                workspace_root.join(p)
            }
        };
        (resolve(&self.store_path), resolve(&self.objects_path))
    }
}
