//! Manifest tracking for index persistence.
//!
//! The manifest records which embedding model built the vectors and how
//! many documents were stored, so a reload can reject stores that no longer
//! belong together.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

use crate::error::{IndexError, IndexResult};
use crate::vector::{StagedFile, VectorError};

/// Metadata written next to the vector and document stores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    /// Name of the embedding model used
    pub model_name: String,

    /// Dimension of embeddings
    pub dimension: usize,

    /// Number of documents stored
    pub count: usize,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Version of the on-disk layout
    pub version: u32,
}

impl IndexManifest {
    /// Current manifest version
    pub const CURRENT_VERSION: u32 = 1;

    pub const FILE_NAME: &'static str = "manifest.json";

    /// Create a manifest stamped with the current time
    pub fn new(model_name: String, dimension: usize, count: usize) -> Self {
        let now = Utc::now();
        Self {
            model_name,
            dimension,
            count,
            created_at: now,
            updated_at: now,
            version: Self::CURRENT_VERSION,
        }
    }

    /// Manifest for a store first created at `created_at`
    pub fn updated(
        model_name: String,
        dimension: usize,
        count: usize,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            created_at,
            ..Self::new(model_name, dimension, count)
        }
    }

    /// Write the manifest next to its target without replacing it yet
    pub fn stage(&self, dir: &Path) -> Result<StagedFile, VectorError> {
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| VectorError::InvalidFormat(format!("Failed to serialize manifest: {e}")))?;
        StagedFile::create(&dir.join(Self::FILE_NAME), |writer| writer.write_all(&json))
    }

    /// Load the manifest from an index directory
    pub fn load(dir: &Path) -> IndexResult<Self> {
        let path = dir.join(Self::FILE_NAME);
        let load_error = |reason: String| IndexError::Load {
            path: path.clone(),
            reason,
        };

        let json = std::fs::read_to_string(&path)
            .map_err(|e| load_error(format!("Failed to read manifest: {e}")))?;
        let manifest: Self = serde_json::from_str(&json)
            .map_err(|e| load_error(format!("Failed to parse manifest: {e}")))?;

        // Check version compatibility
        if manifest.version > Self::CURRENT_VERSION {
            return Err(load_error(format!(
                "Manifest version {} is newer than supported version {}",
                manifest.version,
                Self::CURRENT_VERSION
            )));
        }

        Ok(manifest)
    }

    /// Check if a manifest exists in `dir`
    pub fn exists(dir: &Path) -> bool {
        dir.join(Self::FILE_NAME).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_manifest_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = IndexManifest::new("AllMiniLML6V2".to_string(), 384, 12);

        assert!(!IndexManifest::exists(temp_dir.path()));
        manifest.stage(temp_dir.path()).unwrap().commit().unwrap();
        assert!(IndexManifest::exists(temp_dir.path()));

        let loaded = IndexManifest::load(temp_dir.path()).unwrap();
        assert_eq!(loaded, manifest);
    }

    #[test]
    fn test_updated_keeps_creation_time() {
        let first = IndexManifest::new("mock".to_string(), 8, 1);
        let next = IndexManifest::updated("mock".to_string(), 8, 3, first.created_at);
        assert_eq!(next.created_at, first.created_at);
        assert!(next.updated_at >= first.updated_at);
        assert_eq!(next.count, 3);
    }

    #[test]
    fn test_newer_version_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut manifest = IndexManifest::new("mock".to_string(), 8, 0);
        manifest.version = IndexManifest::CURRENT_VERSION + 1;
        std::fs::write(
            temp_dir.path().join(IndexManifest::FILE_NAME),
            serde_json::to_string(&manifest).unwrap(),
        )
        .unwrap();

        let err = IndexManifest::load(temp_dir.path()).unwrap_err();
        assert!(matches!(err, IndexError::Load { .. }));
        assert!(err.to_string().contains("newer than supported"));
    }

    #[test]
    fn test_garbage_manifest_rejected() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(IndexManifest::FILE_NAME), "{not json").unwrap();
        assert!(matches!(
            IndexManifest::load(temp_dir.path()),
            Err(IndexError::Load { .. })
        ));
    }
}
