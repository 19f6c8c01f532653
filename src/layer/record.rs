//! Persisted record of a layer's last successful build
//!
//! Stored as `<layers>/<name>.toml`:
//!
//! ```toml
//! [types]
//! build = true
//! launch = false
//! cache = true
//!
//! [metadata]
//! identity = "GraalVM 11.0.0"
//! fingerprint = '{"dependencies":[...]}'
//! built_at = "2024-01-01T00:00:00Z"
//! ```

use crate::error::{JvmLayerError, JvmLayerResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::warn;

/// Where a layer is visible and whether it survives between builds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerTypes {
    pub build: bool,
    pub launch: bool,
    pub cache: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// Identity of the contribution (e.g., "GraalVM 11.0.0")
    pub identity: String,
    /// Canonical fingerprint the layer was built from
    pub fingerprint: String,
    pub built_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerRecord {
    #[serde(default)]
    pub types: LayerTypes,
    pub metadata: RecordMetadata,
}

impl LayerRecord {
    pub fn new(identity: impl Into<String>, types: LayerTypes, fingerprint: impl Into<String>) -> Self {
        Self {
            types,
            metadata: RecordMetadata {
                identity: identity.into(),
                fingerprint: fingerprint.into(),
                built_at: Utc::now(),
            },
        }
    }

    /// Load a record; an unreadable or corrupt record counts as absent
    pub fn load(path: &Path) -> Option<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unreadable layer record, rebuilding");
                return None;
            }
        };

        match toml::from_str(&content) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Corrupt layer record, rebuilding");
                None
            }
        }
    }

    /// Write the record to a temporary file and rename it into place
    pub fn save(&self, path: &Path) -> JvmLayerResult<()> {
        let dir = path
            .parent()
            .ok_or_else(|| JvmLayerError::Internal(format!("no parent for {}", path.display())))?;
        fs::create_dir_all(dir)
            .map_err(|e| JvmLayerError::io(format!("creating {}", dir.display()), e))?;

        let content = toml::to_string_pretty(self)?;
        let mut file = NamedTempFile::new_in(dir)
            .map_err(|e| JvmLayerError::io("creating layer record temp file", e))?;
        file.write_all(content.as_bytes())
            .and_then(|_| file.as_file().sync_all())
            .map_err(|e| JvmLayerError::io("writing layer record", e))?;
        file.persist(path)
            .map_err(|e| JvmLayerError::io(format!("persisting {}", path.display()), e.error))?;
        Ok(())
    }

    /// Remove a record; a missing record is not an error
    pub fn remove(path: &Path) -> JvmLayerResult<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(JvmLayerError::io(format!("removing {}", path.display()), e)),
        }
    }
}
