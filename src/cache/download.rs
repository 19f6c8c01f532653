//! Filesystem-backed dependency cache with checksum-verified downloads

use crate::cache::{Artifact, DependencyCache};
use crate::checksum::{digests_match, is_sha256, HashingWriter};
use crate::dependency::Dependency;
use crate::error::{JvmLayerError, JvmLayerResult};
use async_trait::async_trait;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Dependency cache backed by a read-only mirror and a writable download directory
#[derive(Debug, Clone)]
pub struct DownloadCache {
    cache_path: Option<PathBuf>,
    download_path: PathBuf,
}

impl DownloadCache {
    /// Create a cache that downloads into `download_path`
    pub fn new(download_path: impl Into<PathBuf>) -> Self {
        Self {
            cache_path: None,
            download_path: download_path.into(),
        }
    }

    /// Consult a pre-populated, read-only directory before downloading
    pub fn with_cache_path(mut self, cache_path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(cache_path.into());
        self
    }

    pub fn download_path(&self) -> &Path {
        &self.download_path
    }

    /// Find an already materialized artifact with the dependency's checksum
    fn lookup(root: &Path, dependency: &Dependency) -> Option<PathBuf> {
        let dir = root.join(dependency.sha256.to_ascii_lowercase());
        let preferred = dir.join(dependency.file_name());
        if preferred.is_file() {
            return Some(preferred);
        }

        // Same bytes stored under another descriptor's file name
        let entries = fs::read_dir(&dir).ok()?;
        let mut files: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect();
        files.sort();
        files.into_iter().next()
    }

    fn open(path: PathBuf) -> JvmLayerResult<Artifact> {
        let file = File::open(&path)
            .map_err(|e| JvmLayerError::io(format!("opening artifact {}", path.display()), e))?;
        Ok(Artifact::new(path, file))
    }
}

#[async_trait]
impl DependencyCache for DownloadCache {
    async fn artifact(&self, dependency: &Dependency) -> JvmLayerResult<Artifact> {
        if !is_sha256(&dependency.sha256) {
            return Err(JvmLayerError::InvalidChecksum {
                id: dependency.id.clone(),
                sha256: dependency.sha256.clone(),
            });
        }

        let roots = self.cache_path.iter().chain(std::iter::once(&self.download_path));
        for root in roots {
            if let Some(path) = Self::lookup(root, dependency) {
                debug!(id = %dependency.id, path = %path.display(), "Reusing cached artifact");
                return Self::open(path);
            }
        }

        info!("Downloading from {}", dependency.uri);
        let root = self.download_path.clone();
        let dep = dependency.clone();
        let path = tokio::task::spawn_blocking(move || download(&dep, &root))
            .await
            .map_err(|e| JvmLayerError::Internal(format!("download task failed: {}", e)))??;

        debug!(id = %dependency.id, path = %path.display(), "Verified artifact");
        Self::open(path)
    }
}

/// Open a byte stream for `uri`; `file://` and bare paths are read from disk
fn source_reader(uri: &str) -> JvmLayerResult<Box<dyn Read>> {
    let local = uri
        .strip_prefix("file://")
        .or_else(|| (!uri.contains("://")).then_some(uri));

    if let Some(path) = local {
        let file = File::open(path).map_err(|e| JvmLayerError::Download {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;
        return Ok(Box::new(file));
    }

    let response = ureq::get(uri).call().map_err(|e| JvmLayerError::Download {
        uri: uri.to_string(),
        reason: e.to_string(),
    })?;
    Ok(Box::new(response.into_body().into_reader()))
}

/// Fetch, hash while writing, and rename into place only when the digest matches
fn download(dependency: &Dependency, root: &Path) -> JvmLayerResult<PathBuf> {
    fs::create_dir_all(root)
        .map_err(|e| JvmLayerError::io(format!("creating {}", root.display()), e))?;

    let temp = NamedTempFile::new_in(root)
        .map_err(|e| JvmLayerError::io("creating download temp file", e))?;

    let mut reader = source_reader(&dependency.uri)?;
    let mut writer = HashingWriter::new(temp);
    io::copy(&mut reader, &mut writer).map_err(|e| JvmLayerError::Download {
        uri: dependency.uri.clone(),
        reason: e.to_string(),
    })?;
    let (temp, actual) = writer.finish();

    if !digests_match(&dependency.sha256, &actual) {
        return Err(JvmLayerError::ChecksumMismatch {
            uri: dependency.uri.clone(),
            expected: dependency.sha256.clone(),
            actual,
        });
    }

    let dir = root.join(actual);
    fs::create_dir_all(&dir)
        .map_err(|e| JvmLayerError::io(format!("creating {}", dir.display()), e))?;
    let destination = dir.join(dependency.file_name());
    temp.persist(&destination).map_err(|e| {
        JvmLayerError::io(format!("moving download to {}", destination.display()), e.error)
    })?;

    Ok(destination)
}
