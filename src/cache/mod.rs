//! Content-addressed artifact cache
//!
//! Maps a resolved [`Dependency`] to a checksum-verified local file.
//! Artifacts live under `<root>/<sha256>/<file name>`, so identical bytes
//! are fetched once even when several descriptors point at them.
//!
//! # Lookup Order
//!
//! | Root | Access | Description |
//! |------|--------|-------------|
//! | `cache_path` | ro | Pre-populated mirror, optional |
//! | `download_path` | rw | Verified downloads from earlier runs |
//! | network / `file://` | - | Fetched, hashed, renamed into `download_path` |

pub mod download;

pub use download::DownloadCache;

use crate::dependency::Dependency;
use crate::error::JvmLayerResult;
use async_trait::async_trait;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// A verified artifact opened for reading
#[derive(Debug)]
pub struct Artifact {
    path: PathBuf,
    file: File,
}

impl Artifact {
    pub(crate) fn new(path: PathBuf, file: File) -> Self {
        Self { path, file }
    }

    /// Location of the artifact on local disk
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Read for Artifact {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

/// Source of verified artifact bytes for resolved dependencies
#[async_trait]
pub trait DependencyCache: Send + Sync {
    /// Return the artifact for `dependency`, fetching it on first use
    async fn artifact(&self, dependency: &Dependency) -> JvmLayerResult<Artifact>;
}
