//! Cacheable layers
//!
//! A layer is a named directory under the layers root plus a record file
//! beside it (`<layers>/<name>/` and `<layers>/<name>.toml`). The
//! [`LayerContributor`] decides from the recorded fingerprint whether a
//! layer can be reused or must be rebuilt.

pub mod contributor;
pub mod environment;
pub mod fingerprint;
pub mod record;

pub use contributor::LayerContributor;
pub use environment::{EnvAction, Environment};
pub use fingerprint::Fingerprint;
pub use record::{LayerRecord, LayerTypes};

use crate::error::{JvmLayerError, JvmLayerResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory holding all layers of a build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layers {
    pub path: PathBuf,
}

impl Layers {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Handle for the layer called `name`; nothing is created on disk
    pub fn layer(&self, name: &str) -> Layer {
        Layer {
            name: name.to_string(),
            path: self.path.join(name),
            record_path: self.path.join(format!("{}.toml", name)),
            types: LayerTypes::default(),
            build_env: Environment::new(),
            launch_env: Environment::new(),
        }
    }

    /// Every readable layer record, sorted by layer name
    pub fn records(&self) -> JvmLayerResult<Vec<(String, LayerRecord)>> {
        if !self.path.is_dir() {
            return Ok(vec![]);
        }

        let entries = fs::read_dir(&self.path)
            .map_err(|e| JvmLayerError::io(format!("reading {}", self.path.display()), e))?;

        let mut records = vec![];
        for entry in entries {
            let path = entry
                .map_err(|e| JvmLayerError::io("reading layer entry", e))?
                .path();
            if !path.extension().is_some_and(|ext| ext == "toml") {
                continue;
            }
            let Some(name) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };
            if let Some(record) = LayerRecord::load(&path) {
                records.push((name, record));
            }
        }

        records.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(records)
    }
}

/// A layer being contributed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    pub name: String,
    pub path: PathBuf,
    pub record_path: PathBuf,
    pub types: LayerTypes,
    pub build_env: Environment,
    pub launch_env: Environment,
}

impl Layer {
    pub fn build_env_dir(&self) -> PathBuf {
        self.path.join("env.build")
    }

    pub fn launch_env_dir(&self) -> PathBuf {
        self.path.join("env.launch")
    }

    /// Whether the layer directory exists and holds anything
    pub fn is_populated(&self) -> bool {
        is_non_empty_dir(&self.path)
    }
}

fn is_non_empty_dir(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}
