//! Configuration schema for jvmlayer
//!
//! Configuration is stored at `~/.config/jvmlayer/config.toml`

use crate::certs::CertificateSources;
use crate::dependency::Dependency;
use crate::error::{JvmLayerError, JvmLayerResult};
use crate::layer::LayerTypes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Java version requested when neither the user nor the buildpack names one
pub const FALLBACK_JAVA_VERSION: &str = "11.*";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Build settings
    pub build: BuildConfig,

    /// Trusted CA certificate sources
    pub certificates: CertificatesConfig,

    /// Artifact cache settings
    pub cache: CacheConfig,

    /// Memory calculation inputs, reported only
    pub memory: MemoryConfig,

    /// Buildpack defaults and candidate dependencies
    pub buildpack: BuildpackConfig,

    /// Requested layers
    pub plan: PlanConfig,
}

impl Config {
    /// Version constraint to resolve runtimes with
    pub fn java_version(&self) -> String {
        self.build
            .java_version
            .clone()
            .or_else(|| self.buildpack.default_versions.get("java").cloned())
            .unwrap_or_else(|| FALLBACK_JAVA_VERSION.to_string())
    }

    /// Apply `BP_JAVA_VERSION` and the `BPL_*` overrides from the process environment
    pub fn apply_env(&mut self) -> JvmLayerResult<()> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_env_from(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> JvmLayerResult<()> {
        if let Some(version) = lookup("BP_JAVA_VERSION") {
            self.build.java_version = Some(version);
        }
        if let Some(value) = lookup("BPL_HEAD_ROOM") {
            self.memory.head_room = parse_number("BPL_HEAD_ROOM", &value)?;
        }
        if let Some(value) = lookup("BPL_LOADED_CLASS_COUNT") {
            self.memory.loaded_class_count = value;
        }
        if let Some(value) = lookup("BPL_THREAD_COUNT") {
            self.memory.thread_count = parse_number("BPL_THREAD_COUNT", &value)?;
        }
        Ok(())
    }
}

fn parse_number(name: &str, value: &str) -> JvmLayerResult<u32> {
    value
        .trim()
        .parse()
        .map_err(|_| JvmLayerError::User(format!("{} must be a whole number, got {:?}", name, value)))
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Build settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Directory holding the layers and their records
    pub layers_dir: PathBuf,

    /// Stack id dependencies must support
    pub stack: String,

    /// Requested Java version constraint (e.g., "11.*")
    pub java_version: Option<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            layers_dir: PathBuf::from("layers"),
            stack: "io.buildpacks.stacks.bionic".to_string(),
            java_version: None,
        }
    }
}

/// Certificate sources loaded into every runtime's trust store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificatesConfig {
    /// PEM bundle
    pub file: Option<PathBuf>,

    /// Directories of individual PEM files
    pub dirs: Vec<PathBuf>,
}

impl Default for CertificatesConfig {
    fn default() -> Self {
        Self {
            file: Some(PathBuf::from("/etc/ssl/certs/ca-certificates.crt")),
            dirs: vec![],
        }
    }
}

impl CertificatesConfig {
    pub fn sources(&self) -> CertificateSources {
        CertificateSources::new(self.file.clone(), self.dirs.clone())
    }
}

/// Artifact cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Pre-populated, read-only artifact directory
    pub cache_dir: Option<PathBuf>,

    /// Writable directory downloads are stored in
    pub download_dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            download_dir: super::ConfigManager::default_download_dir(),
        }
    }
}

/// Memory calculation inputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Percentage of total memory left as headroom
    pub head_room: u32,

    /// Loaded class count, absolute or relative ("35% of classes")
    pub loaded_class_count: String,

    /// Number of threads
    pub thread_count: u32,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            head_room: 0,
            loaded_class_count: "35% of classes".to_string(),
            thread_count: 250,
        }
    }
}

/// Buildpack metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildpackConfig {
    /// Default version constraint per dependency family (e.g., java = "11.*")
    pub default_versions: BTreeMap<String, String>,

    /// Candidate dependencies
    pub dependencies: Vec<Dependency>,
}

/// Requested layers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    pub entries: Vec<PlanEntry>,
}

impl PlanConfig {
    /// First entry called `name`
    pub fn entry(&self, name: &str) -> Option<&PlanEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

/// One requested layer with its free-form metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub name: String,

    #[serde(default)]
    pub metadata: toml::Table,
}

impl PlanEntry {
    /// Metadata parsed into `T`; unknown keys are ignored
    pub fn metadata_as<T: DeserializeOwned>(&self) -> JvmLayerResult<T> {
        toml::Value::Table(self.metadata.clone())
            .try_into()
            .map_err(|e: toml::de::Error| {
                JvmLayerError::User(format!("invalid metadata for plan entry {}: {}", self.name, e))
            })
    }
}

/// Recognized `jdk` plan entry metadata
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JdkPlanMetadata {
    /// Install the native-image component and skip the JRE
    #[serde(rename = "native-image")]
    pub native_image: bool,
}

/// Recognized `jre` plan entry metadata
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JrePlanMetadata {
    pub build: bool,
    pub launch: bool,
    pub cache: bool,
}

impl JrePlanMetadata {
    pub fn types(&self) -> LayerTypes {
        LayerTypes {
            build: self.build,
            launch: self.launch,
            cache: self.cache,
        }
    }
}
