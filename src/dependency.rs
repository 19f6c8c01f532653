//! Dependency descriptors and their resolution
//!
//! A [`Dependency`] identifies exactly one fetchable artifact. The resolver
//! picks the highest candidate that satisfies a version constraint on the
//! configured stack.

use crate::error::{JvmLayerError, JvmLayerResult};
use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Stack wildcard accepted in a dependency's `stacks` list
pub const ANY_STACK: &str = "*";

/// A resolved, immutable dependency descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Dependency id (e.g., "jdk", "jre", "native-image-svm")
    pub id: String,

    /// Human-readable name, falls back to the id when empty
    #[serde(default)]
    pub name: String,

    /// Semantic version string
    pub version: String,

    /// Download location (https:// or file://)
    pub uri: String,

    /// Expected SHA256 of the artifact (hex)
    pub sha256: String,

    /// Stacks this artifact runs on
    #[serde(default)]
    pub stacks: Vec<String>,

    /// Free-form per-dependency metadata
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

impl Dependency {
    /// Display name, falling back to the id
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    /// Identity used in logs and layer records (e.g., "GraalVM 11.0.0")
    pub fn identity(&self) -> String {
        if self.version.is_empty() {
            self.display_name().to_string()
        } else {
            format!("{} {}", self.display_name(), self.version)
        }
    }

    /// File name of the artifact, taken from the last URI path segment
    pub fn file_name(&self) -> String {
        let path = self.uri.split(['?', '#']).next().unwrap_or_default();
        path.rsplit('/')
            .find(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.id.clone())
    }

    /// Parse the version leniently ("11" and "11.0" are padded)
    pub fn semver(&self) -> Option<Version> {
        parse_lenient(&self.version)
    }

    /// Whether this dependency can run on `stack`
    pub fn supports_stack(&self, stack: &str) -> bool {
        self.stacks.is_empty() || self.stacks.iter().any(|s| s == stack || s == ANY_STACK)
    }

    /// Manifest record for bill-of-materials composition
    pub fn as_manifest_entry(&self, build: bool, launch: bool) -> ManifestEntry {
        let mut metadata = BTreeMap::new();
        metadata.insert("name".to_string(), Value::from(self.display_name()));
        metadata.insert("uri".to_string(), Value::from(self.uri.as_str()));
        metadata.insert("sha256".to_string(), Value::from(self.sha256.as_str()));
        if !self.stacks.is_empty() {
            metadata.insert("stacks".to_string(), Value::from(self.stacks.clone()));
        }

        ManifestEntry {
            name: self.id.clone(),
            version: self.version.clone(),
            build,
            launch,
            metadata,
        }
    }
}

/// One contributed dependency, as emitted for downstream manifest composition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub version: String,
    pub build: bool,
    pub launch: bool,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

/// Parse a version, padding missing minor/patch components
pub fn parse_lenient(version: &str) -> Option<Version> {
    let version = version.trim().trim_start_matches('v');
    if let Ok(v) = Version::parse(version) {
        return Some(v);
    }

    // Split off pre-release/build suffixes before padding
    let split_at = version.find(['-', '+']).unwrap_or(version.len());
    let (core, suffix) = version.split_at(split_at);
    let mut parts: Vec<&str> = core.split('.').collect();
    if parts.is_empty() || parts.len() > 3 || parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    while parts.len() < 3 {
        parts.push("0");
    }
    Version::parse(&format!("{}{}", parts.join("."), suffix)).ok()
}

/// Parse a version constraint; a bare version means "exactly this version"
fn parse_constraint(constraint: &str) -> JvmLayerResult<VersionReq> {
    let trimmed = constraint.trim();
    if trimmed.is_empty() {
        return Ok(VersionReq::STAR);
    }

    let normalized = if trimmed.starts_with(|c: char| c.is_ascii_digit()) && !trimmed.contains('*')
    {
        format!("={}", trimmed)
    } else {
        trimmed.to_string()
    };

    VersionReq::parse(&normalized).map_err(|e| JvmLayerError::VersionConstraint {
        constraint: constraint.to_string(),
        reason: e.to_string(),
    })
}

/// Resolves an id + version constraint to a concrete dependency
#[derive(Debug, Clone)]
pub struct DependencyResolver {
    dependencies: Vec<Dependency>,
    stack: String,
}

impl DependencyResolver {
    pub fn new(dependencies: Vec<Dependency>, stack: impl Into<String>) -> Self {
        Self {
            dependencies,
            stack: stack.into(),
        }
    }

    /// Select the highest version of `id` satisfying `constraint` on this stack
    pub fn resolve(&self, id: &str, constraint: &str) -> JvmLayerResult<Dependency> {
        let req = parse_constraint(constraint)?;

        let mut best: Option<(Version, &Dependency)> = None;
        for candidate in self
            .dependencies
            .iter()
            .filter(|d| d.id == id && d.supports_stack(&self.stack))
        {
            let Some(version) = candidate.semver() else {
                debug!(id = %candidate.id, version = %candidate.version, "Skipping unparsable candidate version");
                continue;
            };
            if !req.matches(&version) {
                continue;
            }
            if best.as_ref().map_or(true, |(v, _)| version > *v) {
                best = Some((version, candidate));
            }
        }

        match best {
            Some((_, dependency)) => {
                debug!(id, version = %dependency.version, "Resolved dependency");
                Ok(dependency.clone())
            }
            None => Err(JvmLayerError::NoValidDependencies {
                id: id.to_string(),
                version: constraint.to_string(),
                stack: self.stack.clone(),
            }),
        }
    }
}
