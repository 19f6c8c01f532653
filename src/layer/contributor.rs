//! Fingerprint-gated layer contribution
//!
//! A layer is rebuilt only when its expected fingerprint differs from the
//! recorded one, when no valid record exists, or when the layer directory
//! is gone. The record is written last, after the build succeeded, so an
//! interrupted build is always redone.

use crate::error::{JvmLayerError, JvmLayerResult};
use crate::layer::{Environment, Fingerprint, Layer, LayerRecord};
use std::future::Future;
use tokio::fs;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct LayerContributor {
    identity: String,
    expected: Fingerprint,
}

impl LayerContributor {
    pub fn new(identity: impl Into<String>, expected: Fingerprint) -> Self {
        Self {
            identity: identity.into(),
            expected,
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn expected(&self) -> &Fingerprint {
        &self.expected
    }

    /// Reuse `layer` when its record matches, otherwise rebuild it with `build`.
    ///
    /// `build` receives an empty layer directory and returns the populated
    /// layer. Its error is returned unchanged and leaves no record behind.
    pub async fn contribute<F, Fut>(&self, mut layer: Layer, build: F) -> JvmLayerResult<Layer>
    where
        F: FnOnce(Layer) -> Fut,
        Fut: Future<Output = JvmLayerResult<Layer>>,
    {
        let expected = self.expected.canonical()?;

        if let Some(record) = LayerRecord::load(&layer.record_path) {
            if record.metadata.fingerprint == expected && layer.is_populated() {
                let restored = Environment::load(&layer.build_env_dir())
                    .and_then(|build| Ok((build, Environment::load(&layer.launch_env_dir())?)));
                match restored {
                    Ok((build_env, launch_env)) => {
                        info!("{}: Reusing cached layer", self.identity);
                        layer.types = record.types;
                        layer.build_env = build_env;
                        layer.launch_env = launch_env;
                        return Ok(layer);
                    }
                    Err(e) => warn!(
                        layer = %layer.name,
                        error = %e,
                        "Unable to restore layer environment, rebuilding"
                    ),
                }
            } else {
                debug!(
                    layer = %layer.name,
                    recorded = %record.metadata.fingerprint,
                    expected = %expected,
                    "Layer fingerprint changed"
                );
            }
        }

        info!("{}: Contributing to layer", self.identity);

        LayerRecord::remove(&layer.record_path)?;
        if fs::try_exists(&layer.path).await.unwrap_or(false) {
            fs::remove_dir_all(&layer.path).await.map_err(|e| {
                JvmLayerError::io(format!("removing layer {}", layer.path.display()), e)
            })?;
        }
        fs::create_dir_all(&layer.path).await.map_err(|e| {
            JvmLayerError::io(format!("creating layer {}", layer.path.display()), e)
        })?;

        let layer = build(layer).await?;

        layer.build_env.write(&layer.build_env_dir())?;
        layer.launch_env.write(&layer.launch_env_dir())?;
        LayerRecord::new(&self.identity, layer.types, expected).save(&layer.record_path)?;

        Ok(layer)
    }
}
