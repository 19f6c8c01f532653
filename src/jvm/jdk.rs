//! JDK layer
//!
//! Expands the JDK, points `JAVA_HOME`/`JDK_HOME` at it for the build,
//! loads CA certificates into its trust store and, when requested,
//! installs the native-image component with `gu`.

use crate::cache::DependencyCache;
use crate::certs::{CertificateLoader, CertificateSources, KeyTool};
use crate::dependency::{Dependency, ManifestEntry};
use crate::effect::{Execution, Executor};
use crate::error::{JvmLayerResult, StepContext};
use crate::jvm::extract::extract_archive;
use crate::jvm::version::{keystore_path, RuntimeKind};
use crate::layer::{Fingerprint, Layer, LayerContributor};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Layer name of the JDK contribution
pub const JDK_LAYER: &str = "jdk";

pub struct Jdk {
    dependency: Dependency,
    native_image: Option<Dependency>,
    cache: Arc<dyn DependencyCache>,
    certificates: CertificateSources,
    executor: Arc<dyn Executor>,
    contributor: LayerContributor,
}

impl Jdk {
    /// Prepare a JDK contribution, recording a manifest entry for every
    /// dependency it installs.
    pub fn new(
        dependency: Dependency,
        native_image: Option<Dependency>,
        cache: Arc<dyn DependencyCache>,
        certificates: CertificateSources,
        executor: Arc<dyn Executor>,
        manifest: &mut Vec<ManifestEntry>,
    ) -> JvmLayerResult<Self> {
        let mut dependencies = vec![&dependency];
        manifest.push(dependency.as_manifest_entry(true, false));
        if let Some(native_image) = &native_image {
            dependencies.push(native_image);
            manifest.push(native_image.as_manifest_entry(true, false));
        }

        let mut expected = Fingerprint::new();
        expected.insert("dependencies", &dependencies)?;
        certificates.fingerprint(&mut expected)?;

        let contributor = LayerContributor::new(dependency.identity(), expected);
        Ok(Self {
            dependency,
            native_image,
            cache,
            certificates,
            executor,
            contributor,
        })
    }

    pub fn name(&self) -> &'static str {
        JDK_LAYER
    }

    pub fn dependency(&self) -> &Dependency {
        &self.dependency
    }

    pub fn native_image(&self) -> Option<&Dependency> {
        self.native_image.as_ref()
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        self.contributor.expected()
    }

    /// Trust store of a JDK expanded at `home`
    pub fn keystore_path(&self, home: &Path) -> PathBuf {
        keystore_path(home, RuntimeKind::Jdk, &self.dependency.version)
    }

    pub async fn contribute(&self, layer: Layer) -> JvmLayerResult<Layer> {
        self.contributor
            .contribute(layer, |layer| self.assemble(layer))
            .await
    }

    async fn assemble(&self, mut layer: Layer) -> JvmLayerResult<Layer> {
        let artifact = self
            .cache
            .artifact(&self.dependency)
            .await
            .step(|| format!("unable to get dependency {}", self.dependency.id))?;

        info!("Expanding to {}", layer.path.display());
        extract_archive(artifact.path().to_path_buf(), layer.path.clone(), 1)
            .await
            .step(|| "unable to expand JDK".to_string())?;

        let home = layer.path.display().to_string();
        layer.build_env.set_override("JAVA_HOME", home.clone());
        layer.build_env.set_override("JDK_HOME", home);

        let loader = CertificateLoader::new(
            KeyTool::in_java_home(&layer.path, self.executor.clone()),
            self.certificates.clone(),
            self.keystore_path(&layer.path),
        );
        loader
            .load()
            .await
            .step(|| "unable to load certificates".to_string())?;

        if let Some(native_image) = &self.native_image {
            info!("{}", native_image.identity());

            let artifact = self
                .cache
                .artifact(native_image)
                .await
                .step(|| format!("unable to get dependency {}", native_image.id))?;

            info!("Installing substrate VM");
            let execution = Execution::new(layer.path.join("bin").join("gu"))
                .args([
                    "install".to_string(),
                    "--local-file".to_string(),
                    artifact.path().display().to_string(),
                ])
                .dir(&layer.path)
                .forward_output();
            self.executor
                .execute(&execution)
                .await
                .step(|| "unable to run gu install".to_string())?;
        }

        layer.types.build = true;
        layer.types.cache = true;
        Ok(layer)
    }
}
