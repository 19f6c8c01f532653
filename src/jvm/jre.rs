//! JRE layer
//!
//! Also used to provide a JDK at runtime when no JRE matches; the layer keeps
//! the JRE layout and flags in that case.

use crate::cache::DependencyCache;
use crate::certs::{CertificateLoader, CertificateSources, KeyTool};
use crate::dependency::{Dependency, ManifestEntry};
use crate::effect::Executor;
use crate::error::{JvmLayerResult, StepContext};
use crate::jvm::extract::extract_archive;
use crate::jvm::version::{keystore_path, RuntimeKind};
use crate::layer::{Fingerprint, Layer, LayerContributor, LayerTypes};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Layer name of the JRE contribution
pub const JRE_LAYER: &str = "jre";

pub struct Jre {
    dependency: Dependency,
    cache: Arc<dyn DependencyCache>,
    certificates: CertificateSources,
    executor: Arc<dyn Executor>,
    types: LayerTypes,
    contributor: LayerContributor,
}

impl Jre {
    /// `types` selects where the runtime is visible; a build-visible JRE is
    /// always cached.
    pub fn new(
        dependency: Dependency,
        cache: Arc<dyn DependencyCache>,
        certificates: CertificateSources,
        executor: Arc<dyn Executor>,
        mut types: LayerTypes,
        manifest: &mut Vec<ManifestEntry>,
    ) -> JvmLayerResult<Self> {
        types.cache |= types.build;
        manifest.push(dependency.as_manifest_entry(types.build, types.launch));

        let mut expected = Fingerprint::new();
        expected.insert("dependency", &dependency)?;
        expected.insert("build", &types.build)?;
        expected.insert("launch", &types.launch)?;
        expected.insert("cache", &types.cache)?;
        certificates.fingerprint(&mut expected)?;

        let contributor = LayerContributor::new(dependency.identity(), expected);
        Ok(Self {
            dependency,
            cache,
            certificates,
            executor,
            types,
            contributor,
        })
    }

    pub fn name(&self) -> &'static str {
        JRE_LAYER
    }

    pub fn dependency(&self) -> &Dependency {
        &self.dependency
    }

    pub fn types(&self) -> LayerTypes {
        self.types
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        self.contributor.expected()
    }

    pub fn keystore_path(&self, home: &Path) -> PathBuf {
        keystore_path(home, RuntimeKind::Jre, &self.dependency.version)
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
            .step(|| "unable to expand JRE".to_string())?;

        let home = layer.path.display().to_string();
        if self.types.build {
            layer.build_env.set_override("JAVA_HOME", home.clone());
        }
        if self.types.launch {
            layer.launch_env.set_default("JAVA_HOME", home);
        }

        CertificateLoader::new(
            KeyTool::in_java_home(&layer.path, self.executor.clone()),
            self.certificates.clone(),
            self.keystore_path(&layer.path),
        )
        .load()
        .await
        .step(|| "unable to load certificates".to_string())?;

        layer.types = self.types;
        Ok(layer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::DownloadCache;
    use crate::certs::testing::generate_pem;
    use crate::effect::fake::FakeExecutor;
    use crate::jvm::testing::runtime_dependency;
    use crate::layer::{EnvAction, Layers};
    use std::fs;
    use tempfile::TempDir;

    fn jre(
        temp: &TempDir,
        dependency: Dependency,
        executor: Arc<FakeExecutor>,
        types: LayerTypes,
    ) -> (Jre, Vec<ManifestEntry>) {
        let bundle = temp.path().join("ca-certificates.crt");
        if !bundle.exists() {
            fs::write(&bundle, generate_pem("corp.example")).unwrap();
        }
        let mut manifest = vec![];
        let jre = Jre::new(
            dependency,
            Arc::new(DownloadCache::new(temp.path().join("downloads"))),
            CertificateSources::bundle(&bundle),
            executor,
            types,
            &mut manifest,
        )
        .unwrap();
        (jre, manifest)
    }

    fn launch_only() -> LayerTypes {
        LayerTypes {
            build: false,
            launch: true,
            cache: false,
        }
    }

    #[tokio::test]
    async fn launch_jre_sets_default_java_home() {
        let temp = TempDir::new().unwrap();
        let executor = Arc::new(FakeExecutor::new());
        let dependency = runtime_dependency(temp.path(), "jre", "11.0.0");
        let (jre, manifest) = jre(&temp, dependency, executor.clone(), launch_only());

        let layer = jre
            .contribute(Layers::new(temp.path().join("layers")).layer("jre"))
            .await
            .unwrap();

        assert_eq!(layer.types, launch_only());
        let home = layer.path.display().to_string();
        assert_eq!(layer.launch_env.get("JAVA_HOME", EnvAction::Default), Some(home.as_str()));
        assert!(layer.build_env.is_empty());
        assert!(layer.path.join("env.launch").join("JAVA_HOME.default").is_file());

        let keystore = layer.path.join("lib/security/cacerts");
        assert_eq!(executor.keystore(&keystore).len(), 1);
        assert!(!manifest[0].build && manifest[0].launch);
    }

    #[tokio::test]
    async fn build_flag_implies_cache() {
        let temp = TempDir::new().unwrap();
        let executor = Arc::new(FakeExecutor::new());
        let dependency = runtime_dependency(temp.path(), "jre", "11.0.0");
        let types = LayerTypes {
            build: true,
            launch: true,
            cache: false,
        };
        let (jre, _) = jre(&temp, dependency, executor, types);

        assert!(jre.types().cache);
        let layer = jre
            .contribute(Layers::new(temp.path().join("layers")).layer("jre"))
            .await
            .unwrap();
        assert!(layer.types.build && layer.types.launch && layer.types.cache);
        assert!(layer.build_env.get("JAVA_HOME", EnvAction::Override).is_some());
    }

    #[tokio::test]
    async fn jdk_8_as_jre_keeps_flat_keystore() {
        let temp = TempDir::new().unwrap();
        let executor = Arc::new(FakeExecutor::new());
        let dependency = runtime_dependency(temp.path(), "jdk", "8.0.252");
        let (jre, _) = jre(&temp, dependency, executor.clone(), launch_only());

        let layer = jre
            .contribute(Layers::new(temp.path().join("layers")).layer("jre"))
            .await
            .unwrap();

        let imports: Vec<_> = executor
            .executions_of("keytool")
            .into_iter()
            .filter(|e| e.args[0] == "-importcert")
            .map(|e| e.args[6].clone())
            .collect();
        assert_eq!(
            imports,
            vec![layer.path.join("lib/security/cacerts").display().to_string()]
        );
    }

    #[test]
    fn flags_are_part_of_fingerprint() {
        let temp = TempDir::new().unwrap();
        let executor = Arc::new(FakeExecutor::new());
        let dependency = runtime_dependency(temp.path(), "jre", "11.0.0");

        let (launch, _) = jre(&temp, dependency.clone(), executor.clone(), launch_only());
        let (both, _) = jre(
            &temp,
            dependency,
            executor,
            LayerTypes {
                build: true,
                launch: true,
                cache: true,
            },
        );

        assert_ne!(
            launch.fingerprint().canonical().unwrap(),
            both.fingerprint().canonical().unwrap()
        );
    }
}
