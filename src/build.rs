//! Build orchestration
//!
//! Turns plan entries into layer contributions:
//!
//! | Entry | Resolves | Layer |
//! |-------|----------|-------|
//! | `jdk` | `jdk`, plus `native-image-svm` when `native-image = true` | `jdk` |
//! | `jre` | `jre`, falling back to `jdk` with a warning | `jre` |
//!
//! The `jre` entry is ignored in native-image mode.

use crate::cache::DependencyCache;
use crate::certs::CertificateSources;
use crate::config::schema::{MemoryConfig, PlanConfig, FALLBACK_JAVA_VERSION};
use crate::config::{absolute_path, Config, JdkPlanMetadata, JrePlanMetadata};
use crate::dependency::{Dependency, DependencyResolver, ManifestEntry};
use crate::effect::Executor;
use crate::error::{JvmLayerResult, StepContext};
use crate::jvm::{Jdk, Jre};
use crate::layer::{Layer, Layers};
use std::sync::Arc;
use tracing::{info, warn};

/// Dependency id of the native-image component
pub const NATIVE_IMAGE_ID: &str = "native-image-svm";

/// Warning recorded when a JDK stands in for a missing JRE
pub const JRE_FALLBACK_WARNING: &str = "No valid JRE available, providing matching JDK instead. Using a JDK at runtime has security implications.";

/// Everything a build reads
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub layers: Layers,
    pub stack: String,
    pub java_version: String,
    pub plan: PlanConfig,
    pub dependencies: Vec<Dependency>,
    pub certificates: CertificateSources,
    pub memory: MemoryConfig,
}

impl BuildContext {
    /// Read the build settings from `config`; the layers root is made absolute
    pub fn from_config(config: &Config) -> JvmLayerResult<Self> {
        Ok(Self {
            layers: Layers::new(absolute_path(&config.build.layers_dir)?),
            stack: config.build.stack.clone(),
            java_version: config.java_version(),
            plan: config.plan.clone(),
            dependencies: config.buildpack.dependencies.clone(),
            certificates: config.certificates.sources(),
            memory: config.memory.clone(),
        })
    }
}

/// A resolved layer contribution
pub enum Contribution {
    Jdk(Jdk),
    Jre(Jre),
}

impl Contribution {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Jdk(jdk) => jdk.name(),
            Self::Jre(jre) => jre.name(),
        }
    }

    /// Dependency the layer is built from
    pub fn dependency(&self) -> &Dependency {
        match self {
            Self::Jdk(jdk) => jdk.dependency(),
            Self::Jre(jre) => jre.dependency(),
        }
    }

    pub async fn contribute(&self, layer: Layer) -> JvmLayerResult<Layer> {
        match self {
            Self::Jdk(jdk) => jdk.contribute(layer).await,
            Self::Jre(jre) => jre.contribute(layer).await,
        }
    }
}

/// Resolved contributions, ready to run
pub struct BuildPlan {
    pub contributions: Vec<Contribution>,
    pub manifest: Vec<ManifestEntry>,
    pub warnings: Vec<String>,
}

/// Outcome of a build
#[derive(Debug, Default)]
pub struct BuildResult {
    pub layers: Vec<Layer>,
    pub manifest: Vec<ManifestEntry>,
    pub warnings: Vec<String>,
}

pub struct Build {
    cache: Arc<dyn DependencyCache>,
    executor: Arc<dyn Executor>,
}

impl Build {
    pub fn new(cache: Arc<dyn DependencyCache>, executor: Arc<dyn Executor>) -> Self {
        Self { cache, executor }
    }

    /// Resolve and contribute every requested layer, one after another
    pub async fn build(&self, context: &BuildContext) -> JvmLayerResult<BuildResult> {
        let plan = self.plan(context)?;

        let mut layers = Vec::with_capacity(plan.contributions.len());
        for contribution in &plan.contributions {
            let name = contribution.name();
            let layer = contribution
                .contribute(context.layers.layer(name))
                .await
                .step(|| format!("unable to contribute {} layer", name))?;
            layers.push(layer);
        }

        Ok(BuildResult {
            layers,
            manifest: plan.manifest,
            warnings: plan.warnings,
        })
    }

    /// Resolve the plan entries into contributions without touching any layer
    pub fn plan(&self, context: &BuildContext) -> JvmLayerResult<BuildPlan> {
        report_user_config(&context.memory);

        let resolver = DependencyResolver::new(context.dependencies.clone(), &context.stack);
        let version = context.java_version.as_str();
        info!(version, stack = %context.stack, "Resolving Java runtime");

        let mut plan = BuildPlan {
            contributions: vec![],
            manifest: vec![],
            warnings: vec![],
        };
        let mut native_image_mode = false;

        if let Some(entry) = context.plan.entry("jdk") {
            let metadata: JdkPlanMetadata = entry
                .metadata_as()
                .step(|| "unable to resolve jdk plan entry".to_string())?;

            let jdk = resolver
                .resolve("jdk", version)
                .step(|| "unable to find dependency".to_string())?;

            let native_image = if metadata.native_image {
                native_image_mode = true;
                Some(
                    resolver
                        .resolve(NATIVE_IMAGE_ID, version)
                        .step(|| "unable to find dependency".to_string())?,
                )
            } else {
                None
            };

            plan.contributions.push(Contribution::Jdk(Jdk::new(
                jdk,
                native_image,
                self.cache.clone(),
                context.certificates.clone(),
                self.executor.clone(),
                &mut plan.manifest,
            )?));
        }

        if let Some(entry) = context.plan.entry("jre") {
            if native_image_mode {
                info!("Native image requested, skipping JRE");
            } else {
                let metadata: JrePlanMetadata = entry
                    .metadata_as()
                    .step(|| "unable to resolve jre plan entry".to_string())?;

                let jre = match resolver.resolve("jre", version) {
                    Err(e) if e.is_no_valid_dependencies() => {
                        warn!("{}", JRE_FALLBACK_WARNING);
                        plan.warnings.push(JRE_FALLBACK_WARNING.to_string());
                        resolver.resolve("jdk", version)
                    }
                    other => other,
                }
                .step(|| "unable to find dependency".to_string())?;

                plan.contributions.push(Contribution::Jre(Jre::new(
                    jre,
                    self.cache.clone(),
                    context.certificates.clone(),
                    self.executor.clone(),
                    metadata.types(),
                    &mut plan.manifest,
                )?));
            }
        }

        Ok(plan)
    }
}

fn report_user_config(memory: &MemoryConfig) {
    let defaults = MemoryConfig::default();
    info!(
        "{}",
        format_user_config("BP_JAVA_VERSION", "the Java version", FALLBACK_JAVA_VERSION)
    );
    info!(
        "{}",
        format_user_config(
            "BPL_HEAD_ROOM",
            "the headroom in memory calculation",
            &defaults.head_room.to_string()
        )
    );
    info!(
        "{}",
        format_user_config(
            "BPL_LOADED_CLASS_COUNT",
            "the number of loaded classes in memory calculation",
            &defaults.loaded_class_count
        )
    );
    info!(
        "{}",
        format_user_config(
            "BPL_THREAD_COUNT",
            "the number of threads in memory calculation",
            &defaults.thread_count.to_string()
        )
    );
    if *memory != defaults {
        info!(
            head_room = memory.head_room,
            loaded_class_count = %memory.loaded_class_count,
            thread_count = memory.thread_count,
            "Memory calculation overrides"
        );
    }
}

/// One line describing a user-facing setting and its default
pub fn format_user_config(name: &str, description: &str, default: &str) -> String {
    format!("Set ${} to configure {}. Default {}.", name, description, default)
}
