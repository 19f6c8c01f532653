//! Build command - contribute the requested runtime layers

use crate::build::{Build, BuildContext, BuildResult};
use crate::cache::DownloadCache;
use crate::cli::args::{BuildArgs, OutputFormat};
use crate::cli::commands::format_types;
use crate::config::{absolute_path, Config};
use crate::dependency::ManifestEntry;
use crate::effect::CommandExecutor;
use crate::error::JvmLayerResult;
use console::style;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Serialize)]
struct LayerSummary {
    name: String,
    path: PathBuf,
    build: bool,
    launch: bool,
    cache: bool,
}

#[derive(Serialize)]
struct BuildSummary<'a> {
    layers: Vec<LayerSummary>,
    manifest: &'a [ManifestEntry],
    warnings: &'a [String],
}

/// Execute the build command
pub async fn execute(args: BuildArgs, config: &Config) -> JvmLayerResult<()> {
    let mut config = config.clone();
    if let Some(layers_dir) = args.layers_dir {
        config.build.layers_dir = layers_dir;
    }
    if let Some(stack) = args.stack {
        config.build.stack = stack;
    }

    let context = BuildContext::from_config(&config)?;
    let mut cache = DownloadCache::new(absolute_path(&config.cache.download_dir)?);
    if let Some(cache_dir) = &config.cache.cache_dir {
        cache = cache.with_cache_path(absolute_path(cache_dir)?);
    }

    let build = Build::new(Arc::new(cache), Arc::new(CommandExecutor::new()));
    let result = build.build(&context).await?;

    match args.format {
        OutputFormat::Table => print_table(&result),
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Plain => print_plain(&result),
    }

    Ok(())
}

fn print_table(result: &BuildResult) {
    for warning in &result.warnings {
        println!("{} {}", style("Warning:").yellow().bold(), style(warning).yellow());
    }

    if result.layers.is_empty() {
        println!("No layers requested");
        return;
    }

    println!(
        "{:<10} {:<20} {:<40}",
        style("LAYER").bold(),
        style("TYPES").bold(),
        style("PATH").bold()
    );
    for layer in &result.layers {
        println!(
            "{:<10} {:<20} {:<40}",
            layer.name,
            format_types(&layer.types),
            layer.path.display()
        );
    }

    println!();
    println!("{}", style("Dependencies:").bold());
    for entry in &result.manifest {
        println!("  {} {}", entry.name, entry.version);
    }
}

fn print_json(result: &BuildResult) -> JvmLayerResult<()> {
    let summary = BuildSummary {
        layers: result
            .layers
            .iter()
            .map(|layer| LayerSummary {
                name: layer.name.clone(),
                path: layer.path.clone(),
                build: layer.types.build,
                launch: layer.types.launch,
                cache: layer.types.cache,
            })
            .collect(),
        manifest: &result.manifest,
        warnings: &result.warnings,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn print_plain(result: &BuildResult) {
    for layer in &result.layers {
        println!("{}", layer.path.display());
    }
}
