//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// jvmlayer - cacheable JDK/JRE layers
///
/// Resolves, downloads and expands Java runtimes into layer directories,
/// loads CA certificates into their trust stores and reuses unchanged
/// layers between builds.
#[derive(Parser, Debug)]
#[command(name = "jvmlayer")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "JVMLAYER_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Contribute the JDK/JRE layers requested by the plan
    Build(BuildArgs),

    /// List contributed layers
    Layers(LayersArgs),
}

/// Arguments for the build command
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Layers directory (overrides build.layers_dir)
    #[arg(short, long)]
    pub layers_dir: Option<PathBuf>,

    /// Stack id (overrides build.stack)
    #[arg(long)]
    pub stack: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the layers command
#[derive(Parser, Debug)]
pub struct LayersArgs {
    /// Layers directory (overrides build.layers_dir)
    #[arg(short, long)]
    pub layers_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Output format for listings
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}
