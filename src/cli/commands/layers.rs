//! Layers command - show contributed layers and their records

use crate::checksum::sha256_bytes;
use crate::cli::args::{LayersArgs, OutputFormat};
use crate::cli::commands::format_types;
use crate::config::Config;
use crate::error::JvmLayerResult;
use crate::layer::{LayerRecord, Layers};
use console::style;
use serde::Serialize;

#[derive(Serialize)]
struct RecordSummary<'a> {
    name: &'a str,
    #[serde(flatten)]
    record: &'a LayerRecord,
}

/// Execute the layers command
pub async fn execute(args: LayersArgs, config: &Config) -> JvmLayerResult<()> {
    let dir = args
        .layers_dir
        .unwrap_or_else(|| config.build.layers_dir.clone());
    let records = Layers::new(&dir).records()?;

    if records.is_empty() {
        match args.format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Plain => {}
            OutputFormat::Table => println!("No layers in {}", dir.display()),
        }
        return Ok(());
    }

    match args.format {
        OutputFormat::Table => print_table(&records),
        OutputFormat::Json => print_json(&records)?,
        OutputFormat::Plain => print_plain(&records),
    }

    Ok(())
}

fn print_table(records: &[(String, LayerRecord)]) {
    println!(
        "{:<10} {:<20} {:<14} {:<18} {:<30}",
        style("NAME").bold(),
        style("TYPES").bold(),
        style("FINGERPRINT").bold(),
        style("BUILT").bold(),
        style("IDENTITY").bold()
    );
    println!("{}", "-".repeat(92));

    for (name, record) in records {
        let digest = sha256_bytes(record.metadata.fingerprint.as_bytes());
        println!(
            "{:<10} {:<20} {:<14} {:<18} {:<30}",
            name,
            format_types(&record.types),
            &digest[..12],
            record.metadata.built_at.format("%Y-%m-%d %H:%M"),
            record.metadata.identity
        );
    }

    println!();
    println!("{} layer(s)", records.len());
}

fn print_json(records: &[(String, LayerRecord)]) -> JvmLayerResult<()> {
    let summaries: Vec<_> = records
        .iter()
        .map(|(name, record)| RecordSummary { name, record })
        .collect();
    println!("{}", serde_json::to_string_pretty(&summaries)?);
    Ok(())
}

fn print_plain(records: &[(String, LayerRecord)]) {
    for (name, _) in records {
        println!("{}", name);
    }
}
