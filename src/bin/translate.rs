//! Schema Translation CLI
//!
//! Translates every JSON Schema / XML Metaschema document under a directory
//! into combined per-document schemas and, optionally, per-namespace packages.
//!
//! Usage:
//!   schema-translate --input schemas/ --format jadn --format proto
//!   schema-translate --input schemas/ --no-split --dry-run

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use schema_canon::codegen::{emitters, write_outputs};
use schema_canon::loader::{collect_sources, translate_batch};
use schema_canon::{split, NamespaceRegistry, OutputFormat, TranslateConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-translate")]
#[command(about = "Translate JSON Schema and Metaschema documents into canonical schemas")]
struct Cli {
    /// Directory of source documents
    #[arg(short, long)]
    input: PathBuf,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<String>,

    /// Output directory for combined per-document schemas
    #[arg(long)]
    combined_dir: Option<PathBuf>,

    /// Output directory for per-namespace packages
    #[arg(long)]
    package_dir: Option<PathBuf>,

    /// Skip the package split
    #[arg(long)]
    no_split: bool,

    /// Output format (repeatable)
    #[arg(short, long, value_parser = parse_format)]
    format: Vec<OutputFormat>,

    /// Translate and report, write nothing
    #[arg(long)]
    dry_run: bool,
}

fn parse_format(s: &str) -> Result<OutputFormat, String> {
    match s {
        "jadn" => Ok(OutputFormat::Jadn),
        "proto" => Ok(OutputFormat::Proto),
        other => Err(format!("unknown format '{}' (expected jadn or proto)", other)),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = TranslateConfig::load_from(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(dir) = cli.combined_dir {
        config.output.combined_dir = dir;
    }
    if let Some(dir) = cli.package_dir {
        config.output.package_dir = dir;
    }
    if cli.no_split {
        config.output.split_packages = false;
    }
    if !cli.format.is_empty() {
        config.output.formats = cli.format;
    }

    let bundle = collect_sources(&cli.input, &config.input)
        .with_context(|| format!("Failed to read sources from {}", cli.input.display()))?;
    let mut registry = NamespaceRegistry::from_config(&config);
    let batch = translate_batch(&bundle, &config.naming, &mut registry);

    println!("Bundle {}", batch.bundle_hash);
    for doc in &batch.documents {
        let info = &doc.schema.info;
        println!(
            "\n{} ({}): {} types, {} ids, {} aliases, {} refs",
            doc.path.display(),
            info.title.as_deref().unwrap_or(&info.package),
            doc.schema.types.len(),
            doc.translation.stats.ids.len(),
            doc.translation.stats.aliases.len(),
            doc.translation.stats.refs.len()
        );
        if !doc.diagnostics.is_empty() {
            print!("{}", doc.diagnostics);
        }
    }
    for failure in &batch.failures {
        eprintln!("❌ {}: {}", failure.path.display(), failure.error);
    }

    println!("\nNamespaces:");
    for (key, prefix) in registry.entries() {
        println!("{:>6} {}", prefix, registry.namespace_name(key));
    }

    if cli.dry_run {
        println!("\nDry run: nothing written");
        return Ok(());
    }

    for doc in &batch.documents {
        let stem = doc
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("schema");
        let source = doc.path.to_string_lossy();
        let writers = emitters(&config.output.formats, config.output.pretty, Some(source.as_ref()));
        write_outputs(&doc.schema, &config.output.combined_dir, stem, &writers)
            .with_context(|| format!("Failed to write combined schema for {}", doc.path.display()))?;
    }

    if config.output.split_packages && !batch.documents.is_empty() {
        let result = split(&batch.schemas(), &registry, &config.naming).context("Package split failed")?;
        if !result.diagnostics.is_empty() {
            print!("\n{}", result.diagnostics);
        }
        let writers = emitters(&config.output.formats, config.output.pretty, None);
        for package in &result.packages {
            write_outputs(&package.schema, &config.output.package_dir, &package.name, &writers)
                .with_context(|| format!("Failed to write package {}", package.name))?;
        }
        println!("\n✅ Wrote {} packages to {}", result.packages.len(), config.output.package_dir.display());
    }

    if !batch.is_success() {
        anyhow::bail!("{} document(s) failed to translate", batch.failures.len());
    }
    Ok(())
}
