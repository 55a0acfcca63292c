use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use schema_canon::loader::{translate_document, SourceDocument};
use schema_canon::walk::metaschema::MetaschemaCatalog;
use schema_canon::walk::xml;
use schema_canon::{NamespaceRegistry, SourceFormat, TranslateConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-graph-export")]
#[command(about = "Export the type dependency graph of one document to DOT format")]
struct Cli {
    /// Source document (.json or .xml)
    #[arg(short, long)]
    document: PathBuf,

    /// Output file (defaults to <document stem>.dot)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = TranslateConfig::load_from(cli.config.as_deref()).context("Failed to load configuration")?;

    let content = std::fs::read_to_string(&cli.document)
        .with_context(|| format!("Failed to read {}", cli.document.display()))?;
    let doc = SourceDocument::new(cli.document.clone(), content)
        .with_context(|| format!("{} is neither .json nor .xml", cli.document.display()))?;

    let mut catalog = MetaschemaCatalog::new();
    let root = if doc.format == SourceFormat::Metaschema {
        let root = xml::parse(&doc.content)?;
        catalog.add(&doc.label(), &root)?;
        Some(root)
    } else {
        None
    };

    let mut registry = NamespaceRegistry::from_config(&config);
    let result = translate_document(&doc, root.as_ref(), &catalog, &config.naming, &mut registry)
        .with_context(|| format!("Failed to translate {}", cli.document.display()))?;

    println!(
        "Graph loaded: {} types, {} edges",
        result.graph.len(),
        result.graph.edge_count()
    );

    let output_path = cli
        .output
        .unwrap_or_else(|| cli.document.with_extension("dot"));
    std::fs::write(&output_path, result.graph.to_dot())
        .with_context(|| format!("Failed to write {}", output_path.display()))?;
    println!("✅ Exported DOT to: {:?}", output_path);

    Ok(())
}
