//! Document Loading
//!
//! Collects source documents from a directory, runs each one through its
//! walker, the graph builder and the orderer, and records per-document
//! failures without stopping the batch.

use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::{InputConfig, NamingConfig};
use crate::error::{Result, TranslateError};
use crate::graph::diagnostics::Diagnostics;
use crate::graph::{build_graph, order, report_cycles, DependencyGraph};
use crate::ir::CanonicalSchema;
use crate::resolve::NamespaceRegistry;
use crate::walk::metaschema::{self, MetaschemaCatalog};
use crate::walk::xml::{self, Element};
use crate::walk::{json, SourceFormat, Translation};

/// A source file read into memory
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Path relative to the input directory
    pub path: PathBuf,
    pub format: SourceFormat,
    pub content: String,
}

impl SourceDocument {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Option<Self> {
        let path = path.into();
        let format = SourceFormat::from_path(&path)?;
        Some(Self {
            path,
            format,
            content: content.into(),
        })
    }

    pub fn label(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

/// Sources of one input directory plus their bundle hash
#[derive(Debug, Clone, Default)]
pub struct SourceBundle {
    /// Sorted by path
    pub documents: Vec<SourceDocument>,
    pub bundle_hash: String,
}

/// A translated document: ordered combined schema and everything reported
#[derive(Debug, Clone)]
pub struct DocumentResult {
    pub path: PathBuf,
    pub schema: CanonicalSchema,
    pub graph: DependencyGraph,
    pub translation: Translation,
    pub diagnostics: Diagnostics,
}

#[derive(Debug)]
pub struct DocumentFailure {
    pub path: PathBuf,
    pub error: TranslateError,
}

#[derive(Debug, Default)]
pub struct BatchResult {
    pub documents: Vec<DocumentResult>,
    pub failures: Vec<DocumentFailure>,
    pub bundle_hash: String,
}

impl BatchResult {
    pub fn schemas(&self) -> Vec<CanonicalSchema> {
        self.documents.iter().map(|d| d.schema.clone()).collect()
    }

    pub fn diagnostics(&self) -> Diagnostics {
        let mut all = Diagnostics::new();
        for doc in &self.documents {
            all.merge(doc.diagnostics.clone());
        }
        all
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

// =============================================================================
// Collection
// =============================================================================

/// Read every `.json` / `.xml` file under `dir`, filtered by the include and
/// skip prefixes, in sorted path order.
pub fn collect_sources(dir: &Path, input: &InputConfig) -> anyhow::Result<SourceBundle> {
    let mut documents = Vec::new();

    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() || SourceFormat::from_path(path).is_none() {
            continue;
        }

        let relative_path = path.strip_prefix(dir)?.to_path_buf();
        let relative_str = relative_path.to_string_lossy();

        // Apply include/skip filters
        if !input.include_prefixes.is_empty()
            && !input.include_prefixes.iter().any(|p| relative_str.starts_with(p))
        {
            continue;
        }
        if input.skip_prefixes.iter().any(|p| relative_str.starts_with(p)) {
            continue;
        }

        let content = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
        if let Some(doc) = SourceDocument::new(relative_path, content) {
            documents.push(doc);
        }
    }

    documents.sort_by(|a, b| a.path.cmp(&b.path));
    let bundle_hash = bundle_hash(&documents);
    tracing::info!("Collected {} documents from {} ({})", documents.len(), dir.display(), &bundle_hash[..12]);

    Ok(SourceBundle { documents, bundle_hash })
}

/// SHA-256 over every document's path and content, in order
pub fn bundle_hash(documents: &[SourceDocument]) -> String {
    let mut hasher = Sha256::new();
    for doc in documents {
        hasher.update(doc.path.to_string_lossy().as_bytes());
        hasher.update([0u8]);
        hasher.update(doc.content.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

// =============================================================================
// Translation
// =============================================================================

/// Build the graph of a walked document and order its table
pub fn finish(translation: Translation) -> Result<DocumentResult> {
    let graph = build_graph(&translation.schema.types);
    let ordering = order(&graph, &translation.schema.info.roots)?;

    let mut diagnostics = translation.diagnostics.clone();
    diagnostics.merge(ordering.diagnostics.clone());
    diagnostics.merge(report_cycles(&graph));

    // Documents without a root marker are rooted at their unreferenced types
    let mut info = translation.schema.info.clone();
    if info.roots.is_empty() {
        info.roots = graph.unreferenced();
    }
    let schema = CanonicalSchema {
        info,
        types: ordering.apply(translation.schema.types.clone()),
    };
    debug_assert_eq!(schema.types.len(), translation.schema.types.len());

    Ok(DocumentResult {
        path: PathBuf::new(),
        schema,
        graph,
        translation,
        diagnostics,
    })
}

/// Walk and order one document against `registry`
pub fn translate_document(
    doc: &SourceDocument,
    parsed: Option<&Element>,
    catalog: &MetaschemaCatalog,
    naming: &NamingConfig,
    registry: &mut NamespaceRegistry,
) -> Result<DocumentResult> {
    let translation = match doc.format {
        SourceFormat::JsonSchema => {
            let value: serde_json::Value = serde_json::from_str(&doc.content)?;
            json::translate(&value, naming, registry)?
        }
        SourceFormat::Metaschema => {
            let owned;
            let root = match parsed {
                Some(root) => root,
                None => {
                    owned = xml::parse(&doc.content)?;
                    &owned
                }
            };
            metaschema::translate(root, &doc.label(), catalog, naming, registry)?
        }
    };

    let mut result = finish(translation)?;
    result.path = doc.path.clone();
    Ok(result)
}

/// Translate every document of a bundle. Each document works on a copy of
/// the registry that replaces `registry` only if the document succeeds.
pub fn translate_batch(
    bundle: &SourceBundle,
    naming: &NamingConfig,
    registry: &mut NamespaceRegistry,
) -> BatchResult {
    let mut batch = BatchResult {
        bundle_hash: bundle.bundle_hash.clone(),
        ..Default::default()
    };

    // Metaschema modules reference each other, so every module is cataloged
    // before any is walked
    let mut catalog = MetaschemaCatalog::new();
    let mut parsed: Vec<Option<Element>> = Vec::with_capacity(bundle.documents.len());
    let mut prepass_errors: Vec<Option<TranslateError>> = Vec::with_capacity(bundle.documents.len());
    for doc in &bundle.documents {
        if doc.format != SourceFormat::Metaschema {
            parsed.push(None);
            prepass_errors.push(None);
            continue;
        }
        match xml::parse(&doc.content).and_then(|root| catalog.add(&doc.label(), &root).map(|_| root)) {
            Ok(root) => {
                parsed.push(Some(root));
                prepass_errors.push(None);
            }
            Err(e) => {
                parsed.push(None);
                prepass_errors.push(Some(e));
            }
        }
    }

    for ((doc, root), prepass_error) in bundle.documents.iter().zip(&parsed).zip(prepass_errors) {
        if let Some(error) = prepass_error {
            tracing::warn!("Skipping {}: {}", doc.label(), error);
            batch.failures.push(DocumentFailure {
                path: doc.path.clone(),
                error,
            });
            continue;
        }

        let mut working = registry.clone();
        match translate_document(doc, root.as_ref(), &catalog, naming, &mut working) {
            Ok(result) => {
                *registry = working;
                result.diagnostics.log();
                batch.documents.push(result);
            }
            Err(error) => {
                tracing::warn!("Failed to translate {}: {}", doc.label(), error);
                batch.failures.push(DocumentFailure {
                    path: doc.path.clone(),
                    error,
                });
            }
        }
    }

    tracing::info!(
        "Translated {} documents, {} failed",
        batch.documents.len(),
        batch.failures.len()
    );
    batch
}

/// Collect and translate a directory
pub fn load_from_directory(
    dir: &Path,
    input: &InputConfig,
    naming: &NamingConfig,
    registry: &mut NamespaceRegistry,
) -> anyhow::Result<BatchResult> {
    let bundle = collect_sources(dir, input)?;
    Ok(translate_batch(&bundle, naming, registry))
}
