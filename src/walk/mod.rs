//! Tree Walkers
//!
//! Front-ends that turn one source document into a flat table of canonical
//! types. Both share a [`TranslationSession`]: the resolver memo, the
//! seen-definition set, the output table and the diagnostics, with the
//! namespace registry lent in for the duration of the document.
//!
//! - [`json`]: JSON Schema with Metaschema-style `$id`s
//! - [`metaschema`]: XML Metaschema definitions

pub mod json;
pub mod metaschema;
pub mod xml;

use regex::Regex;
use std::collections::HashSet;
use std::path::Path;

use crate::config::NamingConfig;
use crate::error::Result;
use crate::graph::diagnostics::{DiagnosticCode, DiagnosticItem, Diagnostics};
use crate::ir::{CanonicalSchema, CanonicalType, Namespace, TypeName, TypeTable};
use crate::resolve::{split_qualified, IdentifierResolver, NamespaceRegistry};

/// Input notation, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    JsonSchema,
    Metaschema,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(Self::JsonSchema),
            Some("xml") => Some(Self::Metaschema),
            _ => None,
        }
    }
}

/// Counters reported per document
#[derive(Debug, Clone, Default)]
pub struct WalkStats {
    pub ids: HashSet<String>,
    pub refs: HashSet<String>,
    pub aliases: HashSet<String>,
}

/// Result of walking one document: unordered table plus its info block
#[derive(Debug, Clone)]
pub struct Translation {
    pub schema: CanonicalSchema,
    pub diagnostics: Diagnostics,
    pub stats: WalkStats,
}

/// Per-document state shared by `scan` calls
pub struct TranslationSession<'r> {
    pub naming: NamingConfig,
    pub registry: &'r mut NamespaceRegistry,
    pub resolver: IdentifierResolver,
    pub table: TypeTable,
    pub seen: HashSet<String>,
    pub diagnostics: Diagnostics,
    pub stats: WalkStats,
}

impl<'r> TranslationSession<'r> {
    pub fn new(naming: &NamingConfig, registry: &'r mut NamespaceRegistry) -> Result<Self> {
        let sys = naming.separator()?;
        registry.begin_document();
        Ok(Self {
            naming: naming.clone(),
            registry,
            resolver: IdentifierResolver::new(sys),
            table: TypeTable::new(),
            seen: HashSet::new(),
            diagnostics: Diagnostics::new(),
            stats: WalkStats::default(),
        })
    }

    /// Append a type to the table; identical re-insertions are no-ops
    pub fn add(&mut self, t: CanonicalType) -> Result<TypeName> {
        let name = t.name.clone();
        if self.table.insert(t)? {
            tracing::debug!("type {}", name);
        }
        Ok(name)
    }

    /// Qualified root marker name for the namespace of `owner`
    pub fn root_marker_for(&self, owner: &str) -> TypeName {
        let prefix = split_qualified(owner).map(|(p, _)| p).unwrap_or(owner);
        format!("{}:{}", prefix, self.naming.root_marker)
    }

    /// `[prefix, uri]` for every namespace this document used
    pub fn namespaces(&self, base: &str) -> Vec<Namespace> {
        let used = self.registry.used_keys();
        self.registry
            .entries()
            .filter(|(key, _)| used.contains(*key))
            .map(|(key, prefix)| Namespace::new(prefix, self.registry.uri(base, key)))
            .collect()
    }

    /// Check generated names against the naming constraints
    pub fn check_names(&mut self) -> Result<()> {
        let diagnostics = check_names(self.table.iter(), &self.naming)?;
        self.diagnostics.merge(diagnostics);
        Ok(())
    }

    /// Log the per-document summary
    pub fn log_summary(&self, label: &str) {
        tracing::info!(
            "{}: {} ids, {} aliases, {} refs, {} namespaces, {} types",
            label,
            self.stats.ids.len(),
            self.stats.aliases.len(),
            self.stats.refs.len(),
            self.registry.used_keys().len(),
            self.table.len()
        );
    }
}

/// Validate type and field names against `$TypeName`, `$FieldName` and
/// `$MaxString`. Type names are checked without their namespace prefix.
pub fn check_names<'a>(
    types: impl Iterator<Item = &'a CanonicalType>,
    naming: &NamingConfig,
) -> Result<Diagnostics> {
    let type_re = Regex::new(&naming.type_name)?;
    let field_re = Regex::new(&naming.field_name)?;
    let mut diagnostics = Diagnostics::new();

    for t in types {
        let local = split_qualified(&t.name).map(|(_, l)| l).unwrap_or(&t.name);
        if !type_re.is_match(local) {
            diagnostics.push(DiagnosticItem::new(
                &t.name,
                DiagnosticCode::InvalidTypeName,
                format!("'{}' does not match {}", local, naming.type_name),
            ));
        }
        if t.name.len() > naming.max_string {
            diagnostics.push(DiagnosticItem::new(
                &t.name,
                DiagnosticCode::NameTooLong,
                format!("{} characters exceeds {}", t.name.len(), naming.max_string),
            ));
        }
        for field in t.fields.iter().filter_map(|f| f.as_struct()) {
            if !field_re.is_match(&field.name) {
                diagnostics.push(DiagnosticItem::new(
                    &t.name,
                    DiagnosticCode::InvalidFieldName,
                    format!("field '{}' does not match {}", field.name, naming.field_name),
                ));
            }
        }
    }

    Ok(diagnostics)
}

/// Namespace base of a package URI: everything up to and including the last `/`
pub fn package_base(package: &str) -> String {
    match package.rsplit_once('/') {
        Some((base, _)) => format!("{}/", base),
        None => String::new(),
    }
}
