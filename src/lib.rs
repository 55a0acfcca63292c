//! Schema Canon
//!
//! Translates JSON Schema (Metaschema-style `$id`s) and XML Metaschema
//! documents into a canonical, namespaced type model.
//!
//! ## Pipeline
//!
//! ```text
//! document ──walk──▶ type table + info ──build_graph──▶ DependencyGraph
//!                                                          │
//!                                                        order
//!                                                          ▼
//!                                 combined schema ──split──▶ one schema per namespace
//!                                                          │
//!                                                       emitters (.jadn, .proto)
//! ```
//!
//! - [`resolve`]: encoded identifiers → qualified type names, namespace prefixes
//! - [`walk`]: JSON Schema and Metaschema front-ends
//! - [`graph`]: dependency graph, topological order, cycle analysis
//! - [`package`]: per-namespace split
//! - [`loader`]: directory batches with per-document failure isolation
//! - [`codegen`]: text emitters

pub mod codegen;
pub mod config;
pub mod error;
pub mod graph;
pub mod ir;
pub mod loader;
pub mod package;
pub mod resolve;
pub mod walk;

pub use config::{OutputFormat, TranslateConfig};
pub use error::{Result, TranslateError};
pub use graph::{build_graph, order, DependencyGraph, Diagnostics, Ordering};
pub use ir::{BaseKind, CanonicalSchema, CanonicalType, Field, PackageInfo, TypeOption, TypeTable};
pub use loader::{BatchResult, DocumentResult, SourceDocument};
pub use package::{split, Package, SplitResult};
pub use resolve::{IdentifierResolver, NamespaceRegistry};
pub use walk::{SourceFormat, Translation};
