//! Package Splitter
//!
//! Partitions the combined tables of one or more documents into one schema
//! per namespace. Within a package, references to its own types drop their
//! prefix; everything else stays qualified and its prefix is imported.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::config::NamingConfig;
use crate::error::{Result, TranslateError};
use crate::graph::diagnostics::Diagnostics;
use crate::graph::{build_graph, order};
use crate::ir::{CanonicalSchema, CanonicalType, Namespace, PackageInfo, TypeName};
use crate::resolve::{split_qualified, NamespaceRegistry};
use crate::walk::package_base;

/// One namespace's schema
#[derive(Debug, Clone)]
pub struct Package {
    pub prefix: String,
    /// Namespace display name; also the package file stem
    pub name: String,
    pub schema: CanonicalSchema,
}

#[derive(Debug, Clone, Default)]
pub struct SplitResult {
    /// Packages in namespace registration order
    pub packages: Vec<Package>,
    pub diagnostics: Diagnostics,
}

impl SplitResult {
    pub fn get(&self, name: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.name == name)
    }
}

/// Types of one prefix, first definition per local name
#[derive(Debug, Default)]
struct Group {
    locals: Vec<String>,
    defs: HashMap<String, Vec<CanonicalType>>,
}

impl Group {
    fn add(&mut self, local: &str, t: &CanonicalType) {
        let defs = self.defs.entry(local.to_string()).or_insert_with(|| {
            self.locals.push(local.to_string());
            Vec::new()
        });
        if !defs.iter().any(|d| d.same_structure(t)) {
            defs.push(t.clone());
        }
    }
}

/// Split ordered per-document schemas into per-namespace packages
pub fn split(
    schemas: &[CanonicalSchema],
    registry: &NamespaceRegistry,
    naming: &NamingConfig,
) -> Result<SplitResult> {
    let mut diagnostics = Diagnostics::new();
    let mut groups: BTreeMap<String, Group> = BTreeMap::new();

    for schema in schemas {
        for t in &schema.types {
            let (prefix, local) = split_qualified(&t.name)
                .ok_or_else(|| TranslateError::malformed(&t.name, "type name has no namespace prefix"))?;
            groups.entry(prefix.to_string()).or_default().add(local, t);
        }
    }

    // Collapse duplicates; differing definitions are fatal except for the root marker
    let mut package_types: BTreeMap<String, Vec<CanonicalType>> = BTreeMap::new();
    for (prefix, group) in &groups {
        let mut types = Vec::with_capacity(group.locals.len());
        for local in &group.locals {
            let Some(defs) = group.defs.get(local) else {
                continue;
            };
            if defs.len() > 1 {
                if *local == naming.root_marker {
                    diagnostics.root_marker_collision(&format!("{}:{}", prefix, local), defs.len());
                } else {
                    return Err(TranslateError::AmbiguousLocalName {
                        namespace: prefix.clone(),
                        name: local.clone(),
                        count: defs.len(),
                    });
                }
            }
            if let Some(first) = defs.first() {
                types.push(first.clone());
            }
        }
        package_types.insert(prefix.clone(), types);
    }

    report_collisions(&groups, naming, &mut diagnostics);

    let base = schemas
        .first()
        .map(|s| package_base(&s.info.package))
        .unwrap_or_default();

    let mut packages = Vec::with_capacity(package_types.len());
    for prefix in prefix_order(registry, &package_types) {
        let Some(types) = package_types.remove(&prefix) else {
            continue;
        };
        let key = registry.key_for_prefix(&prefix).unwrap_or(prefix.as_str());
        let name = registry.namespace_name(key).to_string();

        let (schema, package_diagnostics) = build_package(&prefix, &name, types, schemas, registry, &base, naming)?;
        diagnostics.merge(package_diagnostics);

        tracing::info!("package {} ({}): {} types", name, prefix, schema.types.len());
        packages.push(Package { prefix, name, schema });
    }

    Ok(SplitResult { packages, diagnostics })
}

/// Registry order first, then prefixes the registry never saw, sorted
fn prefix_order(registry: &NamespaceRegistry, package_types: &BTreeMap<String, Vec<CanonicalType>>) -> Vec<String> {
    let mut ordered: Vec<String> = registry
        .entries()
        .map(|(_, prefix)| prefix.to_string())
        .filter(|prefix| package_types.contains_key(prefix))
        .collect();
    for prefix in package_types.keys() {
        if !ordered.contains(prefix) {
            ordered.push(prefix.clone());
        }
    }
    ordered
}

fn report_collisions(groups: &BTreeMap<String, Group>, naming: &NamingConfig, diagnostics: &mut Diagnostics) {
    let mut by_local: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for (prefix, group) in groups {
        for local in &group.locals {
            by_local
                .entry(local.as_str())
                .or_default()
                .push(format!("{}:{}", prefix, local));
        }
    }
    for (local, qualified) in by_local {
        if qualified.len() > 1 && local != naming.root_marker {
            diagnostics.non_qualified_collision(local, &qualified);
        }
    }
}

fn build_package(
    prefix: &str,
    name: &str,
    types: Vec<CanonicalType>,
    schemas: &[CanonicalSchema],
    registry: &NamespaceRegistry,
    base: &str,
    naming: &NamingConfig,
) -> Result<(CanonicalSchema, Diagnostics)> {
    let locals: BTreeSet<String> = types
        .iter()
        .filter_map(|t| split_qualified(&t.name).map(|(_, l)| l.to_string()))
        .collect();

    let localize = |n: &str| -> String {
        match split_qualified(n) {
            Some((p, l)) if p == prefix && locals.contains(l) => l.to_string(),
            _ => n.to_string(),
        }
    };
    let types: Vec<CanonicalType> = types.iter().map(|t| t.rename(&localize)).collect();

    let imported: BTreeSet<&str> = types
        .iter()
        .flat_map(|t| t.references())
        .filter_map(|r| split_qualified(r).map(|(p, _)| p))
        .filter(|p| *p != prefix)
        .collect();
    let namespaces: Vec<Namespace> = imported
        .into_iter()
        .map(|p| {
            let key = registry.key_for_prefix(p).unwrap_or(p);
            Namespace::new(p, registry.uri(base, key))
        })
        .collect();

    let graph = build_graph(&types);
    let roots: Vec<TypeName> = graph.unreferenced();
    let ordering = order(&graph, &roots)?;

    let package_uri = format!("{}{}", base, name);
    let mut info = schemas
        .iter()
        .find(|s| s.info.package == package_uri || s.info.package.rsplit('/').next() == Some(name))
        .map(|s| s.info.clone())
        .unwrap_or_else(|| PackageInfo::new(package_uri));
    info.roots = roots;
    info.namespaces = namespaces;
    info.config = naming.info_config();

    let schema = CanonicalSchema {
        info,
        types: ordering.apply(types),
    };
    Ok((schema, ordering.diagnostics))
}
