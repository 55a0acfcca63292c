//! Type Dependency Graph
//!
//! Map from each declared type to the set of declared types it references.
//! Built from a flat type table; references come from struct-field types and
//! from the type-carrying options (`ValueType`, `KeyType`). Builtin primitive
//! names never appear as dependencies.
//!
//! Sorted collections throughout so every traversal is deterministic.

pub mod analysis;
pub mod diagnostics;
pub mod order;

pub use analysis::{find_cycles, report_cycles, CycleGroup};
pub use diagnostics::{DiagnosticCode, DiagnosticItem, Diagnostics, Severity};
pub use order::{order, Ordering};

use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::ir::{CanonicalType, TypeName};

/// The dependency graph of one type table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    /// type → referenced types; a key for every declared type
    pub deps: BTreeMap<TypeName, BTreeSet<TypeName>>,

    /// Declared types that carry fields
    pub structured: BTreeSet<TypeName>,

    /// Declaration order of the table the graph was built from
    pub declared: Vec<TypeName>,
}

/// Build the dependency graph of a type table. Pure.
pub fn build_graph<'a>(types: impl IntoIterator<Item = &'a CanonicalType>) -> DependencyGraph {
    let mut graph = DependencyGraph::default();

    for t in types {
        let entry = graph.deps.entry(t.name.clone()).or_default();
        entry.extend(t.references().map(str::to_string));

        if t.has_fields() {
            graph.structured.insert(t.name.clone());
        }
        if !graph.declared.contains(&t.name) {
            graph.declared.push(t.name.clone());
        }
    }

    graph
}

impl DependencyGraph {
    pub fn contains(&self, name: &str) -> bool {
        self.deps.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.deps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deps.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.deps.values().map(BTreeSet::len).sum()
    }

    /// Outgoing references of a type
    pub fn refs_out(&self, name: &str) -> impl Iterator<Item = &TypeName> {
        self.deps.get(name).into_iter().flatten()
    }

    /// Types referencing `name`
    pub fn refs_in<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a TypeName> {
        self.deps
            .iter()
            .filter(move |(_, targets)| targets.contains(name))
            .map(|(source, _)| source)
    }

    pub fn has_fields(&self, name: &str) -> bool {
        self.structured.contains(name)
    }

    /// Every name referenced by some type, declared or not
    pub fn referenced(&self) -> BTreeSet<&str> {
        self.deps.values().flatten().map(String::as_str).collect()
    }

    /// Declared types nobody else references, in declaration order.
    /// A self-reference does not count.
    pub fn unreferenced(&self) -> Vec<TypeName> {
        let mut referenced: BTreeSet<&str> = BTreeSet::new();
        for (source, targets) in &self.deps {
            referenced.extend(targets.iter().filter(|t| *t != source).map(String::as_str));
        }
        self.declared
            .iter()
            .filter(|name| !referenced.contains(name.as_str()))
            .cloned()
            .collect()
    }

    /// `(source, target)` pairs whose target is not declared
    pub fn undefined(&self) -> Vec<(TypeName, TypeName)> {
        self.deps
            .iter()
            .flat_map(|(source, targets)| {
                targets
                    .iter()
                    .filter(|t| !self.deps.contains_key(t.as_str()))
                    .map(move |t| (source.clone(), t.clone()))
            })
            .collect()
    }

    /// Types that reference themselves
    pub fn self_loops(&self) -> Vec<TypeName> {
        self.deps
            .iter()
            .filter(|(name, targets)| targets.contains(name.as_str()))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Copy with every self-referential edge removed
    pub fn without_self_loops(&self) -> DependencyGraph {
        let mut pruned = self.clone();
        for (name, targets) in pruned.deps.iter_mut() {
            targets.remove(name);
        }
        pruned
    }

    /// petgraph view over declared types; edges to undeclared names are
    /// dropped.
    pub fn to_petgraph(&self) -> (DiGraph<TypeName, ()>, HashMap<TypeName, NodeIndex>) {
        let mut graph = DiGraph::new();
        let mut indices = HashMap::new();

        for name in self.deps.keys() {
            indices.insert(name.clone(), graph.add_node(name.clone()));
        }
        for (source, targets) in &self.deps {
            for target in targets {
                if let (Some(&from), Some(&to)) = (indices.get(source), indices.get(target)) {
                    graph.add_edge(from, to, ());
                }
            }
        }

        (graph, indices)
    }

    /// Export the dependency graph to GraphViz DOT format
    pub fn to_dot(&self) -> String {
        let mut output = String::new();

        output.push_str("digraph TypeGraph {\n");
        output.push_str("  rankdir=LR;\n");
        output.push_str("  bgcolor=\"#1e1e1e\";\n");
        output.push_str("  node [shape=box, style=\"filled,rounded\", fontname=\"Helvetica\", fontsize=10, fontcolor=\"white\", color=\"#404040\"];\n");
        output.push_str("  edge [fontname=\"Helvetica\", fontsize=8, fontcolor=\"#808080\"];\n");
        output.push('\n');

        let roots: BTreeSet<TypeName> = self.unreferenced().into_iter().collect();

        for name in self.deps.keys() {
            let color = if roots.contains(name) {
                "#4CAF50"
            } else if self.structured.contains(name) {
                "#2196F3"
            } else {
                "#607D8B"
            };
            output.push_str(&format!(
                "  \"{}\" [label=\"{}\", fillcolor=\"{}\"];\n",
                dot_id(name),
                name,
                color
            ));
        }

        output.push('\n');

        for (source, targets) in &self.deps {
            for target in targets {
                // Only include edges between types we have nodes for
                if self.deps.contains_key(target) {
                    output.push_str(&format!("  \"{}\" -> \"{}\";\n", dot_id(source), dot_id(target)));
                }
            }
        }

        output.push_str("}\n");
        output
    }
}

fn dot_id(name: &str) -> String {
    name.replace([':', '.', '-', '$'], "_")
}
