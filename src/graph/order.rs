//! Topological Orderer
//!
//! Breadth-first placement from the roots over the self-loop-free graph.
//! Placed types are bucketed (types with fields, then field-less types) and
//! anything the traversal never reaches trails the output in declaration
//! order.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use super::diagnostics::Diagnostics;
use super::DependencyGraph;
use crate::error::{Result, TranslateError};
use crate::ir::{CanonicalType, TypeName};

/// Result of ordering one type table
#[derive(Debug, Clone, Default)]
pub struct Ordering {
    /// Every declared type exactly once
    pub types: Vec<TypeName>,
    /// Types not reachable from any root, in declaration order
    pub unreferenced: Vec<TypeName>,
    /// Types whose self-referential edge was pruned
    pub self_loops: Vec<TypeName>,
    pub diagnostics: Diagnostics,
}

/// Order the types of `graph` starting from `roots`.
///
/// An empty `roots` list means "every type nothing else references".
/// A root that is not declared is a `DanglingRoot` error.
pub fn order(graph: &DependencyGraph, roots: &[TypeName]) -> Result<Ordering> {
    let mut diagnostics = Diagnostics::new();

    let self_loops = graph.self_loops();
    for name in &self_loops {
        diagnostics.self_loop(name);
    }
    let pruned = graph.without_self_loops();

    let roots: Vec<TypeName> = if roots.is_empty() {
        pruned.unreferenced()
    } else {
        roots.to_vec()
    };
    if let Some(missing) = roots.iter().find(|r| !pruned.contains(r.as_str())) {
        return Err(TranslateError::DanglingRoot(missing.clone()));
    }

    let mut placed: HashSet<&str> = HashSet::new();
    let mut with_fields = Vec::new();
    let mut field_less = Vec::new();
    let mut queue: VecDeque<&str> = roots.iter().map(String::as_str).collect();

    while let Some(name) = queue.pop_front() {
        if placed.contains(name) || !pruned.contains(name) {
            continue;
        }
        placed.insert(name);

        if pruned.has_fields(name) {
            with_fields.push(name.to_string());
        } else {
            field_less.push(name.to_string());
        }

        // BTreeSet iteration is already sorted
        for next in pruned.refs_out(name) {
            if !placed.contains(next.as_str()) {
                queue.push_back(next.as_str());
            }
        }
    }

    let unreferenced: Vec<TypeName> = pruned
        .declared
        .iter()
        .filter(|name| !placed.contains(name.as_str()))
        .cloned()
        .collect();
    for name in &unreferenced {
        diagnostics.unreferenced(name);
    }

    for (source, target) in pruned.undefined() {
        diagnostics.undefined_reference(&source, &target);
    }

    let mut types = with_fields;
    types.extend(field_less);
    types.extend(unreferenced.iter().cloned());

    tracing::debug!(
        "ordered {} types from {} roots ({} unreferenced, {} self-loops)",
        types.len(),
        roots.len(),
        unreferenced.len(),
        self_loops.len()
    );

    Ok(Ordering {
        types,
        unreferenced,
        self_loops,
        diagnostics,
    })
}

impl Ordering {
    /// Rearrange `types` into this ordering. Types the ordering does not
    /// name keep their relative order at the end.
    pub fn apply(&self, types: Vec<CanonicalType>) -> Vec<CanonicalType> {
        let position: HashMap<&str, usize> = self
            .types
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();
        let mut indexed: Vec<(usize, CanonicalType)> = types
            .into_iter()
            .map(|t| (position.get(t.name.as_str()).copied().unwrap_or(usize::MAX), t))
            .collect();
        indexed.sort_by_key(|(pos, _)| *pos);
        indexed.into_iter().map(|(_, t)| t).collect()
    }

    pub fn unreferenced_set(&self) -> BTreeSet<&str> {
        self.unreferenced.iter().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_graph;
    use crate::graph::diagnostics::DiagnosticCode;
    use crate::ir::{make_type, BaseKind, Field, TypeOption};

    fn record(name: &str, refs: &[&str]) -> CanonicalType {
        let fields = refs
            .iter()
            .enumerate()
            .map(|(i, r)| Field::structured(i as u32 + 1, format!("f{}", i + 1), *r, vec![], ""))
            .collect();
        make_type(name, BaseKind::Record, vec![], "", fields)
    }

    fn names(v: &[&str]) -> Vec<TypeName> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_root_then_dependency_then_orphan() {
        let types = vec![record("A", &["B"]), record("B", &["String"]), record("C", &["String"])];
        let graph = build_graph(&types);
        let ordering = order(&graph, &names(&["A"])).unwrap();

        assert_eq!(ordering.types, names(&["A", "B", "C"]));
        assert_eq!(ordering.unreferenced, names(&["C"]));
        assert_eq!(ordering.diagnostics.with_code(DiagnosticCode::Unreferenced).count(), 1);
    }

    #[test]
    fn test_field_less_types_trail() {
        let types = vec![
            record("Root", &["List", "Item"]),
            make_type("List", BaseKind::ArrayOf, vec![TypeOption::ValueType("Item".into())], "", vec![]),
            record("Item", &["String"]),
        ];
        let graph = build_graph(&types);
        let ordering = order(&graph, &names(&["Root"])).unwrap();
        assert_eq!(ordering.types, names(&["Root", "Item", "List"]));
        assert!(ordering.unreferenced.is_empty());
    }

    #[test]
    fn test_self_loop_does_not_change_placement() {
        let with_loop = vec![record("A", &["B"]), record("B", &["B", "C"]), record("C", &["String"])];
        let without_loop = vec![record("A", &["B"]), record("B", &["C"]), record("C", &["String"])];

        let looped = order(&build_graph(&with_loop), &names(&["A"])).unwrap();
        let plain = order(&build_graph(&without_loop), &names(&["A"])).unwrap();

        assert_eq!(looped.types, plain.types);
        assert_eq!(looped.self_loops, names(&["B"]));
        assert_eq!(looped.diagnostics.with_code(DiagnosticCode::SelfLoopDetected).count(), 1);
    }

    #[test]
    fn test_each_type_placed_once() {
        let types = vec![
            record("A", &["B", "C"]),
            record("B", &["D"]),
            record("C", &["D"]),
            record("D", &["A"]),
        ];
        let ordering = order(&build_graph(&types), &names(&["A"])).unwrap();
        assert_eq!(ordering.types, names(&["A", "B", "C", "D"]));
    }

    #[test]
    fn test_dangling_root() {
        let types = vec![record("A", &["String"])];
        let err = order(&build_graph(&types), &names(&["Missing"])).unwrap_err();
        assert!(matches!(err, TranslateError::DanglingRoot(name) if name == "Missing"));
    }

    #[test]
    fn test_default_roots_and_undefined() {
        let types = vec![record("A", &["Ghost"]), record("B", &["String"])];
        let ordering = order(&build_graph(&types), &[]).unwrap();

        assert_eq!(ordering.types, names(&["A", "B"]));
        assert!(ordering.unreferenced.is_empty());
        assert_eq!(ordering.diagnostics.with_code(DiagnosticCode::UndefinedReference).count(), 1);
    }

    #[test]
    fn test_apply() {
        let types = vec![record("C", &["String"]), record("B", &["String"]), record("A", &["B"])];
        let ordering = order(&build_graph(&types), &names(&["A"])).unwrap();
        let applied = ordering.apply(types);
        let applied_names: Vec<&str> = applied.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(applied_names, vec!["A", "B", "C"]);
    }
}
