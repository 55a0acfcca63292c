//! Dependency Graph Analysis
//!
//! Strongly connected components (reference cycles) of a type graph.
//! Recursive types are legal in the IR; cycles are reported, never broken.

use petgraph::algo::kosaraju_scc;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use super::diagnostics::Diagnostics;
use super::DependencyGraph;
use crate::ir::TypeName;

// =============================================================================
// Cycle Group
// =============================================================================

/// A strongly connected component of the type graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleGroup {
    /// Index of this group in the analysis result
    pub id: usize,
    /// Member types, sorted
    pub members: Vec<TypeName>,
    /// Whether this is a single type referencing itself
    pub is_self_referential: bool,
}

impl CycleGroup {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

// =============================================================================
// Analysis
// =============================================================================

/// Find every cycle group: multi-member SCCs plus self-referencing types.
/// Groups are sorted by their first member.
pub fn find_cycles(graph: &DependencyGraph) -> Vec<CycleGroup> {
    let (pg, _) = graph.to_petgraph();
    let mut groups: Vec<(Vec<TypeName>, bool)> = Vec::new();

    for scc in kosaraju_scc(&pg) {
        if scc.len() == 1 {
            let node_idx = scc[0];
            let has_self_ref = pg
                .edges_directed(node_idx, Direction::Outgoing)
                .any(|e| e.target() == node_idx);
            if has_self_ref {
                if let Some(name) = pg.node_weight(node_idx) {
                    groups.push((vec![name.clone()], true));
                }
            }
            continue;
        }

        let mut members: Vec<TypeName> = scc.iter().filter_map(|&idx| pg.node_weight(idx).cloned()).collect();
        members.sort();
        groups.push((members, false));
    }

    groups.sort();
    groups
        .into_iter()
        .enumerate()
        .map(|(id, (members, is_self_referential))| CycleGroup {
            id,
            members,
            is_self_referential,
        })
        .collect()
}

/// Report multi-member cycles as info diagnostics. Self-loops are reported
/// by the orderer.
pub fn report_cycles(graph: &DependencyGraph) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();
    for group in find_cycles(graph).iter().filter(|g| !g.is_self_referential) {
        diagnostics.cycle(&group.members);
    }
    diagnostics
}
