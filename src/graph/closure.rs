//! Re-export staleness closure.
//!
//! A module that re-exports a binding from a changed module is not rebuilt
//! by the compiler, yet its emitted artifact still holds the stale compiled
//! reference. On incremental runs the affected set is therefore expanded
//! along incoming re-export edges until no new tracked file is reachable.

use rustc_hash::FxHashSet;
use std::path::Path;

use super::{DepKind, ModuleGraph, ModuleIdx};
use crate::store::TrackedSet;

/// Expand the raw affected set along incoming re-export edges.
///
/// Whenever an edge pointing at an affected module is tagged
/// [`DepKind::ReExport`] and its origin belongs to a tracked file, the
/// origin joins the affected set and the walk continues from it. Ordinary
/// edges are never expanded, keeping cost proportional to the closure.
/// The visited set is keyed by resource path, so cyclic re-export graphs
/// terminate.
///
/// Returns the expanded set: the input order first, additions in discovery
/// order.
pub fn expand(graph: &ModuleGraph, affected: &[ModuleIdx], tracked: &TrackedSet) -> Vec<ModuleIdx> {
    let incoming = graph.incoming_edges();

    let mut visited: FxHashSet<&Path> = affected
        .iter()
        .filter_map(|&idx| graph.get(idx).resource.as_deref())
        .collect();
    let mut expanded = affected.to_vec();
    let mut stack = affected.to_vec();

    while let Some(idx) = stack.pop() {
        for &(origin, kind) in &incoming[idx] {
            if kind != DepKind::ReExport {
                continue;
            }
            let Some(resource) = graph.get(origin).resource.as_deref() else {
                continue;
            };
            if !tracked.contains(resource) || !visited.insert(resource) {
                continue;
            }
            expanded.push(origin);
            stack.push(origin);
        }
    }

    crate::debug!("closure"; "expanded {} affected modules to {}", affected.len(), expanded.len());
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{DepEdge, ModuleRecord};
    use crate::store::TrackedFile;
    use smallvec::SmallVec;
    use std::path::PathBuf;

    fn module(resource: &str, deps: Vec<DepEdge>) -> ModuleRecord {
        ModuleRecord {
            id: Some(0),
            resource: Some(PathBuf::from(resource)),
            deps: SmallVec::from_vec(deps),
            ..ModuleRecord::default()
        }
    }

    fn tracked(paths: &[&str]) -> TrackedSet {
        TrackedSet::snapshot(
            paths
                .iter()
                .map(|p| TrackedFile::new(p.trim_start_matches('/'), *p))
                .collect(),
        )
    }

    #[test]
    fn re_export_dependent_joins_affected_set() {
        // b re-exports from a; c imports from b ordinarily
        let mut graph = ModuleGraph::new();
        let a = graph.push(module("/p/a.js", vec![]));
        let b = graph.push(module("/p/b.js", vec![DepEdge::re_export(a)]));
        let _c = graph.push(module("/p/c.js", vec![DepEdge::ordinary(b)]));
        let tracked = tracked(&["/p/a.js", "/p/b.js", "/p/c.js"]);

        // Only a changed
        let expanded = expand(&graph, &[a], &tracked);
        assert_eq!(expanded, vec![a, b]);
    }

    #[test]
    fn ordinary_edges_are_not_expanded() {
        let mut graph = ModuleGraph::new();
        let a = graph.push(module("/p/a.js", vec![]));
        let _b = graph.push(module("/p/b.js", vec![DepEdge::ordinary(a)]));
        let tracked = tracked(&["/p/a.js", "/p/b.js"]);

        let expanded = expand(&graph, &[a], &tracked);
        assert_eq!(expanded, vec![a]);
    }

    #[test]
    fn chains_of_re_exports_propagate() {
        // d re-exports from b, b re-exports from a
        let mut graph = ModuleGraph::new();
        let a = graph.push(module("/p/a.js", vec![]));
        let b = graph.push(module("/p/b.js", vec![DepEdge::re_export(a)]));
        let d = graph.push(module("/p/d.js", vec![DepEdge::re_export(b)]));
        let tracked = tracked(&["/p/a.js", "/p/b.js", "/p/d.js"]);

        let expanded = expand(&graph, &[a], &tracked);
        assert_eq!(expanded, vec![a, b, d]);
    }

    #[test]
    fn cyclic_re_exports_terminate() {
        // a and b re-export from each other (index 1 is b, known up front)
        let mut graph = ModuleGraph::new();
        let a = graph.push(module("/p/a.js", vec![DepEdge::re_export(1)]));
        let b = graph.push(module("/p/b.js", vec![DepEdge::re_export(a)]));
        let tracked = tracked(&["/p/a.js", "/p/b.js"]);

        let expanded = expand(&graph, &[a], &tracked);
        assert_eq!(expanded, vec![a, b]);
    }

    #[test]
    fn untracked_origins_are_skipped() {
        let mut graph = ModuleGraph::new();
        let a = graph.push(module("/p/a.js", vec![]));
        let _vendor = graph.push(module("/node_modules/v.js", vec![DepEdge::re_export(a)]));
        let tracked = tracked(&["/p/a.js"]);

        let expanded = expand(&graph, &[a], &tracked);
        assert_eq!(expanded, vec![a]);
    }

    #[test]
    fn already_affected_modules_are_not_duplicated() {
        let mut graph = ModuleGraph::new();
        let a = graph.push(module("/p/a.js", vec![]));
        let b = graph.push(module("/p/b.js", vec![DepEdge::re_export(a)]));
        let tracked = tracked(&["/p/a.js", "/p/b.js"]);

        // b was already rebuilt by the compiler this run
        let expanded = expand(&graph, &[a, b], &tracked);
        assert_eq!(expanded, vec![a, b]);
    }
}
