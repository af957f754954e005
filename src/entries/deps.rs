//! Per-test transitive dependency index.
//!
//! The host consumes this to decide which tests must re-run for a given
//! file change; this core only computes and exposes it.

use rustc_hash::{FxHashMap, FxHashSet};
use std::path::{Path, PathBuf};

use crate::graph::{ModuleGraph, ModuleIdx};
use crate::store::TrackedSet;

/// Test file id → ordered set of tracked-file ids it transitively imports.
///
/// Recomputed per test module whenever that module is rebuilt; cleared as
/// part of the atomic structural reset.
#[derive(Debug, Default)]
pub struct TestDependencyIndex {
    deps: FxHashMap<PathBuf, Vec<PathBuf>>,
}

impl TestDependencyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, test: &Path, deps: Vec<PathBuf>) {
        self.deps.insert(test.to_path_buf(), deps);
    }

    pub fn get(&self, test: &Path) -> Option<&[PathBuf]> {
        self.deps.get(test).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &[PathBuf])> {
        self.deps
            .iter()
            .map(|(test, deps)| (test.as_path(), deps.as_slice()))
    }

    pub fn clear(&mut self) {
        self.deps.clear();
    }

    pub fn len(&self) -> usize {
        self.deps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deps.is_empty()
    }
}

/// Gather the tracked-file ids a module transitively depends on.
///
/// Walks forward edges of every kind (ordinary and re-export),
/// deduplicating through a resource-keyed visited set, preserving
/// discovery order. The start module itself is not part of its own
/// dependency list.
pub fn collect_tracked_deps(
    graph: &ModuleGraph,
    start: ModuleIdx,
    tracked: &TrackedSet,
) -> Vec<PathBuf> {
    let mut seen: FxHashSet<ModuleIdx> = FxHashSet::default();
    seen.insert(start);
    let mut visited: FxHashSet<&Path> = FxHashSet::default();
    if let Some(resource) = graph.get(start).resource.as_deref() {
        visited.insert(resource);
    }

    let mut deps = Vec::new();
    let mut stack: Vec<ModuleIdx> = graph
        .get(start)
        .deps
        .iter()
        .rev()
        .map(|e| e.target)
        .collect();

    while let Some(idx) = stack.pop() {
        if !seen.insert(idx) {
            continue;
        }
        let module = graph.get(idx);
        if let Some(resource) = module.resource.as_deref() {
            if !visited.insert(resource) {
                continue;
            }
            if tracked.contains(resource) {
                deps.push(resource.to_path_buf());
            }
        }
        stack.extend(module.deps.iter().rev().map(|e| e.target));
    }

    deps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{DepEdge, ModuleRecord};
    use crate::store::TrackedFile;
    use smallvec::SmallVec;

    fn module(resource: Option<&str>, deps: Vec<DepEdge>) -> ModuleRecord {
        ModuleRecord {
            id: Some(0),
            resource: resource.map(PathBuf::from),
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
    fn collects_transitive_tracked_deps_in_discovery_order() {
        // t -> b -> a, t -> c
        let mut graph = ModuleGraph::new();
        let a = graph.push(module(Some("/p/a.js"), vec![]));
        let b = graph.push(module(Some("/p/b.js"), vec![DepEdge::re_export(a)]));
        let c = graph.push(module(Some("/p/c.js"), vec![]));
        let t = graph.push(module(
            Some("/p/t.spec.js"),
            vec![DepEdge::ordinary(b), DepEdge::ordinary(c)],
        ));
        let tracked = tracked(&["/p/a.js", "/p/b.js", "/p/c.js", "/p/t.spec.js"]);

        let deps = collect_tracked_deps(&graph, t, &tracked);
        assert_eq!(
            deps,
            vec![
                PathBuf::from("/p/b.js"),
                PathBuf::from("/p/a.js"),
                PathBuf::from("/p/c.js"),
            ]
        );
    }

    #[test]
    fn untracked_modules_are_traversed_but_not_collected() {
        // t -> vendor -> a : a is tracked, vendor is not
        let mut graph = ModuleGraph::new();
        let a = graph.push(module(Some("/p/a.js"), vec![]));
        let vendor = graph.push(module(
            Some("/node_modules/v.js"),
            vec![DepEdge::ordinary(a)],
        ));
        let t = graph.push(module(Some("/p/t.spec.js"), vec![DepEdge::ordinary(vendor)]));
        let tracked = tracked(&["/p/a.js", "/p/t.spec.js"]);

        let deps = collect_tracked_deps(&graph, t, &tracked);
        assert_eq!(deps, vec![PathBuf::from("/p/a.js")]);
    }

    #[test]
    fn shared_dependency_appears_once() {
        // t -> b -> a, t -> c -> a
        let mut graph = ModuleGraph::new();
        let a = graph.push(module(Some("/p/a.js"), vec![]));
        let b = graph.push(module(Some("/p/b.js"), vec![DepEdge::ordinary(a)]));
        let c = graph.push(module(Some("/p/c.js"), vec![DepEdge::ordinary(a)]));
        let t = graph.push(module(
            Some("/p/t.spec.js"),
            vec![DepEdge::ordinary(b), DepEdge::ordinary(c)],
        ));
        let tracked = tracked(&["/p/a.js", "/p/b.js", "/p/c.js", "/p/t.spec.js"]);

        let deps = collect_tracked_deps(&graph, t, &tracked);
        assert_eq!(deps.iter().filter(|d| d.ends_with("a.js")).count(), 1);
    }

    #[test]
    fn cyclic_imports_terminate() {
        let mut graph = ModuleGraph::new();
        let a = graph.push(module(Some("/p/a.js"), vec![DepEdge::ordinary(1)]));
        let _b = graph.push(module(Some("/p/b.js"), vec![DepEdge::ordinary(a)]));
        let tracked = tracked(&["/p/a.js", "/p/b.js"]);

        let deps = collect_tracked_deps(&graph, a, &tracked);
        assert_eq!(deps, vec![PathBuf::from("/p/b.js")]);
    }

    #[test]
    fn index_records_and_clears() {
        let mut index = TestDependencyIndex::new();
        index.record(Path::new("/p/t.spec.js"), vec![PathBuf::from("/p/a.js")]);

        assert_eq!(
            index.get(Path::new("/p/t.spec.js")),
            Some(&[PathBuf::from("/p/a.js")][..])
        );
        index.clear();
        assert!(index.is_empty());
    }
}
