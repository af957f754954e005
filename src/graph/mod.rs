//! Module records and the per-run dependency graph snapshot.
//!
//! The external compiler owns module resolution and graph construction;
//! each run it hands this core a [`ModuleGraph`] snapshot plus the list of
//! module indices it actually rebuilt. Numeric module ids are stable only
//! within one compiled generation; [`identity`] maps them to externally
//! visible ids that survive incremental runs.

pub mod closure;
pub mod identity;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::path::{Path, PathBuf};

/// Index of a module inside one [`ModuleGraph`] snapshot.
pub type ModuleIdx = usize;

/// Kind of a dependency edge, decided at graph construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepKind {
    /// Plain import: the dependent copies or calls what it imports.
    Ordinary,
    /// The dependent forwards a binding it does not itself define;
    /// requires live-binding propagation rather than value copying.
    ReExport,
}

/// One outgoing dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepEdge {
    pub target: ModuleIdx,
    pub kind: DepKind,
}

impl DepEdge {
    pub fn ordinary(target: ModuleIdx) -> Self {
        Self {
            target,
            kind: DepKind::Ordinary,
        }
    }

    pub fn re_export(target: ModuleIdx) -> Self {
        Self {
            target,
            kind: DepKind::ReExport,
        }
    }
}

/// A compiler-produced module unit.
#[derive(Debug, Clone, Default)]
pub struct ModuleRecord {
    /// Compiler-internal numeric id, stable within one generation only.
    /// Absent for runtime-synthetic modules.
    pub id: Option<u32>,
    /// Absolute resource path; absent for runtime-synthetic modules.
    pub resource: Option<PathBuf>,
    /// Externally supplied stable-id annotation; survives structural
    /// reshuffles when present.
    pub stable_id: Option<String>,
    /// Outgoing dependency edges.
    pub deps: SmallVec<[DepEdge; 4]>,
    /// Generated code for this module.
    pub source: String,
    /// Source map for the generated code, when the compiler emitted one.
    pub source_map: Option<String>,
    /// Whether the factory body must run in strict mode.
    pub strict: bool,
}

/// Arena of modules for one compiled generation.
///
/// Forward edges live on each [`ModuleRecord`]; the reverse adjacency is
/// materialized on demand by [`ModuleGraph::incoming_edges`], once per
/// closure walk.
#[derive(Debug, Default)]
pub struct ModuleGraph {
    modules: Vec<ModuleRecord>,
    by_resource: FxHashMap<PathBuf, ModuleIdx>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a module, indexing it by resource path when it has one.
    ///
    /// A resource compiled more than once (e.g. under a mock substitution)
    /// keeps its first index as the canonical lookup.
    pub fn push(&mut self, module: ModuleRecord) -> ModuleIdx {
        let idx = self.modules.len();
        if let Some(resource) = &module.resource {
            self.by_resource.entry(resource.clone()).or_insert(idx);
        }
        self.modules.push(module);
        idx
    }

    #[inline]
    pub fn get(&self, idx: ModuleIdx) -> &ModuleRecord {
        &self.modules[idx]
    }

    #[inline]
    pub fn by_resource(&self, resource: &Path) -> Option<ModuleIdx> {
        self.by_resource.get(resource).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModuleIdx, &ModuleRecord)> {
        self.modules.iter().enumerate()
    }

    /// Build the reverse adjacency: for each module, the (origin, kind)
    /// pairs of edges pointing at it.
    pub fn incoming_edges(&self) -> Vec<SmallVec<[(ModuleIdx, DepKind); 4]>> {
        let mut incoming = vec![SmallVec::new(); self.modules.len()];
        for (origin, module) in self.iter() {
            for edge in &module.deps {
                incoming[edge.target].push((origin, edge.kind));
            }
        }
        incoming
    }
}
