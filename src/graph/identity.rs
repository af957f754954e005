//! Externally visible module identities.
//!
//! The compiler's numeric ids are cheap but only stable within one compiled
//! generation. Entry and test modules are addressed from outside (previously
//! emitted "run this entry" scripts), so they get path-based identities that
//! survive recompiles. A host-supplied stable-id annotation trumps both.

use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use super::ModuleRecord;
use crate::store::TrackedFile;

// ============================================================================
// ModuleIdentity
// ============================================================================

/// The key a module is registered under in the runtime cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModuleIdentity {
    /// Host-supplied stable id, used verbatim.
    Stable(String),
    /// Absolute resource path; stable across incremental runs.
    Path(PathBuf),
    /// Compiler-internal numeric id; regenerated with its referents.
    Numeric(u32),
}

impl ModuleIdentity {
    /// Render as a JavaScript object-literal key.
    ///
    /// Numeric identities stay bare numbers; everything else becomes a
    /// JSON string literal.
    pub fn as_js_key(&self) -> String {
        match self {
            Self::Numeric(id) => id.to_string(),
            other => serde_json::Value::String(other.to_string()).to_string(),
        }
    }
}

impl fmt::Display for ModuleIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stable(id) => write!(f, "{id}"),
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Numeric(id) => write!(f, "{id}"),
        }
    }
}

// ============================================================================
// IdentityRegistry
// ============================================================================

/// Run-spanning identity state.
///
/// Tracks which identities an already-emitted loader protocol knows (the
/// regeneration trigger), the identity→numeric translation table and
/// test-path table serialized into the bootstrap, the path → last-assigned
/// identity map, and how many distinct numeric ids each tracked path has
/// been compiled under.
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    /// Identities baked into the last emitted protocol.
    known: FxHashSet<ModuleIdentity>,
    /// Identities observed this run but absent from `known`.
    pending: FxHashSet<ModuleIdentity>,
    /// Non-numeric identity → current numeric id, insertion-ordered for
    /// stable serialization.
    id_table: Vec<(ModuleIdentity, u32)>,
    id_table_index: FxHashMap<ModuleIdentity, usize>,
    /// Test file path by numeric id.
    test_paths: Vec<(u32, PathBuf)>,
    test_path_index: FxHashMap<u32, usize>,
    /// Path → last-assigned identity, so dependents can discover an
    /// entry/test module's current id.
    last_by_path: FxHashMap<PathBuf, ModuleIdentity>,
    /// Distinct numeric ids seen per tracked resource path.
    numeric_ids_by_path: FxHashMap<PathBuf, FxHashSet<u32>>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the externally visible identity for a rebuilt module.
    ///
    /// Policy, in precedence order:
    /// 1. host-supplied stable-id annotation, verbatim;
    /// 2. resource path, when the file is a test, the module has no numeric
    ///    id, or the module is an entry;
    /// 3. the compiler's numeric id.
    pub fn assign(
        &mut self,
        module: &ModuleRecord,
        file: Option<&TrackedFile>,
        is_entry: bool,
    ) -> ModuleIdentity {
        let identity = if let Some(stable) = &module.stable_id {
            ModuleIdentity::Stable(stable.clone())
        } else if file.is_some_and(|f| f.is_test) || module.id.is_none() || is_entry {
            match &module.resource {
                Some(resource) => ModuleIdentity::Path(resource.clone()),
                // Synthetic module without a numeric id; the compiler
                // guarantees at least one of the two exists.
                None => ModuleIdentity::Numeric(module.id.unwrap_or_default()),
            }
        } else {
            ModuleIdentity::Numeric(module.id.unwrap_or_default())
        };

        self.record(module, file, &identity);
        identity
    }

    fn record(
        &mut self,
        module: &ModuleRecord,
        file: Option<&TrackedFile>,
        identity: &ModuleIdentity,
    ) {
        if !self.known.contains(identity) {
            self.pending.insert(identity.clone());
        }

        if let Some(resource) = &module.resource {
            self.last_by_path
                .insert(resource.clone(), identity.clone());
            if let Some(id) = module.id {
                self.numeric_ids_by_path
                    .entry(resource.clone())
                    .or_default()
                    .insert(id);
            }
        }

        if let Some(id) = module.id {
            // Translation entry: only identities the generated code cannot
            // address directly need one.
            if !matches!(identity, ModuleIdentity::Numeric(_)) {
                match self.id_table_index.get(identity) {
                    Some(&slot) => self.id_table[slot].1 = id,
                    None => {
                        self.id_table_index
                            .insert(identity.clone(), self.id_table.len());
                        self.id_table.push((identity.clone(), id));
                    }
                }
            }

            if let Some(file) = file.filter(|f| f.is_test) {
                match self.test_path_index.get(&id) {
                    Some(&slot) => self.test_paths[slot].1 = file.abs_path.clone(),
                    None => {
                        self.test_path_index.insert(id, self.test_paths.len());
                        self.test_paths.push((id, file.abs_path.clone()));
                    }
                }
            }
        }
    }

    /// Last identity assigned for a resource path.
    pub fn last_for_path(&self, path: &Path) -> Option<&ModuleIdentity> {
        self.last_by_path.get(path)
    }

    /// How many distinct numeric ids a tracked path has been compiled under.
    pub fn numeric_ids_seen(&self, path: &Path) -> usize {
        self.numeric_ids_by_path
            .get(path)
            .map_or(0, FxHashSet::len)
    }

    /// Whether this run observed an identity no emitted protocol knows yet.
    pub fn has_new_identities(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Fold pending identities into the known set after the protocol was
    /// emitted with them.
    pub fn commit_protocol(&mut self) {
        self.known.extend(self.pending.drain());
    }

    /// Discard the per-run pending set without emitting a protocol.
    pub fn finish_run(&mut self) {
        self.pending.clear();
    }

    /// Identity→numeric translation table, in first-assignment order.
    pub fn id_table(&self) -> impl Iterator<Item = (&ModuleIdentity, u32)> {
        self.id_table.iter().map(|(identity, id)| (identity, *id))
    }

    /// Test-file-path-by-numeric-id table, in first-assignment order.
    pub fn test_path_table(&self) -> impl Iterator<Item = (u32, &Path)> {
        self.test_paths.iter().map(|(id, path)| (*id, path.as_path()))
    }

    /// Full reset; part of the atomic structural-change reset.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
