//! Run-spanning compile caches handed to the external compiler.
//!
//! Two maps make unaffected modules no-ops inside the compiler:
//! [`CompilationCache`] keeps build-keyed artifacts across runs, and
//! [`FileTimestamps`] tells the compiler which resources went stale.
//! Both are concurrent maps behind `Arc` because the compile step may
//! parallelize internally; this core only touches them between compiles.
//!
//! They are cleared together with the identity registry and the test
//! dependency index on structural change - never partially, or stale
//! entries corrupt subsequent incremental runs.

use dashmap::DashMap;
use std::path::{Path, PathBuf};

/// Timestamp marker for resources that must never be treated as stale
/// (untracked modules the compiler compiled once).
pub const NEVER_STALE: u64 = 0;

// ============================================================================
// CompilationCache
// ============================================================================

/// Persistent build-key → cached-payload map.
///
/// The payload is opaque to this core; the compiler decides what it stores
/// under a key. Build keys are content-addressed via [`build_key`].
#[derive(Debug, Default)]
pub struct CompilationCache {
    entries: DashMap<String, Vec<u8>>,
}

impl CompilationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.get(key).map(|e| e.value().clone())
    }

    pub fn insert(&self, key: impl Into<String>, payload: Vec<u8>) {
        self.entries.insert(key.into(), payload);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Content-addressed build key (blake3 hex over path + content).
pub fn build_key(path: &Path, content: &[u8]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(path.to_string_lossy().as_bytes());
    hasher.update(b"\0");
    hasher.update(content);
    hex::encode(hasher.finalize().as_bytes())
}

// ============================================================================
// FileTimestamps
// ============================================================================

/// Resource path → "last changed" marker.
///
/// The orchestrator bumps a run generation counter and stamps each file the
/// host reported changed; the compiler compares markers against the
/// generation it last built a resource at and skips everything else.
#[derive(Debug, Default)]
pub struct FileTimestamps {
    markers: DashMap<PathBuf, u64>,
}

impl FileTimestamps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a resource changed at the given run generation.
    pub fn touch(&self, path: &Path, generation: u64) {
        self.markers.insert(path.to_path_buf(), generation);
    }

    /// Pin a resource to the never-stale sentinel so the compiler never
    /// redundantly rebuilds it. Does not overwrite a real marker.
    pub fn pin_never_stale(&self, path: &Path) {
        self.markers
            .entry(path.to_path_buf())
            .or_insert(NEVER_STALE);
    }

    pub fn get(&self, path: &Path) -> Option<u64> {
        self.markers.get(path).map(|m| *m)
    }

    pub fn clear(&self) {
        self.markers.clear();
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}
