//! Tracked file store and artifact sink collaborator contracts.
//!
//! The host test runner owns the authoritative file list, change tracking,
//! and artifact storage. This core only reads tracked files and pushes
//! finished artifacts back through [`FileStore::create_artifact`].

use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

// ============================================================================
// TrackedFile
// ============================================================================

/// A source or test file the host tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedFile {
    /// Store-relative path (as matched against entry patterns).
    pub path: PathBuf,
    /// Absolute path; the file's id everywhere in this core.
    pub abs_path: PathBuf,
    /// Content/identity marker owned by the store (content hash or mtime).
    pub digest: String,
    /// Index of the first entry pattern this file satisfies, if any.
    pub entry_ordinal: Option<usize>,
    /// Whether the host classified this file as a test.
    pub is_test: bool,
}

impl TrackedFile {
    pub fn new(path: impl Into<PathBuf>, abs_path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            abs_path: abs_path.into(),
            digest: String::new(),
            entry_ordinal: None,
            is_test: false,
        }
    }

    pub fn test(path: impl Into<PathBuf>, abs_path: impl Into<PathBuf>) -> Self {
        Self {
            is_test: true,
            ..Self::new(path, abs_path)
        }
    }
}

// ============================================================================
// TrackedSet
// ============================================================================

/// Read-only snapshot of the store's file list, keyed by absolute path.
///
/// Rebuilt wholesale whenever the host reports added or deleted files;
/// never mutated in place.
#[derive(Debug, Default)]
pub struct TrackedSet {
    files: FxHashMap<PathBuf, TrackedFile>,
}

impl TrackedSet {
    pub fn snapshot(files: Vec<TrackedFile>) -> Self {
        Self {
            files: files.into_iter().map(|f| (f.abs_path.clone(), f)).collect(),
        }
    }

    #[inline]
    pub fn get(&self, abs_path: &Path) -> Option<&TrackedFile> {
        self.files.get(abs_path)
    }

    #[inline]
    pub fn contains(&self, abs_path: &Path) -> bool {
        self.files.contains_key(abs_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedFile> {
        self.files.values()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

// ============================================================================
// Artifact
// ============================================================================

/// Load-order metadata consumed by the host when serving artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ArtifactOrder {
    /// Must load before any module artifact (loader bootstrap).
    First,
    /// Entry artifact, ordered by pattern priority.
    Entry(usize),
    /// No ordering constraint (per-module artifacts).
    Unordered,
    /// Must load after all other artifacts (trailer).
    Last,
}

/// A finished artifact handed to the host's sink.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Emission path, relative to the host's serving root.
    pub path: PathBuf,
    /// Original source file this artifact was derived from, if any.
    pub original: Option<PathBuf>,
    /// Generated content.
    pub content: String,
    /// Source map, when the compiler produced one.
    pub source_map: Option<String>,
    /// Load-order constraint.
    pub order: ArtifactOrder,
}

// ============================================================================
// Collaborator traits
// ============================================================================

/// Logger exposed by the host's file store.
///
/// Default methods route through the crate's own logger so hosts without
/// special reporting needs get sensible output for free.
pub trait HostLogger: Sync {
    fn info(&self, message: &str) {
        crate::log!("run"; "{message}");
    }

    fn warn(&self, message: &str) {
        crate::log!("warning"; "{message}");
    }

    fn error(&self, message: &str) {
        crate::log!("error"; "{message}");
    }
}

/// Default logger routing through the crate's `log!` macros.
pub struct TraceLogger;

impl HostLogger for TraceLogger {}

/// The host's tracked file store and artifact sink.
///
/// `Sync` because artifact creation for one run fans out across rayon
/// workers; individual calls never overlap between runs.
pub trait FileStore: Sync {
    /// Every file the store currently tracks.
    fn all_files(&self) -> Vec<TrackedFile>;

    /// Files the host reports as changed this run.
    fn affected_files(&self) -> Vec<TrackedFile>;

    /// Every tracked test file.
    fn all_test_files(&self) -> Vec<TrackedFile>;

    /// Whether files appeared since the last run.
    fn any_files_added(&self) -> bool;

    /// Whether files disappeared since the last run.
    fn any_files_deleted(&self) -> bool;

    /// Host-side logger for diagnostics.
    fn logger(&self) -> &dyn HostLogger;

    /// Publish one artifact. May suspend on external I/O.
    fn create_artifact(&self, artifact: Artifact) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_keyed_by_abs_path() {
        let set = TrackedSet::snapshot(vec![
            TrackedFile::new("a.js", "/proj/a.js"),
            TrackedFile::test("t.spec.js", "/proj/t.spec.js"),
        ]);

        assert_eq!(set.len(), 2);
        assert!(set.contains(Path::new("/proj/a.js")));
        assert!(!set.contains(Path::new("a.js")));
        assert!(set.get(Path::new("/proj/t.spec.js")).unwrap().is_test);
    }

    #[test]
    fn test_artifact_order_sorts_first_to_last() {
        let mut orders = vec![
            ArtifactOrder::Last,
            ArtifactOrder::Entry(1),
            ArtifactOrder::First,
            ArtifactOrder::Entry(0),
            ArtifactOrder::Unordered,
        ];
        orders.sort();
        assert_eq!(orders.first(), Some(&ArtifactOrder::First));
        assert_eq!(orders.last(), Some(&ArtifactOrder::Last));
        assert!(orders[1] < orders[2]); // Entry(0) before Entry(1)
    }
}
