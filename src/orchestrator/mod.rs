//! Per-run compile-and-emit driver.
//!
//! One orchestrator instance owns the run-spanning state: the compile
//! caches threaded into the external compiler, the identity registry, and
//! the per-test dependency index. The host guarantees runs are issued one
//! at a time; everything here assumes exclusive access between compiles.


use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::{CompilationCache, FileTimestamps};
use crate::compiler::{Compiler, CompilerConfig, EntryPoint};
use crate::emit;
use crate::entries::EntryPatterns;
use crate::entries::deps::{TestDependencyIndex, collect_tracked_deps};
use crate::error::PackError;
use crate::graph::identity::IdentityRegistry;
use crate::graph::{ModuleIdx, closure};
use crate::options::Options;
use crate::runtime;
use crate::store::{Artifact, FileStore, TrackedSet};

/// Whether a run rebuilt the world or reused the module graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    /// Structural change: caches and identities were reset together.
    Full,
    /// Content change only: unaffected modules were no-ops.
    Incremental,
}

/// What one run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub kind: RunKind,
    /// Modules the compiler reported rebuilt, before closure expansion.
    pub modules_built: usize,
    /// Emission paths of every artifact published this run.
    pub artifacts: Vec<PathBuf>,
    /// User-code diagnostics logged this run.
    pub diagnostics: usize,
    /// Whether bootstrap/trailer were regenerated.
    pub protocol_regenerated: bool,
}

/// Incremental compile-and-emit orchestrator.
pub struct Orchestrator<C: Compiler> {
    compiler: C,
    options: Options,
    patterns: EntryPatterns,

    // Run-spanning state, reset atomically on structural change
    cache: Arc<CompilationCache>,
    timestamps: Arc<FileTimestamps>,
    registry: IdentityRegistry,
    test_deps: TestDependencyIndex,

    // Snapshots rebuilt on structural change
    tracked: TrackedSet,
    entries: Vec<EntryPoint>,
    entry_paths: FxHashSet<PathBuf>,
    unmatched_patterns: Vec<String>,

    generation: u64,
    configured: bool,
}

impl<C: Compiler> Orchestrator<C> {
    pub fn new(compiler: C, options: Options) -> Result<Self, PackError> {
        let patterns = EntryPatterns::parse(&options.entry_patterns)?;
        Ok(Self {
            compiler,
            options,
            patterns,
            cache: Arc::new(CompilationCache::new()),
            timestamps: Arc::new(FileTimestamps::new()),
            registry: IdentityRegistry::new(),
            test_deps: TestDependencyIndex::new(),
            tracked: TrackedSet::default(),
            entries: Vec::new(),
            entry_paths: FxHashSet::default(),
            unmatched_patterns: Vec::new(),
            generation: 0,
            configured: false,
        })
    }

    /// Dependency lists computed for rebuilt test modules, for the host to
    /// decide which tests re-run on a file change.
    pub fn test_dependencies(&self) -> &TestDependencyIndex {
        &self.test_deps
    }

    /// Run one compile-and-emit cycle.
    pub fn run(&mut self, store: &dyn FileStore) -> Result<RunSummary, PackError> {
        let structural = store.any_files_added() || store.any_files_deleted();
        let kind = if structural || !self.configured {
            self.reconfigure(store)?;
            RunKind::Full
        } else {
            RunKind::Incremental
        };

        for pattern in &self.unmatched_patterns {
            store
                .logger()
                .warn(&format!("entry pattern `{pattern}` matched no files"));
        }

        // Stamp changed files so the compiler treats them, and only them,
        // as stale
        self.generation += 1;
        let changed = store.affected_files();
        for file in &changed {
            self.timestamps.touch(&file.abs_path, self.generation);
        }
        crate::debug!("run"; "{kind:?} run, generation {}, {} changed files", self.generation, changed.len());

        let mut built: Vec<ModuleIdx> = Vec::new();
        let stats = self
            .compiler
            .compile(&mut |idx| built.push(idx))
            .map_err(PackError::Compile)?;
        if built.is_empty() {
            built = stats.built.clone();
        }

        for diagnostic in &stats.diagnostics {
            store.logger().error(&format!("compile error: {diagnostic}"));
        }

        let affected = match kind {
            RunKind::Incremental => closure::expand(&stats.graph, &built, &self.tracked),
            RunKind::Full => built.clone(),
        };

        // Identity assignment mutates the registry, so it stays sequential;
        // artifact publication fans out below
        let mut artifacts: Vec<Artifact> = Vec::with_capacity(affected.len() + 2);
        for &idx in &affected {
            let module = stats.graph.get(idx);
            let file = module
                .resource
                .as_deref()
                .and_then(|resource| self.tracked.get(resource));

            if file.is_none()
                && let Some(resource) = module.resource.as_deref()
            {
                // Untracked dependency the compiler compiled anyway; never
                // rebuild it again
                self.timestamps.pin_never_stale(resource);
            }

            let is_entry = file.is_some_and(|f| self.entry_paths.contains(&f.abs_path));
            let identity = self.registry.assign(module, file, is_entry);

            let duplicate = match (module.resource.as_deref(), module.id) {
                (Some(resource), Some(_)) => {
                    self.registry.numeric_ids_seen(resource) > 1
                        && stats.graph.by_resource(resource) != Some(idx)
                }
                _ => false,
            };

            artifacts.push(emit::module_artifact(
                &identity,
                module,
                file,
                duplicate,
                module.source_map.clone(),
            ));

            if let Some(file) = file.filter(|f| f.is_test) {
                let deps = collect_tracked_deps(&stats.graph, idx, &self.tracked);
                self.test_deps.record(&file.abs_path, deps);
            }
        }

        let protocol_regenerated = self.registry.has_new_identities();
        if protocol_regenerated {
            artifacts.push(runtime::bootstrap_artifact(&self.registry));
            if !self.entries.is_empty() {
                artifacts.push(runtime::trailer_artifact(
                    &self.entries,
                    &self.registry,
                    self.options.entry_order,
                ));
            }
            self.registry.commit_protocol();
        } else {
            self.registry.finish_run();
        }

        let emitted: Vec<PathBuf> = artifacts.iter().map(|a| a.path.clone()).collect();
        artifacts.into_par_iter().try_for_each(|artifact| {
            let path = artifact.path.clone();
            store
                .create_artifact(artifact)
                .map_err(|e| PackError::Artifact(path, e))
        })?;

        if !emitted.is_empty() {
            crate::log!("run"; "emitted {} artifacts ({} modules)", emitted.len(), affected.len());
        }

        Ok(RunSummary {
            kind,
            modules_built: built.len(),
            artifacts: emitted,
            diagnostics: stats.diagnostics.len(),
            protocol_regenerated,
        })
    }

    /// Rebuild the tracked snapshot and entry matches, reset every piece of
    /// run-spanning state together, and reconfigure the compiler.
    fn reconfigure(&mut self, store: &dyn FileStore) -> Result<(), PackError> {
        let mut all_files = store.all_files();
        let test_files = store.all_test_files();
        let selection = self.patterns.select(&all_files, &test_files);
        self.unmatched_patterns = selection.unmatched_patterns;

        // Carry entry ordinals into the snapshot so emitted entry artifacts
        // get their pattern-priority load order
        for file in &mut all_files {
            file.entry_ordinal = selection
                .entries
                .iter()
                .find(|e| e.file.abs_path == file.abs_path)
                .and_then(|e| e.priority);
        }

        self.entry_paths = selection
            .entries
            .iter()
            .map(|e| e.file.abs_path.clone())
            .collect();
        self.tracked = TrackedSet::snapshot(all_files);
        self.entries = selection.entries;

        // Atomic reset: a partial reset would let stale entries corrupt
        // subsequent incremental runs
        self.cache.clear();
        self.timestamps.clear();
        self.registry.clear();
        self.test_deps.clear();

        self.compiler
            .configure(CompilerConfig {
                entries: &self.entries,
                cache: Arc::clone(&self.cache),
                file_timestamps: Arc::clone(&self.timestamps),
                resolution_roots: &self.options.resolution_roots,
                disable_chunk_assets: self.options.disable_chunk_assets,
                disable_ordering_passes: self.options.disable_ordering_passes,
            })
            .map_err(PackError::Configure)?;
        self.configured = true;

        crate::debug!("run"; "reconfigured: {} tracked files, {} entries", self.tracked.len(), self.entries.len());
        Ok(())
    }
}
