//! External compiler collaborator contract.
//!
//! The multi-file compiler owns module resolution, parsing, and code
//! generation. This core configures it once per entry set, stamps file
//! timestamps before each compile, and consumes the resulting graph
//! snapshot plus per-module "built" notifications.

use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::{CompilationCache, FileTimestamps};
use crate::error::Diagnostic;
use crate::graph::{ModuleGraph, ModuleIdx};
use crate::store::TrackedFile;

/// One configured entry: the tracked file plus its pattern priority
/// (index of the first entry pattern it matched, `None` for default
/// test-file entries) and its position in discovery order.
#[derive(Debug, Clone)]
pub struct EntryPoint {
    pub file: TrackedFile,
    pub priority: Option<usize>,
    pub declared: usize,
}

/// Everything the compiler needs for a (re)configuration.
///
/// The cache handles are shared: the compiler reads and writes them during
/// compiles, this core resets them on structural change. Chunk-asset
/// generation and ordering passes are disabled through flags rather than
/// by patching compiler internals.
pub struct CompilerConfig<'a> {
    pub entries: &'a [EntryPoint],
    pub cache: Arc<CompilationCache>,
    pub file_timestamps: Arc<FileTimestamps>,
    pub resolution_roots: &'a [PathBuf],
    pub disable_chunk_assets: bool,
    pub disable_ordering_passes: bool,
}

/// Result of one compile invocation.
#[derive(Debug, Default)]
pub struct CompileStats {
    /// The full module graph of this compiled generation.
    pub graph: ModuleGraph,
    /// Indices of the modules actually (re)built this run, in build order.
    /// Mirrors the per-module notifications for hosts that prefer polling.
    pub built: Vec<ModuleIdx>,
    /// User-code diagnostics (syntax errors, unresolved imports). These do
    /// not fail the compile; files still valid keep their artifacts.
    pub diagnostics: Vec<Diagnostic>,
}

/// The external multi-file compiler.
///
/// Errors returned from [`Compiler::configure`] or [`Compiler::compile`]
/// are collaborator failures (I/O, configuration, internal exceptions) and
/// abort the run; user-code problems travel as [`Diagnostic`]s inside
/// [`CompileStats`] instead.
pub trait Compiler {
    /// (Re)configure for a new entry set. Called on the first run and after
    /// every structural change.
    fn configure(&mut self, config: CompilerConfig<'_>) -> anyhow::Result<()>;

    /// Compile, invoking `on_module_built` once per (re)built module as it
    /// happens. The returned stats own the graph snapshot for this
    /// generation.
    fn compile(&mut self, on_module_built: &mut dyn FnMut(ModuleIdx))
    -> anyhow::Result<CompileStats>;
}
