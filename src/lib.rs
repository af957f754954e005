//! testpack - incremental module pack cache and loader runtime for browser
//! test runners.
//!
//! A host test runner hands this crate its tracked file set and an external
//! multi-file compiler; each run the orchestrator decides what must be
//! recompiled and re-emitted, expands the affected set across stale
//! re-exported bindings, wraps every rebuilt module into a self-registering
//! artifact, and regenerates the in-sandbox loader protocol only when a new
//! module identity appears. A one-line edit to a known module re-emits
//! exactly one artifact.
//!
//! # Example
//!
//! ```ignore
//! use testpack::{Options, Orchestrator};
//!
//! let mut orchestrator = Orchestrator::new(my_compiler, Options::for_file_serving())?;
//! let summary = orchestrator.run(&my_store)?;
//! log!("run"; "emitted {} artifacts", summary.artifacts.len());
//! ```

pub mod cache;
pub mod compiler;
pub mod emit;
pub mod entries;
pub mod error;
pub mod graph;
pub mod logger;
pub mod options;
pub mod orchestrator;
pub mod runtime;
pub mod store;

pub use compiler::{CompileStats, Compiler, CompilerConfig, EntryPoint};
pub use error::{Diagnostic, PackError};
pub use graph::identity::ModuleIdentity;
pub use graph::{DepEdge, DepKind, ModuleGraph, ModuleIdx, ModuleRecord};
pub use options::{EntryOrder, Options};
pub use orchestrator::{Orchestrator, RunKind, RunSummary};
pub use store::{Artifact, ArtifactOrder, FileStore, HostLogger, TraceLogger, TrackedFile};
