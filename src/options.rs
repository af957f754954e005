//! Orchestrator options, handed over by the embedding host.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How entry invocations are ordered in the trailer script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryOrder {
    /// Order by the index of the first entry pattern a file matches.
    #[default]
    PatternPriority,
    /// Keep the order entries were declared/discovered in.
    Declared,
}

/// Options for one orchestrator instance.
///
/// The host parses these from wherever it keeps configuration; this core
/// only consumes them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Options {
    /// Ordered entry patterns; index is the tie-break priority.
    /// Empty means "every known test file is an entry."
    pub entry_patterns: Vec<String>,

    /// Trailer invocation order for non-test entries.
    pub entry_order: EntryOrder,

    /// Extra roots the compiler resolves bare module requests against.
    pub resolution_roots: Vec<PathBuf>,

    /// Tell the compiler to skip chunk-asset generation; artifacts are
    /// served file-by-file, never chunked.
    pub disable_chunk_assets: bool,

    /// Tell the compiler to skip module/chunk ordering passes.
    pub disable_ordering_passes: bool,
}

impl Options {
    /// Options with the per-file serving flags set, the common case.
    pub fn for_file_serving() -> Self {
        Self {
            disable_chunk_assets: true,
            disable_ordering_passes: true,
            ..Self::default()
        }
    }
}
