//! Loader runtime protocol generation.
//!
//! Two artifacts bracket the per-module ones: the bootstrap carries the
//! runtime registry/resolution algorithm plus the serialized identity
//! tables, the trailer kicks off non-test entries. Both regenerate only
//! when a previously-unseen module identity appeared this run, so the
//! common small edit re-emits nothing but the touched module.

pub mod template;

use serde_json::{Map, Value};
use std::path::PathBuf;

use crate::compiler::EntryPoint;
use crate::emit::{RUNTIME_GLOBAL, WRAPPED_SUFFIX};
use crate::graph::identity::IdentityRegistry;
use crate::options::EntryOrder;
use crate::store::{Artifact, ArtifactOrder};
use template::{Template, TemplateVars};

/// Emission path of the bootstrap script. Deliberately outside the
/// wrapped-artifact namespace so `loadTests` never mistakes it for a test.
pub const BOOTSTRAP_PATH: &str = ".pack/loader.js";

/// Emission path of the entry trailer script.
pub const TRAILER_PATH: &str = ".pack/entries.js";

/// Variables for loader.js.
pub struct LoaderVars {
    /// JSON object: identity → numeric id.
    pub id_table: String,
    /// JSON object: numeric id → test file path.
    pub test_paths: String,
}

impl TemplateVars for LoaderVars {
    fn apply(&self, content: &str) -> String {
        content
            .replace(
                "__PACK_SUFFIX__",
                &Value::String(WRAPPED_SUFFIX.to_string()).to_string(),
            )
            .replace("__PACK_ID_TABLE__", &self.id_table)
            .replace("__PACK_TEST_PATHS__", &self.test_paths)
    }
}

/// Loader runtime with identity-table injection.
pub const LOADER_JS: Template<LoaderVars> = Template::new(include_str!("loader.js"));

impl LoaderVars {
    /// Serialize the registry's tables, insertion-ordered.
    pub fn from_registry(registry: &IdentityRegistry) -> Self {
        let mut id_table = Map::new();
        for (identity, numeric) in registry.id_table() {
            id_table.insert(identity.to_string(), Value::from(numeric));
        }

        let mut test_paths = Map::new();
        for (numeric, path) in registry.test_path_table() {
            test_paths.insert(
                numeric.to_string(),
                Value::String(path.display().to_string()),
            );
        }

        Self {
            id_table: Value::Object(id_table).to_string(),
            test_paths: Value::Object(test_paths).to_string(),
        }
    }
}

/// Render the bootstrap artifact (must load first).
pub fn bootstrap_artifact(registry: &IdentityRegistry) -> Artifact {
    Artifact {
        path: PathBuf::from(BOOTSTRAP_PATH),
        original: None,
        content: LOADER_JS.render(&LoaderVars::from_registry(registry)),
        source_map: None,
        order: ArtifactOrder::First,
    }
}

/// Render the entry trailer artifact (must load last).
///
/// Invokes the runtime resolve operation for every non-test entry whose
/// identity is known, in pattern-priority or declared order. The entries
/// slice arrives pattern-priority sorted from selection.
pub fn trailer_artifact(
    entries: &[EntryPoint],
    registry: &IdentityRegistry,
    order: EntryOrder,
) -> Artifact {
    let mut ordered: Vec<&EntryPoint> = entries.iter().filter(|e| !e.file.is_test).collect();
    if order == EntryOrder::Declared {
        ordered.sort_by_key(|e| e.declared);
    }

    let mut invocations = String::new();
    for entry in ordered {
        let Some(identity) = registry.last_for_path(&entry.file.abs_path) else {
            continue;
        };
        invocations.push_str(&format!("  require({});\n", identity.as_js_key()));
    }

    let content = format!(
        "/* testpack entry trailer. Loads after all module artifacts. */\n\
         (function (self) {{\n\
         \x20 \"use strict\";\n\
         \x20 var require = self.{RUNTIME_GLOBAL}.require;\n\
         {invocations}\
         }})(typeof self !== \"undefined\" ? self : this);\n",
    );

    Artifact {
        path: PathBuf::from(TRAILER_PATH),
        original: None,
        content,
        source_map: None,
        order: ArtifactOrder::Last,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ModuleRecord;
    use crate::store::TrackedFile;

    fn registry_with(entries: &[(&str, u32, bool)]) -> IdentityRegistry {
        let mut registry = IdentityRegistry::new();
        for (path, id, is_test) in entries {
            let module = ModuleRecord {
                id: Some(*id),
                resource: Some(PathBuf::from(path)),
                ..ModuleRecord::default()
            };
            let file = if *is_test {
                TrackedFile::test(path.trim_start_matches('/'), *path)
            } else {
                TrackedFile::new(path.trim_start_matches('/'), *path)
            };
            registry.assign(&module, Some(&file), true);
        }
        registry
    }

    #[test]
    fn bootstrap_inlines_tables_and_suffix() {
        let registry = registry_with(&[("/p/main.js", 0, false), ("/p/t.spec.js", 1, true)]);
        let artifact = bootstrap_artifact(&registry);

        assert_eq!(artifact.order, ArtifactOrder::First);
        assert_eq!(artifact.path, PathBuf::from(BOOTSTRAP_PATH));
        // All placeholders replaced
        assert!(!artifact.content.contains("__PACK_ID_TABLE__"));
        assert!(!artifact.content.contains("__PACK_TEST_PATHS__"));
        assert!(!artifact.content.contains("__PACK_SUFFIX__"));
        // Tables inlined
        assert!(artifact.content.contains("\"/p/main.js\":0"));
        assert!(artifact.content.contains("\"1\":\"/p/t.spec.js\""));
        assert!(artifact.content.contains("\".pack.js\""));
    }

    #[test]
    fn bootstrap_path_is_not_a_wrapped_artifact() {
        // loadTests strips the wrapped suffix; the bootstrap must never match
        assert!(!BOOTSTRAP_PATH.ends_with(WRAPPED_SUFFIX));
        assert!(!TRAILER_PATH.ends_with(WRAPPED_SUFFIX));
    }

    fn entry(path: &str, abs: &str, priority: Option<usize>, declared: usize) -> EntryPoint {
        EntryPoint {
            file: TrackedFile::new(path, abs),
            priority,
            declared,
        }
    }

    #[test]
    fn trailer_preserves_pattern_priority_order() {
        let registry = registry_with(&[("/p/a/x.js", 0, false), ("/p/b/y.js", 1, false)]);
        // Priority-sorted input; declared order is reversed
        let entries = vec![
            entry("a/x.js", "/p/a/x.js", Some(0), 1),
            entry("b/y.js", "/p/b/y.js", Some(1), 0),
        ];

        let artifact = trailer_artifact(&entries, &registry, EntryOrder::PatternPriority);
        assert_eq!(artifact.order, ArtifactOrder::Last);
        let a = artifact.content.find("/p/a/x.js").unwrap();
        let b = artifact.content.find("/p/b/y.js").unwrap();
        assert!(a < b);
    }

    #[test]
    fn trailer_declared_order_resorts() {
        let registry = registry_with(&[("/p/a/x.js", 0, false), ("/p/b/y.js", 1, false)]);
        let entries = vec![
            entry("a/x.js", "/p/a/x.js", Some(0), 1),
            entry("b/y.js", "/p/b/y.js", Some(1), 0),
        ];

        let artifact = trailer_artifact(&entries, &registry, EntryOrder::Declared);
        let a = artifact.content.find("/p/a/x.js").unwrap();
        let b = artifact.content.find("/p/b/y.js").unwrap();
        assert!(b < a);
    }

    #[test]
    fn trailer_skips_test_entries() {
        let registry = registry_with(&[("/p/a/x.js", 0, false), ("/p/t.spec.js", 1, true)]);
        let mut test_entry = entry("t.spec.js", "/p/t.spec.js", None, 1);
        test_entry.file.is_test = true;
        let entries = vec![entry("a/x.js", "/p/a/x.js", Some(0), 0), test_entry];

        let artifact = trailer_artifact(&entries, &registry, EntryOrder::PatternPriority);
        assert!(artifact.content.contains("/p/a/x.js"));
        assert!(!artifact.content.contains("t.spec.js"));
    }

    #[test]
    fn trailer_skips_never_compiled_entries() {
        let registry = registry_with(&[("/p/a/x.js", 0, false)]);
        let entries = vec![
            entry("a/x.js", "/p/a/x.js", Some(0), 0),
            entry("b/never.js", "/p/b/never.js", Some(1), 1),
        ];

        let artifact = trailer_artifact(&entries, &registry, EntryOrder::PatternPriority);
        assert!(artifact.content.contains("/p/a/x.js"));
        assert!(!artifact.content.contains("never.js"));
    }

    #[test]
    fn loader_template_has_protocol_surface() {
        let content = LOADER_JS.content();
        for hook in [
            "ctx.resolve",
            "ctx.require",
            "ctx.markAsModule",
            "ctx.interopImport",
            "ctx.loadTests",
            "duplicate test execution",
            "module not found",
        ] {
            assert!(content.contains(hook), "missing: {hook}");
        }
    }
}
