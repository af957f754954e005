//! Module wrapping and emission paths.
//!
//! Every rebuilt module becomes a self-registering artifact: loading it in
//! the sandbox stores (factory, shared-dependency-table reference) under
//! the module's identity and does nothing else. The factory body runs only
//! when the runtime resolves the module, so artifacts stay individually
//! cacheable by the browser.

use std::path::PathBuf;

use crate::graph::ModuleRecord;
use crate::graph::identity::ModuleIdentity;
use crate::store::{Artifact, ArtifactOrder, TrackedFile};

/// Fixed suffix of every wrapped module artifact. The runtime's
/// `loadTests` recognizes test entries by filtering fetched filenames for
/// this suffix and stripping it.
pub const WRAPPED_SUFFIX: &str = ".pack.js";

/// Directory for synthetic artifact paths of untracked modules.
pub const SYNTHETIC_DIR: &str = ".pack";

/// Global context object the generated code hangs off the sandbox.
pub const RUNTIME_GLOBAL: &str = "__testpack__";

/// Wrap generated module code in a registration statement.
///
/// The snippet guards the context object so module artifacts can load in
/// any order among themselves; only the bootstrap must come first. The
/// strict-mode directive is prefixed inside the factory body when the
/// module carries strict intent, preserving semantics without leaking
/// strictness into the registration shell.
pub fn wrap_module(identity: &ModuleIdentity, module: &ModuleRecord) -> String {
    let key = identity.as_js_key();
    let strict = if module.strict { "\"use strict\";\n" } else { "" };
    format!(
        "(self.{g} = self.{g} || {{ modules: {{}}, instances: {{}} }}).modules[{key}] = \
         [function (require, module, exports, __pack_resolve, __pack_modules, __pack_instances) {{\n\
         {strict}{source}\n\
         }}, (self.{g}.table = self.{g}.table || {{}})];\n",
        g = RUNTIME_GLOBAL,
        source = module.source,
    )
}

/// Compute the emission path for a wrapped module.
///
/// - tracked file, single compiled identity: `<original path>.pack.js`
/// - tracked file compiled under several identities (mock substitutions),
///   not a test: `<original path>.<numeric id>.pack.js`, keeping cache keys
///   distinct while the plain path stays canonical
/// - untracked module: `.pack/<numeric id>.pack.js`
pub fn artifact_path(
    module: &ModuleRecord,
    file: Option<&TrackedFile>,
    duplicate: bool,
) -> PathBuf {
    match file {
        Some(file) => {
            let base = file.path.to_string_lossy();
            if duplicate && !file.is_test {
                let id = module.id.unwrap_or_default();
                PathBuf::from(format!("{base}.{id}{WRAPPED_SUFFIX}"))
            } else {
                PathBuf::from(format!("{base}{WRAPPED_SUFFIX}"))
            }
        }
        None => {
            let id = module.id.unwrap_or_default();
            PathBuf::from(format!("{SYNTHETIC_DIR}/{id}{WRAPPED_SUFFIX}"))
        }
    }
}

/// Build the finished artifact for one wrapped module.
///
/// Entry artifacts matching a configured pattern carry their pattern
/// priority as load order; everything else is unordered.
pub fn module_artifact(
    identity: &ModuleIdentity,
    module: &ModuleRecord,
    file: Option<&TrackedFile>,
    duplicate: bool,
    source_map: Option<String>,
) -> Artifact {
    let order = match file.and_then(|f| f.entry_ordinal) {
        Some(priority) => ArtifactOrder::Entry(priority),
        None => ArtifactOrder::Unordered,
    };
    Artifact {
        path: artifact_path(module, file, duplicate),
        original: file.map(|f| f.abs_path.clone()),
        content: wrap_module(identity, module),
        source_map,
        order,
    }
}
