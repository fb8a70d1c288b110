//! Module identity for reload targets.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of a named unit of code known to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    /// A loadable module: loading it produces an exported value.
    Module,
    /// An executable entry point. Runs on its own, exports nothing.
    Script,
    /// A non-code asset.
    Asset,
}

impl ModuleKind {
    /// Whether this kind can be loaded through an execution environment.
    ///
    /// Only loadable kinds are valid reload targets.
    pub fn is_loadable(&self) -> bool {
        matches!(self, ModuleKind::Module)
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModuleKind::Module => "module",
            ModuleKind::Script => "script",
            ModuleKind::Asset => "asset",
        };
        f.write_str(name)
    }
}

/// Identity of a module within its host.
///
/// The name is host-specific; the script host uses a root-relative file
/// path. Two ids refer to the same module when both name and kind match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleId {
    name: String,
    kind: ModuleKind,
}

impl ModuleId {
    /// Create a module id with an explicit kind.
    pub fn new(name: impl Into<String>, kind: ModuleKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Shorthand for a loadable module id.
    pub fn module(name: impl Into<String>) -> Self {
        Self::new(name, ModuleKind::Module)
    }

    /// The host-specific module name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The module's kind.
    pub fn kind(&self) -> ModuleKind {
        self.kind
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
