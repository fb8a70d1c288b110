//! Script module loading with require() resolution.
//!
//! This module provides:
//! - Source loading from a root directory
//! - Transitive require() closure resolution
//! - Topological ordering of the closure
//! - Cycle detection

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use regex::Regex;
use rekindle_core::ModuleId;
use rustc_hash::FxHashMap;

use crate::error::{ScriptError, ScriptResult};

static REQUIRE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"require\s*\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap());

/// A fully resolved module: its source plus the dependency closure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedScript {
    pub module: ModuleId,
    pub source: String,
    /// Transitive require() closure in dependency-first order.
    pub dependencies: Vec<ModuleId>,
}

/// Loads script modules from a root directory.
///
/// A module's name is its root-relative path. Its source may reference
/// other modules with `require("relative/path.ext")` (single or double
/// quotes); the loader resolves the transitive closure and orders it
/// dependencies before dependents.
pub struct ScriptLoader {
    root: PathBuf,
    /// The directed graph: edges go from dependency to dependent.
    graph: DiGraph<ModuleId, ()>,
    /// Module to node index mapping; doubles as the visited set.
    node_indices: FxHashMap<ModuleId, NodeIndex>,
    /// Every file the last load visited, for watch registration.
    touched: FxHashMap<PathBuf, ModuleId>,
}

impl ScriptLoader {
    /// Create a loader rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            graph: DiGraph::new(),
            node_indices: FxHashMap::default(),
            touched: FxHashMap::default(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load `module` and its transitive require() closure.
    ///
    /// On failure the files visited so far are still recorded in
    /// [`touched`](ScriptLoader::touched), so a caller can watch the
    /// partial set and retry when it changes.
    pub fn load(&mut self, module: &ModuleId) -> ScriptResult<LoadedScript> {
        self.graph.clear();
        self.node_indices.clear();
        self.touched.clear();

        let source = self.visit(module)?;

        let order = toposort(&self.graph, None).map_err(|cycle| {
            ScriptError::DependencyCycle(self.graph[cycle.node_id()].clone())
        })?;
        let dependencies: Vec<ModuleId> = order
            .into_iter()
            .map(|idx| self.graph[idx].clone())
            .filter(|dep| dep != module)
            .collect();

        tracing::debug!(
            "Loaded '{}' with {} dependencies",
            module,
            dependencies.len()
        );
        Ok(LoadedScript {
            module: module.clone(),
            source,
            dependencies,
        })
    }

    /// Files visited by the last load, including a failed one.
    pub fn touched(&self) -> &FxHashMap<PathBuf, ModuleId> {
        &self.touched
    }

    fn visit(&mut self, module: &ModuleId) -> ScriptResult<String> {
        let path = self.root.join(module.name());
        self.touched.insert(path.clone(), module.clone());

        let source = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ScriptError::ModuleNotFound(module.clone()),
            _ => ScriptError::Io {
                path: path.clone(),
                message: e.to_string(),
            },
        })?;

        let node = self.node(module);
        for capture in REQUIRE_RE.captures_iter(&source) {
            let dep = ModuleId::module(&capture[1]);
            let first_visit = !self.node_indices.contains_key(&dep);
            let dep_node = self.node(&dep);
            self.graph.add_edge(dep_node, node, ());
            if first_visit {
                self.visit(&dep)?;
            }
        }
        Ok(source)
    }

    fn node(&mut self, module: &ModuleId) -> NodeIndex {
        if let Some(&idx) = self.node_indices.get(module) {
            return idx;
        }
        let idx = self.graph.add_node(module.clone());
        self.node_indices.insert(module.clone(), idx);
        idx
    }
}
