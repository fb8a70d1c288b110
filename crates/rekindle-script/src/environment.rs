//! Disposable script execution environment.
//!
//! A [`ScriptEnvironment`] is one generation of loaded script state. It
//! loads modules synchronously through [`ScriptLoader`], remembers which
//! files the load visited, and fires its dependency-changed signal at most
//! once, the first time one of those files is reported changed. The
//! reloader replaces the whole environment instead of reusing it.

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use rekindle_core::{Environment, EnvironmentProvider, LoadError, LoadHandle, ModuleId, Signal};
use rustc_hash::FxHashMap;

use crate::loader::{LoadedScript, ScriptLoader};

struct EnvState {
    destroyed: bool,
    fired: bool,
    /// Files the load visited, keyed for change lookups.
    watched: FxHashMap<PathBuf, ModuleId>,
}

struct EnvInner {
    id: u64,
    root: PathBuf,
    changed: Signal<ModuleId>,
    state: RefCell<EnvState>,
}

/// One generation of script state. Cheap shared handle.
#[derive(Clone)]
pub struct ScriptEnvironment {
    inner: Rc<EnvInner>,
}

impl ScriptEnvironment {
    /// Generation id assigned by the host.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    /// Paths the last load visited; changes to these are reportable.
    pub fn watched_paths(&self) -> Vec<PathBuf> {
        self.inner.state.borrow().watched.keys().cloned().collect()
    }

    /// Report a file-system change.
    ///
    /// Fires the dependency-changed signal if `path` is watched and this
    /// environment has not fired before; returns whether it fired.
    /// Destroyed environments ignore changes.
    pub fn notice_change(&self, path: &Path) -> bool {
        let module = {
            let mut state = self.inner.state.borrow_mut();
            if state.destroyed || state.fired {
                return false;
            }
            let Some(module) = state.watched.get(path).cloned() else {
                return false;
            };
            state.fired = true;
            module
        };
        tracing::debug!(
            "Dependency '{}' changed in environment {}",
            module,
            self.inner.id
        );
        self.inner.changed.fire(module);
        true
    }
}

impl Environment for ScriptEnvironment {
    type Output = LoadedScript;

    fn dependency_changed(&self) -> Signal<ModuleId> {
        self.inner.changed.clone()
    }

    fn load_dependency(&self, module: &ModuleId) -> LoadHandle<LoadedScript> {
        if self.inner.state.borrow().destroyed {
            return LoadHandle::failed(LoadError::Failed(
                "environment destroyed".into(),
            ));
        }

        let mut loader = ScriptLoader::new(self.inner.root.clone());
        let result = loader.load(module);
        // Watch the visited set even when the load failed, so a fix to any
        // of those files can trigger the next cycle.
        self.inner.state.borrow_mut().watched = loader.touched().clone();

        match result {
            Ok(script) => LoadHandle::ready(script),
            Err(error) => LoadHandle::failed(LoadError::Failed(error.to_string())),
        }
    }

    fn destroy(&self) {
        {
            let mut state = self.inner.state.borrow_mut();
            if state.destroyed {
                return;
            }
            state.destroyed = true;
            state.watched.clear();
        }
        tracing::debug!("Script environment {} destroyed", self.inner.id);
    }

    fn is_destroyed(&self) -> bool {
        self.inner.state.borrow().destroyed
    }
}

/// Mints [`ScriptEnvironment`]s with increasing generation ids.
pub struct ScriptHost {
    root: PathBuf,
    next_id: Cell<u64>,
}

impl ScriptHost {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            next_id: Cell::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl EnvironmentProvider for ScriptHost {
    type Env = ScriptEnvironment;

    fn create_environment(&self) -> ScriptEnvironment {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        tracing::debug!(
            "Creating script environment {} at {}",
            id,
            self.root.display()
        );
        ScriptEnvironment {
            inner: Rc::new(EnvInner {
                id,
                root: self.root.clone(),
                changed: Signal::new(),
                state: RefCell::new(EnvState {
                    destroyed: false,
                    fired: false,
                    watched: FxHashMap::default(),
                }),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture(files: &[(&str, &str)]) -> (TempDir, ScriptHost) {
        let temp = TempDir::new().unwrap();
        for (name, source) in files {
            let path = temp.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, source).unwrap();
        }
        let host = ScriptHost::new(temp.path());
        (temp, host)
    }

    #[test]
    fn test_load_settles_synchronously() {
        let (temp, host) = fixture(&[
            ("main.txt", "require('lib.txt')"),
            ("lib.txt", "leaf"),
        ]);
        let env = host.create_environment();

        let handle = env.load_dependency(&ModuleId::module("main.txt"));
        assert!(handle.is_settled());

        let script = handle.try_result().unwrap().unwrap();
        assert_eq!(script.dependencies, vec![ModuleId::module("lib.txt")]);
        assert!(env.watched_paths().contains(&temp.path().join("lib.txt")));
    }

    #[test]
    fn test_notice_change_fires_once() {
        let (temp, host) = fixture(&[
            ("main.txt", "require('lib.txt')"),
            ("lib.txt", "leaf"),
        ]);
        let env = host.create_environment();
        env.load_dependency(&ModuleId::module("main.txt"));

        let fired: Rc<RefCell<Vec<ModuleId>>> = Rc::default();
        let seen = fired.clone();
        let _sub = env
            .dependency_changed()
            .connect(move |module: &ModuleId| seen.borrow_mut().push(module.clone()));

        let lib = temp.path().join("lib.txt");
        assert!(env.notice_change(&lib));
        assert!(!env.notice_change(&lib));

        assert_eq!(*fired.borrow(), vec![ModuleId::module("lib.txt")]);
    }

    #[test]
    fn test_notice_change_ignores_unwatched_path() {
        let (temp, host) = fixture(&[("main.txt", "body")]);
        let env = host.create_environment();
        env.load_dependency(&ModuleId::module("main.txt"));

        assert!(!env.notice_change(&temp.path().join("unrelated.txt")));
    }

    #[test]
    fn test_destroyed_environment_ignores_changes() {
        let (temp, host) = fixture(&[("main.txt", "body")]);
        let env = host.create_environment();
        env.load_dependency(&ModuleId::module("main.txt"));

        env.destroy();
        assert!(env.is_destroyed());
        assert!(!env.notice_change(&temp.path().join("main.txt")));
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let (_temp, host) = fixture(&[]);
        let env = host.create_environment();
        env.destroy();
        env.destroy();
        assert!(env.is_destroyed());
        assert!(env.watched_paths().is_empty());
    }

    #[test]
    fn test_load_through_destroyed_environment_fails() {
        let (_temp, host) = fixture(&[("main.txt", "body")]);
        let env = host.create_environment();
        env.destroy();

        let handle = env.load_dependency(&ModuleId::module("main.txt"));
        assert!(matches!(
            handle.try_result(),
            Some(Err(LoadError::Failed(_)))
        ));
    }

    #[test]
    fn test_failed_load_still_watches_visited_files() {
        let (temp, host) = fixture(&[("main.txt", "require('absent.txt')")]);
        let env = host.create_environment();

        let handle = env.load_dependency(&ModuleId::module("main.txt"));
        assert!(matches!(
            handle.try_result(),
            Some(Err(LoadError::Failed(_)))
        ));

        // Creating the missing file counts as a change: the next cycle can
        // pick it up.
        assert!(env.notice_change(&temp.path().join("absent.txt")));
    }

    #[test]
    fn test_host_assigns_generation_ids() {
        let (_temp, host) = fixture(&[]);
        assert_eq!(host.create_environment().id(), 1);
        assert_eq!(host.create_environment().id(), 2);
    }
}
