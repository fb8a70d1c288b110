//! Execution environment contract.
//!
//! An [`Environment`] is one generation of loaded state: it performs loads,
//! reports dependency changes, and is torn down when its generation ends.
//! Environments are cheap shared handles (clones view the same underlying
//! state), which lets reload events carry the environment they belong to
//! while the reloader keeps its own handle for teardown.
//!
//! The reloader is the only caller of [`Environment::destroy`]. Handles
//! cloned out of events stay valid for inspection after teardown and
//! answer [`Environment::is_destroyed`] accordingly.

use crate::load::LoadHandle;
use crate::module::ModuleId;
use crate::signal::Signal;

/// One generation of execution state owned by a reloader.
pub trait Environment: Clone + 'static {
    /// What a successful load of a module produces.
    type Output: Clone + 'static;

    /// Fired when a dependency of this environment changes on disk.
    ///
    /// Fires at most once per environment generation; the reloader
    /// replaces the environment before listening again.
    fn dependency_changed(&self) -> Signal<ModuleId>;

    /// Begin loading `module` and its dependency closure.
    ///
    /// The returned handle may already be settled for synchronous
    /// loaders. Loading through a destroyed environment yields a failed
    /// handle rather than a panic.
    fn load_dependency(&self, module: &ModuleId) -> LoadHandle<Self::Output>;

    /// Tear down this generation. Idempotent, and safe to call while a
    /// load is still pending.
    fn destroy(&self);

    /// Whether [`destroy`](Environment::destroy) has run.
    fn is_destroyed(&self) -> bool;
}

/// Factory for fresh [`Environment`] generations.
pub trait EnvironmentProvider: 'static {
    type Env: Environment;

    /// Create a new, not yet destroyed environment.
    fn create_environment(&self) -> Self::Env;
}
