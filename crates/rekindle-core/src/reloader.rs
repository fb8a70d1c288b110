//! Reload lifecycle state machine.
//!
//! A [`HotReloader`] watches exactly one module and owns at most one live
//! [`Environment`] at a time. Each reload cycle tears down the previous
//! cycle, creates a fresh environment through the provider, runs the
//! optional before-reload hook, arms a one-shot dependency-change
//! listener, starts the load, and announces the cycle on
//! [`reload_started`](HotReloader::reload_started).
//!
//! When the environment reports a dependency change, the reloader
//! republishes it on [`dependency_changed`](HotReloader::dependency_changed)
//! first and reads the auto-reload flag afterwards, so subscribers can flip
//! the flag during the event and still affect that very cycle.
//!
//! The reloader is single-threaded and cooperative: state lives behind
//! brief `RefCell` borrows that are released before any hook, signal
//! handler, or environment call runs, which makes re-entrant `reload()`
//! from inside a change handler a plain synchronous call.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::environment::{Environment, EnvironmentProvider};
use crate::error::{Error, Result};
use crate::load::LoadHandle;
use crate::module::ModuleId;
use crate::signal::{Signal, Subscription};

/// Load output produced by a provider's environments.
pub type ProviderOutput<P> = <<P as EnvironmentProvider>::Env as Environment>::Output;

type BeforeReloadHook<E> = dyn Fn(&E) -> Result<()>;

/// Payload of [`HotReloader::dependency_changed`].
///
/// Carries the environment the change belongs to; the environment is still
/// live while the event is delivered, and is torn down right after if
/// auto-reload is on.
#[derive(Clone)]
pub struct DependencyChange<E> {
    pub module: ModuleId,
    pub environment: E,
}

impl<E> fmt::Debug for DependencyChange<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyChange")
            .field("module", &self.module)
            .finish_non_exhaustive()
    }
}

struct ReloaderState<P: EnvironmentProvider> {
    auto_reload: bool,
    destroyed: bool,
    environment: Option<P::Env>,
    pending: Option<LoadHandle<ProviderOutput<P>>>,
    change_listener: Option<Subscription>,
    before_reload: Option<Rc<BeforeReloadHook<P::Env>>>,
}

struct ReloaderShared<P: EnvironmentProvider> {
    module: ModuleId,
    provider: P,
    reload_started: Signal<LoadHandle<ProviderOutput<P>>>,
    dependency_changed: Signal<DependencyChange<P::Env>>,
    state: RefCell<ReloaderState<P>>,
}

/// Coordinates reload cycles for one module over a provider.
pub struct HotReloader<P: EnvironmentProvider> {
    shared: Rc<ReloaderShared<P>>,
}

impl<P: EnvironmentProvider> HotReloader<P> {
    /// Create a reloader for `module`.
    ///
    /// Fails with [`Error::InvalidModuleKind`] unless the module's kind is
    /// loadable. No environment is created until the first
    /// [`reload`](HotReloader::reload).
    pub fn new(module: ModuleId, provider: P) -> Result<Self> {
        if !module.kind().is_loadable() {
            return Err(Error::InvalidModuleKind(module));
        }
        Ok(Self {
            shared: Rc::new(ReloaderShared {
                module,
                provider,
                reload_started: Signal::new(),
                dependency_changed: Signal::new(),
                state: RefCell::new(ReloaderState {
                    auto_reload: true,
                    destroyed: false,
                    environment: None,
                    pending: None,
                    change_listener: None,
                    before_reload: None,
                }),
            }),
        })
    }

    /// The module this reloader watches.
    pub fn module(&self) -> &ModuleId {
        &self.shared.module
    }

    /// Whether a dependency change re-enters `reload()` on its own.
    pub fn auto_reload(&self) -> bool {
        self.shared.state.borrow().auto_reload
    }

    pub fn set_auto_reload(&self, enabled: bool) {
        self.shared.state.borrow_mut().auto_reload = enabled;
    }

    /// Install the before-reload hook. The last bound hook wins.
    ///
    /// The hook runs after the new environment is installed and before the
    /// load starts; a hook error aborts the cycle and propagates out of
    /// [`reload`](HotReloader::reload) with the new environment left in
    /// place.
    pub fn set_before_reload(&self, hook: impl Fn(&P::Env) -> Result<()> + 'static) {
        self.shared.state.borrow_mut().before_reload = Some(Rc::new(hook));
    }

    /// The current cycle's environment, if a cycle is installed.
    pub fn environment(&self) -> Option<P::Env> {
        self.shared.state.borrow().environment.clone()
    }

    /// Fired once per cycle, right after the load starts.
    pub fn reload_started(&self) -> Signal<LoadHandle<ProviderOutput<P>>> {
        self.shared.reload_started.clone()
    }

    /// Fired when the current environment reports a dependency change.
    pub fn dependency_changed(&self) -> Signal<DependencyChange<P::Env>> {
        self.shared.dependency_changed.clone()
    }

    /// Run one reload cycle and return its deferred result.
    ///
    /// The returned handle is also carried by the
    /// [`reload_started`](HotReloader::reload_started) fire, which happens
    /// before this call returns.
    pub fn reload(&self) -> Result<LoadHandle<ProviderOutput<P>>> {
        run_reload(&self.shared)
    }

    /// Tear down the current cycle and refuse further reloads. Idempotent.
    pub fn destroy(&self) {
        {
            let mut state = self.shared.state.borrow_mut();
            if state.destroyed {
                return;
            }
            state.destroyed = true;
        }
        tracing::debug!("Destroying reloader for '{}'", self.shared.module);
        clear_cycle(&self.shared);
    }

    pub fn is_destroyed(&self) -> bool {
        self.shared.state.borrow().destroyed
    }
}

impl<P: EnvironmentProvider> Drop for HotReloader<P> {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl<P: EnvironmentProvider> fmt::Debug for HotReloader<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("HotReloader")
            .field("module", &self.shared.module)
            .field("auto_reload", &state.auto_reload)
            .field("destroyed", &state.destroyed)
            .field("has_environment", &state.environment.is_some())
            .finish()
    }
}

/// Tear down the current cycle: cancel the pending load, disconnect the
/// change listener, destroy the environment, in that order.
fn clear_cycle<P: EnvironmentProvider>(shared: &ReloaderShared<P>) {
    let (pending, listener, environment) = {
        let mut state = shared.state.borrow_mut();
        (
            state.pending.take(),
            state.change_listener.take(),
            state.environment.take(),
        )
    };
    if let Some(pending) = pending {
        pending.cancel();
    }
    if let Some(listener) = listener {
        // A one-shot listener that already fired disconnected itself.
        if listener.is_connected() {
            listener.disconnect();
        }
    }
    if let Some(environment) = environment {
        environment.destroy();
    }
}

fn run_reload<P: EnvironmentProvider>(
    shared: &Rc<ReloaderShared<P>>,
) -> Result<LoadHandle<ProviderOutput<P>>> {
    if shared.state.borrow().destroyed {
        return Err(Error::ReloaderDestroyed);
    }
    tracing::info!("Reloading module '{}'", shared.module);

    clear_cycle(shared);

    let environment = shared.provider.create_environment();
    let hook = {
        let mut state = shared.state.borrow_mut();
        state.environment = Some(environment.clone());
        state.before_reload.clone()
    };

    // No borrow is held while user code runs.
    if let Some(hook) = hook {
        hook(&environment)?;
    }

    let listener = {
        let weak = Rc::downgrade(shared);
        let changes = shared.dependency_changed.clone();
        let changed_env = environment.clone();
        environment.dependency_changed().once(move |module: &ModuleId| {
            changes.fire(DependencyChange {
                module: module.clone(),
                environment: changed_env.clone(),
            });
            let Some(shared) = weak.upgrade() else {
                return;
            };
            // Read after the republish: subscribers may have flipped the
            // flag or destroyed the reloader during the event.
            let auto = {
                let state = shared.state.borrow();
                state.auto_reload && !state.destroyed
            };
            if auto {
                if let Err(error) = run_reload(&shared) {
                    tracing::error!(
                        "Auto-reload of '{}' failed: {}",
                        shared.module,
                        error
                    );
                }
            }
        })
    };
    shared.state.borrow_mut().change_listener = Some(listener);

    let handle = environment.load_dependency(&shared.module);
    shared.state.borrow_mut().pending = Some(handle.clone());

    shared.reload_started.fire(handle.clone());
    Ok(handle)
}
