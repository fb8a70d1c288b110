//! Reload-lifecycle core for the rekindle hot-module-reload coordinator.
//!
//! This crate provides:
//! - Module identity and loadability validation
//! - The synchronous event primitive (`Signal` / `Subscription`)
//! - Cancellable deferred load results (`LoadHandle` / `LoadResolver`)
//! - The `Environment` / `EnvironmentProvider` host boundary
//! - The `HotReloader` reload-cycle state machine
//!
//! The core is single-threaded and cooperative: state lives in `Rc` and
//! `RefCell`, events deliver synchronously, and re-entrant calls from
//! event handlers are ordinary nested calls.

pub mod environment;
pub mod error;
pub mod load;
pub mod module;
pub mod reloader;
pub mod signal;

pub use environment::{Environment, EnvironmentProvider};
pub use error::{Error, Result};
pub use load::{LoadError, LoadHandle, LoadResolver};
pub use module::{ModuleId, ModuleKind};
pub use reloader::{DependencyChange, HotReloader, ProviderOutput};
pub use signal::{Signal, Subscription};
