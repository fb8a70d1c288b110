//! Script-module host for the rekindle reloader.
//!
//! A reference implementation of the environment boundary: plain-text
//! script modules loaded from a root directory, with `require("...")`
//! references resolved transitively.
//!
//! # Architecture
//!
//! The host consists of:
//! - **Loader**: require() scanning, closure resolution, cycle detection
//! - **Environment**: one disposable generation of loaded state
//! - **Watcher**: debounced file-system monitoring for the driving loop

pub mod environment;
pub mod error;
pub mod loader;
pub mod watcher;

pub use environment::{ScriptEnvironment, ScriptHost};
pub use error::{ScriptError, ScriptResult};
pub use loader::{LoadedScript, ScriptLoader};
pub use watcher::{FileEvent, FileWatcher};
