//! Error types for rekindle-core.

use thiserror::Error;

use crate::module::ModuleId;

/// Result type for rekindle-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in rekindle-core.
///
/// Load failures are not represented here: they travel through a
/// [`LoadHandle`](crate::load::LoadHandle)'s own failure channel and are
/// never intercepted by the reloader.
#[derive(Debug, Error)]
pub enum Error {
    /// The reload target is not a loadable kind of module.
    #[error("cannot hot-reload '{0}': kind {kind} is not loadable", kind = .0.kind())]
    InvalidModuleKind(ModuleId),

    /// The reloader was used after `destroy()`.
    #[error("reloader already destroyed")]
    ReloaderDestroyed,

    /// A before-reload hook failed, aborting that reload cycle.
    #[error("before-reload hook failed: {0}")]
    Hook(String),
}
