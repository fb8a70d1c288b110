//! Error types for the script host.

use std::path::PathBuf;

use rekindle_core::ModuleId;

/// Script host error type.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// Module file does not exist under the root.
    #[error("Module not found: {0}")]
    ModuleNotFound(ModuleId),

    /// IO error while reading a module file.
    #[error("IO error at {path}: {message}")]
    Io { path: PathBuf, message: String },

    /// require() references form a cycle.
    #[error("Dependency cycle through '{0}'")]
    DependencyCycle(ModuleId),

    /// Watch error.
    #[error("File watch error: {0}")]
    Watch(String),
}

/// Result type for script host operations.
pub type ScriptResult<T> = Result<T, ScriptError>;
