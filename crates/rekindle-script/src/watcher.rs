//! File watcher for detecting script changes.
//!
//! Watches a script root recursively and forwards debounced change events
//! to the driving loop. Which paths actually matter is decided by the
//! environment's watched set, not here.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify_debouncer_mini::{DebounceEventResult, new_debouncer, notify::RecursiveMode};
use tokio::sync::mpsc;

use crate::error::{ScriptError, ScriptResult};

/// Events within this window collapse into one.
const DEBOUNCE_WINDOW: Duration = Duration::from_millis(200);

/// A debounced change to one path.
#[derive(Debug, Clone)]
pub enum FileEvent {
    /// The path exists after the change (created or edited).
    Modified(PathBuf),
    /// The path no longer exists.
    Removed(PathBuf),
}

impl FileEvent {
    pub fn path(&self) -> &Path {
        match self {
            FileEvent::Modified(path) | FileEvent::Removed(path) => path,
        }
    }
}

/// Watches a script root and yields debounced [`FileEvent`]s.
pub struct FileWatcher {
    /// Holding the debouncer keeps the underlying watcher alive.
    _debouncer: notify_debouncer_mini::Debouncer<notify::RecommendedWatcher>,
    rx: mpsc::UnboundedReceiver<FileEvent>,
}

impl FileWatcher {
    /// Watch `root` recursively, debounced by [`DEBOUNCE_WINDOW`].
    pub fn new(root: impl AsRef<Path>) -> ScriptResult<Self> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut debouncer = new_debouncer(
            DEBOUNCE_WINDOW,
            move |result: DebounceEventResult| {
                let Ok(events) = result else {
                    return;
                };
                for event in events {
                    // The mini debouncer reports only that a path settled;
                    // probe the filesystem to classify what happened.
                    let path = event.path;
                    let file_event = if path.exists() {
                        FileEvent::Modified(path)
                    } else {
                        FileEvent::Removed(path)
                    };
                    if tx.send(file_event).is_err() {
                        return;
                    }
                }
            },
        )
        .map_err(|e| ScriptError::Watch(e.to_string()))?;

        debouncer
            .watcher()
            .watch(root.as_ref(), RecursiveMode::Recursive)
            .map_err(|e| ScriptError::Watch(e.to_string()))?;

        Ok(Self {
            _debouncer: debouncer,
            rx,
        })
    }

    /// Next debounced event, or `None` once the watch backend shuts down.
    pub async fn recv(&mut self) -> Option<FileEvent> {
        self.rx.recv().await
    }
}
