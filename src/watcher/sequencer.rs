//! Per-path in-flight operation tracking.
//!
//! The dispatcher deliberately allows overlapping renders for the same
//! source: the last write to *finish* wins, matching the low edit frequency
//! of hand-authored diagrams. Setting `watch.supersede_renders` routes
//! spawned operations through this registry instead, which aborts the prior
//! pending operation for a path before admitting its replacement.

use std::collections::HashMap;
use std::path::PathBuf;

use tokio::task::JoinHandle;

/// Map from source path to the single latest in-flight operation for it.
#[derive(Debug, Default)]
pub struct InflightRenders {
    pending: HashMap<PathBuf, JoinHandle<()>>,
}

impl InflightRenders {
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
        }
    }

    /// Record the latest operation for `path`, superseding any prior one.
    ///
    /// The superseded task is aborted; aborting a task that already
    /// finished is a no-op.
    pub fn record(&mut self, path: PathBuf, handle: JoinHandle<()>) {
        if let Some(previous) = self.pending.insert(path, handle) {
            previous.abort();
        }
    }

    /// Drop handles of completed operations so the registry does not grow
    /// with every event for the lifetime of the process.
    pub fn sweep(&mut self) {
        self.pending.retain(|_, handle| !handle.is_finished());
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
