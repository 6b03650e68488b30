//! Change dispatcher: routes filesystem notifications to the pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use notify::event::{CreateKind, ModifyKind, RemoveKind};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::artifact::ArtifactPipeline;
use crate::logging::Logger;

use super::error::WatchError;
use super::filter::EventFilter;
use super::sequencer::InflightRenders;

/// Classification of one filesystem notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

/// Routes change notifications for diagram sources to the artifact pipeline.
///
/// Pre-existing files are not replayed at subscription time: only events
/// observed after the watch begins are processed, so restarting the process
/// never triggers a full regeneration burst.
///
/// Classification and routing run synchronously on the event loop; each
/// dispatched generate/cleanup is a spawned task, so renders for different
/// files (and, by default, repeated edits of the same file) overlap freely.
pub struct ChangeDispatcher {
    root: PathBuf,
    filter: EventFilter,
    pipeline: Arc<ArtifactPipeline>,
    logger: Arc<dyn Logger>,
    /// Present only when per-path superseding is enabled.
    inflight: Option<InflightRenders>,
    /// Channel for receiving file events.
    event_rx: mpsc::Receiver<notify::Result<Event>>,
    /// The underlying file watcher (kept alive by storing it).
    _watcher: notify::RecommendedWatcher,
}

impl std::fmt::Debug for ChangeDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeDispatcher")
            .field("root", &self.root)
            .field("filter", &self.filter)
            .field("inflight", &self.inflight)
            .finish_non_exhaustive()
    }
}

impl ChangeDispatcher {
    /// Create a builder for configuring the dispatcher.
    pub fn builder() -> ChangeDispatcherBuilder {
        ChangeDispatcherBuilder::new()
    }

    /// Start watching for file changes.
    ///
    /// Runs until the process receives an interrupt, at which point the
    /// subscription is released. In-flight renders are abandoned without
    /// drain or cleanup guarantees on partially written artifacts.
    pub async fn watch(mut self) -> Result<(), WatchError> {
        self._watcher
            .watch(&self.root, RecursiveMode::Recursive)
            .map_err(|e| WatchError::PathWatchFailed {
                path: self.root.clone(),
                reason: e.to_string(),
            })?;

        self.logger.log(&format!("watching {}", self.root.display()));

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                maybe = self.event_rx.recv() => {
                    match maybe {
                        Some(Ok(event)) => self.handle_event(event),
                        Some(Err(e)) => {
                            tracing::error!("[watcher] file watch error: {e}");
                        }
                        None => return Err(WatchError::ChannelClosed),
                    }
                }

                _ = &mut ctrl_c => {
                    self.logger.log("shutting down");
                    return Ok(());
                }
            }
        }
    }

    /// Handle an incoming file event.
    fn handle_event(&mut self, event: Event) {
        let Some(kind) = classify(&event.kind) else {
            return;
        };

        for path in event.paths {
            if !self.filter.matches(&path) {
                tracing::debug!("[watcher] ignored {}", path.display());
                continue;
            }
            self.dispatch(kind, path);
        }
    }

    /// Spawn the pipeline operation for one classified change.
    fn dispatch(&mut self, kind: ChangeKind, path: PathBuf) {
        // Rename-as-modify platforms report a vanished path as Modify.
        let kind = if kind != ChangeKind::Removed && !path.exists() {
            ChangeKind::Removed
        } else {
            kind
        };

        let pipeline = Arc::clone(&self.pipeline);
        let task_path = path.clone();
        let handle = match kind {
            ChangeKind::Created | ChangeKind::Modified => tokio::spawn(async move {
                pipeline.generate(&task_path).await;
            }),
            ChangeKind::Removed => tokio::spawn(async move {
                pipeline.cleanup(&task_path).await;
            }),
        };

        if let Some(inflight) = self.inflight.as_mut() {
            inflight.sweep();
            inflight.record(path, handle);
        }
    }
}

/// Map a notify event kind onto the dispatcher's change classification.
///
/// Directory-level events, access notifications, and pure metadata changes
/// produce no change.
fn classify(kind: &EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder) => None,
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Modify(ModifyKind::Metadata(_)) => None,
        EventKind::Modify(_) => Some(ChangeKind::Modified),
        EventKind::Remove(_) => Some(ChangeKind::Removed),
        _ => None,
    }
}

/// Builder for constructing a ChangeDispatcher.
pub struct ChangeDispatcherBuilder {
    root: Option<PathBuf>,
    filter: Option<EventFilter>,
    pipeline: Option<Arc<ArtifactPipeline>>,
    logger: Option<Arc<dyn Logger>>,
    supersede_renders: bool,
}

impl ChangeDispatcherBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            root: None,
            filter: None,
            pipeline: None,
            logger: None,
            supersede_renders: false,
        }
    }

    /// Set the watch root.
    pub fn root(mut self, root: PathBuf) -> Self {
        self.root = Some(root);
        self
    }

    /// Set the inclusion/exclusion policy.
    pub fn filter(mut self, filter: EventFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Set the artifact pipeline.
    pub fn pipeline(mut self, pipeline: Arc<ArtifactPipeline>) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Set the status logger.
    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Enable per-path superseding of pending operations.
    pub fn supersede_renders(mut self, enabled: bool) -> Self {
        self.supersede_renders = enabled;
        self
    }

    /// Build the ChangeDispatcher.
    pub fn build(self) -> Result<ChangeDispatcher, WatchError> {
        let root = self.root.ok_or_else(|| WatchError::InitFailed {
            reason: "watch root is required".to_string(),
        })?;

        let filter = self.filter.ok_or_else(|| WatchError::InitFailed {
            reason: "event filter is required".to_string(),
        })?;

        let pipeline = self.pipeline.ok_or_else(|| WatchError::InitFailed {
            reason: "artifact pipeline is required".to_string(),
        })?;

        let logger = self.logger.ok_or_else(|| WatchError::InitFailed {
            reason: "logger is required".to_string(),
        })?;

        // Create channel for events
        let (tx, rx) = mpsc::channel(100);

        // Create the notify watcher
        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.blocking_send(res);
        })?;

        Ok(ChangeDispatcher {
            root,
            filter,
            pipeline,
            logger,
            inflight: self.supersede_renders.then(InflightRenders::new),
            event_rx: rx,
            _watcher: watcher,
        })
    }
}

impl Default for ChangeDispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, DataChange, MetadataKind, RenameMode};

    #[test]
    fn file_creation_classifies_as_created() {
        assert_eq!(
            classify(&EventKind::Create(CreateKind::File)),
            Some(ChangeKind::Created)
        );
        assert_eq!(
            classify(&EventKind::Create(CreateKind::Any)),
            Some(ChangeKind::Created)
        );
    }

    #[test]
    fn content_modification_classifies_as_modified() {
        assert_eq!(
            classify(&EventKind::Modify(ModifyKind::Data(DataChange::Content))),
            Some(ChangeKind::Modified)
        );
        assert_eq!(
            classify(&EventKind::Modify(ModifyKind::Any)),
            Some(ChangeKind::Modified)
        );
        assert_eq!(
            classify(&EventKind::Modify(ModifyKind::Name(RenameMode::To))),
            Some(ChangeKind::Modified)
        );
    }

    #[test]
    fn file_removal_classifies_as_removed() {
        assert_eq!(
            classify(&EventKind::Remove(RemoveKind::File)),
            Some(ChangeKind::Removed)
        );
    }

    #[test]
    fn directory_level_events_are_dropped() {
        assert_eq!(classify(&EventKind::Create(CreateKind::Folder)), None);
        assert_eq!(classify(&EventKind::Remove(RemoveKind::Folder)), None);
    }

    #[test]
    fn access_and_metadata_events_are_dropped() {
        assert_eq!(classify(&EventKind::Access(AccessKind::Any)), None);
        assert_eq!(
            classify(&EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any))),
            None
        );
        assert_eq!(classify(&EventKind::Any), None);
    }

    #[test]
    fn build_requires_all_collaborators() {
        let err = ChangeDispatcher::builder().build().unwrap_err();
        assert!(matches!(err, WatchError::InitFailed { .. }));
    }
}
