//! Filesystem watching and change dispatch.
//!
//! # Architecture
//!
//! ```text
//! ChangeDispatcher
//!   - Single notify::RecommendedWatcher, recursive on the watch root
//!   - EventFilter (extension inclusion, directory exclusion)
//!   - Classifies notifications as Created/Modified/Removed
//!   - Created/Modified -> ArtifactPipeline::generate (spawned task)
//!   - Removed          -> ArtifactPipeline::cleanup  (spawned task)
//!   - Optional per-path supersede registry (InflightRenders)
//! ```

mod dispatcher;
mod error;
mod filter;
mod sequencer;

pub use dispatcher::{ChangeDispatcher, ChangeDispatcherBuilder, ChangeKind};
pub use error::WatchError;
pub use filter::EventFilter;
pub use sequencer::InflightRenders;
