//! Mapping diagram sources to derived artifacts, and keeping them in sync.

mod mapper;
mod pipeline;

pub use mapper::{OutputFormat, artifact_path};
pub use pipeline::{ArtifactPipeline, PipelineError};
