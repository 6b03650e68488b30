pub mod artifact;
pub mod config;
pub mod logging;
pub mod render;
pub mod watcher;

pub use artifact::{ArtifactPipeline, OutputFormat, artifact_path};
pub use config::Settings;
pub use logging::{ConsoleLogger, Logger};
pub use render::{PlantUmlRenderer, RenderError, Renderer};
pub use watcher::{ChangeDispatcher, WatchError};
