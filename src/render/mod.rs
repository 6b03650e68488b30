//! External rendering collaborator.
//!
//! Rendering is consumed as an opaque capability: hand over a source path,
//! an output format, and an optional style file, get image bytes back. The
//! diagram language and the rendering algorithm live entirely on the other
//! side of this seam.

mod plantuml;

pub use plantuml::PlantUmlRenderer;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::artifact::OutputFormat;

/// Errors from invoking the external rendering capability.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to read source {path}: {source}")]
    Source {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to invoke renderer '{bin}': {source}")]
    Spawn {
        bin: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to stream diagram through renderer: {0}")]
    Pipe(#[from] std::io::Error),

    #[error("renderer exited with code {code}: {stderr}")]
    Failed { code: i32, stderr: String },
}

/// Converts one diagram source into image bytes.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(
        &self,
        source: &Path,
        format: OutputFormat,
        style: Option<&Path>,
    ) -> Result<Vec<u8>, RenderError>;
}
