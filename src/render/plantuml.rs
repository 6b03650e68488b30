//! PlantUML subprocess renderer.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{RenderError, Renderer};
use crate::artifact::OutputFormat;

/// Renders diagrams by piping source text through the `plantuml` executable.
///
/// `plantuml -pipe` reads one diagram on stdin and writes the image to
/// stdout, which keeps artifact placement entirely on our side of the seam.
pub struct PlantUmlRenderer {
    bin: String,
}

impl PlantUmlRenderer {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }
}

#[async_trait]
impl Renderer for PlantUmlRenderer {
    async fn render(
        &self,
        source: &Path,
        format: OutputFormat,
        style: Option<&Path>,
    ) -> Result<Vec<u8>, RenderError> {
        let text = tokio::fs::read(source)
            .await
            .map_err(|e| RenderError::Source {
                path: source.to_path_buf(),
                source: e,
            })?;

        let mut cmd = Command::new(&self.bin);
        cmd.arg("-pipe").arg(format.renderer_flag());
        if let Some(style) = style {
            cmd.arg("-config").arg(style);
        }
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| RenderError::Spawn {
            bin: self.bin.clone(),
            source: e,
        })?;

        // Dropping stdin after the write closes the pipe so the renderer
        // sees EOF and starts producing output.
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&text).await?;
        }

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(RenderError::Failed {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}
