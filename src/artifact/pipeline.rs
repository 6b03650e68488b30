//! Artifact generation and cleanup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::artifact::{OutputFormat, artifact_path};
use crate::logging::Logger;
use crate::render::{RenderError, Renderer};

/// Errors from a single generate/cleanup operation.
///
/// These never escape the pipeline's public methods: both entry points
/// catch, log, and swallow, so one broken diagram cannot stall the watch
/// loop.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("failed to write artifact {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove artifact {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Renders diagram sources into image artifacts and removes stale ones.
///
/// Owns every artifact file under the watch root: artifacts are created and
/// deleted only here, never edited by a user.
pub struct ArtifactPipeline {
    renderer: Arc<dyn Renderer>,
    logger: Arc<dyn Logger>,
    format: OutputFormat,
    style_path: Option<PathBuf>,
}

impl ArtifactPipeline {
    pub fn new(
        renderer: Arc<dyn Renderer>,
        logger: Arc<dyn Logger>,
        format: OutputFormat,
        style_path: Option<PathBuf>,
    ) -> Self {
        Self {
            renderer,
            logger,
            format,
            style_path,
        }
    }

    /// Remove the artifact derived from `source`, if it exists.
    ///
    /// A missing artifact is a silent no-op, not an error. Deletion failures
    /// (permissions, concurrent writers) are logged and swallowed.
    pub async fn cleanup(&self, source: &Path) {
        if let Err(e) = self.try_cleanup(source).await {
            self.logger.log(&format!("error: {e}"));
        }
    }

    /// Regenerate the artifact for `source`.
    ///
    /// Removes any prior artifact first so a failed render cannot leave a
    /// stale image masquerading as current output. Render and write failures
    /// are logged and swallowed; the watch loop keeps serving other events.
    pub async fn generate(&self, source: &Path) {
        self.cleanup(source).await;

        if let Err(e) = self.try_generate(source).await {
            self.logger.log(&format!("error: {e}"));
        }
    }

    async fn try_cleanup(&self, source: &Path) -> Result<(), PipelineError> {
        let artifact = artifact_path(source, self.format);
        if !artifact.exists() {
            return Ok(());
        }

        self.logger.log(&format!("removing {}", artifact.display()));
        tokio::fs::remove_file(&artifact)
            .await
            .map_err(|source| PipelineError::Remove {
                path: artifact,
                source,
            })
    }

    async fn try_generate(&self, source: &Path) -> Result<(), PipelineError> {
        let artifact = artifact_path(source, self.format);
        self.logger.log(&format!("generating {}", artifact.display()));

        let bytes = self
            .renderer
            .render(source, self.format, self.style_path.as_deref())
            .await?;

        tokio::fs::write(&artifact, &bytes)
            .await
            .map_err(|source| PipelineError::Write {
                path: artifact.clone(),
                source,
            })?;

        self.logger.log(&format!("generated {}", artifact.display()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StaticRenderer {
        payload: Vec<u8>,
        fail: bool,
    }

    #[async_trait]
    impl Renderer for StaticRenderer {
        async fn render(
            &self,
            source: &Path,
            _format: OutputFormat,
            _style: Option<&Path>,
        ) -> Result<Vec<u8>, RenderError> {
            if self.fail {
                return Err(RenderError::Failed {
                    code: 1,
                    stderr: format!("syntax error in {}", source.display()),
                });
            }
            Ok(self.payload.clone())
        }
    }

    struct MemoryLogger(Mutex<Vec<String>>);

    impl MemoryLogger {
        fn new() -> Self {
            Self(Mutex::new(Vec::new()))
        }

        fn lines(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    impl Logger for MemoryLogger {
        fn log(&self, message: &str) {
            self.0.lock().unwrap().push(message.to_string());
        }
    }

    fn pipeline(fail: bool) -> (ArtifactPipeline, Arc<MemoryLogger>) {
        let logger = Arc::new(MemoryLogger::new());
        let pipeline = ArtifactPipeline::new(
            Arc::new(StaticRenderer {
                payload: b"image-bytes".to_vec(),
                fail,
            }),
            logger.clone(),
            OutputFormat::Png,
            None,
        );
        (pipeline, logger)
    }

    #[tokio::test]
    async fn generate_writes_artifact_next_to_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("report.puml");
        std::fs::write(&source, "@startuml\n@enduml").unwrap();

        let (pipeline, logger) = pipeline(false);
        pipeline.generate(&source).await;

        let artifact = dir.path().join("report.png");
        assert_eq!(std::fs::read(&artifact).unwrap(), b"image-bytes");

        let lines = logger.lines();
        assert!(lines.iter().any(|l| l.starts_with("generating ")));
        assert!(lines.iter().any(|l| l.starts_with("generated ")));
    }

    #[tokio::test]
    async fn generate_replaces_stale_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("report.puml");
        let artifact = dir.path().join("report.png");
        std::fs::write(&source, "@startuml\n@enduml").unwrap();
        std::fs::write(&artifact, "stale").unwrap();

        let (pipeline, logger) = pipeline(false);
        pipeline.generate(&source).await;

        assert_eq!(std::fs::read(&artifact).unwrap(), b"image-bytes");
        assert!(logger.lines().iter().any(|l| l.starts_with("removing ")));
    }

    #[tokio::test]
    async fn cleanup_removes_existing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("report.puml");
        let artifact = dir.path().join("report.png");
        std::fs::write(&artifact, "image").unwrap();

        let (pipeline, logger) = pipeline(false);
        pipeline.cleanup(&source).await;

        assert!(!artifact.exists());
        assert!(logger.lines().iter().any(|l| l.starts_with("removing ")));
    }

    #[tokio::test]
    async fn cleanup_of_missing_artifact_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("report.puml");

        let (pipeline, logger) = pipeline(false);
        pipeline.cleanup(&source).await;

        assert!(logger.lines().is_empty());
    }

    #[tokio::test]
    async fn render_failure_is_logged_and_leaves_no_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("broken.puml");
        std::fs::write(&source, "@startuml\noops").unwrap();

        let (pipeline, logger) = pipeline(true);
        pipeline.generate(&source).await;

        assert!(!dir.path().join("broken.png").exists());
        assert!(logger.lines().iter().any(|l| l.starts_with("error: ")));
    }
}
