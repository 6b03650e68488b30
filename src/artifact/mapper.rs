//! Source-to-artifact path mapping.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Image format produced by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Svg,
}

impl OutputFormat {
    /// File extension of artifacts in this format.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }

    /// Format flag understood by the PlantUML executable.
    pub fn renderer_flag(self) -> &'static str {
        match self {
            Self::Png => "-tpng",
            Self::Svg => "-tsvg",
        }
    }
}

/// Map a diagram source path to its artifact path: same parent directory,
/// same base name, output extension substituted.
///
/// Pure and total: no I/O, no failure modes.
pub fn artifact_path(source: &Path, format: OutputFormat) -> PathBuf {
    source.with_extension(format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_extension_in_place() {
        assert_eq!(
            artifact_path(Path::new("/docs/report.puml"), OutputFormat::Png),
            PathBuf::from("/docs/report.png")
        );
    }

    #[test]
    fn keeps_parent_directory_for_nested_sources() {
        assert_eq!(
            artifact_path(Path::new("/docs/arch/flows/login.puml"), OutputFormat::Svg),
            PathBuf::from("/docs/arch/flows/login.svg")
        );
    }

    #[test]
    fn strips_only_the_final_extension() {
        assert_eq!(
            artifact_path(Path::new("/docs/report.v2.puml"), OutputFormat::Png),
            PathBuf::from("/docs/report.v2.png")
        );
    }

    #[test]
    fn appends_extension_when_source_has_none() {
        assert_eq!(
            artifact_path(Path::new("/docs/diagram"), OutputFormat::Png),
            PathBuf::from("/docs/diagram.png")
        );
    }

    #[test]
    fn is_deterministic() {
        let source = Path::new("docs/report.puml");
        assert_eq!(
            artifact_path(source, OutputFormat::Png),
            artifact_path(source, OutputFormat::Png)
        );
    }
}
