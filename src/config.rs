//! Configuration module for the diagram watcher.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `PLANTWATCH_` and use double
//! underscores to separate nested levels:
//! - `PLANTWATCH_RENDER__OUTPUT_FORMAT=svg` sets `render.output_format`
//! - `PLANTWATCH_WATCH__SUPERSEDE_RENDERS=true` sets `watch.supersede_renders`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::artifact::OutputFormat;

/// Errors from writing or initializing configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file already exists at {path} (use --force to overwrite)")]
    AlreadyExists { path: PathBuf },

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Directory tree to watch. Defaults to the directory holding `.plantwatch`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watch_root: Option<PathBuf>,

    /// Change-notification filtering and dispatch
    #[serde(default)]
    pub watch: WatchConfig,

    /// External renderer invocation
    #[serde(default)]
    pub render: RenderConfig,

    /// Diagnostic logging levels
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WatchConfig {
    /// File extensions treated as diagram sources
    #[serde(default = "default_source_extensions")]
    pub source_extensions: Vec<String>,

    /// Directory names excluded from watching, at any depth under the root.
    /// Hidden (dot-prefixed) directories are always excluded.
    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,

    /// Serialize renders per source path: a new change aborts the pending
    /// operation for the same path instead of letting them overlap.
    #[serde(default = "default_false")]
    pub supersede_renders: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RenderConfig {
    /// Image format written for each source
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Renderer executable name or path
    #[serde(default = "default_plantuml_bin")]
    pub plantuml_bin: String,

    /// Shared style/configuration file passed to the renderer.
    /// Relative paths resolve against the watch root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default level for diagnostic output
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module level overrides
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_source_extensions() -> Vec<String> {
    vec!["puml".to_string()]
}
fn default_exclude_dirs() -> Vec<String> {
    vec![
        "node_modules".to_string(),
        "target".to_string(),
        "out".to_string(),
        "dist".to_string(),
        "build".to_string(),
        "vendor".to_string(),
    ]
}
fn default_false() -> bool {
    false
}
fn default_plantuml_bin() -> String {
    "plantuml".to_string()
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            watch_root: None,
            watch: WatchConfig::default(),
            render: RenderConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            source_extensions: default_source_extensions(),
            exclude_dirs: default_exclude_dirs(),
            supersede_renders: false,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::default(),
            plantuml_bin: default_plantuml_bin(),
            style_path: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(".plantwatch/settings.toml"));

        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(config_path))
            // Layer in environment variables with PLANTWATCH_ prefix.
            // Double underscore (__) separates nested levels; single
            // underscore (_) remains as is within field names.
            .merge(Env::prefixed("PLANTWATCH_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(Box::new)
    }

    /// Find the workspace config by looking for a .plantwatch directory,
    /// searching from the current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(".plantwatch");
            if config_dir.exists() && config_dir.is_dir() {
                return Some(config_dir.join("settings.toml"));
            }
        }

        None
    }

    /// Get the workspace root directory (where .plantwatch is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(".plantwatch");
            if config_dir.exists() && config_dir.is_dir() {
                return Some(ancestor.to_path_buf());
            }
        }

        None
    }

    /// Check if configuration is properly initialized
    pub fn check_init() -> Result<(), String> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(".plantwatch/settings.toml"));

        if !config_path.exists() {
            return Err("No configuration file found".to_string());
        }

        match std::fs::read_to_string(&config_path) {
            Ok(content) => {
                if let Err(e) = toml::from_str::<Settings>(&content) {
                    return Err(format!(
                        "Configuration file is corrupted: {e}\nRun 'plantwatch init --force' to regenerate."
                    ));
                }
            }
            Err(e) => {
                return Err(format!("Cannot read configuration file: {e}"));
            }
        }

        Ok(())
    }

    /// Directory tree to watch: the configured root, else the directory
    /// holding `.plantwatch`, else the current directory.
    pub fn resolved_watch_root(&self) -> PathBuf {
        self.watch_root
            .clone()
            .or_else(Self::workspace_root)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Style file handed to the renderer, resolved against the watch root
    /// when relative. `None` means the renderer runs without a style.
    pub fn resolved_style_path(&self, root: &Path) -> Option<PathBuf> {
        self.render.style_path.as_ref().map(|style| {
            if style.is_absolute() {
                style.clone()
            } else {
                root.join(style)
            }
        })
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let parent = path
            .as_ref()
            .parent()
            .ok_or_else(|| std::io::Error::other("invalid configuration path"))?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file
    pub fn init_config_file(force: bool) -> Result<PathBuf, ConfigError> {
        let config_path = PathBuf::from(".plantwatch/settings.toml");

        if !force && config_path.exists() {
            return Err(ConfigError::AlreadyExists { path: config_path });
        }

        let settings = Settings::default();
        settings.save(&config_path)?;

        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_watch_puml_sources() {
        let settings = Settings::default();
        assert_eq!(settings.watch.source_extensions, vec!["puml"]);
        assert_eq!(settings.render.output_format, OutputFormat::Png);
        assert_eq!(settings.render.plantuml_bin, "plantuml");
        assert!(!settings.watch.supersede_renders);
        assert!(settings.watch_root.is_none());
        assert!(settings.render.style_path.is_none());
    }

    #[test]
    fn default_excludes_cover_dependency_and_output_dirs() {
        let settings = Settings::default();
        for dir in ["node_modules", "target", "dist"] {
            assert!(
                settings.watch.exclude_dirs.iter().any(|d| d == dir),
                "expected {dir} in default excludes"
            );
        }
    }

    #[test]
    fn load_from_overlays_file_on_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(
            &path,
            r#"
watch_root = "/diagrams"

[watch]
source_extensions = ["puml", "iuml"]
supersede_renders = true

[render]
output_format = "svg"
style_path = "styles/corporate.puml"
"#,
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.watch_root, Some(PathBuf::from("/diagrams")));
        assert_eq!(settings.watch.source_extensions, vec!["puml", "iuml"]);
        assert!(settings.watch.supersede_renders);
        assert_eq!(settings.render.output_format, OutputFormat::Svg);
        // Unset fields keep their defaults
        assert_eq!(settings.render.plantuml_bin, "plantuml");
        assert_eq!(settings.logging.default, "warn");
    }

    #[test]
    fn relative_style_path_resolves_against_watch_root() {
        let mut settings = Settings::default();
        settings.render.style_path = Some(PathBuf::from("styles/corporate.puml"));

        let resolved = settings.resolved_style_path(Path::new("/docs"));
        assert_eq!(resolved, Some(PathBuf::from("/docs/styles/corporate.puml")));
    }

    #[test]
    fn absolute_style_path_is_kept_verbatim() {
        let mut settings = Settings::default();
        settings.render.style_path = Some(PathBuf::from("/etc/plantuml/style.puml"));

        let resolved = settings.resolved_style_path(Path::new("/docs"));
        assert_eq!(resolved, Some(PathBuf::from("/etc/plantuml/style.puml")));
    }

    #[test]
    fn save_writes_loadable_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".plantwatch/settings.toml");

        let mut settings = Settings::default();
        settings.watch.supersede_renders = true;
        settings.save(&path).unwrap();

        let reloaded = Settings::load_from(&path).unwrap();
        assert!(reloaded.watch.supersede_renders);
    }
}
