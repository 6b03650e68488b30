//! Inclusion/exclusion policy for change notifications.

use std::path::{Component, Path, PathBuf};

/// Decides which notified paths are diagram sources worth processing.
///
/// Inclusion is by file extension. Exclusion drops anything below a hidden
/// (dot-prefixed) directory or one of the configured directory names.
/// Directory components are evaluated relative to the watch root, so a
/// hidden directory *above* the root does not disqualify everything
/// beneath it.
#[derive(Debug, Clone)]
pub struct EventFilter {
    root: PathBuf,
    extensions: Vec<String>,
    exclude_dirs: Vec<String>,
}

impl EventFilter {
    pub fn new(root: PathBuf, extensions: Vec<String>, exclude_dirs: Vec<String>) -> Self {
        Self {
            root,
            extensions,
            exclude_dirs,
        }
    }

    /// Check whether `path` names a diagram source under the watch root.
    pub fn matches(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        if !self.extensions.iter().any(|e| e == ext) {
            return false;
        }

        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let Some(parent) = relative.parent() else {
            return true;
        };

        for component in parent.components() {
            let Component::Normal(name) = component else {
                continue;
            };
            let Some(name) = name.to_str() else {
                return false;
            };
            if name.starts_with('.') || self.exclude_dirs.iter().any(|d| d == name) {
                return false;
            }
        }

        true
    }
}
