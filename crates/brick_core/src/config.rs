//! Import configuration.
//!
//! Loaded once per session, usually from a JSON file:
//!
//! ```json
//! {
//!     "max_depth": 32,
//!     "container_extensions": [".ldr", ".mpd"],
//!     "read_only_meshes": false
//! }
//! ```
//!
//! Missing fields take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Options for an import session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Deepest allowed sub-file nesting, counting the root as 1
    pub max_depth: usize,

    /// Extensions (with dot, case-insensitive) of files that only place other
    /// models; no material is resolved for references to them
    pub container_extensions: Vec<String>,

    /// Color code used when no explicit color applies
    pub default_color_code: u32,

    /// Mark output meshes as read-only so consumers may batch them
    pub read_only_meshes: bool,

    /// Compute vertex normals on the output mesh
    pub compute_normals: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_depth: 64,
            container_extensions: vec![".ldr".to_string(), ".mpd".to_string()],
            default_color_code: 0,
            read_only_meshes: true,
            compute_normals: false,
        }
    }
}

impl ImportConfig {
    /// Parse a JSON configuration.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a JSON configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// True if `extension` names a container format.
    pub fn is_container(&self, extension: &str) -> bool {
        self.container_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(extension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ImportConfig::default();
        assert!(config.is_container(".ldr"));
        assert!(config.is_container(".MPD"));
        assert!(!config.is_container(".dat"));
        assert!(!config.is_container(""));
        assert!(config.read_only_meshes);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ImportConfig::from_json(r#"{ "max_depth": 8, "compute_normals": true }"#).unwrap();

        assert_eq!(config.max_depth, 8);
        assert!(config.compute_normals);
        assert_eq!(config.container_extensions, ImportConfig::default().container_extensions);
    }

    #[test]
    fn test_invalid_json() {
        let err = ImportConfig::from_json("{ max_depth: }").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = ImportConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
