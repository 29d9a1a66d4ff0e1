//! Part sources: where raw model text comes from.
//!
//! The importer never touches paths itself. It asks a [`PartSource`] for the
//! text of a referenced name and gets back `Ok(None)` when the part does not
//! exist. `Err` is reserved for failures of the source itself (unreadable
//! library, permission problems) and aborts the import.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

/// A part source failed for a reason other than "not found".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to read part '{name}': {message}")]
pub struct SourceError {
    pub name: String,
    pub message: String,
}

/// Supplies the text of a named model or part.
pub trait PartSource: Send + Sync {
    fn get_raw_text(&self, name: &str) -> Result<Option<String>, SourceError>;
}

impl<T: PartSource + ?Sized> PartSource for Arc<T> {
    fn get_raw_text(&self, name: &str) -> Result<Option<String>, SourceError> {
        (**self).get_raw_text(name)
    }
}

impl<T: PartSource + ?Sized> PartSource for &T {
    fn get_raw_text(&self, name: &str) -> Result<Option<String>, SourceError> {
        (**self).get_raw_text(name)
    }
}

/// In-memory name -> text map. Names are matched case-insensitively.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    files: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file.
    pub fn insert(&mut self, name: &str, text: impl Into<String>) {
        self.files.insert(super::normalize_name(name), text.into());
    }

    /// Builder-style [`MemorySource::insert`].
    pub fn with(mut self, name: &str, text: impl Into<String>) -> Self {
        self.insert(name, text);
        self
    }
}

impl PartSource for MemorySource {
    fn get_raw_text(&self, name: &str) -> Result<Option<String>, SourceError> {
        Ok(self.files.get(&super::normalize_name(name)).cloned())
    }
}

/// LDraw library sub-directories searched under every root, in order.
const LIBRARY_FOLDERS: [&str; 4] = ["", "parts", "p", "models"];

/// Reads parts from one or more LDraw library directories.
///
/// For each root, the name is looked up directly and under `parts/`, `p/` and
/// `models/`, first as written and then lower-cased.
#[derive(Clone, Debug)]
pub struct DirectorySource {
    roots: Vec<PathBuf>,
}

impl DirectorySource {
    pub fn new<P: AsRef<Path>>(roots: impl IntoIterator<Item = P>) -> Self {
        Self {
            roots: roots.into_iter().map(|p| p.as_ref().to_path_buf()).collect(),
        }
    }

    /// Search `root` before the existing roots (e.g. the model's own folder).
    pub fn with_root_first(mut self, root: impl AsRef<Path>) -> Self {
        self.roots.insert(0, root.as_ref().to_path_buf());
        self
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn candidates(&self, name: &str) -> Vec<PathBuf> {
        let relative = name.trim().replace('\\', "/");
        let lower = relative.to_lowercase();

        let mut paths = Vec::new();
        for root in &self.roots {
            for folder in LIBRARY_FOLDERS {
                let dir = root.join(folder);
                paths.push(dir.join(&relative));
                if lower != relative {
                    paths.push(dir.join(&lower));
                }
            }
        }
        paths
    }
}

impl PartSource for DirectorySource {
    fn get_raw_text(&self, name: &str) -> Result<Option<String>, SourceError> {
        for path in self.candidates(name) {
            if !path.is_file() {
                continue;
            }
            match std::fs::read(&path) {
                Ok(bytes) => {
                    log::trace!("Resolved '{}' to {}", name, path.display());
                    // Library files are not always valid UTF-8
                    return Ok(Some(String::from_utf8_lossy(&bytes).into_owned()));
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(SourceError {
                        name: name.to_string(),
                        message: format!("{}: {}", path.display(), e),
                    })
                }
            }
        }
        Ok(None)
    }
}
