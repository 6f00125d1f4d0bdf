//! UI preferences sidecar.
//!
//! The catalog never interprets the contents; it only guarantees the file is
//! a JSON object and that `reset` removes it.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::CatalogError;

/// Location of the preferences file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    path: PathBuf,
}

impl Preferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored object; a missing file reads as empty.
    pub fn load(&self) -> Result<Map<String, Value>, CatalogError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(CatalogError::io(&self.path, e)),
        };
        match serde_json::from_str(&text)? {
            Value::Object(map) => Ok(map),
            _ => Err(CatalogError::PrefsNotObject {
                path: self.path.clone(),
            }),
        }
    }

    /// Overwrite the stored object.
    pub fn save(&self, prefs: &Map<String, Value>) -> Result<(), CatalogError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| CatalogError::io(dir, e))?;
        }
        let text = serde_json::to_string_pretty(prefs)?;
        fs::write(&self.path, text).map_err(|e| CatalogError::io(&self.path, e))
    }

    /// Delete the file; a missing file is not an error.
    pub fn clear(&self) -> Result<(), CatalogError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CatalogError::io(&self.path, e)),
        }
    }
}
