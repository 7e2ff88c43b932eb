//! JSON file persistence for the chosen label.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::LabelPersistence;
use crate::error::Result;
use crate::models::SpouseLabel;

const IDENTITY_FILE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct IdentityFile {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    label: Option<SpouseLabel>,
}

const fn default_version() -> u32 {
    IDENTITY_FILE_VERSION
}

/// Stores the label in a small JSON document; a missing file means unset.
#[derive(Debug, Clone)]
pub struct FileLabelStore {
    path: PathBuf,
}

impl FileLabelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LabelPersistence for FileLabelStore {
    fn load_label(&self) -> Result<Option<SpouseLabel>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)?;
        let file: IdentityFile = serde_json::from_str(&raw)?;
        Ok(file.label)
    }

    fn save_label(&self, label: SpouseLabel) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = IdentityFile {
            version: IDENTITY_FILE_VERSION,
            label: Some(label),
        };
        std::fs::write(&self.path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }

    fn clear_label(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}
