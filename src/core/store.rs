//! Store abstraction for Atelier's persisted state.
//!
//! A Store is the `.atelier/` state directory of a project. Every ledger and
//! index the engine maintains (workshop index, survival ledger, curation
//! ledger, era archive, seed state) is a whole-file JSON document under this
//! directory. No in-memory state survives between invocations; documents are
//! reloaded each run.

use crate::core::error::AtelierError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the state directory, relative to the project root.
pub const STATE_DIR: &str = ".atelier";

pub const WORKSHOP_FILE: &str = "workshop.json";
pub const WORKSHOP_LOCK_FILE: &str = "workshop.lock";
pub const SURVIVAL_FILE: &str = "survival.json";
pub const CURATION_FILE: &str = "curation.json";
pub const SEED_FILE: &str = "seed.json";
pub const ERAS_DIR: &str = "eras";

/// Handle for a project's `.atelier/` state workspace.
#[derive(Debug, Clone)]
pub struct Store {
    /// Absolute path to the state directory.
    pub root: PathBuf,
}

impl Store {
    pub fn open(project_root: &Path) -> Self {
        Self {
            root: project_root.join(STATE_DIR),
        }
    }

    pub fn ensure(&self) -> Result<(), AtelierError> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn eras_dir(&self) -> PathBuf {
        self.root.join(ERAS_DIR)
    }
}

/// Load a persisted JSON document.
///
/// Missing and corrupt files both yield `None`: a reader degrades to the
/// document's default state rather than failing the invocation.
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let content = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(err) => {
            eprintln!(
                "[atelier] discarding corrupt document {}: {}",
                path.display(),
                err
            );
            None
        }
    }
}

/// Persist a JSON document via atomic whole-file replacement.
///
/// The document is written to a sibling temp file and renamed into place, so
/// concurrent readers never observe a partially written state.
pub fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<(), AtelierError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document");
    let tmp = path.with_file_name(format!("{}.tmp", file_name));
    let content = serde_json::to_string_pretty(value)?;
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
