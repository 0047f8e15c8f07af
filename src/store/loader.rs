//! Persistence layer for the store document.
//!
//! This module provides the [`StoreLoader`] which reads and writes the whole store
//! state as a single JSON document. Writes go to a sibling temporary file that is
//! renamed over the document, so a failed write never leaves a truncated file.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use log::{debug, error, info, warn};
use tokio::fs;

use crate::store::{StorageError, StoreState};

/// Loads and persists the [`StoreState`] document.
#[derive(Clone, Debug)]
pub struct StoreLoader {
    /// Path to the JSON document.
    path: PathBuf,
}

impl StoreLoader {
    /// Creates a new `StoreLoader` for the specified file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        StoreLoader { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the store document from disk.
    ///
    /// # Error Handling
    ///
    /// - If the file doesn't exist: logs a warning and returns an empty state
    /// - If deserialization fails: moves the document aside to `<file>.corrupt`,
    ///   logs its new path and returns an empty state
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the document exists but cannot be read, or
    /// if a corrupt document cannot be moved aside.
    pub async fn load(&self) -> Result<StoreState, StorageError> {
        let serialized_state = match fs::read_to_string(&self.path).await {
            Ok(serialized_state) => serialized_state,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(
                    "no persisted store found at {}, starting with an empty store",
                    self.path.display()
                );
                return Ok(StoreState::default());
            }
            Err(e) => {
                error!("failed to read store {}: {}", self.path.display(), e);
                return Err(e.into());
            }
        };

        let state: StoreState = match serde_json::from_str(&serialized_state) {
            Ok(state) => state,
            Err(e) => {
                let corrupt_path = self.sibling_path("corrupt");
                if let Err(rename_error) = fs::rename(&self.path, &corrupt_path).await {
                    error!(
                        "failed to deserialize store {}: {}, and failed to move it to {}: {}",
                        self.path.display(),
                        e,
                        corrupt_path.display(),
                        rename_error
                    );
                    return Err(rename_error.into());
                }

                error!(
                    "failed to deserialize store {}: {}, moved it to {} and starting with an empty store",
                    self.path.display(),
                    e,
                    corrupt_path.display()
                );
                return Ok(StoreState::default());
            }
        };

        info!(
            "loaded store with {} alerts and {} reminders",
            state.alerts.len(),
            state.reminders.len()
        );

        Ok(state)
    }

    /// Persists the whole state to disk.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Serialization`] if the state cannot be serialized and
    /// [`StorageError::Io`] if writing or renaming the file fails. The document on
    /// disk is left untouched in both cases.
    pub async fn persist(&self, state: &StoreState) -> Result<(), StorageError> {
        let serialized_state = serde_json::to_string(state)?;

        let tmp_path = self.sibling_path("tmp");
        if let Err(e) = fs::write(&tmp_path, &serialized_state).await {
            error!("failed to write store to {}: {}", tmp_path.display(), e);
            return Err(e.into());
        }

        if let Err(e) = fs::rename(&tmp_path, &self.path).await {
            error!(
                "failed to move store from {} to {}: {}",
                tmp_path.display(),
                self.path.display(),
                e
            );
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        debug!("persisted store to {}", self.path.display());

        Ok(())
    }

    /// Path of the document with `.extension` appended, e.g. `store.json.tmp`.
    fn sibling_path(&self, extension: &str) -> PathBuf {
        let mut file_name = self.path.file_name().unwrap_or_default().to_os_string();
        file_name.push(".");
        file_name.push(extension);
        self.path.with_file_name(file_name)
    }
}
