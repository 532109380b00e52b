//! Persistence of the snapshot.
//!
//! The whole record set lives in one pretty-printed JSON document that is
//! read once per invocation and rewritten wholesale on every mutation.

use crate::error::{CadenceError, Result};
use crate::model::Snapshot;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Load/save boundary between the in-memory snapshot and its backing store.
pub trait RecordStore {
    /// Create an empty store if none exists, returning the current snapshot.
    fn init(&self, created_at: DateTime<Utc>) -> Result<Snapshot>;

    /// Read the full snapshot. Fails with `StoreNotInitialized` when the
    /// store does not exist yet.
    fn load(&self) -> Result<Snapshot>;

    /// Overwrite the store with `snapshot`.
    fn save(&self, snapshot: &Snapshot) -> Result<()>;
}

/// Flat-file JSON store.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

impl RecordStore for JsonFileStore {
    fn init(&self, created_at: DateTime<Utc>) -> Result<Snapshot> {
        if self.exists() {
            info!(path = %self.path.display(), "Store already initialised");
            return self.load();
        }
        let snapshot = Snapshot::new(created_at);
        self.save(&snapshot)?;
        info!(path = %self.path.display(), "Initialised empty store");
        Ok(snapshot)
    }

    fn load(&self) -> Result<Snapshot> {
        if !self.exists() {
            return Err(CadenceError::StoreNotInitialized {
                path: self.path.clone(),
            });
        }
        let content = std::fs::read_to_string(&self.path)?;
        let snapshot: Snapshot = serde_json::from_str(&content)?;
        debug!(
            path = %self.path.display(),
            cohorts = snapshot.cohorts.len(),
            touchpoints = snapshot.touchpoints.len(),
            "Loaded snapshot"
        );
        Ok(snapshot)
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(snapshot)?;
        std::fs::write(&self.path, json)?;
        debug!(
            path = %self.path.display(),
            cohorts = snapshot.cohorts.len(),
            touchpoints = snapshot.touchpoints.len(),
            "Saved snapshot"
        );
        Ok(())
    }
}
