//! File mirror of the catalog
//!
//! The snapshot is a plain JSON array of `{"id", "title"}` objects. It is a
//! cache, not a source of truth: anything unreadable is treated as absent.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};

use crate::parser::CatalogEntry;

/// Errors writing a snapshot
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("failed to write snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Reads and writes the catalog snapshot file
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot, or `None` when it is missing or unreadable
    pub async fn load(&self) -> Option<Vec<CatalogEntry>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No catalog snapshot at {}", self.path.display());
                return None;
            }
            Err(e) => {
                warn!("Failed to read catalog snapshot {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(entries) => Some(entries),
            Err(e) => {
                warn!("Ignoring corrupt catalog snapshot {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Overwrite the snapshot with `entries`
    pub async fn save(&self, entries: &[CatalogEntry]) -> Result<(), SnapshotError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_vec(entries)?;
        fs::write(&self.path, json).await?;
        debug!("Wrote {} entries to {}", entries.len(), self.path.display());
        Ok(())
    }
}
