//! Local file storage for uploaded documents
//!
//! Files live flat under one directory as `<uuid>-<sanitized original name>`.
//! Stored names are generated here and never taken from the client as-is.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, error, warn};

use crate::utils::errors::{AscesaError, Result};
use crate::utils::helpers::{generate_uuid, sanitize_filename};

#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the storage directory if missing
    pub async fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    fn path_for(&self, stored_name: &str) -> Result<PathBuf> {
        // Stored names are always produced by `save`; anything with a path
        // component did not come from here.
        if stored_name.is_empty() || sanitize_filename(stored_name) != stored_name {
            return Err(AscesaError::InvalidInput("Invalid stored file name".to_string()));
        }
        Ok(self.root.join(stored_name))
    }

    /// Write bytes under a fresh unique name and return that name
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String> {
        self.ensure_root().await?;

        let stored_name = format!("{}-{}", generate_uuid(), sanitize_filename(original_name));
        let path = self.path_for(&stored_name)?;
        fs::write(&path, bytes).await?;

        debug!(stored_name = %stored_name, size = bytes.len(), "Stored uploaded file");
        Ok(stored_name)
    }

    pub async fn read(&self, stored_name: &str) -> Result<Vec<u8>> {
        let path = self.path_for(stored_name)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AscesaError::NotFound("File".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a stored file; a file that is already gone is not an error
    pub async fn delete(&self, stored_name: &str) -> Result<()> {
        let path = self.path_for(stored_name)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(stored_name = %stored_name, "Stored file already missing");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a file on a cleanup path; failures are logged and reported as `false`
    pub async fn discard(&self, stored_name: &str) -> bool {
        match self.delete(stored_name).await {
            Ok(()) => true,
            Err(e) => {
                error!(stored_name = %stored_name, error = %e, "Failed to remove stored file");
                false
            }
        }
    }

    /// Discard several files and return how many are gone
    pub async fn discard_all(&self, stored_names: &[String]) -> usize {
        let mut removed = 0;
        for stored_name in stored_names {
            if self.discard(stored_name).await {
                removed += 1;
            }
        }
        removed
    }
}
