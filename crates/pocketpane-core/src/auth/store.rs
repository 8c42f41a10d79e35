use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use super::Credential;
use crate::config;

/// Credential file name in the config directory
pub const CREDENTIAL_FILE: &str = "pocket.data";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Could not find config directory")]
    NoConfigDir,

    #[error("Could not access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed credential file {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not serialize credential: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl StoreError {
    /// True when no credential file has been written yet
    pub fn is_missing(&self) -> bool {
        matches!(self, StoreError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

/// Reads and writes the single persisted Pocket credential.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<config_dir>/pocketpane/pocket.data`
    pub fn in_config_dir() -> Result<Self, StoreError> {
        let dir = config::app_config_dir().ok_or(StoreError::NoConfigDir)?;
        Ok(Self::new(dir.join(CREDENTIAL_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the credential. Missing and malformed files are both errors;
    /// callers treat either as "no credential yet".
    pub fn load(&self) -> Result<Credential, StoreError> {
        let contents = std::fs::read_to_string(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;

        serde_json::from_str(&contents).map_err(|source| StoreError::Malformed {
            path: self.path.clone(),
            source,
        })
    }

    /// Overwrite the credential file. The parent directory must already exist.
    pub fn save(&self, credential: &Credential) -> Result<(), StoreError> {
        let contents = serde_json::to_string_pretty(credential).map_err(StoreError::Serialize)?;
        std::fs::write(&self.path, contents).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), "Credential saved");
        Ok(())
    }
}
