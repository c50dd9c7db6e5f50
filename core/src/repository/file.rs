use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::repository::traits::{InvalidKey, QuotaExceeded, Storage, StorageError};

const DEFAULT_DIR_NAME: &str = ".focus";
const FILE_EXTENSION: &str = "json";

/// Per-value ceiling, in line with what browsers grant local storage.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// `~/.focus`
pub fn default_dir() -> Result<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| anyhow!("Could not determine home directory"))?;
    Ok(home_dir.join(DEFAULT_DIR_NAME))
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Clone, Debug)]
pub struct FileStorage {
    dir: PathBuf,
    quota: Option<usize>,
}

impl FileStorage {
    pub fn new(base_dir: Option<PathBuf>) -> Result<Self> {
        let dir = match base_dir {
            Some(dir) => dir,
            None => default_dir()?,
        };
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;

        info!(dir = %dir.display(), "opened file storage");

        Ok(FileStorage {
            dir,
            quota: Some(DEFAULT_QUOTA_BYTES),
        })
    }

    /// `None` lifts the ceiling entirely.
    pub fn with_quota(mut self, quota: Option<usize>) -> Self {
        self.quota = quota;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, InvalidKey> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && !key.contains(['/', '\\'])
            && !key.contains('\0');
        if !valid {
            return Err(InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.{FILE_EXTENSION}")))
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key).map_err(|e| StorageError::read(key, e))?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(file = %path.display(), "no stored value");
                Ok(None)
            }
            Err(err) => Err(StorageError::read(key, err)),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key).map_err(|e| StorageError::write(key, e))?;

        if let Some(quota) = self.quota {
            if value.len() > quota {
                return Err(StorageError::write(
                    key,
                    QuotaExceeded {
                        needed: value.len(),
                        quota,
                    },
                ));
            }
        }

        let mut temp = NamedTempFile::new_in(&self.dir).map_err(|e| StorageError::write(key, e))?;
        temp.write_all(value.as_bytes())
            .and_then(|_| temp.flush())
            .map_err(|e| StorageError::write(key, e))?;
        temp.persist(&path)
            .map_err(|e| StorageError::write(key, e.error))?;

        debug!(file = %path.display(), bytes = value.len(), "wrote stored value");
        Ok(())
    }
}
