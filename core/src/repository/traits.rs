use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Key-value persistence in the shape of browser local storage: one string
/// value per key, replaced wholesale on every write.
pub trait Storage {
    /// `Ok(None)` when nothing has been stored under `key` yet.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<S: Storage + ?Sized> Storage for &S {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read '{key}' from storage")]
    ReadFailure {
        key: String,
        #[source]
        source: BoxError,
    },
    #[error("failed to write '{key}' to storage")]
    WriteFailure {
        key: String,
        #[source]
        source: BoxError,
    },
}

impl StorageError {
    pub fn read(key: &str, source: impl Into<BoxError>) -> Self {
        StorageError::ReadFailure {
            key: key.to_string(),
            source: source.into(),
        }
    }

    pub fn write(key: &str, source: impl Into<BoxError>) -> Self {
        StorageError::WriteFailure {
            key: key.to_string(),
            source: source.into(),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            StorageError::ReadFailure { key, .. } | StorageError::WriteFailure { key, .. } => key,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("storage quota exceeded: {needed} bytes needed, {quota} allowed")]
pub struct QuotaExceeded {
    pub needed: usize,
    pub quota: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid storage key '{0}'")]
pub struct InvalidKey(pub String);
