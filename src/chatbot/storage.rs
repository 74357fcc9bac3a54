//! Backing storage for the flat JSON stores.
//!
//! Stores hand whole documents to a [`Storage`] and rewrite them on every
//! mutation. [`FileStorage`] is what the bot runs with; [`MemoryStorage`]
//! keeps the document in process.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

#[derive(Debug)]
pub enum StorageError {
    Read(String),
    Write(String),
    Serialize(String),
    Parse(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(e) => write!(f, "failed to read: {e}"),
            Self::Write(e) => write!(f, "failed to write: {e}"),
            Self::Serialize(e) => write!(f, "failed to serialize: {e}"),
            Self::Parse(e) => write!(f, "failed to parse: {e}"),
        }
    }
}

impl std::error::Error for StorageError {}

pub trait Storage: Send + Sync {
    /// The persisted document, or `None` if nothing was written yet.
    fn read(&self) -> Result<Option<String>, StorageError>;

    /// Replace the persisted document.
    fn write(&self, contents: &str) -> Result<(), StorageError>;

    /// Human-readable location for logs.
    fn location(&self) -> String;
}

impl<S: Storage + ?Sized> Storage for Arc<S> {
    fn read(&self) -> Result<Option<String>, StorageError> {
        (**self).read()
    }

    fn write(&self, contents: &str) -> Result<(), StorageError> {
        (**self).write(contents)
    }

    fn location(&self) -> String {
        (**self).location()
    }
}

/// A JSON document on local disk.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Storage for FileStorage {
    fn read(&self) -> Result<Option<String>, StorageError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| StorageError::Read(format!("{}: {e}", self.path.display())))?;
        // An empty file counts as "nothing written yet"
        if contents.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(contents))
    }

    fn write(&self, contents: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::Write(format!("{}: {e}", parent.display())))?;
        }
        std::fs::write(&self.path, contents)
            .map_err(|e| StorageError::Write(format!("{}: {e}", self.path.display())))
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// A document held in memory. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStorage {
    contents: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with_contents(contents: &str) -> Self {
        Self {
            contents: Mutex::new(Some(contents.to_string())),
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.contents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Storage for MemoryStorage {
    fn read(&self) -> Result<Option<String>, StorageError> {
        Ok(self.contents())
    }

    fn write(&self, contents: &str) -> Result<(), StorageError> {
        *self
            .contents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(contents.to_string());
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

/// Decode the stored document, if any.
pub fn read_json<T: DeserializeOwned>(storage: &dyn Storage) -> Result<Option<T>, StorageError> {
    match storage.read()? {
        Some(contents) => serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| StorageError::Parse(e.to_string())),
        None => Ok(None),
    }
}

/// Load a document at startup. Any failure is logged and yields the default.
pub fn load_or_default<T: DeserializeOwned + Default>(storage: &dyn Storage, what: &str) -> T {
    match read_json(storage) {
        Ok(Some(value)) => {
            info!("Loaded {what} from {}", storage.location());
            value
        }
        Ok(None) => {
            info!("No {what} at {}, starting fresh", storage.location());
            T::default()
        }
        Err(e) => {
            warn!("Failed to load {what} from {}: {e}", storage.location());
            T::default()
        }
    }
}

/// Serialize and rewrite the whole document.
pub fn save_json<T: Serialize + ?Sized>(storage: &dyn Storage, value: &T) -> Result<(), StorageError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| StorageError::Serialize(e.to_string()))?;
    storage.write(&json)
}
