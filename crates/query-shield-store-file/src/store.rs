// crates/query-shield-store-file/src/store.rs
// ============================================================================
// Module: File Shield Store
// Description: Durable PersistenceManager backed by a flat JSON file.
// Purpose: Persist shield snapshots with whole-file rewrites.
// Dependencies: query-shield-core, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! This module implements a durable [`PersistenceManager`] over one flat
//! file. Each save serializes the entire snapshot and rewrites the file in
//! place; each load reads the entire file back. An empty file reads as no
//! snapshot, so a freshly created store starts clean. Loads and saves both
//! enforce a size ceiling and fail closed. Storage inputs are untrusted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::fs::OpenOptions;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use query_shield_core::PersistError;
use query_shield_core::PersistenceManager;
use query_shield_core::ShieldState;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default maximum snapshot size accepted by the store.
pub const DEFAULT_MAX_STATE_BYTES: usize = 16 * 1024 * 1024;

// ============================================================================
// SECTION: Config
// ============================================================================

/// Configuration for the file shield store.
#[derive(Debug, Clone, Deserialize)]
pub struct FileStoreConfig {
    /// Path to the snapshot file.
    pub path: PathBuf,
    /// Whether each save forces the snapshot to stable storage.
    #[serde(default = "default_sync_writes")]
    pub sync_writes: bool,
    /// Maximum snapshot size in bytes for loads and saves.
    #[serde(default = "default_max_state_bytes")]
    pub max_state_bytes: usize,
}

/// Returns the default durability setting for saves.
const fn default_sync_writes() -> bool {
    true
}

/// Returns the default snapshot size ceiling.
const fn default_max_state_bytes() -> usize {
    DEFAULT_MAX_STATE_BYTES
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// File store errors.
#[derive(Debug, Error)]
pub enum FileStoreError {
    /// Store I/O error.
    #[error("file store io error: {0}")]
    Io(String),
    /// Store content could not be decoded.
    #[error("file store corruption: {0}")]
    Corrupt(String),
    /// Invalid store configuration or data.
    #[error("file store invalid data: {0}")]
    Invalid(String),
    /// Store payload exceeded configured size limits.
    #[error("file store payload too large: {actual_bytes} bytes (max {max_bytes})")]
    TooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual payload size in bytes.
        actual_bytes: usize,
    },
}

impl From<FileStoreError> for PersistError {
    fn from(error: FileStoreError) -> Self {
        match error {
            FileStoreError::Io(message) => Self::Io(message),
            FileStoreError::Corrupt(message) => Self::Corrupt(message),
            FileStoreError::Invalid(message) => Self::Invalid(message),
            FileStoreError::TooLarge {
                max_bytes,
                actual_bytes,
            } => Self::Invalid(format!(
                "snapshot exceeds size limit: {actual_bytes} bytes (max {max_bytes})"
            )),
        }
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// File-backed shield persistence with whole-file rewrites.
#[derive(Debug, Clone)]
pub struct FileShieldStore {
    /// Store configuration.
    config: FileStoreConfig,
    /// Shared snapshot file guarded by a mutex.
    file: Arc<Mutex<File>>,
}

impl FileShieldStore {
    /// Opens a file-backed shield store, creating the file when absent.
    ///
    /// # Errors
    ///
    /// Returns [`FileStoreError`] when the path fails validation or the file
    /// cannot be opened.
    pub fn new(config: FileStoreConfig) -> Result<Self, FileStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&config.path)
            .map_err(|err| FileStoreError::Io(err.to_string()))?;
        Ok(Self {
            config,
            file: Arc::new(Mutex::new(file)),
        })
    }
}

impl PersistenceManager for FileShieldStore {
    fn load(&self) -> Result<Option<ShieldState>, PersistError> {
        self.load_state().map_err(PersistError::from)
    }

    fn save(&self, state: &ShieldState) -> Result<(), PersistError> {
        self.save_state(state).map_err(PersistError::from)
    }
}

impl FileShieldStore {
    /// Loads the snapshot from the store file.
    fn load_state(&self) -> Result<Option<ShieldState>, FileStoreError> {
        let bytes = {
            let mut guard = self
                .file
                .lock()
                .map_err(|_| FileStoreError::Io("store mutex poisoned".to_string()))?;
            let length = guard
                .metadata()
                .map_err(|err| FileStoreError::Io(err.to_string()))?
                .len();
            if length == 0 {
                return Ok(None);
            }
            let length_usize = usize::try_from(length).map_err(|_| {
                FileStoreError::Invalid("snapshot length exceeds addressable memory".to_string())
            })?;
            if length_usize > self.config.max_state_bytes {
                return Err(FileStoreError::TooLarge {
                    max_bytes: self.config.max_state_bytes,
                    actual_bytes: length_usize,
                });
            }
            guard
                .seek(SeekFrom::Start(0))
                .map_err(|err| FileStoreError::Io(err.to_string()))?;
            let mut bytes = Vec::with_capacity(length_usize);
            guard
                .read_to_end(&mut bytes)
                .map_err(|err| FileStoreError::Io(err.to_string()))?;
            drop(guard);
            bytes
        };
        let state: ShieldState = serde_json::from_slice(&bytes)
            .map_err(|err| FileStoreError::Corrupt(err.to_string()))?;
        Ok(Some(state))
    }

    /// Saves the snapshot to the store file, replacing previous content.
    fn save_state(&self, state: &ShieldState) -> Result<(), FileStoreError> {
        let bytes =
            serde_json::to_vec(state).map_err(|err| FileStoreError::Invalid(err.to_string()))?;
        if bytes.len() > self.config.max_state_bytes {
            return Err(FileStoreError::TooLarge {
                max_bytes: self.config.max_state_bytes,
                actual_bytes: bytes.len(),
            });
        }
        {
            let mut guard = self
                .file
                .lock()
                .map_err(|_| FileStoreError::Io("store mutex poisoned".to_string()))?;
            guard
                .seek(SeekFrom::Start(0))
                .map_err(|err| FileStoreError::Io(err.to_string()))?;
            guard
                .set_len(0)
                .map_err(|err| FileStoreError::Io(err.to_string()))?;
            guard
                .write_all(&bytes)
                .map_err(|err| FileStoreError::Io(err.to_string()))?;
            guard
                .flush()
                .map_err(|err| FileStoreError::Io(err.to_string()))?;
            if self.config.sync_writes {
                guard
                    .sync_all()
                    .map_err(|err| FileStoreError::Io(err.to_string()))?;
            }
            drop(guard);
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), FileStoreError> {
    let Some(parent) = path.parent() else {
        return Err(FileStoreError::Io("store path missing parent directory".to_string()));
    };
    std::fs::create_dir_all(parent).map_err(|err| FileStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), FileStoreError> {
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(FileStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(FileStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.exists() && path.is_dir() {
        return Err(FileStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}
