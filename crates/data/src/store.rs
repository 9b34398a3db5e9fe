//! Touch-history stores.
//!
//! `JsonTouchStore` is the durable, file-backed store used in production:
//! a single JSON object mapping `"{instrument}_{strike}"` keys to touch
//! records, flushed atomically via a temp file and rename so a crash never
//! leaves a half-written history. `MemoryTouchStore` backs tests and the
//! fallback path when the file store is unreadable.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use heatseeker_core::{TouchRecord, TouchStore};

use crate::error::StoreError;

/// File-backed JSON key-value store for touch history.
pub struct JsonTouchStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, TouchRecord>>,
}

impl JsonTouchStore {
    /// Creates a store backed by the given file path. The file is not
    /// touched until `load_all` or `flush` is called.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

#[async_trait]
impl TouchStore for JsonTouchStore {
    async fn load_all(&self) -> Result<HashMap<String, TouchRecord>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No touch history file, starting empty");
                return Ok(HashMap::new());
            }
            Err(e) => return Err(self.io_err(e).into()),
        };

        let loaded: HashMap<String, TouchRecord> =
            serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
                path: self.path.display().to_string(),
                source,
            })?;

        let mut entries = self.entries.lock().await;
        *entries = loaded.clone();
        Ok(loaded)
    }

    async fn put(&self, key: &str, record: &TouchRecord) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), record.clone());
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        let entries = self.entries.lock().await;
        let json = serde_json::to_vec_pretty(&*entries)
            .context("Failed to serialize touch history")?;
        drop(entries);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| self.io_err(e))?;
            }
        }

        // Temp file + rename keeps the old history intact if we crash mid-write.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| self.io_err(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_err(e))?;

        Ok(())
    }
}

/// In-memory store for tests and store-failure fallback.
#[derive(Default)]
pub struct MemoryTouchStore {
    entries: Mutex<HashMap<String, TouchRecord>>,
}

impl MemoryTouchStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TouchStore for MemoryTouchStore {
    async fn load_all(&self) -> Result<HashMap<String, TouchRecord>> {
        Ok(self.entries.lock().await.clone())
    }

    async fn put(&self, key: &str, record: &TouchRecord) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), record.clone());
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}
