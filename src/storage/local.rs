//! Local filesystem ledger.
//!
//! Keeps the seen set in memory and rewrites the JSON file atomically
//! (temp file, then rename) whenever a new key is stored.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::storage::LedgerStore;

/// On-disk ledger format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerFile {
    /// ISO 8601 timestamp of last update
    pub updated_at: DateTime<Utc>,
    pub count: usize,
    /// Sorted link keys
    pub links: Vec<String>,
}

impl LedgerFile {
    pub fn new(seen: &HashSet<String>) -> Self {
        let mut links: Vec<String> = seen.iter().cloned().collect();
        links.sort();
        Self {
            updated_at: Utc::now(),
            count: links.len(),
            links,
        }
    }
}

/// File-backed ledger.
#[derive(Debug)]
pub struct LocalLedger {
    path: PathBuf,
    seen: Mutex<HashSet<String>>,
}

impl LocalLedger {
    /// Open the ledger at `path`, loading existing keys. A missing file starts empty.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let seen = match Self::read(&path).await? {
            Some(file) => file.links.into_iter().collect(),
            None => HashSet::new(),
        };
        Ok(Self {
            path,
            seen: Mutex::new(seen),
        })
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.seen.lock().await.len()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(path: &Path) -> Result<Option<LedgerFile>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write(&self, seen: &HashSet<String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let bytes = serde_json::to_vec_pretty(&LedgerFile::new(seen))?;
        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for LocalLedger {
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.seen.lock().await.contains(key))
    }

    async fn store(&self, key: &str) -> Result<()> {
        let mut seen = self.seen.lock().await;
        if seen.insert(key.to_string()) {
            if let Err(e) = self.write(&seen).await {
                // Keep memory and disk in step: a key that failed to persist is not stored.
                seen.remove(key);
                return Err(e);
            }
            log::debug!("Ledger: stored {} ({} total)", key, seen.len());
        }
        Ok(())
    }
}
