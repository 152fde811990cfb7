//! Injected key-value cache used by the token broker
//!
//! The broker only reads and writes through this seam; the embedding owns
//! the cache lifetime and scopes it to the current user session.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::fs;

/// Key-value cache seam. Storing `None` clears the key.
#[async_trait]
pub trait TokenCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;

    async fn store(&self, key: &str, value: Option<String>);
}

/// Session-scoped in-memory cache.
#[derive(Default)]
pub struct MemoryTokenCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryTokenCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenCache for MemoryTokenCache {
    async fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    async fn store(&self, key: &str, value: Option<String>) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match value {
            Some(value) => {
                entries.insert(key.to_string(), value);
            }
            None => {
                entries.remove(key);
            }
        }
    }
}

/// File-backed cache, one file per key under a base directory.
#[derive(Clone)]
pub struct FileTokenCache {
    base_path: PathBuf,
}

impl FileTokenCache {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", key))
    }
}

#[async_trait]
impl TokenCache for FileTokenCache {
    async fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.entry_path(key)).await.ok()
    }

    async fn store(&self, key: &str, value: Option<String>) {
        let path = self.entry_path(key);
        match value {
            Some(value) => {
                if fs::create_dir_all(&self.base_path).await.is_ok() {
                    if let Err(e) = fs::write(&path, value).await {
                        log::warn!("failed to write token cache entry: {e}");
                    }
                }
            }
            None => {
                let _ = fs::remove_file(&path).await;
            }
        }
    }
}
