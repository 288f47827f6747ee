//! File-backed profile store.
//!
//! Holds one [`StoredProfile`] per identifier. The whole map lives in memory
//! and is rewritten to disk on every [`ProfileStore::put`]; reads are served
//! from memory and never touch the filesystem.

pub mod error;

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::sync::RwLock;
use trailscrape_core::StoredProfile;

pub use error::StoreError;

type ProfileMap = BTreeMap<String, StoredProfile>;

#[derive(Debug)]
pub struct ProfileStore {
    path: PathBuf,
    entries: RwLock<ProfileMap>,
}

impl ProfileStore {
    /// Opens the store at `path`, loading any existing entries.
    ///
    /// A missing or zero-length file yields an empty store; the file is only
    /// created on the first [`put`](Self::put).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file exists but cannot be read, or
    /// [`StoreError::Corrupt`] if its contents are not a profile map.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => ProfileMap::new(),
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
                    path: path.clone(),
                    source,
                })?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => ProfileMap::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        tracing::debug!(path = %path.display(), entries = entries.len(), "profile store opened");
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the most recent record for `id`, if it was ever refreshed.
    pub async fn get(&self, id: &str) -> Option<StoredProfile> {
        self.entries.read().await.get(id).cloned()
    }

    /// Inserts or replaces the entry for `id` and persists the whole map.
    ///
    /// The entry is replaced wholesale, never merged with the previous one.
    /// The write lock is held until the file is on disk, so concurrent puts
    /// reach the file in the order they took the lock.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the map cannot be serialized or written. The
    /// in-memory entry is updated even when persisting fails.
    pub async fn put(&self, id: &str, profile: StoredProfile) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.insert(id.to_owned(), profile);
        self.persist(&entries).await
    }

    /// Deletes the store file and drops every entry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file exists but cannot be removed.
    pub async fn wipe(&self) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.clear();
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// All identifiers with a stored entry, in lexical order.
    pub async fn ids(&self) -> Vec<String> {
        self.entries.read().await.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Writes `entries` to a sibling temp file and renames it over the store
    /// file, so readers of the file never observe a half-written map.
    async fn persist(&self, entries: &ProfileMap) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(entries)?;
        let tmp = self.tmp_path();

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|source| StoreError::Io {
                path: tmp.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|source| StoreError::Io {
                path: self.path.clone(),
                source,
            })
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map_or_else(|| OsString::from("store.json"), ToOwned::to_owned);
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
