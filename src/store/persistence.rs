use std::{
    future::Future,
    io::ErrorKind,
    ops::Deref,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use fs4::tokio::AsyncFileExt;
use tokio::fs::File;
use tracing::{debug, info};

use crate::fs::operations::{replace_atomically, sibling_path};

use super::activity_store::Store;

/// Load/save contract of the durable document.
pub trait StoreRepository {
    /// Reads the whole document. A missing document is a fresh [Store], a malformed one is an
    /// error.
    fn load(&self) -> impl Future<Output = Result<Store>>;

    /// Replaces the whole document.
    fn save(&self, store: &Store) -> impl Future<Output = Result<()>>;
}

impl<T: Deref> StoreRepository for T
where
    T::Target: StoreRepository,
{
    fn load(&self) -> impl Future<Output = Result<Store>> {
        self.deref().load()
    }

    fn save(&self, store: &Store) -> impl Future<Output = Result<()>> {
        self.deref().save(store)
    }
}

/// JSON document on disk. Saves are atomic replacements guarded by an advisory `.lock` file, so
/// two writers never interleave on the temp file. It doesn't prevent lost updates: whoever
/// saves last wins.
pub struct JsonStoreFile {
    path: PathBuf,
}

impl JsonStoreFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn open_lock(&self) -> Result<File> {
        let lock_path = sibling_path(&self.path, ".lock");
        File::options()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .await
            .with_context(|| format!("Failed to open lock file {lock_path:?}"))
    }
}

impl StoreRepository for JsonStoreFile {
    async fn load(&self) -> Result<Store> {
        debug!("Loading store from {:?}", self.path);
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No store at {:?}, starting fresh", self.path);
                return Ok(Store::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read store {:?}", self.path))
            }
        };
        serde_json::from_slice(&bytes).with_context(|| format!("Malformed store {:?}", self.path))
    }

    async fn save(&self, store: &Store) -> Result<()> {
        let contents = serde_json::to_vec_pretty(store)?;

        let lock = self.open_lock().await?;
        lock.lock_exclusive()?;
        let result = replace_atomically(&self.path, &contents)
            .await
            .with_context(|| format!("Failed to save store {:?}", self.path));
        lock.unlock_async().await?;

        debug!("Saved store to {:?}", self.path);
        result
    }
}
