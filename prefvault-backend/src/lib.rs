//! File-backed persistence for PrefVault.
//!
//! Each logical preference namespace lives in its own JSON file wrapped in a
//! [`DataFile`]. A `DataFile` keeps the current snapshot in memory behind a
//! `tokio::sync::Mutex` and funnels every write through a transaction that
//! sees the full snapshot and replaces it atomically on disk.
//!
//! Guarantees:
//! - read-modify-write is atomic and serialized **per file** (the lock is
//!   held from the update closure through the rename)
//! - the on-disk file is replaced via temp file + rename, so a crash
//!   mid-write leaves the previous contents intact
//! - a transaction commits all-or-nothing: a failed persist leaves the
//!   in-memory snapshot at its previous value
//! - there are no cross-file transactions

mod error;

pub use error::{BackendError, BackendResult};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// A single JSON-persisted snapshot with serialized transactions.
pub struct DataFile<T> {
    path: PathBuf,
    state: Mutex<T>,
}

impl<T> DataFile<T>
where
    T: Serialize + DeserializeOwned + Default + Clone,
{
    /// Opens the file at `path`, loading the existing snapshot if present.
    ///
    /// A missing file starts from `T::default()`; unreadable or corrupt
    /// contents are an error. Parent directories are created as needed.
    pub async fn open(path: impl Into<PathBuf>) -> BackendResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let state = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == ErrorKind::NotFound => T::default(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// Runs a read-only closure against the current snapshot.
    pub async fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        let state = self.state.lock().await;
        f(&state)
    }

    /// Runs a write transaction: `f` mutates the full snapshot, which is then
    /// persisted atomically. The lock is held until the rename completes, so
    /// concurrent transactions on the same file are serialized.
    ///
    /// `f` runs against a candidate copy that is swapped in only after the
    /// rename succeeds; a failed transaction leaves both the in-memory
    /// snapshot and the file unchanged.
    pub async fn update<F, R>(&self, f: F) -> BackendResult<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        let mut state = self.state.lock().await;
        let mut candidate = state.clone();
        let result = f(&mut candidate);
        self.persist(&candidate).await?;
        *state = candidate;
        Ok(result)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomic replace: write a sibling temp file, fsync, rename over the
    /// target.
    async fn persist(&self, state: &T) -> BackendResult<()> {
        let bytes = serde_json::to_vec(state)?;
        let tmp_path = self.path.with_extension("tmp");

        let mut file = tokio::fs::File::create(&tmp_path).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}
