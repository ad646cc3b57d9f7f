//! Typed preference store with at-rest encryption for string values.
//!
//! Four disjoint value domains — string, boolean, integer, double — each
//! keyed independently in its own namespace of the snapshot file. Strings
//! are sealed through the AEAD codec before persisting; the other scalar
//! domains are stored in clear form (see [`StoreOptions`]).
//!
//! Read failures never propagate to callers: getters degrade to the domain
//! default or the [`DECRYPT_FAILED_SENTINEL`] and report the underlying
//! error through `tracing::warn!`.

use crate::error::StoreResult;
use crate::key_manager::KeyManager;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use prefvault_backend::DataFile;
use prefvault_crypto::{open, seal};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

/// Returned by `get_string` when a stored envelope cannot be decrypted
/// (tampered data, truncation, or a foreign key). Kept as a literal string
/// for compatibility with existing callers.
pub const DECRYPT_FAILED_SENTINEL: &str = "error";

/// Preference snapshot file name inside the store directory.
pub const PREFS_FILE: &str = "prefs.json";

/// Key registry file name inside the store directory.
pub const KEYRING_FILE: &str = "keyring.json";

/// On-disk snapshot: one map per value domain.
///
/// Domains are disjoint namespaces — the same key can exist in several of
/// them without colliding — and none of them overlaps the key registry,
/// which lives in a separate file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PrefsSnapshot {
    /// key -> base64 AEAD envelope (or raw value when encryption is off)
    #[serde(default)]
    strings: HashMap<String, String>,
    #[serde(default)]
    booleans: HashMap<String, bool>,
    #[serde(default)]
    integers: HashMap<String, i64>,
    #[serde(default)]
    doubles: HashMap<String, f64>,
}

/// Per-namespace encryption policy.
///
/// Only the string domain carries sensitive free-form data (emails, tokens,
/// names), so only strings are encrypted by default. Booleans, integers and
/// doubles are always stored in clear form; that asymmetry is a deliberate,
/// documented choice, not an oversight. The flag must stay stable for the
/// lifetime of a given store directory.
#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
    pub encrypt_strings: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            encrypt_strings: true,
        }
    }
}

/// Encrypted typed preference store.
///
/// All operations are async I/O against the snapshot file; the backend
/// serializes read-modify-write per file. Create one store per directory
/// and share it via `Arc`.
pub struct PreferenceStore {
    prefs: DataFile<PrefsSnapshot>,
    keys: Arc<KeyManager>,
    options: StoreOptions,
    /// One watch channel per observed boolean key, created lazily.
    watchers: Mutex<HashMap<String, watch::Sender<bool>>>,
}

impl PreferenceStore {
    /// Opens (or creates) a store in `dir` with the default policy.
    pub async fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open_with_options(dir, StoreOptions::default()).await
    }

    /// Opens a store with an explicit encryption policy.
    pub async fn open_with_options(
        dir: impl AsRef<Path>,
        options: StoreOptions,
    ) -> StoreResult<Self> {
        let dir = dir.as_ref();
        let keys = Arc::new(KeyManager::open(dir.join(KEYRING_FILE)).await?);
        Self::open_with_key_manager(dir, keys, options).await
    }

    /// Opens a store sharing an externally owned [`KeyManager`].
    pub async fn open_with_key_manager(
        dir: impl AsRef<Path>,
        keys: Arc<KeyManager>,
        options: StoreOptions,
    ) -> StoreResult<Self> {
        let dir = dir.as_ref();
        let prefs = DataFile::open(dir.join(PREFS_FILE)).await?;
        debug!(dir = %dir.display(), encrypt_strings = options.encrypt_strings, "opened preference store");
        Ok(Self {
            prefs,
            keys,
            options,
            watchers: Mutex::new(HashMap::new()),
        })
    }

    // ------------------------------------------------------------------
    // String domain (encrypted at rest)
    // ------------------------------------------------------------------

    /// Encrypts `value` and persists the envelope under `key`.
    pub async fn set_string(&self, key: &str, value: &str) -> StoreResult<()> {
        let stored = if self.options.encrypt_strings {
            let master = self.keys.get_or_create_key().await?;
            let envelope = seal(&master, value.as_bytes())?;
            STANDARD.encode(envelope)
        } else {
            value.to_string()
        };

        self.prefs
            .update(|s| {
                s.strings.insert(key.to_string(), stored);
            })
            .await?;
        Ok(())
    }

    /// Returns the decrypted value for `key`.
    ///
    /// Absent keys yield `""`. A stored value that fails to decode or
    /// decrypt yields the literal [`DECRYPT_FAILED_SENTINEL`] instead of an
    /// error; the cause is logged.
    pub async fn get_string(&self, key: &str) -> String {
        let stored = self.prefs.read(|s| s.strings.get(key).cloned()).await;
        let Some(stored) = stored else {
            return String::new();
        };

        if !self.options.encrypt_strings {
            return stored;
        }

        match self.decrypt_stored(&stored).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "string preference unreadable, returning sentinel");
                DECRYPT_FAILED_SENTINEL.to_string()
            }
        }
    }

    async fn decrypt_stored(&self, stored: &str) -> StoreResult<String> {
        let envelope = STANDARD
            .decode(stored)
            .map_err(|e| crate::StoreError::Decryption(format!("envelope base64 decode: {e}")))?;
        let master = self.keys.get_or_create_key().await?;
        let plaintext = open(&master, &envelope)?;
        String::from_utf8(plaintext)
            .map_err(|e| crate::StoreError::Decryption(format!("plaintext not UTF-8: {e}")))
    }

    // ------------------------------------------------------------------
    // Boolean domain (clear form, observable)
    // ------------------------------------------------------------------

    /// Persists `value` under `key` and notifies any watchers.
    pub async fn set_boolean(&self, key: &str, value: bool) -> StoreResult<()> {
        self.prefs
            .update(|s| {
                s.booleans.insert(key.to_string(), value);
            })
            .await?;

        // Notify after the write is durable, so watchers never observe a
        // value that a crash could roll back.
        let watchers = self.watchers.lock().await;
        if let Some(sender) = watchers.get(key) {
            sender.send_replace(value);
        }
        Ok(())
    }

    /// Returns the stored boolean; absent keys yield `false`.
    pub async fn get_boolean(&self, key: &str) -> bool {
        self.prefs
            .read(|s| s.booleans.get(key).copied())
            .await
            .unwrap_or(false)
    }

    /// Observes `key` as a lazy, infinite, restartable sequence.
    ///
    /// The returned watch yields the current value immediately, then a value
    /// for every subsequent `set_boolean` on that key.
    pub async fn observe_boolean(&self, key: &str) -> BooleanWatch {
        let mut watchers = self.watchers.lock().await;

        // Channels nobody listens to anymore are re-seeded from the durable
        // value on the next observe, so they can be dropped here.
        watchers.retain(|_, sender| sender.receiver_count() > 0);

        let rx = match watchers.entry(key.to_string()) {
            Entry::Occupied(entry) => entry.get().subscribe(),
            Entry::Vacant(entry) => {
                // Seed while holding the watchers lock: a concurrent
                // set_boolean either commits before this read and is seen
                // here, or takes the lock afterwards and notifies the sender
                // inserted below. Seeding outside the lock would let a write
                // land unseen in between.
                let current = self
                    .prefs
                    .read(|s| s.booleans.get(key).copied())
                    .await
                    .unwrap_or(false);
                entry.insert(watch::channel(current).0).subscribe()
            }
        };

        BooleanWatch { rx, primed: false }
    }

    // ------------------------------------------------------------------
    // Integer domain (clear form)
    // ------------------------------------------------------------------

    pub async fn set_integer(&self, key: &str, value: i64) -> StoreResult<()> {
        self.prefs
            .update(|s| {
                s.integers.insert(key.to_string(), value);
            })
            .await?;
        Ok(())
    }

    /// Returns the stored integer; absent keys yield `0`.
    pub async fn get_integer(&self, key: &str) -> i64 {
        self.prefs
            .read(|s| s.integers.get(key).copied())
            .await
            .unwrap_or(0)
    }

    // ------------------------------------------------------------------
    // Double domain (clear form)
    // ------------------------------------------------------------------

    pub async fn set_double(&self, key: &str, value: f64) -> StoreResult<()> {
        self.prefs
            .update(|s| {
                s.doubles.insert(key.to_string(), value);
            })
            .await?;
        Ok(())
    }

    /// Returns the stored double; absent keys yield `0.0`.
    pub async fn get_double(&self, key: &str) -> f64 {
        self.prefs
            .read(|s| s.doubles.get(key).copied())
            .await
            .unwrap_or(0.0)
    }
}

/// A live view of one boolean preference.
///
/// `next` resolves immediately with the value at subscription time, then
/// once per subsequent write to the key. Returns `None` only after the
/// owning store has been dropped. Each `observe_boolean` call yields an
/// independent, restartable watch.
pub struct BooleanWatch {
    rx: watch::Receiver<bool>,
    primed: bool,
}

impl BooleanWatch {
    pub async fn next(&mut self) -> Option<bool> {
        if !self.primed {
            self.primed = true;
            return Some(*self.rx.borrow_and_update());
        }
        match self.rx.changed().await {
            Ok(()) => Some(*self.rx.borrow_and_update()),
            Err(_) => None,
        }
    }
}
