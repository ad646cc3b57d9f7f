//! Master-key lifecycle: lazy generation, persistence, and retrieval.
//!
//! The key registry lives in its own file, a namespace fully separate from
//! the preference snapshot. One `KeyManager` is created at process start and
//! held for the process lifetime; there is no ambient/global key cache.

use crate::error::{StoreError, StoreResult};
use prefvault_backend::DataFile;
use prefvault_crypto::MasterKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::debug;

/// Fixed alias the install key is persisted under.
pub const MASTER_KEY_ALIAS: &str = "master";

/// Persisted key registry: alias -> base64-encoded key bytes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct KeyRegistry {
    #[serde(default)]
    keys: HashMap<String, String>,
}

/// Owns the single symmetric master key for this install.
///
/// The key is created lazily on first use and never rotated or deleted.
pub struct KeyManager {
    registry: DataFile<KeyRegistry>,
    /// Guards the whole check-then-act creation path. Concurrent first-time
    /// callers queue here, so exactly one key is ever materialized per
    /// install; afterwards it doubles as the in-process key cache.
    cached: Mutex<Option<MasterKey>>,
}

impl KeyManager {
    /// Opens the key registry at `path` (created on first write).
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let registry = DataFile::open(path).await?;
        Ok(Self {
            registry,
            cached: Mutex::new(None),
        })
    }

    /// Returns the install's master key, generating and persisting it on
    /// first use.
    ///
    /// Subsequent calls — in this process or after a restart — return
    /// bit-identical key material. Fails with [`StoreError::KeyProvider`]
    /// when the CSPRNG is unavailable or the persisted encoding cannot be
    /// decoded.
    pub async fn get_or_create_key(&self) -> StoreResult<MasterKey> {
        let mut cached = self.cached.lock().await;
        if let Some(key) = cached.as_ref() {
            return Ok(key.clone());
        }

        let persisted = self
            .registry
            .read(|r| r.keys.get(MASTER_KEY_ALIAS).cloned())
            .await;

        let key = match persisted {
            Some(encoded) => MasterKey::from_base64(&encoded)?,
            None => {
                let key = MasterKey::generate()?;
                let encoded = key.to_base64();
                self.registry
                    .update(|r| {
                        r.keys.insert(MASTER_KEY_ALIAS.to_string(), encoded);
                    })
                    .await
                    .map_err(|e| StoreError::KeyProvider(format!("key persistence failed: {e}")))?;
                debug!("generated and persisted new master key");
                key
            }
        };

        *cached = Some(key.clone());
        Ok(key)
    }
}
