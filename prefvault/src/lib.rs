//! Encrypted local preference store.
//!
//! Persists small typed values (strings, booleans, integers, doubles) across
//! process restarts, encrypting string values at rest under a symmetric
//! master key generated once per install.
//!
//! # Architecture
//!
//! - [`KeyManager`] owns the install's single AES-256 master key: lazy
//!   generation behind a single-flight guard, persistence in a dedicated
//!   key-registry file, bit-identical retrieval across restarts.
//! - `prefvault-crypto` seals string values into `nonce || ciphertext || tag`
//!   envelopes (AES-256-GCM).
//! - [`PreferenceStore`] is the typed contract: async get/set per value
//!   domain plus an observable boolean. Getters never fail — reads degrade
//!   to domain defaults (`""`, `false`, `0`, `0.0`) or the
//!   [`DECRYPT_FAILED_SENTINEL`], with the underlying cause logged via
//!   `tracing`.
//!
//! Only strings are encrypted; the other scalar domains are stored in clear
//! form. See [`StoreOptions`] for why that asymmetry is deliberate.

mod error;
mod key_manager;
mod store;

pub use error::{StoreError, StoreResult};
pub use key_manager::{KeyManager, MASTER_KEY_ALIAS};
pub use store::{
    BooleanWatch, PreferenceStore, StoreOptions, DECRYPT_FAILED_SENTINEL, KEYRING_FILE, PREFS_FILE,
};
