//! Encryption layer for PrefVault.
//!
//! Provides the master-key type and the AEAD envelope codec used to protect
//! string preferences at rest:
//! - AES-256-GCM for authenticated encryption (12-byte nonce, 16-byte tag)
//! - OS CSPRNG for key and nonce generation
//! - Secure key handling with zeroization
//!
//! # Envelope layout
//!
//! Every encrypted value is a self-contained byte sequence:
//!
//! ```text
//! nonce (12 bytes) || ciphertext || tag (16 bytes)
//! ```
//!
//! A fresh random nonce is drawn per encryption, so encrypting the same
//! plaintext twice produces two different envelopes. GCM is a stream mode:
//! no padding, envelope length = plaintext length + 28.

mod cipher;
mod error;
mod key;

pub use cipher::{open, seal, NONCE_SIZE, TAG_SIZE};
pub use error::{CryptoError, CryptoResult};
pub use key::{MasterKey, KEY_SIZE};
