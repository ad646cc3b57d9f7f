//! Master-key material: generation, encoding, and secure handling.

use crate::error::{CryptoError, CryptoResult};
use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::OsRng;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// AES-256 key size in bytes.
pub const KEY_SIZE: usize = 32;

/// 256-bit symmetric master key.
///
/// Generated once per install from the OS CSPRNG and persisted as base64.
/// Key bytes are zeroized on drop and never appear in `Debug` output.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey([u8; KEY_SIZE]);

impl MasterKey {
    /// Generates a fresh key from the OS secure random source.
    ///
    /// Fails with [`CryptoError::KeyProvider`] if the CSPRNG is unavailable.
    pub fn generate() -> CryptoResult<Self> {
        let mut bytes = [0u8; KEY_SIZE];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| CryptoError::KeyProvider(format!("secure random unavailable: {e}")))?;
        Ok(Self(bytes))
    }

    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// Encodes the key for persistence.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Reconstructs a key bit-for-bit from its persisted encoding.
    pub fn from_base64(encoded: &str) -> CryptoResult<Self> {
        let decoded = STANDARD
            .decode(encoded)
            .map_err(|e| CryptoError::Encoding(format!("base64 decode: {e}")))?;
        if decoded.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength {
                expected: KEY_SIZE,
                actual: decoded.len(),
            });
        }
        let mut bytes = [0u8; KEY_SIZE];
        bytes.copy_from_slice(&decoded);
        Ok(Self(bytes))
    }
}

impl PartialEq for MasterKey {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for MasterKey {}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKey(..)")
    }
}
