//! AES-256-GCM envelope codec.
//!
//! An envelope is `nonce (12) || ciphertext || tag (16)`, produced fresh per
//! call. The nonce comes from the OS CSPRNG; with 96 random bits the chance
//! of reuse over a key's lifetime is negligible.

use crate::error::{CryptoError, CryptoResult};
use crate::key::MasterKey;
use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};

/// GCM nonce size in bytes.
pub const NONCE_SIZE: usize = 12;

/// GCM authentication tag size in bytes.
pub const TAG_SIZE: usize = 16;

/// Encrypts `plaintext`, returning `nonce || ciphertext || tag`.
pub fn seal(key: &MasterKey, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng
        .try_fill_bytes(&mut nonce_bytes)
        .map_err(|e| CryptoError::KeyProvider(format!("secure random unavailable: {e}")))?;
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| CryptoError::Encryption(format!("AES-GCM encryption failed: {e}")))?;

    let mut envelope = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    envelope.extend_from_slice(&nonce_bytes);
    envelope.extend_from_slice(&ciphertext);
    Ok(envelope)
}

/// Verifies and decrypts an envelope produced by [`seal`].
///
/// Fails with [`CryptoError::Decryption`] when the envelope is shorter than
/// `NONCE_SIZE + TAG_SIZE`, when the tag does not verify (tampered data), or
/// when the key differs from the one used to encrypt.
pub fn open(key: &MasterKey, envelope: &[u8]) -> CryptoResult<Vec<u8>> {
    if envelope.len() < NONCE_SIZE + TAG_SIZE {
        return Err(CryptoError::Decryption(format!(
            "envelope too short: {} bytes, need at least {}",
            envelope.len(),
            NONCE_SIZE + TAG_SIZE
        )));
    }

    let (nonce_bytes, ciphertext) = envelope.split_at(NONCE_SIZE);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));

    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| {
            CryptoError::Decryption("tag verification failed (wrong key or tampered data)".into())
        })
}
