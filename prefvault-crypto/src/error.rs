use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    /// The OS secure random source or cipher provider is unavailable.
    /// Fatal — nothing at this layer can recover from it.
    #[error("key provider error: {0}")]
    KeyProvider(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("encoding error: {0}")]
    Encoding(String),
}

pub type CryptoResult<T> = Result<T, CryptoError>;
