use prefvault_backend::BackendError;
use prefvault_crypto::CryptoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// CSPRNG or cipher provider unavailable, or the persisted key blob is
    /// unusable. Fatal — data encrypted under the install key is unreachable.
    #[error("key provider error: {0}")]
    KeyProvider(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

impl From<CryptoError> for StoreError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::KeyProvider(msg) => StoreError::KeyProvider(msg),
            CryptoError::Encryption(msg) => StoreError::Encryption(msg),
            CryptoError::Decryption(msg) => StoreError::Decryption(msg),
            CryptoError::InvalidKeyLength { expected, actual } => StoreError::KeyProvider(
                format!("invalid key length: expected {expected}, got {actual}"),
            ),
            CryptoError::Encoding(msg) => StoreError::KeyProvider(msg),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
