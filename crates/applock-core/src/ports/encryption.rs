use async_trait::async_trait;

use crate::crypto::{CryptoError, EncryptedBlob, PinKey};

/// Symmetric encryption boundary used to round-trip the verifier.
///
/// Key-store backed implementations can be slow or require user presence,
/// so both operations are async and awaited by the caller.
#[async_trait]
pub trait EncryptionServicePort: Send + Sync {
    /// Encrypt an opaque plaintext buffer under `key` with a fresh nonce.
    async fn encrypt(&self, key: &PinKey, plaintext: &[u8]) -> Result<EncryptedBlob, CryptoError>;

    /// Decrypt `blob` under `key`.
    ///
    /// Failure mapping: wrong key or tampered ciphertext ->
    /// [`CryptoError::Decryption`].
    async fn decrypt(&self, key: &PinKey, blob: &EncryptedBlob) -> Result<Vec<u8>, CryptoError>;
}

#[cfg(test)]
mockall::mock! {
    pub EncryptionService {}

    #[async_trait]
    impl EncryptionServicePort for EncryptionService {
        async fn encrypt(&self, key: &PinKey, plaintext: &[u8]) -> Result<EncryptedBlob, CryptoError>;
        async fn decrypt(&self, key: &PinKey, blob: &EncryptedBlob) -> Result<Vec<u8>, CryptoError>;
    }
}
