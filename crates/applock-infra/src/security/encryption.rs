use async_trait::async_trait;
use chacha20poly1305::aead::Aead;
use chacha20poly1305::{KeyInit, XChaCha20Poly1305, XNonce};
use rand::{rngs::OsRng, TryRngCore};

use applock_core::{
    crypto::{BlobVersion, CryptoError, EncryptedBlob, PinKey},
    ports::EncryptionServicePort,
};

/// XChaCha20-Poly1305 implementation of the encryption boundary.
///
/// Every encryption draws a fresh 24-byte nonce from the OS RNG; the nonce
/// travels inside the blob. Wrong key and tampered ciphertext are
/// indistinguishable by construction: the AEAD tag check fails the same
/// way for both.
pub struct XChaChaEncryptionService;

#[async_trait]
impl EncryptionServicePort for XChaChaEncryptionService {
    async fn encrypt(&self, key: &PinKey, plaintext: &[u8]) -> Result<EncryptedBlob, CryptoError> {
        let mut nonce = vec![0u8; EncryptedBlob::NONCE_LEN];
        OsRng
            .try_fill_bytes(&mut nonce)
            .map_err(|_| CryptoError::CryptoFailure)?;

        let cipher = XChaCha20Poly1305::new_from_slice(key.as_bytes())
            .map_err(|_| CryptoError::InvalidKey)?;
        let ciphertext = cipher
            .encrypt(XNonce::from_slice(&nonce), plaintext)
            .map_err(|_| CryptoError::EncryptFailed)?;

        Ok(EncryptedBlob {
            version: BlobVersion::V1,
            nonce,
            ciphertext,
        })
    }

    async fn decrypt(&self, key: &PinKey, blob: &EncryptedBlob) -> Result<Vec<u8>, CryptoError> {
        blob.validate_basic()?;

        let cipher = XChaCha20Poly1305::new_from_slice(key.as_bytes())
            .map_err(|_| CryptoError::InvalidKey)?;
        cipher
            .decrypt(XNonce::from_slice(&blob.nonce), blob.ciphertext.as_ref())
            .map_err(|_| CryptoError::Decryption)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn encrypt_decrypt_round_trip() {
        let service = XChaChaEncryptionService;
        let key = PinKey::generate().unwrap();

        let blob = service.encrypt(&key, b"4561").await.unwrap();
        let plaintext = service.decrypt(&key, &blob).await.unwrap();
        assert_eq!(plaintext, b"4561");
    }

    #[tokio::test]
    async fn nonces_are_fresh_per_encryption() {
        let service = XChaChaEncryptionService;
        let key = PinKey::generate().unwrap();

        let a = service.encrypt(&key, b"4561").await.unwrap();
        let b = service.encrypt(&key, b"4561").await.unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[tokio::test]
    async fn tampered_ciphertext_fails_decryption() {
        let service = XChaChaEncryptionService;
        let key = PinKey::generate().unwrap();

        let mut blob = service.encrypt(&key, b"4561").await.unwrap();
        blob.ciphertext[0] ^= 0x01;
        assert!(matches!(
            service.decrypt(&key, &blob).await,
            Err(CryptoError::Decryption)
        ));
    }

    #[tokio::test]
    async fn wrong_key_fails_decryption() {
        let service = XChaChaEncryptionService;
        let key = PinKey::generate().unwrap();
        let other = PinKey::generate().unwrap();

        let blob = service.encrypt(&key, b"4561").await.unwrap();
        assert!(matches!(
            service.decrypt(&other, &blob).await,
            Err(CryptoError::Decryption)
        ));
    }
}
