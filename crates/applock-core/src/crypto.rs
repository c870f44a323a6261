//! Cryptographic value objects shared by the use-case layer and adapters.
//!
//! No algorithms live here: the AEAD itself sits behind
//! [`crate::ports::EncryptionServicePort`] and key custody behind
//! [`crate::ports::SecretKeyRepositoryPort`].

use std::fmt;

use rand::{rngs::OsRng, TryRngCore};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlobVersion {
    V1,
}

/// AEAD container persisted by the lock-screen store.
///
/// Nonce length is fixed by the algorithm: 24 bytes for
/// XChaCha20-Poly1305, the only format V1 supports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedBlob {
    pub version: BlobVersion,
    pub nonce: Vec<u8>,
    pub ciphertext: Vec<u8>,
}

impl EncryptedBlob {
    pub const NONCE_LEN: usize = 24;

    pub fn validate_basic(&self) -> Result<(), CryptoError> {
        if self.nonce.len() != Self::NONCE_LEN {
            return Err(CryptoError::InvalidParameter(format!(
                "invalid nonce length: expected {}, got {}",
                Self::NONCE_LEN,
                self.nonce.len()
            )));
        }
        if self.ciphertext.is_empty() {
            return Err(CryptoError::InvalidParameter(
                "ciphertext is empty".into(),
            ));
        }
        match self.version {
            BlobVersion::V1 => {}
        }
        Ok(())
    }
}

/// The symmetric key guarding the stored verifier.
///
/// - 32 bytes, suitable for XChaCha20-Poly1305
/// - no `Serialize` / `Deserialize`
/// - wiped on drop
#[derive(Clone, PartialEq, Eq)]
pub struct PinKey([u8; Self::LEN]);

impl PinKey {
    pub const LEN: usize = 32;

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn generate() -> Result<Self, KeyError> {
        let mut buf = [0u8; Self::LEN];
        OsRng
            .try_fill_bytes(&mut buf)
            .map_err(|_| KeyError::CryptoFailure)?;
        let key = Self(buf);
        buf.zeroize();
        Ok(key)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != Self::LEN {
            return Err(KeyError::Corrupt(format!(
                "invalid key length: expected {}, got {}",
                Self::LEN,
                bytes.len()
            )));
        }
        let mut buf = [0u8; Self::LEN];
        buf.copy_from_slice(bytes);
        Ok(Self(buf))
    }
}

impl fmt::Debug for PinKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PinKey([REDACTED])")
    }
}

impl Drop for PinKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid key")]
    InvalidKey,

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("encryption failed")]
    EncryptFailed,

    /// Malformed or tampered ciphertext, or the wrong key. Callers fold
    /// this into the "wrong pin" path; it must never reach the user as a
    /// distinct failure.
    #[error("decryption failed")]
    Decryption,

    #[error("internal crypto failure")]
    CryptoFailure,
}

#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("key material not found")]
    NotFound,

    #[error("key material is corrupt: {0}")]
    Corrupt(String),

    #[error("permission denied for key material access")]
    PermissionDenied,

    #[error("key store failure: {0}")]
    Backend(String),

    #[error("internal crypto failure")]
    CryptoFailure,
}
