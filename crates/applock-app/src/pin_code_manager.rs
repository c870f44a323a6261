use std::sync::Arc;

use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use applock_core::{
    config::LockScreenConfig,
    crypto::{CryptoError, KeyError},
    pin::{PinCode, PinFormatError, VerifyOutcome},
    ports::{EncryptionServicePort, LockScreenStorePort, SecretKeyRepositoryPort, StoreError},
};

#[derive(Debug, thiserror::Error)]
pub enum PinCodeError {
    #[error("pin code has invalid format: {0}")]
    InvalidFormat(#[from] PinFormatError),

    #[error("no pin code is configured")]
    NotConfigured,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error("encryption failure: {0}")]
    Crypto(#[from] CryptoError),
}

/// Owns the PIN lifecycle: create, verify, delete, attempt bookkeeping.
///
/// All store mutations funnel through one async mutex so concurrent verify
/// submissions are totally ordered and can never race the attempt
/// decrement past the configured budget.
pub struct PinCodeManager {
    store: Arc<dyn LockScreenStorePort>,
    encryption: Arc<dyn EncryptionServicePort>,
    secret_keys: Arc<dyn SecretKeyRepositoryPort>,
    config: LockScreenConfig,
    write_lock: Mutex<()>,
}

impl PinCodeManager {
    pub fn new(
        store: Arc<dyn LockScreenStorePort>,
        encryption: Arc<dyn EncryptionServicePort>,
        secret_keys: Arc<dyn SecretKeyRepositoryPort>,
        config: LockScreenConfig,
    ) -> Self {
        Self {
            store,
            encryption,
            secret_keys,
            config,
            write_lock: Mutex::new(()),
        }
    }

    /// Configure (or overwrite) the PIN.
    ///
    /// Format violations are rejected before the store or crypto layer is
    /// touched. On success any previous verifier and its attempt state are
    /// replaced, not merged.
    pub async fn create_pin_code(&self, pin: &PinCode) -> Result<(), PinCodeError> {
        pin.check_format(&self.config)?;

        let _guard = self.write_lock.lock().await;
        let key = self.secret_keys.get_or_create_key().await?;
        let blob = self.encryption.encrypt(&key, pin.as_bytes()).await?;
        // The store replaces verifier and counter in one mutation, so a
        // new verifier can never coexist with a stale counter.
        self.store.save_encrypted_pin_code(blob).await?;
        debug!("pin code configured");
        Ok(())
    }

    /// Check a candidate PIN against the stored verifier and bind the
    /// decision to the attempt budget.
    pub async fn verify_pin_code(&self, pin: &PinCode) -> Result<VerifyOutcome, PinCodeError> {
        let _guard = self.write_lock.lock().await;

        let Some(blob) = self.store.get_encrypted_code().await? else {
            return Err(PinCodeError::NotConfigured);
        };

        let key = self.secret_keys.get_or_create_key().await?;
        let matched = match self.encryption.decrypt(&key, &blob).await {
            Ok(plaintext) => {
                let plaintext = Zeroizing::new(plaintext);
                bool::from(plaintext.ct_eq(pin.as_bytes()))
            }
            Err(err) => {
                // Corrupted ciphertext or a rotated key reads exactly like
                // a wrong pin: same outcome, same attempt cost, nothing
                // for a caller to distinguish.
                warn!("verifier decrypt failed, counting as wrong pin: {err}");
                false
            }
        };

        if matched {
            self.store.reset_counter().await?;
            return Ok(VerifyOutcome::Correct);
        }

        let remaining = self.store.on_wrong_pin().await?;
        if remaining == 0 {
            // Budget exhausted: destroy the verifier. The store wipes the
            // ciphertext and resets the counter in one mutation.
            self.store.delete_encrypted_pin_code().await?;
            warn!("pin attempts exhausted, verifier destroyed");
            return Ok(VerifyOutcome::LockedOut);
        }

        debug!(remaining, "wrong pin");
        Ok(VerifyOutcome::Incorrect {
            remaining_attempts: remaining,
        })
    }

    /// Remove the verifier and reset the counter. Used both for a
    /// user-initiated reset and by callers reacting to a lockout.
    pub async fn delete_pin_code(&self) -> Result<(), PinCodeError> {
        let _guard = self.write_lock.lock().await;
        self.store.delete_encrypted_pin_code().await?;
        debug!("pin code deleted");
        Ok(())
    }

    /// Pass-through read for the UI warning shown before lockout.
    pub async fn remaining_attempts(&self) -> Result<u32, PinCodeError> {
        Ok(self.store.remaining_attempts().await?)
    }

    pub async fn is_pin_code_set(&self) -> Result<bool, PinCodeError> {
        Ok(self.store.has_pin_code().await?)
    }

    pub fn config(&self) -> &LockScreenConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use applock_core::crypto::{BlobVersion, EncryptedBlob};
    use applock_infra::{
        MemoryLockScreenStore, MemorySecretKeyRepository, XChaChaEncryptionService,
    };

    fn manager_with(config: LockScreenConfig) -> (PinCodeManager, Arc<MemoryLockScreenStore>) {
        let store = Arc::new(MemoryLockScreenStore::new(config.max_attempts));
        let manager = PinCodeManager::new(
            store.clone(),
            Arc::new(XChaChaEncryptionService),
            Arc::new(MemorySecretKeyRepository::new()),
            config,
        );
        (manager, store)
    }

    fn manager() -> (PinCodeManager, Arc<MemoryLockScreenStore>) {
        manager_with(LockScreenConfig::default())
    }

    #[tokio::test]
    async fn create_then_verify_is_correct_and_resets_counter() {
        let (manager, _) = manager();
        manager
            .create_pin_code(&PinCode::from("4561"))
            .await
            .expect("create pin");

        let outcome = manager
            .verify_pin_code(&PinCode::from("4561"))
            .await
            .expect("verify pin");
        assert_eq!(outcome, VerifyOutcome::Correct);
        assert_eq!(manager.remaining_attempts().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn three_wrong_attempts_destroy_the_verifier() {
        let (manager, _) = manager();
        manager
            .create_pin_code(&PinCode::from("4561"))
            .await
            .expect("create pin");

        let wrong = PinCode::from("9999");
        assert_eq!(
            manager.verify_pin_code(&wrong).await.unwrap(),
            VerifyOutcome::Incorrect {
                remaining_attempts: 2
            }
        );
        assert_eq!(
            manager.verify_pin_code(&wrong).await.unwrap(),
            VerifyOutcome::Incorrect {
                remaining_attempts: 1
            }
        );
        assert_eq!(
            manager.verify_pin_code(&wrong).await.unwrap(),
            VerifyOutcome::LockedOut
        );

        assert!(!manager.is_pin_code_set().await.unwrap());
        // Counter is back at the maximum for the next configuration.
        assert_eq!(manager.remaining_attempts().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn correct_pin_after_wrong_attempts_restores_budget() {
        let (manager, _) = manager();
        manager
            .create_pin_code(&PinCode::from("4561"))
            .await
            .expect("create pin");

        manager.verify_pin_code(&PinCode::from("0001")).await.unwrap();
        manager.verify_pin_code(&PinCode::from("0002")).await.unwrap();
        assert_eq!(manager.remaining_attempts().await.unwrap(), 1);

        assert_eq!(
            manager.verify_pin_code(&PinCode::from("4561")).await.unwrap(),
            VerifyOutcome::Correct
        );
        assert_eq!(manager.remaining_attempts().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn forbidden_pin_is_rejected_without_touching_the_store() {
        let (manager, store) = manager();
        let err = manager
            .create_pin_code(&PinCode::from("0000"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PinCodeError::InvalidFormat(PinFormatError::Forbidden)
        ));
        assert!(!store.has_pin_code().await.unwrap());
    }

    #[tokio::test]
    async fn malformed_pins_are_rejected() {
        let (manager, _) = manager();
        assert!(matches!(
            manager.create_pin_code(&PinCode::from("12")).await,
            Err(PinCodeError::InvalidFormat(PinFormatError::WrongLength { .. }))
        ));
        assert!(matches!(
            manager.create_pin_code(&PinCode::from("12a4")).await,
            Err(PinCodeError::InvalidFormat(PinFormatError::NotNumeric))
        ));
    }

    #[tokio::test]
    async fn verify_without_configured_pin_fails() {
        let (manager, _) = manager();
        assert!(matches!(
            manager.verify_pin_code(&PinCode::from("4561")).await,
            Err(PinCodeError::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn corrupt_ciphertext_counts_as_wrong_pin() {
        let (manager, store) = manager();
        manager
            .create_pin_code(&PinCode::from("4561"))
            .await
            .expect("create pin");

        // Clobber the stored verifier with garbage of valid shape.
        store
            .save_encrypted_pin_code(EncryptedBlob {
                version: BlobVersion::V1,
                nonce: vec![0u8; EncryptedBlob::NONCE_LEN],
                ciphertext: vec![0xAB; 20],
            })
            .await
            .unwrap();

        let outcome = manager
            .verify_pin_code(&PinCode::from("4561"))
            .await
            .expect("verify must not error on corrupt state");
        assert_eq!(
            outcome,
            VerifyOutcome::Incorrect {
                remaining_attempts: 2
            }
        );
    }

    #[tokio::test]
    async fn overwriting_pin_replaces_verifier_and_attempt_state() {
        let (manager, _) = manager();
        manager
            .create_pin_code(&PinCode::from("4561"))
            .await
            .expect("create pin");
        manager.verify_pin_code(&PinCode::from("9999")).await.unwrap();
        assert_eq!(manager.remaining_attempts().await.unwrap(), 2);

        manager
            .create_pin_code(&PinCode::from("8765"))
            .await
            .expect("overwrite pin");
        assert_eq!(manager.remaining_attempts().await.unwrap(), 3);
        assert_eq!(
            manager.verify_pin_code(&PinCode::from("4561")).await.unwrap(),
            VerifyOutcome::Incorrect {
                remaining_attempts: 2
            }
        );
        assert_eq!(
            manager.verify_pin_code(&PinCode::from("8765")).await.unwrap(),
            VerifyOutcome::Correct
        );
    }

    #[tokio::test]
    async fn delete_pin_code_resets_everything() {
        let (manager, _) = manager();
        manager
            .create_pin_code(&PinCode::from("4561"))
            .await
            .expect("create pin");
        manager.verify_pin_code(&PinCode::from("9999")).await.unwrap();

        manager.delete_pin_code().await.expect("delete pin");
        assert!(!manager.is_pin_code_set().await.unwrap());
        assert_eq!(manager.remaining_attempts().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn concurrent_wrong_attempts_never_exceed_the_budget() {
        let (manager, _) = manager_with(LockScreenConfig {
            max_attempts: 5,
            ..Default::default()
        });
        manager
            .create_pin_code(&PinCode::from("4561"))
            .await
            .expect("create pin");

        let manager = Arc::new(manager);
        let mut handles = Vec::new();
        for _ in 0..5 {
            let manager = manager.clone();
            handles.push(tokio::spawn(async move {
                manager.verify_pin_code(&PinCode::from("9999")).await
            }));
        }

        let mut outcomes = Vec::new();
        for handle in handles {
            outcomes.push(handle.await.unwrap().unwrap());
        }

        // Exactly one submission observed the exhausted budget.
        let lockouts = outcomes
            .iter()
            .filter(|o| matches!(o, VerifyOutcome::LockedOut))
            .count();
        assert_eq!(lockouts, 1);
        assert!(!manager.is_pin_code_set().await.unwrap());
    }
}
