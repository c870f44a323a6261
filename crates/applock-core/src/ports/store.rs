use async_trait::async_trait;
use tokio::sync::watch;

use super::errors::StoreError;
use crate::crypto::EncryptedBlob;

/// Durable persistence boundary for the encrypted verifier and the
/// remaining-attempts counter.
///
/// Concurrency contract: mutations must be linearizable with respect to
/// each other. Concurrent wrong-PIN submissions must never observe a lost
/// decrement, or the attempt budget could be exceeded by parallel
/// submissions. Implementations typically serialize through a single
/// writer mutex or a storage-native transaction.
#[async_trait]
pub trait LockScreenStorePort: Send + Sync {
    /// Stored ciphertext, or `None` when no PIN is configured.
    async fn get_encrypted_code(&self) -> Result<Option<EncryptedBlob>, StoreError>;

    /// Upsert the ciphertext, restore the attempt counter to the
    /// configured maximum in the same mutation, and notify subscribers
    /// that a PIN is now configured. A fresh verifier must never be
    /// observable alongside a stale counter.
    async fn save_encrypted_pin_code(&self, blob: EncryptedBlob) -> Result<(), StoreError>;

    /// Remove the ciphertext and restore the attempt counter to the
    /// configured maximum, as a single store-level mutation. A partially
    /// applied wipe (verifier gone but counter stale, or vice versa) must
    /// never be observable.
    async fn delete_encrypted_pin_code(&self) -> Result<(), StoreError>;

    async fn has_pin_code(&self) -> Result<bool, StoreError>;

    /// Remaining attempts; reads back as the configured maximum if never
    /// decremented.
    async fn remaining_attempts(&self) -> Result<u32, StoreError>;

    /// Atomically decrement the counter by one, never below zero, and
    /// return the new value.
    async fn on_wrong_pin(&self) -> Result<u32, StoreError>;

    /// Restore the counter to "unset" (read back as the maximum).
    async fn reset_counter(&self) -> Result<(), StoreError>;

    /// Subscribe to the "PIN configured" signal. The receiver starts at
    /// the current value and observes every configure/remove transition.
    /// Subscriptions are scoped to the receiver's lifetime; dropping it
    /// unsubscribes.
    fn subscribe(&self) -> watch::Receiver<bool>;
}

#[cfg(test)]
mockall::mock! {
    pub LockScreenStore {}

    #[async_trait]
    impl LockScreenStorePort for LockScreenStore {
        async fn get_encrypted_code(&self) -> Result<Option<EncryptedBlob>, StoreError>;
        async fn save_encrypted_pin_code(&self, blob: EncryptedBlob) -> Result<(), StoreError>;
        async fn delete_encrypted_pin_code(&self) -> Result<(), StoreError>;
        async fn has_pin_code(&self) -> Result<bool, StoreError>;
        async fn remaining_attempts(&self) -> Result<u32, StoreError>;
        async fn on_wrong_pin(&self) -> Result<u32, StoreError>;
        async fn reset_counter(&self) -> Result<(), StoreError>;
        fn subscribe(&self) -> watch::Receiver<bool>;
    }
}
