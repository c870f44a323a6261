//! In-memory lock-screen store.
//! 内存版锁屏存储。
//!
//! Nothing survives a restart, so this is only suitable for tests and for
//! ephemeral sessions that must never leave a verifier on disk. Semantics
//! otherwise match the file-backed store exactly.

use async_trait::async_trait;
use tokio::sync::{watch, Mutex};

use applock_core::{
    crypto::EncryptedBlob,
    ports::{LockScreenStorePort, StoreError},
};

#[derive(Debug, Default)]
struct MemoryRecord {
    encrypted_pin: Option<EncryptedBlob>,
    remaining_attempts: Option<u32>,
}

pub struct MemoryLockScreenStore {
    max_attempts: u32,
    record: Mutex<MemoryRecord>,
    configured_tx: watch::Sender<bool>,
}

impl MemoryLockScreenStore {
    pub fn new(max_attempts: u32) -> Self {
        let (configured_tx, _) = watch::channel(false);
        Self {
            max_attempts,
            record: Mutex::new(MemoryRecord::default()),
            configured_tx,
        }
    }

    fn notify(&self, configured: bool) {
        self.configured_tx.send_if_modified(|current| {
            if *current != configured {
                *current = configured;
                true
            } else {
                false
            }
        });
    }
}

#[async_trait]
impl LockScreenStorePort for MemoryLockScreenStore {
    async fn get_encrypted_code(&self) -> Result<Option<EncryptedBlob>, StoreError> {
        Ok(self.record.lock().await.encrypted_pin.clone())
    }

    async fn save_encrypted_pin_code(&self, blob: EncryptedBlob) -> Result<(), StoreError> {
        {
            let mut record = self.record.lock().await;
            record.encrypted_pin = Some(blob);
            record.remaining_attempts = None;
        }
        self.notify(true);
        Ok(())
    }

    async fn delete_encrypted_pin_code(&self) -> Result<(), StoreError> {
        {
            let mut record = self.record.lock().await;
            record.encrypted_pin = None;
            record.remaining_attempts = None;
        }
        self.notify(false);
        Ok(())
    }

    async fn has_pin_code(&self) -> Result<bool, StoreError> {
        Ok(self.record.lock().await.encrypted_pin.is_some())
    }

    async fn remaining_attempts(&self) -> Result<u32, StoreError> {
        let record = self.record.lock().await;
        Ok(record.remaining_attempts.unwrap_or(self.max_attempts))
    }

    async fn on_wrong_pin(&self) -> Result<u32, StoreError> {
        let mut record = self.record.lock().await;
        let next = record
            .remaining_attempts
            .unwrap_or(self.max_attempts)
            .saturating_sub(1);
        record.remaining_attempts = Some(next);
        Ok(next)
    }

    async fn reset_counter(&self) -> Result<(), StoreError> {
        self.record.lock().await.remaining_attempts = None;
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.configured_tx.subscribe()
    }
}
