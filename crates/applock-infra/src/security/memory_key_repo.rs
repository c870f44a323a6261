//! In-memory secret-key repository.
//! 内存版密钥仓库。
//!
//! The key is generated lazily on first use and lost when the process
//! exits. Tests and ephemeral sessions only; the create-once rule still
//! holds within one process lifetime.

use async_trait::async_trait;
use tokio::sync::Mutex;

use applock_core::{
    crypto::{KeyError, PinKey},
    ports::SecretKeyRepositoryPort,
};

pub struct MemorySecretKeyRepository {
    key: Mutex<Option<PinKey>>,
}

impl MemorySecretKeyRepository {
    pub fn new() -> Self {
        Self {
            key: Mutex::new(None),
        }
    }
}

impl Default for MemorySecretKeyRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretKeyRepositoryPort for MemorySecretKeyRepository {
    async fn get_or_create_key(&self) -> Result<PinKey, KeyError> {
        let mut key = self.key.lock().await;
        match key.as_ref() {
            Some(existing) => Ok(existing.clone()),
            None => {
                let fresh = PinKey::generate()?;
                *key = Some(fresh.clone());
                Ok(fresh)
            }
        }
    }
}
