//! OS-keyring secret-key repository.
//!
//! The key lives in the platform credential store (Keychain, Windows
//! Credential Manager, Secret Service). One entry per account, versioned
//! so a future key format can coexist with the current one.

use async_trait::async_trait;
use keyring::Entry;
use tracing::debug;

use applock_core::{
    crypto::{KeyError, PinKey},
    ports::SecretKeyRepositoryPort,
};

const KEY_PREFIX: &str = "pin-key:v1:";

fn build_username(account: &str) -> String {
    format!("{}{}", KEY_PREFIX, account)
}

pub struct KeyringSecretKeyRepository {
    service: String,
    account: String,
}

impl KeyringSecretKeyRepository {
    /// `service` is the application identifier shown in the credential
    /// store; `account` scopes the key to one signed-in session.
    pub fn new(service: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            account: account.into(),
        }
    }

    fn entry(&self) -> Result<Entry, KeyError> {
        Entry::new(&self.service, &build_username(&self.account))
            .map_err(|e| KeyError::Backend(format!("failed to access keyring entry: {}", e)))
    }
}

#[async_trait]
impl SecretKeyRepositoryPort for KeyringSecretKeyRepository {
    async fn get_or_create_key(&self) -> Result<PinKey, KeyError> {
        let entry = self.entry()?;
        match entry.get_secret() {
            Ok(secret) => PinKey::from_bytes(&secret)
                .map_err(|e| KeyError::Corrupt(format!("invalid key material in keyring: {e}"))),
            Err(keyring::Error::NoEntry) => {
                let key = PinKey::generate()?;
                entry
                    .set_secret(key.as_bytes())
                    .map_err(|e| KeyError::Backend(format!("failed to store key: {}", e)))?;
                debug!("pin key created in keyring");
                Ok(key)
            }
            Err(keyring::Error::PlatformFailure(msg)) => {
                Err(KeyError::Backend(msg.to_string()))
            }
            Err(e) => Err(KeyError::Backend(format!("keyring error: {}", e))),
        }
    }
}
