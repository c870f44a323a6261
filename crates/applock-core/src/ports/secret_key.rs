use async_trait::async_trait;

use crate::crypto::{KeyError, PinKey};

/// Custody of the platform-held symmetric key.
///
/// The key's lifecycle beyond creation is out of this subsystem's hands;
/// only the create-once rule is enforced here.
#[async_trait]
pub trait SecretKeyRepositoryPort: Send + Sync {
    /// Load the key, generating and storing it on first use.
    ///
    /// An existing key is always reused. Implementations must never rotate
    /// silently: that would orphan the stored verifier without warning.
    async fn get_or_create_key(&self) -> Result<PinKey, KeyError>;
}

#[cfg(test)]
mockall::mock! {
    pub SecretKeyRepository {}

    #[async_trait]
    impl SecretKeyRepositoryPort for SecretKeyRepository {
        async fn get_or_create_key(&self) -> Result<PinKey, KeyError>;
    }
}
