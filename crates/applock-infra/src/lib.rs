//! # applock-infra
//!
//! Infrastructure adapters implementing the `applock-core` ports: durable
//! lock-screen storage, the AEAD encryption service, secret-key custody
//! (OS keyring and file fallback), and the monotonic clock.

pub mod security;
pub mod store;
pub mod time;

pub use security::encryption::XChaChaEncryptionService;
pub use security::file_key_repo::FileSecretKeyRepository;
pub use security::keyring_repo::KeyringSecretKeyRepository;
pub use security::memory_key_repo::MemorySecretKeyRepository;
pub use store::file_store::FileLockScreenStore;
pub use store::memory::MemoryLockScreenStore;
pub use time::MonotonicClock;
