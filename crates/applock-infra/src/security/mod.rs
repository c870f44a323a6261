//! Security adapters: the AEAD encryption service and secret-key custody.

pub mod encryption;
pub mod file_key_repo;
pub mod keyring_repo;
pub mod memory_key_repo;
