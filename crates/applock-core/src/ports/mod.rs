//! Port interfaces for the application layer
//!
//! Ports define the contract between the use cases in `applock-app` and the
//! infrastructure implementations in `applock-infra`. This follows the
//! hexagonal layering used across the app: the domain never touches a file,
//! a keystore, or a cipher directly.

mod clock;
mod encryption;
pub mod errors;
mod secret_key;
mod store;

pub use clock::ClockPort;
pub use encryption::EncryptionServicePort;
pub use errors::StoreError;
pub use secret_key::SecretKeyRepositoryPort;
pub use store::LockScreenStorePort;
