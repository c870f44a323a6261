//! # applock-core
//!
//! Core domain models and business logic for the app-lock subsystem.
//!
//! This crate contains pure business logic without any infrastructure
//! dependencies: the PIN entry editing model, the lock state machine,
//! configuration, and the port traits implemented by `applock-infra`.

// Public module exports
pub mod config;
pub mod crypto;
pub mod lock;
pub mod pin;
pub mod ports;

// Re-export commonly used types at the crate root
pub use config::{BiometricStrength, LockScreenConfig};
pub use crypto::{EncryptedBlob, PinKey};
pub use lock::{LockEvent, LockMachine, LockState};
pub use pin::{PinCode, PinDigit, PinEntry, VerifyOutcome};
