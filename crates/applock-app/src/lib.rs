//! # applock-app
//!
//! Use-case layer of the app-lock subsystem. The two services here are the
//! only writers of their respective pieces of state:
//!
//! - [`PinCodeManager`] is the sole authority turning a candidate PIN into
//!   accept/reject, and the only writer of the stored verifier.
//! - [`LockScreenService`] owns the externally observed lock state and
//!   never bypasses the manager.
//!
//! Both follow the `Arc<dyn Port>` pattern used across the app layer:
//! concrete types, ports injected as trait objects.

pub mod pin_code_manager;
pub mod lock_screen_service;

pub use lock_screen_service::{LockScreenService, SubmitPinError};
pub use pin_code_manager::{PinCodeError, PinCodeManager};
