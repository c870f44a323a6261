//! PIN domain models: the UI-facing entry buffer, the secret PIN string,
//! and the verification outcome.

pub mod code;
pub mod entry;

pub use code::{PinCode, PinFormatError};
pub use entry::{PinDigit, PinEntry};

/// Result of checking a candidate PIN against the stored verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Candidate matched; the attempt counter has been reset.
    Correct,

    /// Candidate did not match; `remaining_attempts` submissions are left
    /// before the verifier is destroyed.
    Incorrect { remaining_attempts: u32 },

    /// The attempt budget is exhausted. The verifier has been deleted and
    /// the PIN must be configured again.
    LockedOut,
}
