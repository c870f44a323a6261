use serde::{Deserialize, Serialize};

/// Lock state observed by the rest of the app.
///
/// Exactly one value holds at any time. The machine has no terminal state:
/// it cycles for the lifetime of the session and is torn down with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockState {
    /// No PIN is configured and none is required. The lock feature is
    /// effectively disabled.
    NotConfigured,

    /// Policy requires a PIN but none is configured, either because the
    /// app was never set up or because a lockout destroyed the verifier.
    SetupRequired,

    /// A PIN exists and must be re-entered before the session is usable.
    Locked,

    Unlocked,
}

impl LockState {
    pub fn is_locked(self) -> bool {
        matches!(self, Self::Locked)
    }

    pub fn is_setup_required(self) -> bool {
        matches!(self, Self::SetupRequired)
    }
}
