use std::time::{Duration, Instant};

use tracing::debug;

use super::state::LockState;

/// Inputs to the lock state machine.
///
/// Lifecycle events carry the instant they were observed at so the machine
/// itself never reads a clock; the service layer samples one monotonic
/// source for both the background timestamp and the foreground comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockEvent {
    AppBackgrounded { at: Instant },
    AppForegrounded { at: Instant },
    PinAccepted,
    BiometricAccepted,
    LockedOut,
    PinConfigured,
    PinRemoved,
}

/// Pure lock state machine.
///
/// State transitions:
/// ```text
///   (cold start, pin set)        ──────────────► Locked
///   (cold start, no pin, policy) ──────────────► SetupRequired
///   (cold start, no pin)         ──────────────► Unlocked
///
///   Unlocked + Foregrounded past grace period  ► Locked
///   Locked   + PinAccepted / BiometricAccepted ► Unlocked
///   Locked   + LockedOut (verifier destroyed)  ► SetupRequired
///   any      + PinRemoved                      ► NotConfigured | SetupRequired
///   SetupRequired / NotConfigured + Configured ► Unlocked
/// ```
pub struct LockMachine {
    pin_mandatory: bool,
    grace_period: Duration,
    pin_set: bool,
    state: LockState,
    backgrounded_at: Option<Instant>,
}

impl LockMachine {
    /// Compute the initial state from the persisted facts: a configured
    /// PIN always demands re-entry at cold start.
    pub fn new(pin_set: bool, pin_mandatory: bool, grace_period: Duration) -> Self {
        let state = if pin_set {
            LockState::Locked
        } else if pin_mandatory {
            LockState::SetupRequired
        } else {
            LockState::Unlocked
        };
        Self {
            pin_mandatory,
            grace_period,
            pin_set,
            state,
            backgrounded_at: None,
        }
    }

    pub fn state(&self) -> LockState {
        self.state
    }

    pub fn pin_set(&self) -> bool {
        self.pin_set
    }

    /// Apply one event and return the resulting state.
    pub fn apply(&mut self, event: LockEvent) -> LockState {
        let previous = self.state;
        match event {
            LockEvent::AppBackgrounded { at } => {
                self.backgrounded_at = Some(at);
            }
            LockEvent::AppForegrounded { at } => {
                if self.state == LockState::Unlocked && self.pin_set && self.grace_expired(at) {
                    self.state = LockState::Locked;
                }
            }
            LockEvent::PinAccepted | LockEvent::BiometricAccepted => {
                if self.state == LockState::Locked {
                    self.state = LockState::Unlocked;
                    // Forget the stale window so it cannot re-lock us later.
                    self.backgrounded_at = None;
                }
            }
            LockEvent::LockedOut => {
                if self.state == LockState::Locked {
                    self.pin_set = false;
                    self.state = LockState::SetupRequired;
                }
            }
            LockEvent::PinConfigured => {
                self.pin_set = true;
                if matches!(
                    self.state,
                    LockState::SetupRequired | LockState::NotConfigured
                ) {
                    self.state = LockState::Unlocked;
                }
            }
            LockEvent::PinRemoved => {
                self.pin_set = false;
                self.state = if self.pin_mandatory {
                    LockState::SetupRequired
                } else {
                    LockState::NotConfigured
                };
                self.backgrounded_at = None;
            }
        }
        if self.state != previous {
            debug!(?previous, current = ?self.state, "lock state transition");
        }
        self.state
    }

    fn grace_expired(&self, now: Instant) -> bool {
        match self.backgrounded_at {
            Some(at) => now.duration_since(at) > self.grace_period,
            // Never backgrounded since construction or unlock: a foreground
            // signal with no recorded window always re-locks.
            None => true,
        }
    }
}
