use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

use applock_core::{
    config::{BiometricStrength, LockScreenConfig},
    lock::{LockEvent, LockMachine, LockState},
    pin::{PinCode, VerifyOutcome},
    ports::ClockPort,
};

use crate::pin_code_manager::{PinCodeError, PinCodeManager};

#[derive(Debug, thiserror::Error)]
pub enum SubmitPinError {
    #[error("pin submission is only valid while locked")]
    NotLocked,

    #[error(transparent)]
    PinCode(#[from] PinCodeError),
}

/// Top-level lock state machine service.
///
/// Combines [`PinCodeManager`] results with app lifecycle timing and
/// biometric unlock signals, and exposes a single observable lock state.
/// This service is the only writer of that state; everything PIN-shaped is
/// delegated to the manager, never bypassed.
///
/// On lockout the verifier is already gone and the state lands in
/// `SetupRequired`. Forcing the remote sign-out that policy demands is the
/// caller's job; this subsystem only guarantees no secret lingers.
pub struct LockScreenService {
    manager: Arc<PinCodeManager>,
    clock: Arc<dyn ClockPort>,
    config: LockScreenConfig,
    machine: Mutex<LockMachine>,
    state_tx: watch::Sender<LockState>,
    setup_required_tx: watch::Sender<bool>,
    pin_setup_tx: watch::Sender<bool>,
}

impl LockScreenService {
    /// Build the service, computing the initial state from the persisted
    /// facts: a stored PIN demands re-entry at cold start.
    pub async fn new(
        manager: Arc<PinCodeManager>,
        clock: Arc<dyn ClockPort>,
        config: LockScreenConfig,
    ) -> Result<Self, PinCodeError> {
        let pin_set = manager.is_pin_code_set().await?;
        let machine = LockMachine::new(pin_set, config.pin_mandatory, config.grace_period);

        let (state_tx, _) = watch::channel(machine.state());
        let (setup_required_tx, _) = watch::channel(machine.state().is_setup_required());
        let (pin_setup_tx, _) = watch::channel(pin_set);

        debug!(initial = ?machine.state(), "lock screen service created");
        Ok(Self {
            manager,
            clock,
            config,
            machine: Mutex::new(machine),
            state_tx,
            setup_required_tx,
            pin_setup_tx,
        })
    }

    /// Observable lock state. The receiver starts at the current value.
    pub fn lock_state(&self) -> watch::Receiver<LockState> {
        self.state_tx.subscribe()
    }

    /// Derived convenience: does policy currently demand PIN setup?
    pub fn is_setup_required(&self) -> watch::Receiver<bool> {
        self.setup_required_tx.subscribe()
    }

    /// Derived convenience: is a PIN currently configured?
    pub fn is_pin_setup(&self) -> watch::Receiver<bool> {
        self.pin_setup_tx.subscribe()
    }

    pub async fn current_state(&self) -> LockState {
        self.machine.lock().await.state()
    }

    /// Record the moment the app left the foreground. The state itself
    /// does not change yet.
    pub async fn on_app_backgrounded(&self) {
        let at = self.clock.now();
        let mut machine = self.machine.lock().await;
        machine.apply(LockEvent::AppBackgrounded { at });
        self.publish(&machine);
    }

    /// Re-evaluate the lock on return to the foreground: past the grace
    /// period (or with no recorded background), an unlocked session with a
    /// PIN re-locks.
    pub async fn on_app_foregrounded(&self) -> LockState {
        let at = self.clock.now();
        let mut machine = self.machine.lock().await;
        let state = machine.apply(LockEvent::AppForegrounded { at });
        self.publish(&machine);
        state
    }

    /// Submit a candidate PIN. Valid only while locked.
    ///
    /// The verification outcome is returned so the UI can surface the
    /// remaining-attempts warning; the state transition has already been
    /// published by the time this returns.
    pub async fn submit_pin(&self, pin: &PinCode) -> Result<VerifyOutcome, SubmitPinError> {
        let mut machine = self.machine.lock().await;
        if machine.state() != LockState::Locked {
            return Err(SubmitPinError::NotLocked);
        }

        let outcome = self.manager.verify_pin_code(pin).await?;
        match outcome {
            VerifyOutcome::Correct => {
                machine.apply(LockEvent::PinAccepted);
            }
            VerifyOutcome::Incorrect { .. } => {}
            VerifyOutcome::LockedOut => {
                machine.apply(LockEvent::LockedOut);
            }
        }
        self.publish(&machine);
        Ok(outcome)
    }

    /// Deliver a biometric unlock result. Accepted only while locked and
    /// only when the sensor class is allowed by configuration, consulted
    /// here at transition time. Biometric failures never consume PIN
    /// attempts.
    pub async fn submit_biometric(&self, strength: BiometricStrength, success: bool) -> LockState {
        let mut machine = self.machine.lock().await;
        if machine.state() != LockState::Locked {
            return machine.state();
        }
        if !self.config.biometric_allowed(strength) {
            warn!(?strength, "biometric unlock rejected: sensor class not allowed");
            return machine.state();
        }
        if success {
            machine.apply(LockEvent::BiometricAccepted);
            self.publish(&machine);
        } else {
            debug!(?strength, "biometric unlock failed, staying locked");
        }
        machine.state()
    }

    /// Configure (or overwrite) the PIN and adjust the state.
    pub async fn configure_pin(&self, pin: &PinCode) -> Result<LockState, PinCodeError> {
        let mut machine = self.machine.lock().await;
        self.manager.create_pin_code(pin).await?;
        let state = machine.apply(LockEvent::PinConfigured);
        self.publish(&machine);
        Ok(state)
    }

    /// Remove the PIN; the resulting state depends on whether policy makes
    /// a PIN mandatory.
    pub async fn remove_pin(&self) -> Result<LockState, PinCodeError> {
        let mut machine = self.machine.lock().await;
        self.manager.delete_pin_code().await?;
        let state = machine.apply(LockEvent::PinRemoved);
        self.publish(&machine);
        Ok(state)
    }

    fn publish(&self, machine: &LockMachine) {
        let state = machine.state();
        self.state_tx.send_if_modified(|current| {
            if *current != state {
                *current = state;
                true
            } else {
                false
            }
        });
        let setup_required = state.is_setup_required();
        self.setup_required_tx.send_if_modified(|current| {
            if *current != setup_required {
                *current = setup_required;
                true
            } else {
                false
            }
        });
        let pin_set = machine.pin_set();
        self.pin_setup_tx.send_if_modified(|current| {
            if *current != pin_set {
                *current = pin_set;
                true
            } else {
                false
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use std::time::{Duration, Instant};

    use applock_infra::{
        MemoryLockScreenStore, MemorySecretKeyRepository, XChaChaEncryptionService,
    };

    /// Manually stepped monotonic clock.
    struct FakeClock {
        base: Instant,
        offset: StdMutex<Duration>,
    }

    impl FakeClock {
        fn new() -> Self {
            Self {
                base: Instant::now(),
                offset: StdMutex::new(Duration::ZERO),
            }
        }

        fn advance(&self, by: Duration) {
            *self.offset.lock().unwrap() += by;
        }
    }

    impl ClockPort for FakeClock {
        fn now(&self) -> Instant {
            self.base + *self.offset.lock().unwrap()
        }
    }

    fn config() -> LockScreenConfig {
        LockScreenConfig {
            grace_period: Duration::from_secs(5),
            ..Default::default()
        }
    }

    async fn service_with(
        config: LockScreenConfig,
    ) -> (LockScreenService, Arc<FakeClock>, Arc<PinCodeManager>) {
        let manager = Arc::new(PinCodeManager::new(
            Arc::new(MemoryLockScreenStore::new(config.max_attempts)),
            Arc::new(XChaChaEncryptionService),
            Arc::new(MemorySecretKeyRepository::new()),
            config.clone(),
        ));
        let clock = Arc::new(FakeClock::new());
        let service = LockScreenService::new(manager.clone(), clock.clone(), config)
            .await
            .expect("build service");
        (service, clock, manager)
    }

    async fn unlocked_service_with_pin() -> (LockScreenService, Arc<FakeClock>) {
        let (service, clock, _) = service_with(config()).await;
        let state = service.configure_pin(&PinCode::from("4561")).await.unwrap();
        assert_eq!(state, LockState::Unlocked);
        (service, clock)
    }

    #[tokio::test]
    async fn initial_state_reflects_persisted_pin() {
        let (service, _, manager) = service_with(config()).await;
        assert_eq!(service.current_state().await, LockState::Unlocked);

        // Rebuild after a pin exists: cold start demands re-entry.
        manager
            .create_pin_code(&PinCode::from("4561"))
            .await
            .expect("create pin");
        let clock = Arc::new(FakeClock::new());
        let restarted = LockScreenService::new(manager, clock, config())
            .await
            .expect("build service");
        assert_eq!(restarted.current_state().await, LockState::Locked);
    }

    #[tokio::test]
    async fn initial_state_mandatory_without_pin_requires_setup() {
        let (service, _, _) = service_with(LockScreenConfig {
            pin_mandatory: true,
            ..config()
        })
        .await;
        assert_eq!(service.current_state().await, LockState::SetupRequired);
        assert!(*service.is_setup_required().borrow());
    }

    #[tokio::test]
    async fn grace_period_shields_quick_app_switches() {
        let (service, clock) = unlocked_service_with_pin().await;

        service.on_app_backgrounded().await;
        clock.advance(Duration::from_secs(3));
        assert_eq!(service.on_app_foregrounded().await, LockState::Unlocked);

        service.on_app_backgrounded().await;
        clock.advance(Duration::from_secs(10));
        assert_eq!(service.on_app_foregrounded().await, LockState::Locked);
    }

    #[tokio::test]
    async fn correct_pin_unlocks() {
        let (service, clock) = unlocked_service_with_pin().await;
        service.on_app_backgrounded().await;
        clock.advance(Duration::from_secs(60));
        service.on_app_foregrounded().await;

        let outcome = service.submit_pin(&PinCode::from("4561")).await.unwrap();
        assert_eq!(outcome, VerifyOutcome::Correct);
        assert_eq!(service.current_state().await, LockState::Unlocked);
    }

    #[tokio::test]
    async fn wrong_pin_stays_locked_and_reports_remaining() {
        let (service, clock) = unlocked_service_with_pin().await;
        service.on_app_backgrounded().await;
        clock.advance(Duration::from_secs(60));
        service.on_app_foregrounded().await;

        let outcome = service.submit_pin(&PinCode::from("9999")).await.unwrap();
        assert_eq!(
            outcome,
            VerifyOutcome::Incorrect {
                remaining_attempts: 2
            }
        );
        assert_eq!(service.current_state().await, LockState::Locked);
    }

    #[tokio::test]
    async fn exhausted_attempts_force_setup_required() {
        let (service, clock) = unlocked_service_with_pin().await;
        service.on_app_backgrounded().await;
        clock.advance(Duration::from_secs(60));
        service.on_app_foregrounded().await;

        let mut states = service.lock_state();
        let wrong = PinCode::from("9999");
        service.submit_pin(&wrong).await.unwrap();
        service.submit_pin(&wrong).await.unwrap();
        let outcome = service.submit_pin(&wrong).await.unwrap();

        assert_eq!(outcome, VerifyOutcome::LockedOut);
        assert_eq!(service.current_state().await, LockState::SetupRequired);
        assert!(!*service.is_pin_setup().borrow());

        // The observable saw the transition.
        states.changed().await.expect("state change");
        assert_eq!(*states.borrow(), LockState::SetupRequired);
    }

    #[tokio::test]
    async fn submit_pin_while_unlocked_is_rejected() {
        let (service, _) = unlocked_service_with_pin().await;
        let err = service.submit_pin(&PinCode::from("4561")).await.unwrap_err();
        assert!(matches!(err, SubmitPinError::NotLocked));
    }

    #[tokio::test]
    async fn biometric_success_unlocks_without_touching_attempts() {
        let (service, clock) = unlocked_service_with_pin().await;
        service.on_app_backgrounded().await;
        clock.advance(Duration::from_secs(60));
        service.on_app_foregrounded().await;

        let state = service
            .submit_biometric(BiometricStrength::Strong, true)
            .await;
        assert_eq!(state, LockState::Unlocked);
    }

    #[tokio::test]
    async fn biometric_failure_stays_locked() {
        let (service, clock) = unlocked_service_with_pin().await;
        service.on_app_backgrounded().await;
        clock.advance(Duration::from_secs(60));
        service.on_app_foregrounded().await;

        let state = service
            .submit_biometric(BiometricStrength::Strong, false)
            .await;
        assert_eq!(state, LockState::Locked);
    }

    #[tokio::test]
    async fn disallowed_biometric_class_is_ignored() {
        let (service, clock) = unlocked_service_with_pin().await;
        service.on_app_backgrounded().await;
        clock.advance(Duration::from_secs(60));
        service.on_app_foregrounded().await;

        // Weak biometrics are disabled in the default configuration.
        let state = service.submit_biometric(BiometricStrength::Weak, true).await;
        assert_eq!(state, LockState::Locked);
    }

    #[tokio::test]
    async fn configure_pin_from_setup_required_unlocks() {
        let (service, _, _) = service_with(LockScreenConfig {
            pin_mandatory: true,
            ..config()
        })
        .await;
        assert_eq!(service.current_state().await, LockState::SetupRequired);

        let state = service.configure_pin(&PinCode::from("4561")).await.unwrap();
        assert_eq!(state, LockState::Unlocked);
        assert!(*service.is_pin_setup().borrow());
        assert!(!*service.is_setup_required().borrow());
    }

    #[tokio::test]
    async fn remove_pin_follows_mandatory_policy() {
        let (service, _) = unlocked_service_with_pin().await;
        let state = service.remove_pin().await.unwrap();
        assert_eq!(state, LockState::NotConfigured);
        assert!(!*service.is_pin_setup().borrow());
    }

    #[tokio::test]
    async fn observable_receives_lock_transition() {
        let (service, clock) = unlocked_service_with_pin().await;
        let mut states = service.lock_state();
        assert_eq!(*states.borrow_and_update(), LockState::Unlocked);

        service.on_app_backgrounded().await;
        clock.advance(Duration::from_secs(60));
        service.on_app_foregrounded().await;

        states.changed().await.expect("state change");
        assert_eq!(*states.borrow(), LockState::Locked);
    }
}
