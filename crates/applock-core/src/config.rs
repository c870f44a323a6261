//! App-lock configuration domain model

use std::collections::HashSet;
use std::time::Duration;

use serde::Deserialize;

/// Static app-lock configuration.
///
/// Loaded once at startup by the composition root and read-only afterwards.
/// Invalid configuration is a startup failure, not a runtime error: callers
/// are expected to run [`LockScreenConfig::validate`] before wiring the
/// subsystem together and abort on `Err`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LockScreenConfig {
    /// Whether a PIN must be configured before the app can be used.
    pub pin_mandatory: bool,

    /// PIN codes rejected at setup time (trivial codes).
    pub forbidden_pin_codes: HashSet<String>,

    /// Number of digits in a PIN.
    pub pin_size: usize,

    /// Wrong attempts allowed before the verifier is destroyed.
    pub max_attempts: u32,

    /// Window after backgrounding during which re-foregrounding does not
    /// force re-entry of the PIN.
    pub grace_period: Duration,

    /// Whether class-3 (strong) biometric unlock is allowed.
    pub strong_biometrics_enabled: bool,

    /// Whether class-2 (weak) biometric unlock is allowed.
    pub weak_biometrics_enabled: bool,
}

impl Default for LockScreenConfig {
    fn default() -> Self {
        Self {
            pin_mandatory: false,
            forbidden_pin_codes: ["0000", "1234"].iter().map(|s| s.to_string()).collect(),
            pin_size: 4,
            max_attempts: 3,
            grace_period: Duration::from_secs(2 * 60),
            strong_biometrics_enabled: true,
            weak_biometrics_enabled: false,
        }
    }
}

/// Biometric sensor class, reported by the platform when an unlock result
/// is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiometricStrength {
    Strong,
    Weak,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("pin_size must be positive")]
    InvalidPinSize,

    #[error("max_attempts must be positive")]
    InvalidMaxAttempts,
}

impl LockScreenConfig {
    /// Validate the configuration once at load time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pin_size == 0 {
            return Err(ConfigError::InvalidPinSize);
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts);
        }
        Ok(())
    }

    /// Capability query consulted by the lock state machine at transition
    /// time: may an unlock result from a sensor of this class be accepted?
    pub fn biometric_allowed(&self, strength: BiometricStrength) -> bool {
        match strength {
            BiometricStrength::Strong => self.strong_biometrics_enabled,
            BiometricStrength::Weak => self.weak_biometrics_enabled,
        }
    }
}
