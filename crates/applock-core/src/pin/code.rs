use std::fmt;

use zeroize::Zeroize;

use crate::config::LockScreenConfig;

/// Reasons a candidate PIN is rejected before storage or crypto is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PinFormatError {
    #[error("pin must be exactly {expected} digits")]
    WrongLength { expected: usize },

    #[error("pin contains non-digit characters")]
    NotNumeric,

    #[error("pin is too easy to guess")]
    Forbidden,
}

/// A candidate or freshly configured PIN string.
///
/// Same hygiene as the sensitive strings elsewhere in the app:
/// - not `Clone`
/// - not `Serialize` / `Deserialize`
/// - `Debug` / `Display` never print the digits
/// - zeroed on drop
pub struct PinCode {
    inner: String,
}

impl PinCode {
    pub fn new(value: String) -> Self {
        Self { inner: value }
    }

    /// Borrow the digits. Only the verification path should call this.
    pub fn expose(&self) -> &str {
        &self.inner
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.inner.as_bytes()
    }

    /// Check length, charset, and the forbidden list against `config`.
    pub fn check_format(&self, config: &LockScreenConfig) -> Result<(), PinFormatError> {
        if self.inner.chars().count() != config.pin_size {
            return Err(PinFormatError::WrongLength {
                expected: config.pin_size,
            });
        }
        if !self.inner.chars().all(|c| c.is_ascii_digit()) {
            return Err(PinFormatError::NotNumeric);
        }
        if config.forbidden_pin_codes.contains(&self.inner) {
            return Err(PinFormatError::Forbidden);
        }
        Ok(())
    }
}

impl From<&str> for PinCode {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl fmt::Debug for PinCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PinCode([REDACTED])")
    }
}

impl fmt::Display for PinCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Drop for PinCode {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}
