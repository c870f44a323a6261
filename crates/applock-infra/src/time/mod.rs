use std::time::Instant;

use applock_core::ports::ClockPort;

/// Production clock: `Instant` is monotonic by construction, which is the
/// whole point — wall-clock adjustments must never shrink or stretch the
/// grace period.
pub struct MonotonicClock;

impl ClockPort for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
