use std::time::Instant;

/// Monotonic time source for grace-period bookkeeping.
///
/// One clock feeds both the background timestamp and the foreground
/// comparison. Mixing wall and monotonic sources here silently breaks the
/// grace-period math, so the port deals in `Instant` only.
pub trait ClockPort: Send + Sync {
    fn now(&self) -> Instant;
}

#[cfg(test)]
mockall::mock! {
    pub Clock {}

    impl ClockPort for Clock {
        fn now(&self) -> Instant;
    }
}
