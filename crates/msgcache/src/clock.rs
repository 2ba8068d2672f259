//! Wall-clock source used to stamp cache accesses

/// Millisecond clock
pub trait Clock: Send {
    /// Current time in milliseconds since the Unix epoch
    fn now_millis(&self) -> i64;
}

/// System wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}
