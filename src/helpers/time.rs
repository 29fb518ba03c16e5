use chrono::Utc;

/// Injectable wall clock. Expiry decisions go through this trait so tests
/// can simulate a token about to expire without waiting in real time.
pub trait Clock: Send + Sync {
    /// Current time as UNIX seconds.
    fn now_unix(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        now_i64()
    }
}

pub fn now_i64() -> i64 {
    Utc::now().timestamp()
}
