use std::ops::Add;
use std::{
    sync::RwLock,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

/// Source of wall-clock time.
///
/// Audit timestamps go through this trait so tests can pin them.
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;

    /// Milliseconds since the Unix epoch, or `None` if the clock reads a
    /// time before the epoch.
    fn now_millis(&self) -> Option<u64> {
        self.now()
            .duration_since(UNIX_EPOCH)
            .ok()
            .and_then(|d| u64::try_from(d.as_millis()).ok())
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

#[derive(Debug)]
pub struct MockClock {
    now: RwLock<SystemTime>,
}

impl Clock for MockClock {
    fn now(&self) -> SystemTime {
        *self.now.read().unwrap()
    }
}

impl MockClock {
    pub fn with_time(time: SystemTime) -> Self {
        Self {
            now: RwLock::new(time),
        }
    }

    /// A clock pinned at `millis` milliseconds after the Unix epoch.
    pub fn at_millis(millis: u64) -> Self {
        Self::with_time(UNIX_EPOCH + Duration::from_millis(millis))
    }

    pub fn new() -> Self {
        Self::with_time(SystemTime::now())
    }

    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.write().unwrap();
        *now = now.add(duration);
    }

    pub fn set_time(&self, time: SystemTime) {
        *self.now.write().unwrap() = time;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_report_millis_since_epoch() {
        // given
        let clock = MockClock::at_millis(1_700_000_000_000);

        // when
        clock.advance(Duration::from_millis(250));

        // then
        assert_eq!(clock.now_millis(), Some(1_700_000_000_250));
    }

    #[test]
    fn should_return_none_before_epoch() {
        let clock = MockClock::with_time(UNIX_EPOCH - Duration::from_secs(1));
        assert_eq!(clock.now_millis(), None);
    }
}
