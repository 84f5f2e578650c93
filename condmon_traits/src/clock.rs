use std::time::Instant;

use chrono::{Local, NaiveDateTime};

/// Wall-clock abstraction used to timestamp measurements.
///
/// Timestamps are naive local time because the process log they are
/// correlated with is written in local time without an offset. Durations
/// are measured on `instant()`, which never jumps with DST or clock steps.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;

    fn instant(&self) -> Instant;
}

/// Real local-time clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    #[inline]
    fn instant(&self) -> Instant {
        Instant::now()
    }
}

impl<C: Clock + ?Sized> Clock for Box<C> {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }

    fn instant(&self) -> Instant {
        (**self).instant()
    }
}

#[cfg(any(test, feature = "test-clock"))]
pub mod test_clock {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Deterministic clock whose time only moves when advanced.
    ///
    /// now() = origin + offset + wall shift
    /// instant() = base + offset
    #[derive(Debug, Clone)]
    pub struct TestClock {
        origin: NaiveDateTime,
        base: Instant,
        offset: Arc<Mutex<Duration>>,
        shift: Arc<Mutex<chrono::Duration>>,
    }

    impl TestClock {
        pub fn starting_at(origin: NaiveDateTime) -> Self {
            Self {
                origin,
                base: Instant::now(),
                offset: Arc::new(Mutex::new(Duration::ZERO)),
                shift: Arc::new(Mutex::new(chrono::Duration::zero())),
            }
        }

        /// Step the wall clock only, as a DST change or NTP correction would.
        pub fn shift_wall(&self, d: chrono::Duration) {
            if let Ok(mut shift) = self.shift.lock() {
                *shift = *shift + d;
            }
        }

        /// Advance the clock by the given duration.
        pub fn advance(&self, d: Duration) {
            if let Ok(mut off) = self.offset.lock() {
                *off = off.saturating_add(d);
            }
        }

        pub fn advance_minutes(&self, minutes: u64) {
            self.advance(Duration::from_secs(minutes * 60));
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> NaiveDateTime {
            let off = self.offset.lock().map(|g| *g).unwrap_or(Duration::ZERO);
            let off = chrono::Duration::from_std(off).unwrap_or(chrono::Duration::zero());
            let shift = self
                .shift
                .lock()
                .map(|g| *g)
                .unwrap_or(chrono::Duration::zero());
            self.origin + off + shift
        }

        fn instant(&self) -> Instant {
            let off = self.offset.lock().map(|g| *g).unwrap_or(Duration::ZERO);
            self.base + off
        }
    }
}
