use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// An absolute, second-resolution timestamp.
///
/// This is the value packed into an entry's expiry field and the value a
/// [`Clock`] produces. Second resolution matches the packed wire format
/// and keeps cycle-ratio math in plain integers until it's time to compute
/// a floating-point ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AbsTime(pub u64);

impl AbsTime {
    #[inline]
    pub const fn from_secs(secs: u64) -> Self {
        AbsTime(secs)
    }

    #[inline]
    pub const fn as_secs(self) -> u64 {
        self.0
    }

    /// `self + ttl_secs`, clamped at `u64::MAX` instead of wrapping.
    #[inline]
    pub fn plus_secs(self, ttl_secs: u64) -> AbsTime {
        AbsTime(self.0.saturating_add(ttl_secs))
    }

    /// Seconds remaining until `self`, as seen from `now`; 0 if already past.
    #[inline]
    pub fn remaining_from(self, now: AbsTime) -> u64 {
        self.0.saturating_sub(now.0)
    }

    /// `self - earlier`, as a real-valued number of seconds. Negative if
    /// `earlier` is actually later than `self`.
    #[inline]
    pub fn elapsed_since(self, earlier: AbsTime) -> f64 {
        self.0 as f64 - earlier.0 as f64
    }
}

/// An injected time source.
///
/// The engine never reads the system clock directly; it goes through a
/// `Clock` so that cycle timing and expiry are deterministic under test.
pub trait Clock: Send + Sync {
    fn now(&self) -> AbsTime;
}

impl<T: Clock + ?Sized> Clock for &T {
    #[inline]
    fn now(&self) -> AbsTime {
        (**self).now()
    }
}

/// The production clock, backed by the system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> AbsTime {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        AbsTime(secs)
    }
}

/// A manually-advanced clock for deterministic tests.
///
/// This is the "simulated clock" referenced throughout the cache's testable
/// scenarios: tests construct one, hand it to the cache, and advance it
/// explicitly between operations instead of sleeping.
#[derive(Debug, Default)]
pub struct ManualClock {
    secs: AtomicU64,
}

impl ManualClock {
    pub fn new(start_secs: u64) -> Self {
        Self {
            secs: AtomicU64::new(start_secs),
        }
    }

    pub fn advance(&self, secs: u64) {
        self.secs.fetch_add(secs, Ordering::SeqCst);
    }

    pub fn set(&self, secs: u64) {
        self.secs.store(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now(&self) -> AbsTime {
        AbsTime(self.secs.load(Ordering::SeqCst))
    }
}
