use crate::clock::TriggerClock;
use chrono::{DateTime, TimeDelta, Utc};
use chrono_tz::Tz;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicI64, Ordering};

#[allow(unused_imports)]
use crate::clock::SystemClock;

/// [`VirtualClock`] is an implementation of the [`TriggerClock`] trait, it acts as a mock object,
/// pinning both the current time and the host time zone. This makes trigger construction
/// deterministic, which is mostly useful for unit tests
///
/// Unlike [`SystemClock`], this clock doesn't move forward, rather it needs explicit
/// calls to [`VirtualClock::advance`] or [`VirtualClock::advance_to`]
///
/// # Constructor(s)
/// When constructing a [`VirtualClock`], one can use a variety of constructor methods, those being:
/// - [`VirtualClock::new`] For creating one based on an initial time
/// - [`VirtualClock::from_epoch`] For creating one at the [UNIX Epoch](https://en.wikipedia.org/wiki/Unix_time)
///
/// Both require the time zone the clock reports as the host's zone
///
/// # See Also
/// - [`SystemClock`]
/// - [`TriggerClock`]
pub struct VirtualClock {
    current_time: AtomicI64,
    zone: Tz,
}

impl VirtualClock {
    pub fn new(initial_time: DateTime<Utc>, zone: Tz) -> Self {
        Self {
            current_time: AtomicI64::new(initial_time.timestamp_micros()),
            zone,
        }
    }

    pub fn from_epoch(zone: Tz) -> Self {
        Self::new(DateTime::<Utc>::UNIX_EPOCH, zone)
    }

    /// Advance the time by a specified delta forward
    pub fn advance(&self, delta: TimeDelta) {
        let micros = delta.num_microseconds().unwrap_or(if delta < TimeDelta::zero() {
            i64::MIN
        } else {
            i64::MAX
        });
        let _ = self
            .current_time
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                Some(current.saturating_add(micros))
            });
    }

    /// Advance the time to a specified point of time
    pub fn advance_to(&self, to: DateTime<Utc>) {
        self.current_time
            .store(to.timestamp_micros(), Ordering::Relaxed);
    }
}

impl Debug for VirtualClock {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualClock")
            .field("current_time", &self.now())
            .field("zone", &self.zone)
            .finish()
    }
}

impl TriggerClock for VirtualClock {
    fn now(&self) -> DateTime<Utc> {
        let micros = self.current_time.load(Ordering::Relaxed);
        DateTime::from_timestamp_micros(micros).unwrap_or(if micros < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        })
    }

    fn local_zone(&self) -> Tz {
        self.zone
    }
}
