pub mod system_clock;
pub mod virtual_clock;

use std::fmt::Debug;
use std::ops::Deref;
pub use system_clock::SystemClock;
pub use virtual_clock::VirtualClock;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

#[allow(unused_imports)]
use crate::trigger::{CronTrigger, IntervalTrigger};

/// [`TriggerClock`] is the single point through which triggers query their environment, i.e.
/// the current time and the time zone of the host. Triggers only consult it while being
/// constructed (to pick a zone when none is configured, or to anchor an
/// [`IntervalTrigger`] without a start date), fire time computations never touch it
///
/// # Required Methods
/// When implementing the [`TriggerClock`], one must provide implementations for two methods, those
/// being [`TriggerClock::now`] and [`TriggerClock::local_zone`]
///
/// # Trait Implementation(s)
/// Specifically, there are 2 noteworthy implementations to list, those being:
///
/// - [`SystemClock`] the default go-to clock, it reads the system time and the host's configured
///   time zone
///
/// - [`VirtualClock`] used to pin both the time and the zone (for unit-tests, reproducible
///   simulations... etc.), it doesn't go forward without explicit advancing
///
/// # See Also
/// - [`SystemClock`]
/// - [`VirtualClock`]
/// - [`CronTrigger`]
/// - [`IntervalTrigger`]
pub trait TriggerClock: Debug + Send + Sync {
    /// Gets the current time of the clock
    fn now(&self) -> DateTime<Utc>;

    /// Gets the time zone used by triggers which were configured without one
    fn local_zone(&self) -> Tz;
}

impl<T> TriggerClock for T
where
    T: Deref + Send + Sync + Debug,
    T::Target: TriggerClock,
{
    fn now(&self) -> DateTime<Utc> {
        self.deref().now()
    }

    fn local_zone(&self) -> Tz {
        self.deref().local_zone()
    }
}
