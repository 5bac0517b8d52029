use crate::clock::TriggerClock;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::fmt::Debug;
use tracing::warn;

#[allow(unused_imports)]
use crate::clock::VirtualClock;

/// [`SystemClock`] is an implementation of [`TriggerClock`] trait, it is the default option
/// for triggers, unlike [`VirtualClock`], it moves forward no matter what and reports the
/// time zone the host is configured with
///
/// When the host zone cannot be determined (or it is not part of the IANA database), UTC
/// is used and a warning is emitted
///
/// # Constructor(s)
/// One can simply use the default rust's struct initialization or via [`SystemClock::default`]
/// to construct the [`SystemClock`]
///
/// # See Also
/// - [`VirtualClock`]
/// - [`TriggerClock`]
#[derive(Default, Clone, Copy)]
pub struct SystemClock;

impl Debug for SystemClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SystemClock").field(&Utc::now()).finish()
    }
}

impl TriggerClock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_zone(&self) -> Tz {
        match iana_time_zone::get_timezone() {
            Ok(name) => name.parse::<Tz>().unwrap_or_else(|_| {
                warn!(zone = %name, "host time zone is unknown to the tz database, using UTC");
                Tz::UTC
            }),
            Err(error) => {
                warn!(%error, "cannot determine the host time zone, using UTC");
                Tz::UTC
            }
        }
    }
}
