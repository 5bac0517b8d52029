pub mod cron; // skipcq: RS-D1001

pub mod interval; // skipcq: RS-D1001

pub use crate::trigger::cron::field::{CalendarField, FieldKind, FieldValue};
pub use crate::trigger::cron::{CronTrigger, CronTriggerConfig};
pub use crate::trigger::interval::{IntervalTrigger, IntervalTriggerConfig};

use crate::errors::TriggerError;
use crate::utils;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use chrono_tz::Tz;
use std::fmt::{Debug, Display};
use std::ops::Deref;

/// The [`TaskTrigger`] trait is used to calculate the next point of time, given a time instance,
/// at which a recurring job should fire. It is the only contract an owning scheduler needs
/// to know about, both [`CronTrigger`] and [`IntervalTrigger`] implement it
///
/// # Required Method(s)
/// If one wants to implement this trait, they must provide an implementation for the
/// [`TaskTrigger::next_fire_time`] method used to calculate the next available time
///
/// # Rendering
/// Every trigger renders a short description via [`Display`] (such as ``cron[hour='5']``)
/// and a fuller diagnostic string via [`Debug`], these are meant for logging
///
/// This trait is also implemented for any type implementing ``Deref`` where the target is ``T`` which
/// itself is an implementation of the [`TaskTrigger`] trait, making it relatively easy to store both
/// owned and non-owned values
///
/// # Object Safety
/// This trait is object safe to use, ``Box<dyn TaskTrigger>`` can be used to mix both trigger kinds
///
/// # See Also
/// - [`CronTrigger`]
/// - [`IntervalTrigger`]
/// - [`FireTimes`]
pub trait TaskTrigger: Debug + Display + Send + Sync {
    /// Calculates the earliest fire time that is at or after ``not_before``
    ///
    /// # Arguments
    /// It accepts a ``not_before`` reference, the lower bound of the search, it may be in any zone
    ///
    /// # Returns
    /// The calculated fire time expressed in the trigger's own time zone, or ``None`` when the
    /// trigger can never fire again. The latter is a regular outcome, not an error
    fn next_fire_time(&self, not_before: &DateTime<Tz>) -> Option<DateTime<Tz>>;

    /// Iterates over successive fire times starting from ``from`` (inclusive), every item is
    /// strictly later than the previous one
    ///
    /// # See Also
    /// - [`FireTimes`]
    fn fire_times(&self, from: &DateTime<Tz>) -> FireTimes<'_>
    where
        Self: Sized,
    {
        FireTimes::new(self, from)
    }
}

impl<T> TaskTrigger for T
where
    T: Deref + Send + Sync + Debug + Display,
    T::Target: TaskTrigger,
{
    fn next_fire_time(&self, not_before: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        self.deref().next_fire_time(not_before)
    }
}

/// [`FireTimes`] is an iterator over the successive fire times of a [`TaskTrigger`]. After
/// yielding a fire time, it asks the trigger for the next fire time one microsecond later,
/// which rounds up to the next whole second, so the same instant is never yielded twice
///
/// The iterator ends once the trigger reports that it can no longer fire
pub struct FireTimes<'a> {
    trigger: &'a dyn TaskTrigger,
    next: Option<DateTime<Tz>>,
}

impl<'a> FireTimes<'a> {
    pub fn new(trigger: &'a dyn TaskTrigger, from: &DateTime<Tz>) -> Self {
        Self {
            trigger,
            next: trigger.next_fire_time(from),
        }
    }
}

impl Iterator for FireTimes<'_> {
    type Item = DateTime<Tz>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        self.next = current
            .checked_add_signed(TimeDelta::microseconds(1))
            .and_then(|after| self.trigger.next_fire_time(&after));
        Some(current)
    }
}

/// [`StartDate`] is a configured point in time (a start or an end date of a trigger). It may
/// or may not carry a time zone, wall-clock forms are interpreted in the trigger's zone
///
/// # Constructor(s)
/// It is constructed via ``From`` from [`DateTime<Tz>`], [`DateTime<Utc>`],
/// [`DateTime<FixedOffset>`], [`NaiveDateTime`], [`NaiveDate`] or a textual date
/// (``&str`` / ``String``) in RFC 3339, ``YYYY-MM-DD HH:MM:SS[.ffffff]`` or ``YYYY-MM-DD`` form
#[derive(Debug, Clone, PartialEq)]
pub enum StartDate {
    Zoned(DateTime<Tz>),
    Fixed(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
    Text(String),
}

impl StartDate {
    /// The time zone carried by this date, only zoned dates carry one
    pub fn zone(&self) -> Option<Tz> {
        match self {
            StartDate::Zoned(date) => Some(date.timezone()),
            _ => None,
        }
    }

    pub(crate) fn resolve(&self, timezone: &Tz) -> Result<DateTime<Tz>, TriggerError> {
        match self {
            StartDate::Zoned(date) => Ok(date.with_timezone(timezone)),
            StartDate::Fixed(date) => Ok(date.with_timezone(timezone)),
            StartDate::Naive(naive) => utils::localize(timezone, naive)
                .ok_or_else(|| TriggerError::InvalidDate(naive.to_string())),
            StartDate::Text(text) => utils::parse_datetime(text, timezone),
        }
    }
}

impl From<DateTime<Tz>> for StartDate {
    fn from(value: DateTime<Tz>) -> Self {
        StartDate::Zoned(value)
    }
}

impl From<DateTime<Utc>> for StartDate {
    fn from(value: DateTime<Utc>) -> Self {
        StartDate::Zoned(value.with_timezone(&Tz::UTC))
    }
}

impl From<DateTime<FixedOffset>> for StartDate {
    fn from(value: DateTime<FixedOffset>) -> Self {
        StartDate::Fixed(value)
    }
}

impl From<NaiveDateTime> for StartDate {
    fn from(value: NaiveDateTime) -> Self {
        StartDate::Naive(value)
    }
}

impl From<NaiveDate> for StartDate {
    fn from(value: NaiveDate) -> Self {
        StartDate::Naive(value.and_time(chrono::NaiveTime::MIN))
    }
}

impl From<&str> for StartDate {
    fn from(value: &str) -> Self {
        StartDate::Text(value.to_owned())
    }
}

impl From<String> for StartDate {
    fn from(value: String) -> Self {
        StartDate::Text(value)
    }
}

/// [`ZoneSpec`] is a configured time zone, either already resolved or as an IANA name
/// (resolved, and validated, when the trigger gets constructed)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneSpec {
    Zone(Tz),
    Name(String),
}

impl ZoneSpec {
    pub fn resolve(&self) -> Result<Tz, TriggerError> {
        match self {
            ZoneSpec::Zone(zone) => Ok(*zone),
            ZoneSpec::Name(name) => utils::resolve_timezone(name),
        }
    }
}

impl From<Tz> for ZoneSpec {
    fn from(value: Tz) -> Self {
        ZoneSpec::Zone(value)
    }
}

impl From<&str> for ZoneSpec {
    fn from(value: &str) -> Self {
        ZoneSpec::Name(value.to_owned())
    }
}

impl From<String> for ZoneSpec {
    fn from(value: String) -> Self {
        ZoneSpec::Name(value)
    }
}

/// Picks the zone of a trigger: the configured one, else the zone carried by the start
/// date, else the host zone reported by the clock
pub(crate) fn select_timezone(
    configured: Option<&ZoneSpec>,
    start_date: Option<&StartDate>,
    clock: &dyn crate::clock::TriggerClock,
) -> Result<Tz, TriggerError> {
    match (configured, start_date.and_then(StartDate::zone)) {
        (Some(zone), _) => zone.resolve(),
        (None, Some(zone)) => Ok(zone),
        (None, None) => Ok(clock.local_zone()),
    }
}
