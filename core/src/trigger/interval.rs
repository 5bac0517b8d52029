use crate::clock::{SystemClock, TriggerClock};
use crate::errors::TriggerError;
use crate::trigger::{StartDate, TaskTrigger, ZoneSpec, select_timezone};
use crate::utils;
use chrono::{DateTime, TimeDelta};
use chrono_tz::Tz;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;
use tracing::debug;
use typed_builder::TypedBuilder;

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: i64 = 24 * SECONDS_PER_HOUR;
const SECONDS_PER_WEEK: i64 = 7 * SECONDS_PER_DAY;

/// [`IntervalTriggerConfig`] holds the raw configuration of an [`IntervalTrigger`], it is
/// built via [`IntervalTriggerConfig::builder`] and turned into a trigger by
/// [`IntervalTrigger::new`] (or ``TryFrom``)
///
/// The duration components are summed into a single period, a period that is not positive
/// is raised to one second
///
/// # Examples
/// ```ignore
/// use chronotrigger::trigger::{IntervalTrigger, IntervalTriggerConfig};
///
/// // Every 1 day and 2 hours, counted from the start date
/// let trigger = IntervalTrigger::new(
///     IntervalTriggerConfig::builder()
///         .days(1)
///         .hours(2)
///         .start_date("2024-01-01 00:00:00")
///         .timezone("UTC")
///         .build(),
/// )?;
/// ```
#[derive(TypedBuilder, Debug, Clone)]
pub struct IntervalTriggerConfig {
    #[builder(default)]
    pub weeks: i64,

    #[builder(default)]
    pub days: i64,

    #[builder(default)]
    pub hours: i64,

    #[builder(default)]
    pub minutes: i64,

    #[builder(default)]
    pub seconds: i64,

    /// Anchor of the period, defaults to one period after the current time of ``clock``
    #[builder(default, setter(strip_option, into))]
    pub start_date: Option<StartDate>,

    /// Latest possible date / time to fire on
    #[builder(default, setter(strip_option, into))]
    pub end_date: Option<StartDate>,

    #[builder(default, setter(strip_option, into))]
    pub timezone: Option<ZoneSpec>,

    #[builder(default = Arc::new(SystemClock) as Arc<dyn TriggerClock>)]
    pub clock: Arc<dyn TriggerClock>,
}

/// [`IntervalTrigger`] is a straightforward implementation of the [`TaskTrigger`] trait that
/// fires every fixed period, counted from an anchor (its start date). Fire times are computed
/// by arithmetic on absolute instants, so a daylight saving transition never makes the
/// trigger drift, the result is merely expressed in the trigger's zone
///
/// Fire times are inclusive, asking with an instant that is exactly ``anchor + k * period``
/// returns that very instant
///
/// # Constructor(s)
/// [`IntervalTrigger::new`] from an [`IntervalTriggerConfig`]
///
/// # Trait Implementation(s)
/// Apart from [`TaskTrigger`], it implements [`Display`] (``interval[1 day, 2:00:00]``),
/// [`Debug`], [`Clone`], [`PartialEq`] and [`Eq`]
///
/// # See Also
/// - [`IntervalTriggerConfig`]
/// - [`TaskTrigger`]
#[derive(Clone, PartialEq, Eq)]
pub struct IntervalTrigger {
    interval: TimeDelta,
    interval_length: i64,
    start_date: DateTime<Tz>,
    end_date: Option<DateTime<Tz>>,
    timezone: Tz,
}

fn interval_seconds(config: &IntervalTriggerConfig) -> Option<i64> {
    [
        (config.weeks, SECONDS_PER_WEEK),
        (config.days, SECONDS_PER_DAY),
        (config.hours, SECONDS_PER_HOUR),
        (config.minutes, SECONDS_PER_MINUTE),
        (config.seconds, 1),
    ]
    .into_iter()
    .try_fold(0i64, |total, (amount, unit)| {
        total.checked_add(amount.checked_mul(unit)?)
    })
}

impl IntervalTrigger {
    pub fn new(config: IntervalTriggerConfig) -> Result<Self, TriggerError> {
        let interval_length = interval_seconds(&config)
            .ok_or(TriggerError::IntervalOutOfRange)?
            .max(1);
        let interval =
            TimeDelta::try_seconds(interval_length).ok_or(TriggerError::IntervalOutOfRange)?;

        let timezone = select_timezone(
            config.timezone.as_ref(),
            config.start_date.as_ref(),
            config.clock.as_ref(),
        )?;
        let start_date = match &config.start_date {
            Some(start_date) => start_date.resolve(&timezone)?,
            None => config
                .clock
                .now()
                .checked_add_signed(interval)
                .ok_or(TriggerError::IntervalOutOfRange)?
                .with_timezone(&timezone),
        };
        let end_date = config
            .end_date
            .as_ref()
            .map(|date| date.resolve(&timezone))
            .transpose()?;

        let trigger = Self {
            interval,
            interval_length,
            start_date,
            end_date,
            timezone,
        };
        debug!(trigger = ?trigger, "interval trigger constructed");
        Ok(trigger)
    }

    pub fn interval(&self) -> TimeDelta {
        self.interval
    }

    /// Length of the period in seconds, always at least one
    pub fn interval_length(&self) -> i64 {
        self.interval_length
    }

    pub fn start_date(&self) -> DateTime<Tz> {
        self.start_date
    }

    pub fn end_date(&self) -> Option<DateTime<Tz>> {
        self.end_date
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }
}

impl TryFrom<IntervalTriggerConfig> for IntervalTrigger {
    type Error = TriggerError;

    fn try_from(value: IntervalTriggerConfig) -> Result<Self, Self::Error> {
        IntervalTrigger::new(value)
    }
}

impl TaskTrigger for IntervalTrigger {
    fn next_fire_time(&self, not_before: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        let fire_time = if *not_before < self.start_date {
            self.start_date
        } else {
            let elapsed = *not_before - self.start_date;
            let seconds = elapsed.num_seconds();

            // Round up, an instant right on a period boundary is due at that boundary
            let mut periods = seconds / self.interval_length;
            if seconds % self.interval_length != 0 || elapsed.subsec_nanos() > 0 {
                periods += 1;
            }

            let offset = TimeDelta::try_seconds(periods.checked_mul(self.interval_length)?)?;
            self.start_date
                .checked_add_signed(offset)?
                .with_timezone(&self.timezone)
        };

        match self.end_date {
            Some(end_date) if fire_time > end_date => None,
            _ => Some(fire_time),
        }
    }
}

impl Display for IntervalTrigger {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "interval[{}]", utils::format_seconds(self.interval_length))
    }
}

impl Debug for IntervalTrigger {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<IntervalTrigger (interval={}, start_date='{}', timezone='{}')>",
            utils::format_seconds(self.interval_length),
            utils::datetime_repr(&self.start_date),
            self.timezone.name()
        )
    }
}
