pub mod expression; // skipcq: RS-D1001

pub mod field; // skipcq: RS-D1001

use crate::clock::{SystemClock, TriggerClock};
use crate::errors::TriggerError;
use crate::trigger::cron::field::{CalendarField, FieldKind, FieldValue};
use crate::trigger::{StartDate, TaskTrigger, ZoneSpec, select_timezone};
use crate::utils;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use chrono_tz::Tz;
use std::cmp::Ordering;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;
use tracing::{debug, trace};
use typed_builder::TypedBuilder;

/// [`CronTriggerConfig`] holds the raw configuration of a [`CronTrigger`], it is built via
/// [`CronTriggerConfig::builder`] and turned into a trigger by [`CronTrigger::new`]
/// (or ``TryFrom``), which is where everything gets validated
///
/// Every field expression is optional. Fields more significant than the least significant
/// configured field, that were not configured themselves, match anything, fields below it
/// get pinned to their lowest value, so ``hour(5)`` alone fires daily at 05:00:00
///
/// # Examples
/// ```ignore
/// use chronotrigger::trigger::{CronTrigger, CronTriggerConfig};
///
/// // Every weekday at 08:30:00 in Berlin
/// let trigger = CronTrigger::new(
///     CronTriggerConfig::builder()
///         .day_of_week("mon-fri")
///         .hour(8)
///         .minute(30)
///         .timezone("Europe/Berlin")
///         .build(),
/// )?;
/// ```
#[derive(TypedBuilder, Debug, Clone)]
pub struct CronTriggerConfig {
    /// Year to fire on (1970-9999)
    #[builder(default, setter(strip_option, into))]
    pub year: Option<FieldValue>,

    /// Month to fire on (1-12 or ``jan``-``dec``)
    #[builder(default, setter(strip_option, into))]
    pub month: Option<FieldValue>,

    /// Day of the month to fire on (1-31, ``last``, ``2nd tue``, ``last fri``)
    #[builder(default, setter(strip_option, into))]
    pub day: Option<FieldValue>,

    /// ISO week of the year to fire on (1-53)
    #[builder(default, setter(strip_option, into))]
    pub week: Option<FieldValue>,

    /// Weekday to fire on (0-6 where 0 is Monday, or ``mon``-``sun``)
    #[builder(default, setter(strip_option, into))]
    pub day_of_week: Option<FieldValue>,

    #[builder(default, setter(strip_option, into))]
    pub hour: Option<FieldValue>,

    #[builder(default, setter(strip_option, into))]
    pub minute: Option<FieldValue>,

    #[builder(default, setter(strip_option, into))]
    pub second: Option<FieldValue>,

    /// Earliest possible date / time to fire on
    #[builder(default, setter(strip_option, into))]
    pub start_date: Option<StartDate>,

    /// Latest possible date / time to fire on
    #[builder(default, setter(strip_option, into))]
    pub end_date: Option<StartDate>,

    /// Zone the fields are evaluated in. Falls back to the zone of ``start_date`` and then
    /// to the host zone reported by ``clock``
    #[builder(default, setter(strip_option, into))]
    pub timezone: Option<ZoneSpec>,

    #[builder(default = Arc::new(SystemClock) as Arc<dyn TriggerClock>)]
    pub clock: Arc<dyn TriggerClock>,
}

/// [`CronTrigger`] is an implementation of the [`TaskTrigger`] trait which fires when the
/// current time matches every one of its eight [`CalendarField`] simultaneously, emulating
/// the UNIX cron scheduler (with second precision, years and ISO weeks)
///
/// # Search
/// The fields are walked from the most significant (year) to the least significant (second).
/// A field whose current value matches moves the walk forward, a field with a later
/// matching value rewrites the date (real fields) or bumps the day (virtual fields), and a
/// field without any matching value carries into the previous real field, resetting every
/// less significant field to its minimum, exactly like carrying a digit. When the carry would
/// go past the year, the trigger can never fire again
///
/// # Constructor(s)
/// - [`CronTrigger::new`] from a [`CronTriggerConfig`]
/// - [`CronTrigger::from_crontab`] from a standard five-field crontab line
///
/// # Trait Implementation(s)
/// Apart from [`TaskTrigger`], it implements [`Display`] (``cron[hour='5']``), [`Debug`]
/// (``<CronTrigger (hour='5', start_date='...')>``) and [`Clone`]
///
/// # See Also
/// - [`CalendarField`]
/// - [`CronTriggerConfig`]
/// - [`TaskTrigger`]
#[derive(Clone)]
pub struct CronTrigger {
    fields: Vec<CalendarField>,
    timezone: Tz,
    start_date: Option<DateTime<Tz>>,
    end_date: Option<DateTime<Tz>>,
}

// The real fields of a date under construction
#[derive(Clone, Copy)]
struct DateParts {
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
}

impl DateParts {
    fn set(&mut self, kind: FieldKind, value: u32) {
        match kind {
            FieldKind::Year => self.year = i32::try_from(value).unwrap_or(i32::MAX),
            FieldKind::Month => self.month = value,
            FieldKind::Day => self.day = value,
            FieldKind::Hour => self.hour = value,
            FieldKind::Minute => self.minute = value,
            FieldKind::Second => self.second = value,
            FieldKind::Week | FieldKind::DayOfWeek => {}
        }
    }

    fn build(self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)?.and_hms_opt(
            self.hour,
            self.minute,
            self.second,
        )
    }
}

impl CronTrigger {
    pub fn new(config: CronTriggerConfig) -> Result<Self, TriggerError> {
        let timezone = select_timezone(
            config.timezone.as_ref(),
            config.start_date.as_ref(),
            config.clock.as_ref(),
        )?;
        let start_date = config
            .start_date
            .as_ref()
            .map(|date| date.resolve(&timezone))
            .transpose()?;
        let end_date = config
            .end_date
            .as_ref()
            .map(|date| date.resolve(&timezone))
            .transpose()?;

        let values = [
            config.year,
            config.month,
            config.day,
            config.week,
            config.day_of_week,
            config.hour,
            config.minute,
            config.second,
        ];
        let last_configured = values.iter().rposition(Option::is_some);

        let fields = FieldKind::ALL
            .into_iter()
            .zip(values)
            .enumerate()
            .map(|(index, (kind, value))| match value {
                Some(value) => CalendarField::new(kind, value.as_str(), false),
                None if last_configured.is_some_and(|last| index > last) => {
                    CalendarField::new(kind, kind.baseline(), true)
                }
                None => CalendarField::new(kind, "*", true),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let trigger = Self {
            fields,
            timezone,
            start_date,
            end_date,
        };
        debug!(trigger = ?trigger, "cron trigger constructed");
        Ok(trigger)
    }

    /// Creates a [`CronTrigger`] from a standard crontab line, those being five
    /// whitespace-separated fields ``minute hour day month day_of_week``. The seconds are
    /// pinned to zero
    ///
    /// # Weekday numbering
    /// Numeric weekdays follow the 0 = Monday convention of ``day_of_week``, unlike classic
    /// crontab where 0 (and 7) is Sunday. Weekday names are unambiguous and preferable:
    /// ```ignore
    /// use chronotrigger::CronTrigger;
    ///
    /// // Sundays at 04:00, the crontab line `0 4 * * 0` would mean Mondays here
    /// let sundays = CronTrigger::from_crontab("0 4 * * sun", "UTC")?;
    /// let also_sundays = CronTrigger::from_crontab("0 4 * * 6", "UTC")?;
    /// ```
    pub fn from_crontab(
        expression: &str,
        timezone: impl Into<ZoneSpec>,
    ) -> Result<Self, TriggerError> {
        let parts: Vec<&str> = expression.split_whitespace().collect();
        let [minute, hour, day, month, day_of_week] = parts.as_slice() else {
            return Err(TriggerError::InvalidExpression {
                field: "crontab",
                expression: expression.to_owned(),
                reason: format!("expected 5 fields, found {}", parts.len()),
            });
        };

        Self::new(
            CronTriggerConfig::builder()
                .minute(*minute)
                .hour(*hour)
                .day(*day)
                .month(*month)
                .day_of_week(*day_of_week)
                .timezone(timezone)
                .build(),
        )
    }

    /// The eight fields in significance order (year down to second)
    pub fn fields(&self) -> &[CalendarField] {
        &self.fields
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn start_date(&self) -> Option<DateTime<Tz>> {
        self.start_date
    }

    pub fn end_date(&self) -> Option<DateTime<Tz>> {
        self.end_date
    }

    /// Rebuilds ``date`` with the field at ``target`` set to ``value``, every real field above it
    /// kept and every real field below it reset to its minimum
    fn rebuild(&self, date: &NaiveDateTime, target: usize, value: u32) -> Option<NaiveDateTime> {
        let mut parts = DateParts {
            year: 0,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
        };

        for (index, field) in self.fields.iter().enumerate() {
            if !field.is_real() {
                continue;
            }
            let part = match index.cmp(&target) {
                Ordering::Less => field.value_at(date),
                Ordering::Equal => value,
                Ordering::Greater => field.min_value(date),
            };
            parts.set(field.kind(), part);
        }

        parts.build()
    }

    /// Increments the field at ``target`` and resets every less significant field, cascading
    /// into more significant fields while the field is at its maximum. Virtual fields never
    /// absorb the increment. Returns the new date together with the index of the field that
    /// was actually incremented, ``None`` once the carry runs past the first field
    fn increment_field_value(
        &self,
        date: &NaiveDateTime,
        mut target: usize,
    ) -> Option<(NaiveDateTime, usize)> {
        loop {
            let field = &self.fields[target];
            if field.is_real() && field.value_at(date) < field.max_value(date) {
                break;
            }
            target = target.checked_sub(1)?;
        }

        let field = &self.fields[target];
        let next = self.rebuild(date, target, field.value_at(date) + 1)?;
        trace!(field = field.name(), from = %date, to = %next, "carried");
        Some((next, target))
    }

    /// Finds the earliest wall-clock time at or after ``date`` that every field matches
    fn search(&self, mut date: NaiveDateTime) -> Option<NaiveDateTime> {
        let mut index = 0;
        while index < self.fields.len() {
            let field = &self.fields[index];
            let current = field.value_at(&date);

            match field.next_value_at_or_after(&date) {
                None => {
                    (date, index) = self.increment_field_value(&date, index.checked_sub(1)?)?;
                }
                Some(next) if next > current => {
                    if field.is_real() {
                        date = self.rebuild(&date, index, next)?;
                        index += 1;
                    } else {
                        (date, index) = self.increment_field_value(&date, index)?;
                    }
                }
                Some(_) => index += 1,
            }
        }

        Some(date)
    }
}

impl TryFrom<CronTriggerConfig> for CronTrigger {
    type Error = TriggerError;

    fn try_from(value: CronTriggerConfig) -> Result<Self, Self::Error> {
        CronTrigger::new(value)
    }
}

impl TaskTrigger for CronTrigger {
    fn next_fire_time(&self, not_before: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        let not_before = match self.start_date {
            Some(start_date) if start_date > *not_before => start_date,
            _ => *not_before,
        };
        let floor = utils::datetime_ceil(&not_before).with_timezone(&self.timezone);

        let mut candidate = floor.naive_local();
        let fire_time = loop {
            let Some(found) = self.search(candidate) else {
                debug!(trigger = %self, not_before = %floor, "no fire time satisfies every field");
                return None;
            };

            match utils::localize_not_before(&self.timezone, &found, &floor) {
                Some(fire_time) => break fire_time,
                // The match falls into a gap, resume from the first existing wall-clock time
                None => candidate = utils::skip_gap(&self.timezone, &found)?,
            }
        };

        match self.end_date {
            Some(end_date) if fire_time > end_date => None,
            _ => Some(fire_time),
        }
    }
}

impl CronTrigger {
    fn configured_fields(&self) -> impl Iterator<Item = String> + '_ {
        self.fields
            .iter()
            .filter(|field| !field.is_default())
            .map(|field| format!("{}='{}'", field.name(), field))
    }
}

impl Display for CronTrigger {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let options: Vec<String> = self.configured_fields().collect();
        write!(f, "cron[{}]", options.join(", "))
    }
}

impl Debug for CronTrigger {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut options: Vec<String> = self.configured_fields().collect();
        if let Some(start_date) = &self.start_date {
            options.push(format!("start_date='{}'", utils::datetime_repr(start_date)));
        }
        if let Some(end_date) = &self.end_date {
            options.push(format!("end_date='{}'", utils::datetime_repr(end_date)));
        }
        options.push(format!("timezone='{}'", self.timezone.name()));
        write!(f, "<CronTrigger ({})>", options.join(", "))
    }
}
