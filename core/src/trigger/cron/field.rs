use crate::errors::TriggerError;
use crate::trigger::cron::expression::Expression;
use crate::utils::{days_in_month, iso_weeks_in_year};
use chrono::{Datelike, NaiveDateTime, Timelike};
use std::fmt::{Display, Formatter};

#[allow(unused_imports)]
use crate::trigger::CronTrigger;

/// [`FieldKind`] represents the calendar unit a [`CalendarField`] constrains, by itself
/// it doesn't hold any data. The variants are declared in significance order, which is the
/// order [`CronTrigger`] walks them in
///
/// # Real and virtual kinds
/// Year, month, day, hour, minute and second are *real*, a date can be built directly from
/// them. Week (ISO week of the year) and day of week (Monday = 0) are *virtual*, they only
/// filter days and are never written into a date
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldKind {
    Year,
    Month,
    Day,
    Week,
    DayOfWeek,
    Hour,
    Minute,
    Second,
}

impl FieldKind {
    pub const ALL: [FieldKind; 8] = [
        FieldKind::Year,
        FieldKind::Month,
        FieldKind::Day,
        FieldKind::Week,
        FieldKind::DayOfWeek,
        FieldKind::Hour,
        FieldKind::Minute,
        FieldKind::Second,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FieldKind::Year => "year",
            FieldKind::Month => "month",
            FieldKind::Day => "day",
            FieldKind::Week => "week",
            FieldKind::DayOfWeek => "day_of_week",
            FieldKind::Hour => "hour",
            FieldKind::Minute => "minute",
            FieldKind::Second => "second",
        }
    }

    pub fn is_real(self) -> bool {
        !matches!(self, FieldKind::Week | FieldKind::DayOfWeek)
    }

    /// The natural ``(min, max)`` domain of the field, literals outside of it are rejected
    pub fn domain(self) -> (u32, u32) {
        match self {
            FieldKind::Year => (1970, 9999),
            FieldKind::Month => (1, 12),
            FieldKind::Day => (1, 31),
            FieldKind::Week => (1, 53),
            FieldKind::DayOfWeek => (0, 6),
            FieldKind::Hour => (0, 23),
            FieldKind::Minute | FieldKind::Second => (0, 59),
        }
    }

    /// Expression given to fields below the least significant configured one
    pub(crate) fn baseline(self) -> &'static str {
        match self {
            FieldKind::Year | FieldKind::Week | FieldKind::DayOfWeek => "*",
            FieldKind::Month | FieldKind::Day => "1",
            FieldKind::Hour | FieldKind::Minute | FieldKind::Second => "0",
        }
    }

    pub fn value_at(self, date: &NaiveDateTime) -> u32 {
        match self {
            FieldKind::Year => u32::try_from(date.year()).unwrap_or(0),
            FieldKind::Month => date.month(),
            FieldKind::Day => date.day(),
            FieldKind::Week => date.iso_week().week(),
            FieldKind::DayOfWeek => date.weekday().num_days_from_monday(),
            FieldKind::Hour => date.hour(),
            FieldKind::Minute => date.minute(),
            FieldKind::Second => date.second(),
        }
    }

    pub fn min_value(self, _date: &NaiveDateTime) -> u32 {
        self.domain().0
    }

    /// Upper bound of the field in the context of ``date``. The last day depends on the month
    /// (and leap years), the last week on the ISO year ``date`` belongs to
    pub fn max_value(self, date: &NaiveDateTime) -> u32 {
        match self {
            FieldKind::Day => days_in_month(date.year(), date.month()),
            FieldKind::Week => iso_weeks_in_year(date.iso_week().year()),
            other => other.domain().1,
        }
    }
}

impl Display for FieldKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// [`FieldValue`] is the raw configuration of one field, either a textual expression or an
/// integer literal. It is validated once the owning trigger gets constructed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValue(String);

impl FieldValue {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self(value)
    }
}

macro_rules! integer_from_impl {
    ($val: ty) => {
        impl From<$val> for FieldValue {
            fn from(value: $val) -> Self {
                Self(value.to_string())
            }
        }
    };
}

integer_from_impl!(i32);
integer_from_impl!(u32);
integer_from_impl!(i64);
integer_from_impl!(u64);

/// [`CalendarField`] is one constrained calendar unit of a [`CronTrigger`], it pairs a
/// [`FieldKind`] with the parsed terms of its expression and answers the queries the search
/// is made of:
/// - [`CalendarField::value_at`] the current value of the field in a date
/// - [`CalendarField::min_value`] / [`CalendarField::max_value`] the bounds of the field,
///   which may depend on the date (days of February, weeks of an ISO year)
/// - [`CalendarField::next_value_at_or_after`] the smallest matching value that is not lower
///   than the current one
///
/// # Constructor(s)
/// [`CalendarField::new`] parses the expression, malformed or out of range expressions are
/// reported there rather than while searching
///
/// # See Also
/// - [`FieldKind`]
/// - [`CronTrigger`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarField {
    kind: FieldKind,
    expressions: Vec<Expression>,
    source: String,
    is_default: bool,
}

impl CalendarField {
    pub fn new(kind: FieldKind, expression: &str, is_default: bool) -> Result<Self, TriggerError> {
        let expressions = Expression::parse_list(kind, expression)?;
        Ok(Self {
            kind,
            expressions,
            source: expression.trim().to_owned(),
            is_default,
        })
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn is_real(&self) -> bool {
        self.kind.is_real()
    }

    /// Whether the expression was filled in rather than configured
    pub fn is_default(&self) -> bool {
        self.is_default
    }

    pub fn expressions(&self) -> &[Expression] {
        &self.expressions
    }

    pub fn value_at(&self, date: &NaiveDateTime) -> u32 {
        self.kind.value_at(date)
    }

    pub fn min_value(&self, date: &NaiveDateTime) -> u32 {
        self.kind.min_value(date)
    }

    pub fn max_value(&self, date: &NaiveDateTime) -> u32 {
        self.kind.max_value(date)
    }

    pub fn next_value_at_or_after(&self, date: &NaiveDateTime) -> Option<u32> {
        self.expressions
            .iter()
            .filter_map(|expression| expression.next_value(date, self.kind))
            .min()
    }

    /// Whether the current value of the field in ``date`` is matched by the expression
    pub fn matches(&self, date: &NaiveDateTime) -> bool {
        self.next_value_at_or_after(date) == Some(self.value_at(date))
    }
}

impl Display for CalendarField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}
