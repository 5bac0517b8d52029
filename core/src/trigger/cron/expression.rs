use crate::errors::TriggerError;
use crate::trigger::cron::field::FieldKind;
use crate::utils::days_in_month;
use chrono::{Datelike, NaiveDate, NaiveDateTime};

const WEEKDAYS: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

const POSITIONS: [&str; 5] = ["1st", "2nd", "3rd", "4th", "5th"];

/// Which occurrence of a weekday within a month a [`Expression::WeekdayPosition`] targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekdayPosition {
    /// 1-based occurrence, from 1 up to 5
    Nth(u32),
    Last,
}

/// [`Expression`] is one term of a field expression, a field matches when any of its terms
/// match. Terms are separated by commas in their textual form
///
/// # Grammar
/// - ``*`` / ``*/step`` [`Expression::All`], every value of the field (strided from the minimum)
/// - ``a`` / ``a-b`` / ``a-b/step`` / ``a/step`` [`Expression::Range`], ``a/step`` runs to the
///   maximum of the field. Weekday names (``mon-fri``) are accepted on ``day_of_week`` and
///   month names (``jan-mar``) on ``month``
/// - ``last`` [`Expression::LastDayOfMonth`], on ``day`` only
/// - ``1st mon`` ... ``5th sun`` / ``last fri`` [`Expression::WeekdayPosition`], on ``day`` only
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    All {
        step: Option<u32>,
    },
    Range {
        first: u32,
        last: Option<u32>,
        step: Option<u32>,
    },
    LastDayOfMonth,
    WeekdayPosition {
        position: WeekdayPosition,
        weekday: u32,
    },
}

impl Expression {
    /// Parses a comma-separated field expression into its terms
    pub fn parse_list(kind: FieldKind, text: &str) -> Result<Vec<Expression>, TriggerError> {
        let normalized = text.trim().to_ascii_lowercase();
        normalized
            .split(',')
            .map(|term| Expression::parse(kind, term.trim(), text))
            .collect()
    }

    fn parse(kind: FieldKind, term: &str, source: &str) -> Result<Expression, TriggerError> {
        let invalid = |reason: &str| TriggerError::InvalidExpression {
            field: kind.name(),
            expression: source.to_owned(),
            reason: reason.to_owned(),
        };

        if term.is_empty() {
            return Err(invalid("empty term"));
        }

        if kind == FieldKind::Day {
            if term == "last" {
                return Ok(Expression::LastDayOfMonth);
            }

            if let Some((position, weekday)) = term.split_once(char::is_whitespace) {
                let position = match position {
                    "last" => WeekdayPosition::Last,
                    other => POSITIONS
                        .iter()
                        .position(|name| *name == other)
                        .map(|index| WeekdayPosition::Nth(index as u32 + 1))
                        .ok_or_else(|| invalid("unknown weekday position"))?,
                };
                let weekday = name_index(&WEEKDAYS, weekday.trim())
                    .ok_or_else(|| invalid("unknown weekday name"))?;
                return Ok(Expression::WeekdayPosition { position, weekday });
            }
        }

        let (body, step) = match term.split_once('/') {
            Some((body, step)) => {
                let step = step
                    .parse::<u32>()
                    .map_err(|_| invalid("step is not a number"))?;
                if step == 0 {
                    return Err(invalid("step must be at least 1"));
                }
                (body, Some(step))
            }
            None => (term, None),
        };

        if body == "*" {
            return Ok(Expression::All { step });
        }

        let (first, last) = match body.split_once('-') {
            Some((first, last)) => {
                let first = parse_value(kind, first, &invalid)?;
                let last = parse_value(kind, last, &invalid)?;
                if first > last {
                    return Err(invalid("range start is greater than its end"));
                }
                (first, Some(last))
            }
            None => {
                let first = parse_value(kind, body, &invalid)?;
                // A lone value with a step runs up to the maximum of the field
                (first, if step.is_some() { None } else { Some(first) })
            }
        };

        Ok(Expression::Range { first, last, step })
    }

    /// Smallest value matched by this term that is not lower than the field's current value
    /// in ``date``, ``None`` if every matched value is lower or outside the field's range
    pub fn next_value(&self, date: &NaiveDateTime, kind: FieldKind) -> Option<u32> {
        let current = kind.value_at(date);
        let min = kind.min_value(date);
        let max = kind.max_value(date);

        let (next, max) = match *self {
            Expression::All { step } => {
                let start = current.max(min);
                (apply_step(start, min, step)?, max)
            }
            Expression::Range { first, last, step } => {
                let min = min.max(first);
                let max = last.map_or(max, |last| max.min(last));
                let start = current.max(min);
                (apply_step(start, min, step)?, max)
            }
            Expression::LastDayOfMonth => (days_in_month(date.year(), date.month()), max),
            Expression::WeekdayPosition { position, weekday } => {
                (weekday_position(date, position, weekday)?, max)
            }
        };

        (next >= current && next <= max).then_some(next)
    }
}

/// First value at or after ``start`` on the stride ``origin, origin + step, ...``, ``None``
/// when it does not fit in a ``u32``
#[inline]
fn apply_step(start: u32, origin: u32, step: Option<u32>) -> Option<u32> {
    match step {
        Some(step) => start.checked_add((step - (start - origin) % step) % step),
        None => Some(start),
    }
}

fn weekday_position(date: &NaiveDateTime, position: WeekdayPosition, weekday: u32) -> Option<u32> {
    let first_weekday = NaiveDate::from_ymd_opt(date.year(), date.month(), 1)?
        .weekday()
        .num_days_from_monday();
    let last_day = days_in_month(date.year(), date.month());

    // Day of the month on which the weekday occurs for the first time
    let first_hit = (weekday + 7 - first_weekday) % 7 + 1;
    let target = match position {
        WeekdayPosition::Nth(occurrence) => first_hit + (occurrence - 1) * 7,
        WeekdayPosition::Last => first_hit + ((last_day - first_hit) / 7) * 7,
    };

    (target <= last_day).then_some(target)
}

fn name_index(names: &[&str], name: &str) -> Option<u32> {
    names
        .iter()
        .position(|candidate| *candidate == name)
        .map(|index| index as u32)
}

fn parse_value(
    kind: FieldKind,
    text: &str,
    invalid: &dyn Fn(&str) -> TriggerError,
) -> Result<u32, TriggerError> {
    let text = text.trim();
    let value = if let Ok(value) = text.parse::<u32>() {
        value
    } else {
        let named = match kind {
            FieldKind::DayOfWeek => name_index(&WEEKDAYS, text),
            FieldKind::Month => name_index(&MONTHS, text).map(|index| index + 1),
            _ => None,
        };
        named.ok_or_else(|| invalid("not a number or a known name"))?
    };

    let (min, max) = kind.domain();
    if value < min || value > max {
        return Err(TriggerError::ValueOutOfRange {
            field: kind.name(),
            value,
            min,
            max,
        });
    }

    Ok(value)
}
