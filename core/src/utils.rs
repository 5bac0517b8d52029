use crate::errors::TriggerError;
use chrono::{
    DateTime, Datelike, LocalResult, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Timelike,
};
use chrono_tz::Tz;
use tracing::debug;

const NANOS_PER_SECOND: u32 = 1_000_000_000;

// Two days of minutes, wider than any daylight-saving / calendar gap in the tz database
const MAX_GAP_MINUTES: u32 = 2 * 24 * 60;

/// Rounds the date up to the next whole second, a date that already sits on a whole second
/// is returned untouched
pub fn datetime_ceil<Z: TimeZone>(date: &DateTime<Z>) -> DateTime<Z> {
    let nanos = date.nanosecond() % NANOS_PER_SECOND;
    if nanos == 0 {
        return date.clone();
    }

    date.clone() + TimeDelta::nanoseconds(i64::from(NANOS_PER_SECOND - nanos))
}

#[inline]
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days of a month in a specific year (``month`` being 1-based)
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 31,
    }
}

/// Number of ISO-8601 weeks in an ISO week-numbering year, either 52 or 53
pub fn iso_weeks_in_year(iso_year: i32) -> u32 {
    // December 28th always falls into the last ISO week of its year
    NaiveDate::from_ymd_opt(iso_year, 12, 28).map_or(52, |date| date.iso_week().week())
}

/// Resolves an IANA identifier (such as ``Europe/Berlin``) into a [`Tz`]
pub fn resolve_timezone(name: &str) -> Result<Tz, TriggerError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| TriggerError::UnknownTimezone(name.to_owned()))
}

/// Finds the first existing wall-clock minute after a wall-clock time that falls into a
/// gap of the time zone (e.g. 02:30 on the day clocks spring forward)
pub fn skip_gap(timezone: &Tz, naive: &NaiveDateTime) -> Option<NaiveDateTime> {
    let mut candidate = naive.with_second(0)?.with_nanosecond(0)?;
    for _ in 0..MAX_GAP_MINUTES {
        candidate = candidate.checked_add_signed(TimeDelta::minutes(1))?;
        if !matches!(timezone.from_local_datetime(&candidate), LocalResult::None) {
            debug!(
                timezone = %timezone,
                requested = %naive,
                resolved = %candidate,
                "wall-clock time does not exist, moved forward past the gap"
            );
            return Some(candidate);
        }
    }

    None
}

/// Attaches a time zone to a wall-clock time. On a fold (the wall-clock time happens twice)
/// the earliest instant is picked, on a gap the time is moved forward past the gap
pub fn localize(timezone: &Tz, naive: &NaiveDateTime) -> Option<DateTime<Tz>> {
    match timezone.from_local_datetime(naive) {
        LocalResult::Single(date) => Some(date),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => {
            let shifted = skip_gap(timezone, naive)?;
            timezone.from_local_datetime(&shifted).earliest()
        }
    }
}

/// Like [`localize`] but a folded wall-clock time resolves to the earliest instant that is not
/// before ``floor``. Returns ``None`` when the wall-clock time falls into a gap
pub fn localize_not_before(
    timezone: &Tz,
    naive: &NaiveDateTime,
    floor: &DateTime<Tz>,
) -> Option<DateTime<Tz>> {
    match timezone.from_local_datetime(naive) {
        LocalResult::Single(date) => Some(date),
        LocalResult::Ambiguous(earliest, latest) => {
            Some(if earliest >= *floor { earliest } else { latest })
        }
        LocalResult::None => None,
    }
}

/// Renders a date for diagnostics, including its zone abbreviation
pub fn datetime_repr(date: &DateTime<Tz>) -> String {
    date.format("%Y-%m-%d %H:%M:%S %Z").to_string()
}

/// Parses a textual date in either RFC 3339, ``YYYY-MM-DD HH:MM:SS[.ffffff]``,
/// ``YYYY-MM-DDTHH:MM:SS[.ffffff]`` or ``YYYY-MM-DD`` form, wall-clock forms are interpreted
/// in ``timezone``
pub fn parse_datetime(text: &str, timezone: &Tz) -> Result<DateTime<Tz>, TriggerError> {
    let trimmed = text.trim();
    let invalid = || TriggerError::InvalidDate(text.to_owned());

    if let Ok(date) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(date.with_timezone(timezone));
    }

    let naive = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .map(|date| date.and_time(chrono::NaiveTime::MIN))
        })
        .map_err(|_| invalid())?;

    localize(timezone, &naive).ok_or_else(invalid)
}

/// Formats a number of seconds the way a ``[D day(s), ]H:MM:SS`` duration is usually shown
pub fn format_seconds(total_seconds: i64) -> String {
    let days = total_seconds / 86_400;
    let remainder = total_seconds % 86_400;
    let clock = format!(
        "{}:{:02}:{:02}",
        remainder / 3600,
        (remainder % 3600) / 60,
        remainder % 60
    );

    match days {
        0 => clock,
        1 => format!("1 day, {clock}"),
        _ => format!("{days} days, {clock}"),
    }
}
