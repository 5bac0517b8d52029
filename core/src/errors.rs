use thiserror::Error;

#[allow(unused_imports)]
use crate::trigger::{CronTrigger, IntervalTrigger};

/// [`TriggerError`] is the main enum that contains all the errors which can be raised while
/// configuring a trigger, it uses under the hood [`thiserror`]. Every variant is raised at
/// construction time of [`CronTrigger`] or [`IntervalTrigger`], never while computing a fire
/// time (a trigger that cannot fire anymore reports it through ``None`` instead)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TriggerError {
    /// This error is meant to happen when a field expression is malformed, i.e. it cannot be
    /// parsed by the grammar of that field (unknown names, empty terms, reversed ranges,
    /// zero steps... etc.)
    #[error("Invalid expression `{expression}` for the `{field}` field: {reason}")]
    InvalidExpression {
        field: &'static str,
        expression: String,
        reason: String,
    },

    /// This error is meant to happen when a literal of a field expression is outside the
    /// natural domain of that field (for example month `13`)
    #[error("Value `{value}` of the `{field}` field is out of its `{min}-{max}` range")]
    ValueOutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    #[error("Time zone `{0}` is not a known IANA time zone")]
    UnknownTimezone(String),

    #[error("Cannot interpret `{0}` as a date / time")]
    InvalidDate(String),

    #[error("Interval length is out of the representable range")]
    IntervalOutOfRange,
}
