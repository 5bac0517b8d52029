pub mod clock; // skipcq: RS-D1001

pub mod errors; // skipcq: RS-D1001

pub mod trigger; // skipcq: RS-D1001

pub mod utils; // skipcq: RS-D1001

pub use chrono_tz::Tz;
pub use clock::{SystemClock, TriggerClock, VirtualClock};
pub use errors::TriggerError;
pub use trigger::{
    CalendarField, CronTrigger, CronTriggerConfig, FieldKind, FieldValue, FireTimes,
    IntervalTrigger, IntervalTriggerConfig, StartDate, TaskTrigger, ZoneSpec,
};
