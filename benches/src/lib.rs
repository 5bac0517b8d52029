use chrono::{DateTime, TimeDelta, Utc};
use chronotrigger::{CronTrigger, CronTriggerConfig, IntervalTrigger, IntervalTriggerConfig, Tz};

/// Named cron rules ranging from a plain daily rule up to rules that only match a few days
/// per decade, so the search has to carry through many months and years
pub fn cron_rules() -> Vec<(&'static str, CronTrigger)> {
    let rules = [
        ("daily", CronTriggerConfig::builder().hour(5).timezone("UTC").build()),
        (
            "office_hours",
            CronTriggerConfig::builder()
                .day_of_week("mon-fri")
                .hour("9-17")
                .minute("*/15")
                .timezone("Europe/Berlin")
                .build(),
        ),
        (
            "last_friday",
            CronTriggerConfig::builder()
                .day("last fri")
                .hour(18)
                .timezone("America/New_York")
                .build(),
        ),
        (
            "leap_day",
            CronTriggerConfig::builder()
                .month(2)
                .day(29)
                .timezone("UTC")
                .build(),
        ),
        (
            "friday_13th",
            CronTriggerConfig::builder()
                .day(13)
                .day_of_week("fri")
                .timezone("UTC")
                .build(),
        ),
    ];

    rules
        .into_iter()
        .filter_map(|(name, config)| Some((name, CronTrigger::new(config).ok()?)))
        .collect()
}

pub fn interval_trigger() -> Option<IntervalTrigger> {
    IntervalTrigger::new(
        IntervalTriggerConfig::builder()
            .hours(1)
            .minutes(30)
            .start_date("2000-01-01 00:00:00")
            .timezone("Europe/Berlin")
            .build(),
    )
    .ok()
}

/// 2024-03-30 12:00:00 UTC, the day before Europe springs forward
pub fn reference_time() -> DateTime<Tz> {
    (DateTime::<Utc>::UNIX_EPOCH + TimeDelta::seconds(1_711_800_000)).with_timezone(&Tz::UTC)
}
