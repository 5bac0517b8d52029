use chrono::{DateTime, Datelike, TimeDelta, TimeZone, Utc};
use chrono_tz::{Asia, Europe, Tz};
use chronotrigger::utils::{datetime_ceil, is_leap_year};
use chronotrigger::{
    CronTrigger, CronTriggerConfig, StartDate, TaskTrigger, TriggerError, VirtualClock,
};
use std::sync::Arc;

fn at(zone: Tz, year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> DateTime<Tz> {
    zone.with_ymd_and_hms(year, month, day, hour, minute, second)
        .single()
        .expect("unambiguous test date")
}

fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> DateTime<Tz> {
    at(Tz::UTC, year, month, day, hour, minute, second)
}

fn build(config: CronTriggerConfig) -> CronTrigger {
    CronTrigger::new(config).expect("valid cron trigger")
}

#[test]
fn single_high_field_pins_lower_fields() {
    let trigger = build(CronTriggerConfig::builder().hour(5).timezone("UTC").build());

    let fire_times: Vec<_> = trigger
        .fire_times(&utc(2024, 6, 10, 12, 34, 56))
        .take(3)
        .collect();
    assert_eq!(
        fire_times,
        vec![
            utc(2024, 6, 11, 5, 0, 0),
            utc(2024, 6, 12, 5, 0, 0),
            utc(2024, 6, 13, 5, 0, 0),
        ]
    );
}

#[test]
fn unconfigured_fields_between_configured_ones_match_anything() {
    let trigger = build(
        CronTriggerConfig::builder()
            .day_of_week("mon")
            .minute(30)
            .timezone("UTC")
            .build(),
    );

    // 2024-06-10 is a Monday
    assert_eq!(
        trigger.next_fire_time(&utc(2024, 6, 10, 10, 45, 0)),
        Some(utc(2024, 6, 10, 11, 30, 0))
    );
    assert_eq!(
        trigger.next_fire_time(&utc(2024, 6, 10, 23, 45, 0)),
        Some(utc(2024, 6, 17, 0, 30, 0))
    );
}

#[test]
fn leap_day_only_fires_on_leap_years() {
    let trigger = build(
        CronTriggerConfig::builder()
            .month(2)
            .day(29)
            .timezone("UTC")
            .build(),
    );

    let fire_times: Vec<_> = trigger
        .fire_times(&utc(2021, 3, 1, 0, 0, 0))
        .take(3)
        .collect();
    assert_eq!(
        fire_times,
        vec![
            utc(2024, 2, 29, 0, 0, 0),
            utc(2028, 2, 29, 0, 0, 0),
            utc(2032, 2, 29, 0, 0, 0),
        ]
    );
}

#[test]
fn impossible_days_never_fire() {
    let thirty_first = build(
        CronTriggerConfig::builder()
            .month("apr,jun,sep,nov")
            .day(31)
            .timezone("UTC")
            .build(),
    );
    assert_eq!(thirty_first.next_fire_time(&utc(2024, 1, 1, 0, 0, 0)), None);
    assert_eq!(thirty_first.next_fire_time(&utc(2024, 4, 30, 23, 59, 59)), None);

    let thirtieth_of_february = build(
        CronTriggerConfig::builder()
            .month(2)
            .day(30)
            .timezone("UTC")
            .build(),
    );
    assert_eq!(thirtieth_of_february.next_fire_time(&utc(2024, 1, 1, 0, 0, 0)), None);
}

#[test]
fn past_years_never_fire() {
    let trigger = build(
        CronTriggerConfig::builder()
            .year(2020)
            .timezone("UTC")
            .build(),
    );
    assert_eq!(trigger.next_fire_time(&utc(2024, 1, 1, 0, 0, 0)), None);
    assert_eq!(
        trigger.next_fire_time(&utc(2019, 6, 1, 0, 0, 0)),
        Some(utc(2020, 1, 1, 0, 0, 0))
    );
}

#[test]
fn not_before_is_rounded_up_to_whole_seconds() {
    let every_second = build(CronTriggerConfig::builder().second("*").timezone("UTC").build());

    let exact = utc(2024, 6, 10, 10, 0, 0);
    assert_eq!(every_second.next_fire_time(&exact), Some(exact));
    assert_eq!(
        every_second.next_fire_time(&(exact + TimeDelta::milliseconds(500))),
        Some(utc(2024, 6, 10, 10, 0, 1))
    );
}

#[test]
fn start_date_clamps_not_before() {
    let trigger = build(
        CronTriggerConfig::builder()
            .hour(5)
            .start_date("2030-01-01")
            .timezone("UTC")
            .build(),
    );

    assert_eq!(trigger.start_date(), Some(utc(2030, 1, 1, 0, 0, 0)));
    assert_eq!(
        trigger.next_fire_time(&utc(2024, 6, 10, 0, 0, 0)),
        Some(utc(2030, 1, 1, 5, 0, 0))
    );
    assert_eq!(
        trigger.next_fire_time(&utc(2031, 6, 10, 0, 0, 0)),
        Some(utc(2031, 6, 10, 5, 0, 0))
    );
}

#[test]
fn end_date_stops_the_trigger() {
    let trigger = build(
        CronTriggerConfig::builder()
            .hour(5)
            .end_date(utc(2024, 6, 12, 0, 0, 0))
            .timezone("UTC")
            .build(),
    );

    let fire_times: Vec<_> = trigger.fire_times(&utc(2024, 6, 10, 6, 0, 0)).collect();
    assert_eq!(fire_times, vec![utc(2024, 6, 11, 5, 0, 0)]);
}

#[test]
fn stepped_and_listed_values() {
    let quarter_hours = build(CronTriggerConfig::builder().minute("*/15").timezone("UTC").build());
    assert_eq!(
        quarter_hours.next_fire_time(&utc(2024, 6, 10, 10, 7, 30)),
        Some(utc(2024, 6, 10, 10, 15, 0))
    );
    assert_eq!(
        quarter_hours.next_fire_time(&utc(2024, 6, 10, 10, 45, 1)),
        Some(utc(2024, 6, 10, 11, 0, 0))
    );

    let office_hours = build(CronTriggerConfig::builder().hour("8,12-14").timezone("UTC").build());
    assert_eq!(
        office_hours.next_fire_time(&utc(2024, 6, 10, 9, 0, 0)),
        Some(utc(2024, 6, 10, 12, 0, 0))
    );
    assert_eq!(
        office_hours.next_fire_time(&utc(2024, 6, 10, 14, 0, 1)),
        Some(utc(2024, 6, 11, 8, 0, 0))
    );
}

#[test]
fn day_markers() {
    let last_friday = build(CronTriggerConfig::builder().day("last fri").timezone("UTC").build());
    assert_eq!(
        last_friday.next_fire_time(&utc(2024, 5, 1, 0, 0, 0)),
        Some(utc(2024, 5, 31, 0, 0, 0))
    );

    let end_of_february = build(
        CronTriggerConfig::builder()
            .month("feb")
            .day("last")
            .timezone("UTC")
            .build(),
    );
    assert_eq!(
        end_of_february.next_fire_time(&utc(2023, 2, 10, 0, 0, 0)),
        Some(utc(2023, 2, 28, 0, 0, 0))
    );
    assert_eq!(
        end_of_february.next_fire_time(&utc(2023, 3, 1, 0, 0, 0)),
        Some(utc(2024, 2, 29, 0, 0, 0))
    );
}

#[test]
fn iso_weeks_filter_days() {
    let trigger = build(
        CronTriggerConfig::builder()
            .week(1)
            .day_of_week("mon")
            .timezone("UTC")
            .build(),
    );

    // ISO week 1 of 2025 starts on Monday 2024-12-30
    assert_eq!(
        trigger.next_fire_time(&utc(2024, 6, 1, 0, 0, 0)),
        Some(utc(2024, 12, 30, 0, 0, 0))
    );
}

#[test]
fn wildcard_week_does_not_skip_the_turn_of_the_year() {
    // 2021-01-01 still belongs to ISO week 53 of 2020
    let daily = build(CronTriggerConfig::builder().hour(0).timezone("UTC").build());
    assert_eq!(
        daily.next_fire_time(&utc(2020, 12, 31, 12, 0, 0)),
        Some(utc(2021, 1, 1, 0, 0, 0))
    );
}

#[test]
fn wall_clock_times_in_a_gap_are_skipped() {
    let trigger = build(
        CronTriggerConfig::builder()
            .hour(2)
            .minute(30)
            .timezone(Europe::Berlin)
            .build(),
    );

    // Clocks spring forward from 02:00 to 03:00 on 2024-03-31
    assert_eq!(
        trigger.next_fire_time(&at(Europe::Berlin, 2024, 3, 30, 12, 0, 0)),
        Some(at(Europe::Berlin, 2024, 4, 1, 2, 30, 0))
    );
}

#[test]
fn folded_wall_clock_times_fire_once() {
    let trigger = build(
        CronTriggerConfig::builder()
            .hour(2)
            .minute(30)
            .timezone(Europe::Berlin)
            .build(),
    );
    let from_utc = |date: DateTime<Utc>| date.with_timezone(&Europe::Berlin);

    // Clocks fall back from 03:00 to 02:00 on 2024-10-27, 00:00 UTC is 02:00 CEST
    let first_pass = from_utc(Utc.with_ymd_and_hms(2024, 10, 27, 0, 0, 0).unwrap());
    let fire_times: Vec<_> = trigger.fire_times(&first_pass).take(2).collect();
    assert_eq!(
        fire_times,
        vec![
            from_utc(Utc.with_ymd_and_hms(2024, 10, 27, 0, 30, 0).unwrap()),
            from_utc(Utc.with_ymd_and_hms(2024, 10, 28, 1, 30, 0).unwrap()),
        ]
    );

    // 01:10 UTC is 02:10 CET, the second pass through the fold
    let second_pass = from_utc(Utc.with_ymd_and_hms(2024, 10, 27, 1, 10, 0).unwrap());
    assert_eq!(
        trigger.next_fire_time(&second_pass),
        Some(from_utc(Utc.with_ymd_and_hms(2024, 10, 27, 1, 30, 0).unwrap()))
    );
}

#[test]
fn not_before_in_another_zone_is_converted() {
    let trigger = build(
        CronTriggerConfig::builder()
            .hour(9)
            .timezone(Asia::Tokyo)
            .build(),
    );

    // 2024-06-10 01:00 UTC is 10:00 in Tokyo
    let fire_time = trigger.next_fire_time(&utc(2024, 6, 10, 1, 0, 0));
    assert_eq!(fire_time, Some(at(Asia::Tokyo, 2024, 6, 11, 9, 0, 0)));
    assert_eq!(fire_time.map(|date| date.timezone()), Some(Asia::Tokyo));
}

#[test]
fn timezone_selection() {
    let clock = Arc::new(VirtualClock::from_epoch(Asia::Tokyo));

    let from_clock = build(CronTriggerConfig::builder().hour(5).clock(clock.clone()).build());
    assert_eq!(from_clock.timezone(), Asia::Tokyo);

    let from_start_date = build(
        CronTriggerConfig::builder()
            .hour(5)
            .start_date(at(Europe::Berlin, 2024, 1, 1, 0, 0, 0))
            .clock(clock.clone())
            .build(),
    );
    assert_eq!(from_start_date.timezone(), Europe::Berlin);

    let explicit = build(
        CronTriggerConfig::builder()
            .hour(5)
            .start_date(at(Europe::Berlin, 2024, 1, 1, 0, 0, 0))
            .timezone("America/New_York")
            .clock(clock)
            .build(),
    );
    assert_eq!(explicit.timezone(), chrono_tz::America::New_York);
    assert_eq!(
        explicit.start_date(),
        Some(at(Europe::Berlin, 2024, 1, 1, 0, 0, 0).with_timezone(&chrono_tz::America::New_York))
    );
}

#[test]
fn invalid_configuration_is_rejected() {
    assert_eq!(
        CronTrigger::new(CronTriggerConfig::builder().month(13).timezone("UTC").build()).err(),
        Some(TriggerError::ValueOutOfRange {
            field: "month",
            value: 13,
            min: 1,
            max: 12
        })
    );
    assert!(matches!(
        CronTrigger::new(CronTriggerConfig::builder().hour("abc").timezone("UTC").build()),
        Err(TriggerError::InvalidExpression { field: "hour", .. })
    ));
    assert!(matches!(
        CronTrigger::new(CronTriggerConfig::builder().day_of_week("fri-mon").timezone("UTC").build()),
        Err(TriggerError::InvalidExpression { field: "day_of_week", .. })
    ));
    assert_eq!(
        CronTrigger::new(CronTriggerConfig::builder().hour(5).timezone("Mars/Olympus").build()).err(),
        Some(TriggerError::UnknownTimezone("Mars/Olympus".to_owned()))
    );
    assert_eq!(
        CronTrigger::new(
            CronTriggerConfig::builder()
                .hour(5)
                .start_date(StartDate::from("yesterday"))
                .timezone("UTC")
                .build()
        )
        .err(),
        Some(TriggerError::InvalidDate("yesterday".to_owned()))
    );
}

#[test]
fn rendering() {
    let trigger = build(
        CronTriggerConfig::builder()
            .month(2)
            .day(29)
            .start_date("2024-01-01")
            .timezone("UTC")
            .build(),
    );

    assert_eq!(trigger.to_string(), "cron[month='2', day='29']");
    let diagnostic = format!("{trigger:?}");
    assert!(diagnostic.starts_with("<CronTrigger (month='2', day='29'"));
    assert!(diagnostic.contains("start_date='2024-01-01 00:00:00 UTC'"));
    assert!(diagnostic.contains("timezone='UTC'"));
}

#[test]
fn crontab_lines() {
    let trigger = CronTrigger::from_crontab("30 8 * * mon-fri", "UTC").unwrap();
    assert_eq!(
        trigger.to_string(),
        "cron[month='*', day='*', day_of_week='mon-fri', hour='8', minute='30']"
    );

    // 2024-06-08 is a Saturday
    assert_eq!(
        trigger.next_fire_time(&utc(2024, 6, 8, 12, 0, 0)),
        Some(utc(2024, 6, 10, 8, 30, 0))
    );

    assert!(matches!(
        CronTrigger::from_crontab("30 8 * *", "UTC"),
        Err(TriggerError::InvalidExpression { field: "crontab", .. })
    ));
}

#[test]
fn crontab_weekdays_count_from_monday() {
    let sundays = CronTrigger::from_crontab("0 4 * * sun", "UTC").unwrap();
    let numeric = CronTrigger::from_crontab("0 4 * * 6", "UTC").unwrap();
    let zero = CronTrigger::from_crontab("0 4 * * 0", "UTC").unwrap();

    // 2024-06-10 is a Monday
    let not_before = utc(2024, 6, 10, 12, 0, 0);
    assert_eq!(sundays.next_fire_time(&not_before), Some(utc(2024, 6, 16, 4, 0, 0)));
    assert_eq!(numeric.next_fire_time(&not_before), Some(utc(2024, 6, 16, 4, 0, 0)));
    assert_eq!(zero.next_fire_time(&not_before), Some(utc(2024, 6, 17, 4, 0, 0)));
}

#[test]
fn steps_wider_than_the_field_carry_instead_of_failing() {
    let hours = build(
        CronTriggerConfig::builder()
            .hour("1-23/4294967295")
            .timezone("UTC")
            .build(),
    );
    assert_eq!(
        hours.next_fire_time(&utc(2024, 6, 10, 3, 0, 0)),
        Some(utc(2024, 6, 11, 1, 0, 0))
    );

    let years = build(
        CronTriggerConfig::builder()
            .year("*/4294967295")
            .timezone("UTC")
            .build(),
    );
    assert_eq!(years.next_fire_time(&utc(2024, 6, 10, 3, 0, 0)), None);
}

#[test]
fn fire_times_are_matching_and_inclusive() {
    let rules = [
        CronTriggerConfig::builder().hour(5).timezone("UTC").build(),
        CronTriggerConfig::builder()
            .day_of_week("sat,sun")
            .hour("9-17/2")
            .minute("*/20")
            .timezone(Europe::Berlin)
            .build(),
        CronTriggerConfig::builder()
            .day("last fri")
            .hour(18)
            .timezone(Europe::Berlin)
            .build(),
        CronTriggerConfig::builder()
            .week("10-12")
            .day_of_week("wed")
            .timezone("UTC")
            .build(),
    ];
    let mut rng = fastrand::Rng::with_seed(0x5eed);

    for config in rules {
        let trigger = build(config);
        for _ in 0..50 {
            let seconds = rng.i64(946_684_800..2_208_988_800); // 2000 up to 2040
            let nanos = if rng.bool() { 0 } else { rng.u32(1..1_000_000_000) };
            let not_before = DateTime::from_timestamp(seconds, nanos)
                .unwrap()
                .with_timezone(&trigger.timezone());

            let fire_time = trigger
                .next_fire_time(&not_before)
                .expect("rule fires again");
            assert!(fire_time >= datetime_ceil(&not_before), "{trigger} from {not_before}");

            let naive = fire_time.naive_local();
            for field in trigger.fields() {
                assert!(field.matches(&naive), "{trigger}: {} in {fire_time}", field.name());
            }

            assert_eq!(trigger.next_fire_time(&fire_time), Some(fire_time));
            let later = trigger
                .next_fire_time(&(fire_time + TimeDelta::microseconds(1)))
                .expect("rule fires again");
            assert!(later > fire_time);
        }
    }
}

#[test]
fn fire_times_are_the_earliest_match() {
    let trigger = build(CronTriggerConfig::builder().minute("*/7").timezone("UTC").build());
    let matches = |date: &DateTime<Tz>| trigger.fields().iter().all(|field| field.matches(&date.naive_local()));
    let mut rng = fastrand::Rng::with_seed(42);

    for _ in 0..100 {
        let seconds = rng.i64(946_684_800..2_208_988_800);
        let not_before = DateTime::from_timestamp(seconds, 0)
            .unwrap()
            .with_timezone(&Tz::UTC);
        let fire_time = trigger.next_fire_time(&not_before).unwrap();

        let mut probe = not_before;
        while probe < fire_time {
            assert!(!matches(&probe), "{probe} matches before {fire_time}");
            probe += TimeDelta::seconds(1);
        }
        assert!(matches(&fire_time));
    }
}

#[test]
fn leap_rule_lands_on_leap_years_only() {
    let trigger = build(
        CronTriggerConfig::builder()
            .month("feb")
            .day(29)
            .hour(12)
            .timezone("UTC")
            .build(),
    );

    for fire_time in trigger.fire_times(&utc(1999, 1, 1, 0, 0, 0)).take(30) {
        assert!(is_leap_year(fire_time.year()), "{fire_time}");
        assert_eq!((fire_time.month(), fire_time.day()), (2, 29));
    }
}
