use benches::{cron_rules, interval_trigger, reference_time};
use chronotrigger::TaskTrigger;
use divan::{Bencher, black_box};

fn main() {
    divan::main();
}

#[divan::bench(args = ["daily", "office_hours", "last_friday", "leap_day", "friday_13th"])]
fn cron_next_fire_time(bencher: Bencher, rule: &str) {
    let trigger = cron_rules()
        .into_iter()
        .find_map(|(name, trigger)| (name == rule).then_some(trigger))
        .expect("known rule");
    let not_before = reference_time();

    bencher.bench_local(|| black_box(&trigger).next_fire_time(black_box(&not_before)));
}

#[divan::bench(args = [1, 10, 100])]
fn cron_fire_times(bencher: Bencher, count: usize) {
    let (_, trigger) = cron_rules()
        .into_iter()
        .find(|(name, _)| *name == "office_hours")
        .expect("known rule");
    let from = reference_time();

    bencher.bench_local(|| trigger.fire_times(black_box(&from)).take(count).count());
}

#[divan::bench]
fn interval_next_fire_time(bencher: Bencher) {
    let trigger = interval_trigger().expect("valid interval");
    let not_before = reference_time();

    bencher.bench_local(|| black_box(&trigger).next_fire_time(black_box(&not_before)));
}
