// tests/cron_schedule.rs

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike, Weekday};

use tickerd::errors::TickerdError;
use tickerd::trigger::CronSchedule;

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Local> {
    Local
        .with_ymd_and_hms(y, mo, d, h, mi, 0)
        .single()
        .expect("unambiguous local time")
}

fn next(expr: &str, after: DateTime<Local>) -> DateTime<Local> {
    CronSchedule::parse(expr)
        .expect("valid schedule")
        .next_after(after)
        .expect("schedule has a next occurrence")
}

#[test]
fn step_minutes() {
    // Wednesday 2024-01-10 10:02
    let n = next("*/5 * * * *", at(2024, 1, 10, 10, 2));
    assert_eq!(n, at(2024, 1, 10, 10, 5));
}

#[test]
fn next_occurrence_is_strictly_later() {
    let n = next("*/5 * * * *", at(2024, 1, 10, 10, 5));
    assert_eq!(n, at(2024, 1, 10, 10, 10));
}

#[test]
fn sunday_is_both_zero_and_seven() {
    let after = at(2024, 1, 10, 10, 2);
    let zero = next("0 0 * * 0", after);
    let seven = next("0 0 * * 7", after);

    assert_eq!(zero, seven);
    assert_eq!(zero.weekday(), Weekday::Sun);
    assert_eq!(zero, at(2024, 1, 14, 0, 0));

    // Ranges running up to 7 wrap onto Sunday.
    let friday = at(2024, 1, 12, 0, 0);
    assert_eq!(next("0 0 * * 5-7", after), friday);
    assert_eq!(next("0 0 * * 5-7", friday), at(2024, 1, 13, 0, 0));
    assert_eq!(next("0 0 * * 5-7", at(2024, 1, 13, 0, 0)), at(2024, 1, 14, 0, 0));
    assert_eq!(next("0 0 * * 6-7", after), at(2024, 1, 13, 0, 0));

    // 0-7/2 is Sun, Tue, Thu, Sat.
    assert_eq!(next("0 0 * * 0-7/2", after), at(2024, 1, 11, 0, 0));
    assert_eq!(next("0 0 * * 0-7/2", at(2024, 1, 11, 0, 0)), at(2024, 1, 13, 0, 0));
}

#[test]
fn restricted_day_fields_match_either_day() {
    // "the 13th, or any Friday"
    let n = next("0 0 13 * 5", at(2024, 1, 10, 10, 2));
    assert_eq!(n, at(2024, 1, 12, 0, 0));
    assert_eq!(n.weekday(), Weekday::Fri);

    let n = next("0 0 13 * 5", n);
    assert_eq!(n, at(2024, 1, 13, 0, 0));
    assert_eq!(n.weekday(), Weekday::Sat);
}

#[test]
fn wildcard_day_field_keeps_the_other_as_is() {
    let after = at(2024, 1, 10, 10, 2);
    // Day of month alone; Friday the 12th does not count.
    assert_eq!(next("0 0 13 * *", after), at(2024, 1, 13, 0, 0));
}

#[test]
fn stepped_wildcard_restricts_the_day() {
    // Days 1, 8, 15, 22, 29 or any Friday.
    let after = at(2024, 1, 10, 10, 2);
    assert_eq!(next("0 0 */7 * 5", after), at(2024, 1, 12, 0, 0));
    assert_eq!(next("0 0 */7 * 5", at(2024, 1, 12, 0, 0)), at(2024, 1, 15, 0, 0));
}

#[test]
fn numeric_weekday_ranges_follow_crontab_numbering() {
    // Friday 2024-01-12 10:00; weekdays only, so Monday is next.
    let n = next("30 9 * * 1-5", at(2024, 1, 12, 10, 0));
    assert_eq!(n, at(2024, 1, 15, 9, 30));
    assert_eq!(n.weekday(), Weekday::Mon);
}

#[test]
fn descriptors() {
    let after = at(2024, 1, 10, 10, 2);

    assert_eq!(next("@hourly", after), at(2024, 1, 10, 11, 0));
    assert_eq!(next("@daily", after), at(2024, 1, 11, 0, 0));
    assert_eq!(next("@midnight", after), at(2024, 1, 11, 0, 0));
    assert_eq!(next("@weekly", after), at(2024, 1, 14, 0, 0));
    assert_eq!(next("@monthly", after), at(2024, 2, 1, 0, 0));
    assert_eq!(next("@yearly", after), at(2025, 1, 1, 0, 0));
    assert_eq!(next("@annually", after), at(2025, 1, 1, 0, 0));
}

#[test]
fn every_adds_a_fixed_delay() {
    let after = at(2024, 1, 10, 10, 2);

    let n = next("@every 90s", after);
    assert_eq!(n - after, chrono::Duration::seconds(90));

    let n = next("@every 1h30m", after);
    assert_eq!((n.hour(), n.minute()), (11, 32));
}

#[test]
fn every_truncates_to_whole_seconds() {
    let after = at(2024, 1, 10, 10, 2);
    let second = chrono::Duration::seconds(1);

    assert_eq!(next("@every 1500ms", after) - after, second);
    assert_eq!(next("@every 200ms", after) - after, second);
    assert_eq!(next("@every 0s", after) - after, second);
    assert_eq!(next("@every 2999ms", after) - after, second * 2);
}

#[test]
fn expression_is_kept_as_written() {
    let schedule = CronSchedule::parse("  0 12 * * MON  ").expect("valid schedule");
    assert_eq!(schedule.expression(), "0 12 * * MON");
}

#[test]
fn malformed_expressions_are_rejected() {
    for expr in [
        "* * * *",
        "0 * * * * *",
        "61 * * * *",
        "* 25 * * *",
        "* * * * 8",
        "@fortnightly",
        "@every",
        "@HOURLY",
        "@Daily",
        "@every soon",
        "",
    ] {
        match CronSchedule::parse(expr) {
            Err(TickerdError::InvalidCron { input, .. }) => assert_eq!(input, expr),
            Err(other) => panic!("{expr:?}: unexpected error {other:?}"),
            Ok(s) => panic!("{expr:?}: accepted as {s:?}"),
        }
    }
}
