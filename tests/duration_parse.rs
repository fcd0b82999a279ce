// tests/duration_parse.rs

use std::time::Duration;

use proptest::prelude::*;

use tickerd::config::{format_duration, parse_duration};
use tickerd::errors::TickerdError;

#[test]
fn common_forms() {
    let cases = [
        ("0", Duration::ZERO),
        ("3s", Duration::from_secs(3)),
        ("250ms", Duration::from_millis(250)),
        ("1h30m", Duration::from_secs(5400)),
        ("1.5h", Duration::from_secs(5400)),
        ("2m0.5s", Duration::from_millis(120_500)),
        ("10us", Duration::from_micros(10)),
        ("10µs", Duration::from_micros(10)),
        ("42ns", Duration::from_nanos(42)),
        (".5s", Duration::from_millis(500)),
        ("+5s", Duration::from_secs(5)),
        (" 1m ", Duration::from_secs(60)),
    ];
    for (input, expected) in cases {
        let got = parse_duration(input).unwrap_or_else(|e| panic!("{input:?}: {e}"));
        assert_eq!(got, expected, "{input:?}");
    }
}

#[test]
fn invalid_forms() {
    for input in ["", "5", "-1s", "1d", "s", "1.s5", "abc", "1h-5m"] {
        match parse_duration(input) {
            Err(TickerdError::InvalidDuration { input: got, .. }) => assert_eq!(got, input),
            other => panic!("{input:?}: expected InvalidDuration, got {other:?}"),
        }
    }
}

#[test]
fn formatting() {
    assert_eq!(format_duration(Duration::ZERO), "0s");
    assert_eq!(format_duration(Duration::from_secs(5400)), "1h30m");
    assert_eq!(format_duration(Duration::from_millis(1500)), "1.500s");
}

proptest! {
    #[test]
    fn compound_durations_sum_their_parts(h in 0u64..1000, m in 0u64..60, s in 0u64..60, ms in 0u64..1000) {
        let input = format!("{h}h{m}m{s}s{ms}ms");
        let expected = Duration::from_secs(h * 3600 + m * 60 + s) + Duration::from_millis(ms);
        prop_assert_eq!(parse_duration(&input).unwrap(), expected);
    }

    #[test]
    fn formatted_durations_parse_back(secs in 1u64..1_000_000, millis in 0u32..1000) {
        let d = Duration::new(secs, millis * 1_000_000);
        prop_assert_eq!(parse_duration(&format_duration(d)).unwrap(), d);
    }

    #[test]
    fn arbitrary_input_never_panics(input in "\\PC{0,16}") {
        let _ = parse_duration(&input);
    }
}
