// src/config/duration.rs

//! Duration strings such as `"3s"`, `"250ms"`, `"1h30m"` or `"1.5h"`.

use std::time::Duration;

use crate::errors::TickerdError;

const UNITS: &[(&str, u128)] = &[
    ("ns", 1),
    ("us", 1_000),
    ("µs", 1_000),
    ("μs", 1_000),
    ("ms", 1_000_000),
    ("s", 1_000_000_000),
    ("m", 60 * 1_000_000_000),
    ("h", 60 * 60 * 1_000_000_000),
];

/// Parse a duration made of one or more `<number><unit>` pairs.
///
/// Numbers may carry a fraction (`1.5h`). A bare `0` is accepted; negative
/// durations are rejected.
pub fn parse_duration(input: &str) -> Result<Duration, TickerdError> {
    let invalid = |reason: &str| TickerdError::InvalidDuration {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    let mut s = input.trim();
    if let Some(rest) = s.strip_prefix('+') {
        s = rest;
    } else if s.starts_with('-') {
        return Err(invalid("duration must not be negative"));
    }

    if s.is_empty() {
        return Err(invalid("empty duration string"));
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total_nanos: u128 = 0;
    while !s.is_empty() {
        let int_len = s.chars().take_while(|c| c.is_ascii_digit()).count();
        let (int_part, rest) = s.split_at(int_len);

        let (frac_part, rest) = match rest.strip_prefix('.') {
            Some(after_dot) => {
                let frac_len = after_dot.chars().take_while(|c| c.is_ascii_digit()).count();
                after_dot.split_at(frac_len)
            }
            None => ("", rest),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid("expected a number"));
        }

        let unit_len = rest
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() || *c == '.')
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let (unit, rest) = rest.split_at(unit_len);

        if unit.is_empty() {
            return Err(invalid("missing unit suffix"));
        }
        let scale = UNITS
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, scale)| *scale)
            .ok_or_else(|| {
                invalid(&format!(
                    "unknown unit {unit:?}; expected ns, us, ms, s, m or h"
                ))
            })?;

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| invalid("number out of range"))?
        };
        let mut nanos = whole
            .checked_mul(scale)
            .ok_or_else(|| invalid("duration out of range"))?;

        if !frac_part.is_empty() {
            // Digits past nanosecond precision cannot contribute.
            let digits = &frac_part[..frac_part.len().min(18)];
            let frac: u128 = digits.parse().map_err(|_| invalid("number out of range"))?;
            let denom = 10u128.pow(digits.len() as u32);
            nanos += frac * scale / denom;
        }

        total_nanos = total_nanos
            .checked_add(nanos)
            .ok_or_else(|| invalid("duration out of range"))?;
        s = rest;
    }

    let secs = u64::try_from(total_nanos / 1_000_000_000)
        .map_err(|_| invalid("duration out of range"))?;
    let sub = (total_nanos % 1_000_000_000) as u32;
    Ok(Duration::new(secs, sub))
}

/// Render a duration the way it is usually typed on the command line.
pub fn format_duration(d: Duration) -> String {
    if d.is_zero() {
        return "0s".to_string();
    }
    let total = d.as_secs();
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    let millis = d.subsec_millis();

    let mut out = String::new();
    if h > 0 {
        out.push_str(&format!("{h}h"));
    }
    if m > 0 {
        out.push_str(&format!("{m}m"));
    }
    if s > 0 || millis > 0 {
        if millis > 0 {
            out.push_str(&format!("{s}.{millis:03}s"));
        } else {
            out.push_str(&format!("{s}s"));
        }
    }
    if out.is_empty() {
        out = format!("{}ns", d.subsec_nanos());
    }
    out
}
