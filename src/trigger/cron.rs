// src/trigger/cron.rs

//! Cron schedule parsing and the cron trigger source.
//!
//! Accepted forms:
//! - 5-field expressions: `minute hour day-of-month month day-of-week`
//! - descriptors: `@yearly`, `@annually`, `@monthly`, `@weekly`, `@daily`,
//!   `@midnight`, `@hourly`
//! - fixed delays: `@every <duration>` (e.g. `@every 1h30m`)
//!
//! Day-of-week numbers follow the classic crontab convention (0 or 7 is
//! Sunday). Occurrences are computed in the local time zone.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::config::duration::{format_duration, parse_duration};
use crate::errors::TickerdError;
use crate::trigger::{TriggerSource, TriggerTx};

const DAY_NAMES: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

/// A parsed, validated cron schedule.
#[derive(Clone)]
pub struct CronSchedule {
    expression: String,
    kind: ScheduleKind,
}

#[derive(Clone)]
enum ScheduleKind {
    Fields(Box<cron::Schedule>),
    /// Both day fields restricted: fires when either one matches.
    EitherDay {
        day_of_month: Box<cron::Schedule>,
        day_of_week: Box<cron::Schedule>,
    },
    Every(Duration),
}

impl fmt::Debug for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CronSchedule")
            .field("expression", &self.expression)
            .finish_non_exhaustive()
    }
}

impl CronSchedule {
    pub fn parse(expression: &str) -> Result<Self, TickerdError> {
        let trimmed = expression.trim();
        let invalid = |reason: String| TickerdError::InvalidCron {
            input: expression.to_string(),
            reason,
        };

        let kind = if trimmed.starts_with('@') {
            parse_descriptor(trimmed).map_err(invalid)?
        } else {
            parse_fields(trimmed).map_err(invalid)?
        };

        Ok(Self {
            expression: trimmed.to_string(),
            kind,
        })
    }

    /// The expression as written by the operator.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// First occurrence strictly after `after`, if any.
    pub fn next_after(&self, after: DateTime<Local>) -> Option<DateTime<Local>> {
        match &self.kind {
            ScheduleKind::Fields(schedule) => schedule.after(&after).next(),
            ScheduleKind::EitherDay {
                day_of_month,
                day_of_week,
            } => {
                let by_month = day_of_month.after(&after).next();
                let by_week = day_of_week.after(&after).next();
                match (by_month, by_week) {
                    (Some(a), Some(b)) => Some(a.min(b)),
                    (a, b) => a.or(b),
                }
            }
            ScheduleKind::Every(delay) => {
                let delay = chrono::Duration::from_std(*delay).ok()?;
                after.checked_add_signed(delay)
            }
        }
    }
}

fn parse_descriptor(expr: &str) -> Result<ScheduleKind, String> {
    if let Some(rest) = expr.strip_prefix("@every") {
        let delay = parse_duration(rest.trim()).map_err(|e| e.to_string())?;
        // Whole seconds only, truncated, and never below one second.
        let secs = delay.as_secs().max(1);
        return Ok(ScheduleKind::Every(Duration::from_secs(secs)));
    }

    let fields = match expr {
        "@yearly" | "@annually" => "0 0 1 1 *",
        "@monthly" => "0 0 1 * *",
        "@weekly" => "0 0 * * 0",
        "@daily" | "@midnight" => "0 0 * * *",
        "@hourly" => "0 * * * *",
        _ => return Err(format!("unrecognized descriptor {expr:?}")),
    };
    parse_fields(fields)
}

fn parse_fields(expr: &str) -> Result<ScheduleKind, String> {
    let fields: Vec<&str> = expr.split_whitespace().collect();
    let [minute, hour, dom, month, dow] = fields[..] else {
        return Err(format!("expected exactly 5 fields, found {}", fields.len()));
    };

    let dow = normalize_day_of_week(dow)?;
    let build = |dom: &str, dow: &str| -> Result<Box<cron::Schedule>, String> {
        // The `cron` crate wants a leading seconds field.
        let full = format!("0 {minute} {hour} {dom} {month} {dow}");
        cron::Schedule::from_str(&full)
            .map(Box::new)
            .map_err(|e| e.to_string())
    };

    // The `cron` crate requires both day fields to match; crontab fires when
    // either matches once both are restricted.
    if is_unrestricted(dom) || is_unrestricted(&dow) {
        return Ok(ScheduleKind::Fields(build(dom, &dow)?));
    }
    Ok(ScheduleKind::EitherDay {
        day_of_month: build(dom, "*")?,
        day_of_week: build("*", &dow)?,
    })
}

/// A day field counts as unrestricted when some item is a bare wildcard.
/// A stepped wildcard such as `*/2` is a restriction.
fn is_unrestricted(field: &str) -> bool {
    field.split(',').any(|item| {
        let (range, step) = item.split_once('/').unwrap_or((item, "1"));
        matches!(range, "*" | "?") && step == "1"
    })
}

/// Rewrite numeric weekdays (0-7, Sunday = 0 or 7) as names, since the
/// `cron` crate numbers weekdays from 1 = Sunday. Ranges ending in 7 are
/// expanded into lists, since `FRI-SUN` does not wrap.
fn normalize_day_of_week(field: &str) -> Result<String, String> {
    let items = field
        .split(',')
        .map(normalize_weekday_item)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(items.join(","))
}

fn normalize_weekday_item(item: &str) -> Result<String, String> {
    let (range, step) = match item.split_once('/') {
        Some((range, step)) => (range, Some(step)),
        None => (item, None),
    };

    if let Some((lo, hi)) = range.split_once('-') {
        if let (Ok(lo), Ok(7)) = (lo.parse::<usize>(), hi.parse::<usize>()) {
            let lo = day_number(lo)?;
            let step = match step {
                Some(raw) => raw
                    .parse::<usize>()
                    .ok()
                    .filter(|&n| n > 0)
                    .ok_or_else(|| format!("invalid step {raw:?}"))?,
                None => 1,
            };

            let mut days: Vec<&str> = Vec::new();
            for day in (lo..=7).step_by(step) {
                let name = DAY_NAMES[day % 7];
                if !days.contains(&name) {
                    days.push(name);
                }
            }
            return Ok(days.join(","));
        }
    }

    rename_weekday_numbers(item)
}

fn day_number(day: usize) -> Result<usize, String> {
    if day > 7 {
        return Err(format!("day of week {day} out of range 0-7"));
    }
    Ok(day)
}

fn rename_weekday_numbers(item: &str) -> Result<String, String> {
    let mut out = String::with_capacity(item.len());
    let mut chars = item.chars().peekable();
    let mut in_step = false;

    while let Some(c) = chars.next() {
        if !c.is_ascii_digit() {
            in_step = c == '/';
            out.push(c);
            continue;
        }

        let mut number = String::from(c);
        while let Some(&d) = chars.peek() {
            if !d.is_ascii_digit() {
                break;
            }
            number.push(d);
            chars.next();
        }

        if in_step {
            out.push_str(&number);
            continue;
        }

        let day: usize = number
            .parse()
            .map_err(|_| format!("invalid day of week {number:?}"))?;
        out.push_str(DAY_NAMES[day_number(day)? % 7]);
    }

    Ok(out)
}

/// Spawn the cron trigger source.
///
/// Fires once per computed occurrence. Occurrences that pass while the
/// scheduler loop is busy are not replayed.
pub fn spawn_cron_source(schedule: CronSchedule, tx: TriggerTx) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(expression = %schedule.expression(), "cron trigger started");

        loop {
            let now = Local::now();
            let Some(next) = schedule.next_after(now) else {
                info!(expression = %schedule.expression(), "cron schedule has no further occurrences");
                break;
            };

            let wait = (next - now).to_std().unwrap_or_default();
            debug!(next = %next, wait = %format_duration(wait), "next cron occurrence");
            sleep(wait).await;

            if tx.fire(TriggerSource::Cron).await.is_err() {
                debug!("scheduler gone; stopping cron trigger");
                break;
            }
        }
    })
}
