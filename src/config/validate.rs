// src/config/validate.rs

use std::path::PathBuf;
use std::time::Duration;

use crate::cli::CliArgs;
use crate::config::duration::parse_duration;
use crate::config::model::{Config, HealthAddr, HealthMode, Invocation};
use crate::errors::{Result, TickerdError};
use crate::trigger::CronSchedule;

impl TryFrom<CliArgs> for Invocation {
    type Error = TickerdError;

    fn try_from(args: CliArgs) -> std::result::Result<Self, Self::Error> {
        let interval = optional_duration(args.interval.as_deref())?;
        let cron = non_empty(args.cron.as_deref())
            .map(CronSchedule::parse)
            .transpose()?;
        let timeout = optional_duration(args.timeout.as_deref())?;
        let health = resolve_health_mode(&args)?;

        if args.healthcheck {
            if health == HealthMode::Disabled {
                return Err(TickerdError::Usage(
                    "--healthcheck requires --healthcheck-file or --healthcheck-addr".to_string(),
                ));
            }
            return Ok(Invocation::Probe(health));
        }

        let command = resolve_command(args.command)?;

        // A cron schedule always defers the first run to its first occurrence.
        let skip_initial = args.skip_initial || cron.is_some();

        Ok(Invocation::Supervise(Config {
            command,
            interval,
            cron,
            timeout,
            watch_path: non_empty(args.watch.as_deref()).map(PathBuf::from),
            health,
            skip_initial,
        }))
    }
}

/// Parse an optional duration flag; zero is treated as "not set".
fn optional_duration(raw: Option<&str>) -> Result<Option<Duration>> {
    match non_empty(raw) {
        None => Ok(None),
        Some(s) => {
            let d = parse_duration(s)?;
            Ok((!d.is_zero()).then_some(d))
        }
    }
}

fn resolve_health_mode(args: &CliArgs) -> Result<HealthMode> {
    let file = non_empty(args.healthcheck_file.as_deref());
    let addr = non_empty(args.healthcheck_addr.as_deref());

    match (file, addr) {
        (Some(_), Some(_)) => Err(TickerdError::Usage(
            "--healthcheck-file and --healthcheck-addr are mutually exclusive".to_string(),
        )),
        (Some(path), None) => Ok(HealthMode::File(PathBuf::from(path))),
        (None, Some(addr)) => Ok(HealthMode::Tcp(HealthAddr::parse(addr)?)),
        (None, None) => Ok(HealthMode::Disabled),
    }
}

fn resolve_command(mut command: Vec<String>) -> Result<Vec<String>> {
    if command.first().is_some_and(|a| a == "--") {
        command.remove(0);
    }
    if command.is_empty() {
        return Err(TickerdError::Usage(
            "missing command; usage: tickerd [OPTIONS] [--] COMMAND [ARGS...]".to_string(),
        ));
    }
    Ok(command)
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}
