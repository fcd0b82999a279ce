// tests/config_validation.rs

mod common;
use crate::common::builders::CliArgsBuilder;
use crate::common::TestResult;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use tickerd::config::{resolve, Config, HealthMode, Invocation};
use tickerd::errors::{TickerdError, EXIT_USAGE};

fn supervise(args: CliArgsBuilder) -> Result<Config, TickerdError> {
    match resolve(args.build())? {
        Invocation::Supervise(cfg) => Ok(cfg),
        Invocation::Probe(mode) => panic!("expected supervise mode, got probe {mode:?}"),
    }
}

#[test]
fn bare_command_runs_once() -> TestResult {
    let cfg = supervise(CliArgsBuilder::new().command(&["echo", "hi"]))?;

    assert_eq!(cfg.command, vec!["echo", "hi"]);
    assert!(cfg.interval.is_none());
    assert!(cfg.cron.is_none());
    assert!(cfg.timeout.is_none());
    assert!(cfg.watch_path.is_none());
    assert_eq!(cfg.health, HealthMode::Disabled);
    assert!(cfg.runs_initially());
    Ok(())
}

#[test]
fn leading_separator_is_not_part_of_the_command() -> TestResult {
    let cfg = supervise(CliArgsBuilder::new().command(&["--", "ls", "-la"]))?;
    assert_eq!(cfg.command, vec!["ls", "-la"]);
    Ok(())
}

#[test]
fn missing_command_is_a_usage_error() {
    let err = supervise(CliArgsBuilder::new().interval("1s")).unwrap_err();
    assert!(matches!(err, TickerdError::Usage(_)), "got {err:?}");
    assert_eq!(err.exit_code(), EXIT_USAGE);

    let err = supervise(CliArgsBuilder::new().command(&["--"])).unwrap_err();
    assert!(matches!(err, TickerdError::Usage(_)), "got {err:?}");
}

#[test]
fn durations_are_parsed_and_zero_means_unset() -> TestResult {
    let cfg = supervise(
        CliArgsBuilder::new()
            .command(&["true"])
            .interval("1m30s")
            .timeout("0"),
    )?;
    assert_eq!(cfg.interval, Some(Duration::from_secs(90)));
    assert_eq!(cfg.timeout, None);

    let cfg = supervise(CliArgsBuilder::new().command(&["true"]).interval("0s"))?;
    assert_eq!(cfg.interval, None);
    Ok(())
}

#[test]
fn malformed_duration_is_rejected() {
    let err = supervise(CliArgsBuilder::new().command(&["true"]).interval("ten")).unwrap_err();
    assert!(
        matches!(err, TickerdError::InvalidDuration { ref input, .. } if input == "ten"),
        "got {err:?}"
    );
    assert_eq!(err.exit_code(), EXIT_USAGE);

    let err = supervise(CliArgsBuilder::new().command(&["true"]).timeout("5")).unwrap_err();
    assert!(matches!(err, TickerdError::InvalidDuration { .. }), "got {err:?}");
}

#[test]
fn cron_implies_skipping_the_initial_run() -> TestResult {
    let cfg = supervise(CliArgsBuilder::new().command(&["true"]).cron("*/5 * * * *"))?;

    assert!(cfg.skip_initial);
    assert!(!cfg.runs_initially());
    assert_eq!(cfg.cron.as_ref().map(|c| c.expression()), Some("*/5 * * * *"));
    Ok(())
}

#[test]
fn malformed_cron_is_rejected() {
    let err = supervise(CliArgsBuilder::new().command(&["true"]).cron("not a schedule")).unwrap_err();
    assert!(matches!(err, TickerdError::InvalidCron { .. }), "got {err:?}");
    assert_eq!(err.exit_code(), EXIT_USAGE);
}

#[test]
fn skip_initial_flag_is_honoured() -> TestResult {
    let cfg = supervise(
        CliArgsBuilder::new()
            .command(&["true"])
            .interval("1h")
            .skip_initial(),
    )?;
    assert!(!cfg.runs_initially());
    Ok(())
}

#[test]
fn watch_path_is_carried_through() -> TestResult {
    let cfg = supervise(CliArgsBuilder::new().command(&["make"]).watch("/etc/app.conf"))?;
    assert_eq!(cfg.watch_path, Some(PathBuf::from("/etc/app.conf")));
    Ok(())
}

#[test]
fn health_modes_are_mutually_exclusive() {
    let err = supervise(
        CliArgsBuilder::new()
            .command(&["true"])
            .healthcheck_file("/tmp/h")
            .healthcheck_addr(":8080"),
    )
    .unwrap_err();
    assert!(matches!(err, TickerdError::Usage(_)), "got {err:?}");
}

#[test]
fn bare_port_listens_everywhere_and_dials_loopback() -> TestResult {
    let cfg = supervise(
        CliArgsBuilder::new()
            .command(&["true"])
            .healthcheck_addr(":8080"),
    )?;

    let HealthMode::Tcp(addr) = cfg.health else {
        panic!("expected tcp health mode, got {:?}", cfg.health);
    };
    assert_eq!(addr.listen_addr(), "0.0.0.0:8080".parse::<SocketAddr>()?);
    assert_eq!(addr.dial_addr(), "127.0.0.1:8080".parse::<SocketAddr>()?);
    Ok(())
}

#[test]
fn bad_health_address_is_rejected() {
    let err = supervise(
        CliArgsBuilder::new()
            .command(&["true"])
            .healthcheck_addr(":notaport"),
    )
    .unwrap_err();
    assert_eq!(err.exit_code(), EXIT_USAGE);
}

#[test]
fn healthcheck_probe_needs_no_command() -> TestResult {
    let inv = resolve(
        CliArgsBuilder::new()
            .healthcheck()
            .healthcheck_file("/tmp/health")
            .build(),
    )?;

    match inv {
        Invocation::Probe(HealthMode::File(path)) => assert_eq!(path, PathBuf::from("/tmp/health")),
        other => panic!("expected file probe, got {other:?}"),
    }
    Ok(())
}

#[test]
fn healthcheck_without_a_mode_is_a_usage_error() {
    let err = resolve(CliArgsBuilder::new().healthcheck().build()).unwrap_err();
    assert!(matches!(err, TickerdError::Usage(_)), "got {err:?}");
    assert_eq!(err.exit_code(), EXIT_USAGE);
}
