// tests/trigger_sources.rs

mod common;
use crate::common::builders::ConfigBuilder;
use crate::common::{init_tracing, with_timeout, TestResult};

use std::time::Duration;

use tokio::time::{timeout, Instant};

use tickerd::errors::{TickerdError, EXIT_USAGE};
use tickerd::trigger::cron::spawn_cron_source;
use tickerd::trigger::interval::spawn_interval_source;
use tickerd::trigger::signal::spawn_manual_trigger;
use tickerd::trigger::watcher::spawn_watcher;
use tickerd::trigger::{spawn_sources, trigger_channel, CronSchedule, SchedulerClosed, TriggerSource};

#[tokio::test]
async fn fire_waits_for_the_scheduler_to_accept() -> TestResult {
    init_tracing();

    let (tx, mut rx) = trigger_channel();
    let fire = tokio::spawn(async move { tx.fire(TriggerSource::Manual).await });

    let trigger = with_timeout(rx.recv()).await.ok_or("channel closed")?;
    assert_eq!(trigger.source(), TriggerSource::Manual);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!fire.is_finished(), "fire returned before the trigger was accepted");

    assert_eq!(trigger.accept(), TriggerSource::Manual);
    assert_eq!(with_timeout(fire).await?, Ok(()));
    Ok(())
}

#[tokio::test]
async fn fire_fails_once_the_scheduler_is_gone() -> TestResult {
    let (tx, mut rx) = trigger_channel();

    // Received but dropped without being accepted.
    let pending = tokio::spawn({
        let tx = tx.clone();
        async move { tx.fire(TriggerSource::Cron).await }
    });
    let trigger = with_timeout(rx.recv()).await.ok_or("channel closed")?;
    drop(trigger);
    assert_eq!(with_timeout(pending).await?, Err(SchedulerClosed));

    drop(rx);
    assert_eq!(tx.fire(TriggerSource::Interval).await, Err(SchedulerClosed));
    Ok(())
}

#[tokio::test]
async fn interval_never_fires_at_start_up() -> TestResult {
    init_tracing();

    let period = Duration::from_millis(100);
    let (tx, mut rx) = trigger_channel();
    let start = Instant::now();
    let task = spawn_interval_source(period, tx);

    let first = with_timeout(rx.recv()).await.ok_or("channel closed")?;
    assert!(start.elapsed() >= period, "first tick after {:?}", start.elapsed());
    assert_eq!(first.accept(), TriggerSource::Interval);

    let second = with_timeout(rx.recv()).await.ok_or("channel closed")?;
    assert!(start.elapsed() >= period * 2);
    second.accept();

    task.abort();
    Ok(())
}

#[tokio::test]
async fn cron_source_fires_on_its_schedule() -> TestResult {
    init_tracing();

    let schedule = CronSchedule::parse("@every 1s")?;
    let (tx, mut rx) = trigger_channel();
    let start = Instant::now();
    let task = spawn_cron_source(schedule, tx);

    let trigger = timeout(Duration::from_secs(3), rx.recv())
        .await?
        .ok_or("channel closed")?;
    assert_eq!(trigger.accept(), TriggerSource::Cron);
    assert!(start.elapsed() >= Duration::from_millis(900));

    task.abort();
    Ok(())
}

#[tokio::test]
async fn file_changes_fire_watch_triggers() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let (tx, mut rx) = trigger_channel();
    let handle = spawn_watcher(dir.path(), tx)?;
    assert_eq!(handle.path(), dir.path());

    std::fs::write(dir.path().join("config.yaml"), "changed")?;

    let trigger = with_timeout(rx.recv()).await.ok_or("channel closed")?;
    assert_eq!(trigger.accept(), TriggerSource::FileWatch);
    Ok(())
}

#[tokio::test]
async fn event_burst_waits_for_a_busy_scheduler() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let (tx, mut rx) = trigger_channel();
    let handle = spawn_watcher(dir.path(), tx)?;

    // Every file creation is at least one event.
    const FILES: usize = 20;
    for i in 0..FILES {
        std::fs::write(dir.path().join(format!("burst-{i}")), "x")?;
    }

    // Nothing is accepted while the scheduler is "running".
    tokio::time::sleep(Duration::from_millis(300)).await;

    let mut accepted = 0;
    while accepted < FILES {
        let trigger = with_timeout(rx.recv()).await.ok_or("channel closed")?;
        assert_eq!(trigger.accept(), TriggerSource::FileWatch);
        accepted += 1;
    }

    // The notify thread may be parked on the full queue; dropping must not hang.
    drop(handle);
    Ok(())
}

#[tokio::test]
async fn unwatchable_path_is_a_configuration_error() -> TestResult {
    let dir = tempfile::tempdir()?;
    let missing = dir.path().join("does-not-exist");
    let (tx, _rx) = trigger_channel();

    let err = spawn_watcher(&missing, tx).unwrap_err();

    assert!(matches!(err, TickerdError::Watch { .. }), "got {err:?}");
    assert_eq!(err.exit_code(), EXIT_USAGE);
    Ok(())
}

#[tokio::test]
async fn sigusr1_requests_a_manual_run() -> TestResult {
    init_tracing();

    let (tx, mut rx) = trigger_channel();
    let task = spawn_manual_trigger(tx)?;

    let status = std::process::Command::new("sh")
        .args(["-c", &format!("kill -USR1 {}", std::process::id())])
        .status()?;
    assert!(status.success());

    let trigger = with_timeout(rx.recv()).await.ok_or("channel closed")?;
    assert_eq!(trigger.accept(), TriggerSource::Manual);

    task.abort();
    Ok(())
}

#[tokio::test]
async fn only_the_manual_trigger_runs_without_schedules() -> TestResult {
    let (tx, _rx) = trigger_channel();
    let set = spawn_sources(&ConfigBuilder::new(&["true"]).build(), tx)?;

    assert_eq!(set.len(), 1);
    assert!(!set.has_periodic_sources());
    Ok(())
}

#[tokio::test]
async fn every_configured_source_is_started() -> TestResult {
    let dir = tempfile::tempdir()?;
    let cfg = ConfigBuilder::new(&["true"])
        .interval(Duration::from_secs(3600))
        .cron("0 0 1 1 *")
        .watch(dir.path())
        .build();
    let (tx, _rx) = trigger_channel();

    let set = spawn_sources(&cfg, tx)?;

    // watch + cron + interval + manual
    assert_eq!(set.len(), 4);
    assert!(set.has_periodic_sources());
    Ok(())
}

#[tokio::test]
async fn bad_watch_path_fails_before_any_source_starts() -> TestResult {
    let dir = tempfile::tempdir()?;
    let cfg = ConfigBuilder::new(&["true"])
        .interval(Duration::from_secs(3600))
        .watch(dir.path().join("nope"))
        .build();
    let (tx, _rx) = trigger_channel();

    let err = spawn_sources(&cfg, tx).unwrap_err();
    assert_eq!(err.exit_code(), EXIT_USAGE);
    Ok(())
}
