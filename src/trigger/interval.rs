// src/trigger/interval.rs

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::duration::format_duration;
use crate::trigger::{TriggerSource, TriggerTx};

/// Spawn the fixed-interval trigger source.
///
/// The first fire happens one full `period` after start-up, never at t=0.
/// Ticks that elapse while a run is in progress are skipped rather than
/// delivered in a burst afterwards.
pub fn spawn_interval_source(period: Duration, tx: TriggerTx) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval = %format_duration(period), "interval trigger started");

        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            if tx.fire(TriggerSource::Interval).await.is_err() {
                debug!("scheduler gone; stopping interval trigger");
                break;
            }
        }
    })
}
