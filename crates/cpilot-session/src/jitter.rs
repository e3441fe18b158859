//! Ambient confidence jitter.
//!
//! Runs on its own cadence, independent of detection ticks, and only ever
//! sends jitter steps to the state owner.

use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::trace;

use crate::confidence::random_jitter;
use crate::state::SessionCommand;

pub(crate) async fn run_jitter(
    interval: Duration,
    step: i32,
    commands: mpsc::Sender<SessionCommand>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;

            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                let delta = random_jitter(step);
                if commands.send(SessionCommand::Jitter(delta)).await.is_err() {
                    break;
                }
            }
        }
    }

    trace!("Jitter stopped");
}
