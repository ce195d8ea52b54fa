use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{info, warn};

use super::clock::Clock;
use super::store::UserStore;
use super::sweep::PassiveBonusSweep;

/// Fires the passive sweep on a fixed interval measured from spawn time.
pub struct SweepScheduler;

impl SweepScheduler {
    /// Spawns the sweep loop. The first sweep runs one full `every` after spawning; the loop
    /// exits once `shutdown` carries `true` or its sender is dropped.
    pub fn spawn<S, C>(
        sweep: Arc<PassiveBonusSweep<S, C>>,
        every: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()>
    where
        S: UserStore + 'static,
        C: Clock + 'static,
    {
        tokio::spawn(async move {
            let Some(first_tick) = Instant::now().checked_add(every) else {
                warn!(
                    interval_secs = every.as_secs(),
                    "sweep interval out of range, scheduler idle"
                );
                while shutdown.changed().await.is_ok() && !*shutdown.borrow() {}
                return;
            };
            let mut ticker = time::interval_at(first_tick, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(interval_secs = every.as_secs(), "passive bonus scheduler started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(err) = sweep.run_once() {
                            warn!(error = %err, "passive bonus sweep skipped");
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            info!("passive bonus scheduler stopped");
        })
    }
}
