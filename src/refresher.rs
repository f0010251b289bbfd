use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing::instrument;
use tracing::warn;

use crate::cache::SampleCache;
use crate::error::Result;
use crate::error::StarError;
use crate::traits::StorageGateway;

/// Summary of a single refresh cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RefreshReport {
    pub generation: u64,
    pub ready:      usize,
    pub empty:      usize,
}

/// Periodically rebuilds every slot of a [`SampleCache`] from the storage.
pub struct Refresher<G>
where
    G: StorageGateway,
{
    cache:    Arc<SampleCache>,
    gateway:  Arc<G>,
    interval: Duration,
}

impl<G> Refresher<G>
where
    G: StorageGateway,
{
    /// Fails on a zero `interval`.
    pub fn new(cache: Arc<SampleCache>, gateway: Arc<G>, interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(StarError::Config("refresh interval must be greater than zero".to_string()));
        }

        Ok(Self {
            cache,
            gateway,
            interval,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Sample every slot from the storage and publish the result as a new snapshot.
    ///
    /// A failure to sample a slot leaves that slot empty in the new snapshot; it never stops the remaining slots from
    /// being populated.
    pub async fn refresh_once(&self) -> RefreshReport {
        let slot_size = self.cache.slot_size();
        let mut builder = self.cache.snapshot_builder();
        let mut empty = 0;

        for index in 0..builder.len() {
            match self.gateway.sample_random(slot_size).await {
                Ok(stars) => {
                    builder.fill(index, stars);
                }
                Err(err) => {
                    warn!(slot = index, error = %err, "failed to sample stars from {}", self.gateway.name());
                    builder.mark_empty(index);
                    empty += 1;
                }
            }
        }

        let ready = builder.len() - empty;
        let generation = self.cache.publish(builder);

        RefreshReport {
            generation,
            ready,
            empty,
        }
    }

    /// Refresh on every tick until cancelled. The first tick is skipped: the cache is expected to be warmed
    /// synchronously before the loop starts.
    #[instrument(level = "debug", skip(self, cancel), fields(interval = ?self.interval))]
    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Cache refresher stopped.");
                    break;
                }
                _ = ticker.tick() => {
                    let report = self.refresh_once().await;
                    info!(
                        generation = report.generation,
                        ready = report.ready,
                        empty = report.empty,
                        "Star cache refreshed."
                    );
                }
            }
        }
    }
}
