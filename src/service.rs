use std::sync::Arc;
use std::time::Duration;

use garde::Validate;
use parking_lot::Mutex;
use rand::Rng;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::cache::SampleCache;
use crate::config::ServiceSettings;
use crate::error::Result;
use crate::error::StarError;
use crate::queue::WriteQueue;
use crate::refresher::Refresher;
use crate::traits::DonationLedger;
use crate::traits::StorageGateway;
use crate::types::CreateOutcome;
use crate::types::DonateOutcome;
use crate::types::Donation;
use crate::types::EnqueueOutcome;
use crate::types::Slot;
use crate::types::Star;
use crate::worker::WorkerReport;
use crate::worker::WriteWorker;

pub const EMPTY_FIELDS_MESSAGE: &str = "either name or message is empty";

/// Ties the sample cache, its refresher, the write queue and its worker together.
///
/// ```ignore
/// let service = StarService::start(ServiceSettings::builder().build()?, gateway).await?;
/// let slot = service.handle_read();
/// let outcome = service.handle_create(Star::new("me", "hello")).await;
/// service.shutdown().await;
/// ```
pub struct StarService<G>
where
    G: StorageGateway,
{
    settings: ServiceSettings,
    gateway:  Arc<G>,
    cache:    Arc<SampleCache>,
    queue:    WriteQueue,
    cancel:   CancellationToken,
    refresher_task: Mutex<Option<JoinHandle<()>>>,
    worker_task:    Mutex<Option<JoinHandle<WorkerReport>>>,
}

impl<G> StarService<G>
where
    G: StorageGateway,
{
    /// Validate the settings, populate the cache once and only then spawn the background tasks.
    ///
    /// By the time this returns every slot is either filled or explicitly empty, so the very first read is served
    /// from a warm cache. Must be called within a Tokio runtime.
    pub async fn start(settings: ServiceSettings, gateway: Arc<G>) -> Result<Self> {
        settings.validate()?;

        let cache = Arc::new(
            SampleCache::builder()
                .slot_count(settings.slot_count())
                .slot_size(settings.slot_size())
                .build()
                .map_err(|err| StarError::Config(err.to_string()))?,
        );

        let refresher = Refresher::new(cache.clone(), gateway.clone(), settings.refresh_interval())?;
        let report = refresher.refresh_once().await;
        info!(
            ready = report.ready,
            empty = report.empty,
            "Star cache populated from {}.",
            gateway.name()
        );
        if report.ready == 0 {
            warn!("No cache slot could be populated, reads will fail until the next refresh.");
        }

        let (queue, pending) = WriteQueue::bounded(settings.queue_capacity());
        let cancel = CancellationToken::new();

        let refresher_task = tokio::spawn(refresher.run(cancel.clone()));
        let worker_task = tokio::spawn(WriteWorker::new(pending, gateway.clone()).run(cancel.clone()));

        Ok(Self {
            settings,
            gateway,
            cache,
            queue,
            cancel,
            refresher_task: Mutex::new(Some(refresher_task)),
            worker_task: Mutex::new(Some(worker_task)),
        })
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    pub fn cache(&self) -> &Arc<SampleCache> {
        &self.cache
    }

    pub fn queue(&self) -> &WriteQueue {
        &self.queue
    }

    /// Serve a uniformly random slot of the current snapshot. An empty slot means the cache isn't warm; the caller
    /// should retry.
    pub fn handle_read(&self) -> Slot {
        let index = rand::rng().random_range(0..self.settings.slot_count());
        self.cache.get(index)
    }

    /// Validate and enqueue a new star. Acceptance only means the star is pending.
    pub async fn handle_create(&self, star: Star) -> CreateOutcome {
        self.handle_create_with_timeout(star, self.settings.enqueue_timeout())
            .await
    }

    pub async fn handle_create_with_timeout(&self, star: Star, timeout: Duration) -> CreateOutcome {
        if star.validate().is_err() {
            return CreateOutcome::Invalid(EMPTY_FIELDS_MESSAGE.to_string());
        }

        match self.queue.enqueue(star, timeout).await {
            EnqueueOutcome::Accepted => CreateOutcome::Accepted,
            EnqueueOutcome::Rejected(_) => CreateOutcome::Rejected,
            EnqueueOutcome::Closed(star) => {
                warn!(star = %star, "write queue is closed, rejecting star");
                CreateOutcome::Rejected
            }
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop the refresher and let the worker drain whatever has been accepted so far. Returns the worker's final
    /// counters; `None` if the service was already shut down.
    pub async fn shutdown(&self) -> Result<Option<WorkerReport>> {
        self.cancel.cancel();

        let refresher_task = self.refresher_task.lock().take();
        if let Some(task) = refresher_task {
            task.await?;
        }

        let worker_task = self.worker_task.lock().take();
        Ok(match worker_task {
            Some(task) => Some(task.await?),
            None => None,
        })
    }
}

impl<G> StarService<G>
where
    G: DonationLedger,
{
    /// Validate a donation and store it right away. Donations bypass the write queue, so a storage failure is
    /// reported to the caller.
    pub async fn handle_donate(&self, donation: Donation) -> DonateOutcome {
        if let Err(message) = donation.check() {
            return DonateOutcome::Invalid(message);
        }

        match self.gateway.record_donation(&donation).await {
            Ok(()) => {
                info!(name = %donation.name, amount = donation.amount, "Donation recorded.");
                DonateOutcome::Created
            }
            Err(err) => {
                error!(name = %donation.name, error = %err, "failed to record donation");
                DonateOutcome::Failed(err.to_string())
            }
        }
    }
}

impl<G> Drop for StarService<G>
where
    G: StorageGateway,
{
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
